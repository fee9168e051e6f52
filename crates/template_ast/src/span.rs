//! Source locations for template nodes.

/// Byte span into the template source file.
///
/// Invariant: `start <= end`. Spans of synthesized text (special characters
/// such as `{sp}`) cover the command that produced them, so a span's length
/// may differ from the length of the text it locates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must be <= end");
        Self { start, end }
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn len(self) -> usize {
        self.end - self.start
    }

    /// Smallest span covering both `self` and `other`.
    pub fn union(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl Span {
    /// Source offset of byte `index` of a text this span locates.
    ///
    /// Exact when the text is a verbatim slice of the source; otherwise the
    /// offset is clamped into the span.
    pub fn locate(self, text_len: usize, index: usize) -> usize {
        if text_len == self.len() {
            self.start + index
        } else {
            (self.start + index).min(self.end)
        }
    }
}
