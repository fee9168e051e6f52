//! Cursor over one run of raw text.

use memchr::{memchr, memmem};
use template_ast::Span;

/// Text of one or more adjacent raw-text nodes lexed as a unit, with the
/// source location of each piece.
#[derive(Clone, Debug)]
pub(crate) struct RawSpan {
    text: String,
    segments: Vec<Segment>,
}

#[derive(Clone, Copy, Debug)]
struct Segment {
    /// Byte offset of the piece in `RawSpan::text`.
    offset: usize,
    len: usize,
    location: Span,
}

impl RawSpan {
    pub(crate) fn new(text: String, location: Span) -> Self {
        let len = text.len();
        Self {
            text,
            segments: vec![Segment {
                offset: 0,
                len,
                location,
            }],
        }
    }

    pub(crate) fn push(&mut self, text: &str, location: Span) {
        self.segments.push(Segment {
            offset: self.text.len(),
            len: text.len(),
            location,
        });
        self.text.push_str(text);
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    fn segment(&self, index: usize) -> Segment {
        let at = self
            .segments
            .partition_point(|segment| segment.offset <= index)
            .saturating_sub(1);
        self.segments[at]
    }

    /// Source offset of byte `index`.
    pub(crate) fn locate(&self, index: usize) -> usize {
        let segment = self.segment(index);
        segment.location.locate(segment.len, index - segment.offset)
    }

    /// Source offset just past byte `index - 1`.
    pub(crate) fn locate_end(&self, index: usize) -> usize {
        if index == 0 {
            return self.locate(0);
        }
        let segment = self.segment(index - 1);
        segment.location.locate(segment.len, index - segment.offset)
    }

    /// Source span of the text bytes `from..to`.
    pub(crate) fn location(&self, from: usize, to: usize) -> Span {
        let start = self.locate(from);
        Span::new(start, self.locate_end(to).max(start))
    }
}

pub(crate) struct Lexer<'t> {
    text: &'t str,
    pos: usize,
}

impl<'t> Lexer<'t> {
    pub(crate) fn new(text: &'t str) -> Self {
        Self { text, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub(crate) fn rest(&self) -> &'t str {
        &self.text[self.pos..]
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Character starting `offset` bytes past the cursor.
    pub(crate) fn peek_at(&self, offset: usize) -> Option<char> {
        self.rest().get(offset..)?.chars().next()
    }

    pub(crate) fn char_len(&self) -> usize {
        self.peek().map_or(0, char::len_utf8)
    }

    pub(crate) fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    /// Whether the text `offset` bytes past the cursor starts with `prefix`,
    /// ignoring ASCII case.
    pub(crate) fn matches_ignore_ascii_case(&self, offset: usize, prefix: &str) -> bool {
        self.rest()
            .as_bytes()
            .get(offset..)
            .and_then(|rest| rest.get(..prefix.len()))
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(prefix.as_bytes()))
    }

    /// Offsets of every `needle` in the remaining text, relative to the
    /// cursor.
    pub(crate) fn find_seq_iter(&self, needle: &str) -> impl Iterator<Item = usize> {
        memmem::find_iter(self.rest().as_bytes(), needle.as_bytes())
    }

    /// Offset of the next `byte` relative to the cursor.
    pub(crate) fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, self.rest().as_bytes())
    }

    pub(crate) fn find_seq(&self, needle: &str) -> Option<usize> {
        memmem::find(self.rest().as_bytes(), needle.as_bytes())
    }

    /// Length of the longest prefix of the remaining text whose characters
    /// satisfy `pred`.
    pub(crate) fn run_len(&self, pred: impl Fn(char) -> bool) -> usize {
        self.rest()
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(self.rest().len(), |(idx, _)| idx)
    }

    pub(crate) fn advance(&mut self, len: usize) {
        debug_assert!(self.text.is_char_boundary(self.pos + len));
        self.pos += len;
    }
}
