//! Deterministic transition function of the html lexer.
//!
//! `advance` looks at the text under the cursor in one state and returns the
//! next state, the structural event, and how many bytes the event consumes.
//! It never consumes past the end of the current raw-text run, so a
//! construct interrupted by a non-text node resumes from the returned state.
//!
//! Invariant: a step with `len == 0` always changes the state.

use template_ast::Quotes;

use crate::lexer::Lexer;
use crate::state::{
    LexState, NamePart, is_attr_name_char, is_attr_name_separator, is_attr_name_start,
    is_html_whitespace, is_name_terminator, is_tag_name_char, is_tag_name_start,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Event {
    /// Content text of the current context.
    Text,
    /// Insignificant characters inside a tag.
    Skip,
    /// `<` or `</`.
    TagStart { close: bool },
    TagNameChar,
    TagNameEnd,
    /// The tag is not a tag after all; its text so far becomes content.
    TagAbort,
    /// `>` or `/>`.
    TagEnd { self_closing: bool },
    AttrNameStart,
    AttrNameChar,
    AttrNameEnd,
    AttrEquals,
    ValueStart(Quotes),
    ValueEnd,
    CommentStart,
    CommentEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LexError {
    IllegalTagName,
    IllegalAttributeName,
    /// Name characters directly after a dynamic name.
    ExpectedWhitespace,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Step {
    pub next: LexState,
    pub event: Event,
    pub len: usize,
    pub error: Option<LexError>,
}

impl Step {
    fn new(next: LexState, event: Event, len: usize) -> Self {
        Self {
            next,
            event,
            len,
            error: None,
        }
    }

    fn with_error(mut self, error: LexError) -> Self {
        self.error = Some(error);
        self
    }
}

/// Advance one step. The lexer must not be at the end of its text.
pub(crate) fn advance(state: LexState, lexer: &Lexer<'_>) -> Step {
    debug_assert!(!lexer.at_end(), "advance called at end of text");
    match state {
        LexState::Pcdata => pcdata(lexer),
        LexState::RcData(tag) => rcdata(state, tag.as_str(), lexer),
        LexState::Comment => comment(lexer),
        LexState::Declaration => raw_until(state, lexer, ">"),
        LexState::CData => raw_until(state, lexer, "]]>"),
        LexState::TagName { name } => tag_name(name, lexer),
        LexState::BeforeAttrName => before_attr_name(lexer),
        LexState::AttrName {
            name,
            after_separator,
            discard,
        } => attr_name(name, after_separator, discard, lexer),
        LexState::BeforeAttrValue => before_attr_value(lexer),
        LexState::AttrValue(quotes) => attr_value(quotes, lexer),
    }
}

fn pcdata(lexer: &Lexer<'_>) -> Step {
    let text = |len| Step::new(LexState::Pcdata, Event::Text, len);
    match lexer.find_byte(b'<') {
        Some(0) => {}
        Some(len) => return text(len),
        None => return text(lexer.rest().len()),
    }
    if lexer.starts_with("<!--") {
        return Step::new(LexState::Comment, Event::CommentStart, 4);
    }
    if lexer.starts_with("<![CDATA[") {
        return Step::new(LexState::CData, Event::Text, 9);
    }
    if lexer.starts_with("<!") || lexer.starts_with("<?") {
        return Step::new(LexState::Declaration, Event::Text, 2);
    }
    let tag_name = LexState::TagName {
        name: NamePart::Empty,
    };
    match (lexer.peek_at(1), lexer.peek_at(2)) {
        // The name may arrive as a print node.
        (None, _) => Step::new(tag_name, Event::TagStart { close: false }, 1),
        (Some('/'), None) => Step::new(tag_name, Event::TagStart { close: true }, 2),
        (Some('/'), Some(c)) if is_tag_name_start(c) => {
            Step::new(tag_name, Event::TagStart { close: true }, 2)
        }
        (Some('/'), Some(_)) => text(2).with_error(LexError::IllegalTagName),
        (Some(c), _) if is_tag_name_start(c) => {
            Step::new(tag_name, Event::TagStart { close: false }, 1)
        }
        (Some(_), _) => text(1).with_error(LexError::IllegalTagName),
    }
}

fn rcdata(state: LexState, name: &str, lexer: &Lexer<'_>) -> Step {
    let Some(at) = lexer
        .find_seq_iter("</")
        .find(|&at| closes_rcdata(lexer, at, name))
    else {
        return Step::new(state, Event::Text, lexer.rest().len());
    };
    if at > 0 {
        return Step::new(state, Event::Text, at);
    }
    let next = LexState::TagName {
        name: NamePart::Empty,
    };
    Step::new(next, Event::TagStart { close: true }, 2)
}

/// The text `at` bytes past the cursor starts with `</`; does it close the
/// element `name`?
fn closes_rcdata(lexer: &Lexer<'_>, at: usize, name: &str) -> bool {
    let after = at + 2;
    lexer.matches_ignore_ascii_case(after, name)
        && lexer
            .peek_at(after + name.len())
            .is_none_or(is_name_terminator)
}

fn comment(lexer: &Lexer<'_>) -> Step {
    match lexer.find_seq("-->") {
        Some(0) => Step::new(LexState::Pcdata, Event::CommentEnd, 3),
        Some(len) => Step::new(LexState::Comment, Event::Text, len),
        None => Step::new(LexState::Comment, Event::Text, lexer.rest().len()),
    }
}

fn raw_until(state: LexState, lexer: &Lexer<'_>, terminator: &str) -> Step {
    match lexer.find_seq(terminator) {
        Some(at) => Step::new(LexState::Pcdata, Event::Text, at + terminator.len()),
        None => Step::new(state, Event::Text, lexer.rest().len()),
    }
}

fn tag_name(name: NamePart, lexer: &Lexer<'_>) -> Step {
    let Some(c) = lexer.peek() else {
        return Step::new(LexState::Pcdata, Event::TagAbort, 0);
    };
    let terminated = LexState::BeforeAttrName;
    match name {
        NamePart::Empty if is_tag_name_start(c) => {
            let next = LexState::TagName {
                name: NamePart::Static,
            };
            Step::new(next, Event::TagNameChar, lexer.run_len(is_tag_name_char))
        }
        NamePart::Empty => {
            Step::new(LexState::Pcdata, Event::TagAbort, 0).with_error(LexError::IllegalTagName)
        }
        _ if is_name_terminator(c) => Step::new(terminated, Event::TagNameEnd, 0),
        NamePart::Static if is_tag_name_char(c) => Step::new(
            LexState::TagName { name },
            Event::TagNameChar,
            lexer.run_len(is_tag_name_char),
        ),
        NamePart::Static => {
            Step::new(LexState::Pcdata, Event::TagAbort, 0).with_error(LexError::IllegalTagName)
        }
        NamePart::Dynamic => {
            Step::new(terminated, Event::TagNameEnd, 0).with_error(LexError::ExpectedWhitespace)
        }
    }
}

fn before_attr_name(lexer: &Lexer<'_>) -> Step {
    let Some(c) = lexer.peek() else {
        return Step::new(LexState::BeforeAttrName, Event::Skip, 0);
    };
    let state = LexState::BeforeAttrName;
    if is_html_whitespace(c) {
        return Step::new(state, Event::Skip, lexer.run_len(is_html_whitespace));
    }
    match c {
        '>' => Step::new(
            LexState::Pcdata,
            Event::TagEnd {
                self_closing: false,
            },
            1,
        ),
        '/' if lexer.starts_with("/>") => {
            Step::new(LexState::Pcdata, Event::TagEnd { self_closing: true }, 2)
        }
        '/' => Step::new(state, Event::Skip, 1),
        c => {
            let legal = is_attr_name_start(c);
            let next = LexState::AttrName {
                name: NamePart::Empty,
                after_separator: false,
                discard: !legal,
            };
            let step = Step::new(next, Event::AttrNameStart, 0);
            if legal {
                step
            } else {
                step.with_error(LexError::IllegalAttributeName)
            }
        }
    }
}

fn attr_name(name: NamePart, after_separator: bool, discard: bool, lexer: &Lexer<'_>) -> Step {
    let Some(c) = lexer.peek() else {
        return Step::new(LexState::BeforeAttrName, Event::AttrNameEnd, 0);
    };
    let ends_name = is_name_terminator(c) || c == '=';
    let ending = |c: char| {
        if c == '=' {
            Step::new(LexState::BeforeAttrValue, Event::AttrEquals, 1)
        } else {
            Step::new(LexState::BeforeAttrName, Event::AttrNameEnd, 0)
        }
    };
    let discarding = LexState::AttrName {
        name,
        after_separator: false,
        discard: true,
    };
    if discard {
        if ends_name {
            return ending(c);
        }
        return Step::new(discarding, Event::Skip, lexer.char_len());
    }
    match name {
        NamePart::Dynamic if ends_name => ending(c),
        NamePart::Dynamic => Step::new(LexState::BeforeAttrName, Event::AttrNameEnd, 0)
            .with_error(LexError::ExpectedWhitespace),
        _ if ends_name && after_separator => {
            Step::new(discarding, Event::Skip, 0).with_error(LexError::IllegalAttributeName)
        }
        _ if ends_name => ending(c),
        NamePart::Empty if is_attr_name_start(c) => attr_name_char(false, lexer),
        NamePart::Static if is_attr_name_char(c) => attr_name_char(false, lexer),
        NamePart::Static if is_attr_name_separator(c) && !after_separator => {
            attr_name_char(true, lexer)
        }
        _ => Step::new(discarding, Event::Skip, 0).with_error(LexError::IllegalAttributeName),
    }
}

fn attr_name_char(separator: bool, lexer: &Lexer<'_>) -> Step {
    let next = LexState::AttrName {
        name: NamePart::Static,
        after_separator: separator,
        discard: false,
    };
    Step::new(next, Event::AttrNameChar, lexer.char_len())
}

fn before_attr_value(lexer: &Lexer<'_>) -> Step {
    match lexer.peek() {
        Some(c) if is_html_whitespace(c) => Step::new(
            LexState::BeforeAttrValue,
            Event::Skip,
            lexer.run_len(is_html_whitespace),
        ),
        Some('"') => Step::new(
            LexState::AttrValue(Quotes::Double),
            Event::ValueStart(Quotes::Double),
            1,
        ),
        Some('\'') => Step::new(
            LexState::AttrValue(Quotes::Single),
            Event::ValueStart(Quotes::Single),
            1,
        ),
        _ => Step::new(
            LexState::AttrValue(Quotes::None),
            Event::ValueStart(Quotes::None),
            0,
        ),
    }
}

fn attr_value(quotes: Quotes, lexer: &Lexer<'_>) -> Step {
    let state = LexState::AttrValue(quotes);
    let Some(quote) = quotes.quote_char() else {
        let len = lexer.run_len(|c| !is_html_whitespace(c) && c != '>');
        if len == 0 {
            return Step::new(LexState::BeforeAttrName, Event::ValueEnd, 0);
        }
        return Step::new(state, Event::Text, len);
    };
    // Quote characters are ASCII.
    match lexer.find_byte(quote as u8) {
        Some(0) => Step::new(LexState::BeforeAttrName, Event::ValueEnd, 1),
        Some(len) => Step::new(state, Event::Text, len),
        None => Step::new(state, Event::Text, lexer.rest().len()),
    }
}

#[cfg(test)]
mod tests;
