//! Lexical states of the html rewrite.
//!
//! The state is a small `Copy` value with no hidden data: branches of a
//! control-flow node are explored by handing each one its own copy.

use template_ast::{ContentKind, Quotes, RcDataTag};

/// How much of a tag or attribute name has been seen so far.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NamePart {
    Empty,
    /// Literal name characters.
    Static,
    /// A print or call node standing in for the name.
    Dynamic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LexState {
    Pcdata,
    /// Body of a context-changing element, ended only by its literal close
    /// tag.
    RcData(RcDataTag),
    Comment,
    /// `<!...>` and `<?...>`, carried as text.
    Declaration,
    CData,
    TagName {
        name: NamePart,
    },
    BeforeAttrName,
    AttrName {
        name: NamePart,
        /// The last name character was `-` or `:`.
        after_separator: bool,
        /// Skip characters up to the end of the name; the attribute is
        /// dropped.
        discard: bool,
    },
    BeforeAttrValue,
    AttrValue(Quotes),
}

impl LexState {
    /// State a block of the given kind starts in, or `None` when blocks of
    /// that kind carry no html structure.
    pub fn entry_for(kind: ContentKind) -> Option<LexState> {
        match kind {
            ContentKind::Html => Some(LexState::Pcdata),
            ContentKind::Attributes => Some(LexState::BeforeAttrName),
            _ => None,
        }
    }

    /// Name of the state in diagnostics.
    pub fn context_name(self) -> &'static str {
        match self {
            LexState::Pcdata => "pcdata",
            LexState::RcData(tag) => tag.as_str(),
            LexState::Comment => "html comment",
            LexState::Declaration => "html declaration",
            LexState::CData => "cdata",
            LexState::TagName { .. } => "html tag name",
            LexState::BeforeAttrName => "html tag",
            LexState::AttrName { .. } => "attribute name",
            LexState::BeforeAttrValue => "before attribute value",
            LexState::AttrValue(Quotes::None) => "unquoted attribute value",
            LexState::AttrValue(Quotes::Single) => "single quoted attribute value",
            LexState::AttrValue(Quotes::Double) => "double quoted attribute value",
        }
    }

    /// States whose content is text up to a fixed terminator. A block may not
    /// end in one it did not start in.
    pub fn is_raw_context(self) -> bool {
        matches!(
            self,
            LexState::RcData(_) | LexState::Comment | LexState::Declaration | LexState::CData
        )
    }

    pub fn exit_class(self) -> ExitClass {
        match self {
            LexState::Pcdata => ExitClass::Pcdata,
            LexState::RcData(tag) => ExitClass::RcData(tag),
            LexState::Comment => ExitClass::Comment,
            LexState::Declaration => ExitClass::Declaration,
            LexState::CData => ExitClass::CData,
            LexState::TagName { .. } | LexState::BeforeAttrName | LexState::AttrName { .. } => {
                ExitClass::Tag
            }
            LexState::BeforeAttrValue => ExitClass::BeforeAttrValue,
            LexState::AttrValue(quotes) => ExitClass::AttrValue(quotes),
        }
    }
}

/// Coarse state used to decide whether control-flow branches agree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExitClass {
    Pcdata,
    RcData(RcDataTag),
    Comment,
    Declaration,
    CData,
    Tag,
    BeforeAttrValue,
    AttrValue(Quotes),
}

pub(crate) fn is_html_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{0C}')
}

pub(crate) fn is_tag_name_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

pub(crate) fn is_tag_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
}

pub(crate) fn is_attr_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '_' | '$')
}

pub(crate) fn is_attr_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$')
}

/// `-` and `:` may join name parts but may not repeat or end a name.
pub(crate) fn is_attr_name_separator(c: char) -> bool {
    matches!(c, '-' | ':')
}

/// Characters that end a tag or attribute name.
pub(crate) fn is_name_terminator(c: char) -> bool {
    is_html_whitespace(c) || matches!(c, '/' | '>')
}
