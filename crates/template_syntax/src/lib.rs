//! Reference front-end for the template language.
//!
//! Parses raw text and `{...}` commands into `template_ast` nodes. Html is
//! left as raw text; giving it structure is the job of the html rewrite pass.
//!
//! Supported commands: print (`{$x}`, `{print x}`), `{call}`/`{param}`,
//! `{let}`, `{if}`/`{elseif}`/`{else}`, `{switch}`/`{case}`/`{default}`,
//! `{for}`/`{ifempty}`, special characters, and the file-level
//! `{namespace}`, `{template}` and `{@param}` declarations.

mod command;
mod parser;

use std::fmt;

use template_ast::{ContentKind, IdGenerator, Template, TemplateFile};

pub use parser::Parser;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    UnterminatedCommand,
    MalformedCommand(String),
    UnknownKind(String),
    UnexpectedCommand(String),
    Unclosed(&'static str),
    TextOutsideTemplate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// Byte offset of the offending command or text.
    pub offset: usize,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SyntaxErrorKind::UnterminatedCommand => write!(f, "unterminated command")?,
            SyntaxErrorKind::MalformedCommand(text) => write!(f, "malformed command '{{{text}}}'")?,
            SyntaxErrorKind::UnknownKind(kind) => write!(f, "unknown content kind '{kind}'")?,
            SyntaxErrorKind::UnexpectedCommand(text) => write!(f, "unexpected {text}")?,
            SyntaxErrorKind::Unclosed(name) => write!(f, "missing {{/{name}}}")?,
            SyntaxErrorKind::TextOutsideTemplate => write!(f, "text outside of a template")?,
        }
        write!(f, " at byte {}", self.offset)
    }
}

impl std::error::Error for SyntaxError {}

/// Parse a file of `{template}` definitions.
pub fn parse_file(source: &str, ids: &mut dyn IdGenerator) -> Result<TemplateFile, SyntaxError> {
    Parser::new(source, ids).parse_file()
}

/// Parse `source` as the body of a single template named `.test`.
pub fn parse_template_body(
    source: &str,
    kind: ContentKind,
    ids: &mut dyn IdGenerator,
) -> Result<Template, SyntaxError> {
    Parser::new(source, ids).parse_body_as_template(".test", kind)
}
