//! Diagnostics reported by the rewrite.
//!
//! Every diagnostic is recoverable: the pass reports it and keeps going, so
//! a single run collects all of them. Whether any should fail the build is
//! up to the caller.

use std::fmt;

use template_ast::Span;

/// Html construct named in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Construct {
    Tag,
    Attribute,
    AttributeValue,
    Comment,
}

impl Construct {
    pub fn as_str(self) -> &'static str {
        match self {
            Construct::Tag => "html tag",
            Construct::Attribute => "html attribute",
            Construct::AttributeValue => "attribute value",
            Construct::Comment => "html comment",
        }
    }
}

/// Kind of block whose end is being checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Template,
    LetContent,
    ParamContent,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Template => "template",
            BlockKind::LetContent => "let content",
            BlockKind::ParamContent => "param content",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    IllegalTagNameCharacter,
    IllegalAttributeNameCharacter,
    UnexpectedCloseTag,
    BlockChangesContext {
        block: BlockKind,
        from: &'static str,
        to: &'static str,
    },
    BranchContextMismatch {
        construct: &'static str,
        first: &'static str,
        other: &'static str,
    },
    LoopChangesContext {
        from: &'static str,
        to: &'static str,
    },
    UnclosedInBranch {
        construct: Construct,
    },
    ClosedInOtherBlock {
        construct: Construct,
    },
    ExpectedWhitespaceAfterName,
    ControlFlowInTagName,
    ExpectedTagName,
    CloseTagWithAttributes,
    ExtraContentAfterAttributeValue,
    ControlFlowTooDeep {
        limit: usize,
    },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::IllegalTagNameCharacter => f.write_str("Illegal tag name character."),
            ErrorKind::IllegalAttributeNameCharacter => {
                f.write_str("Illegal attribute name character.")
            }
            ErrorKind::UnexpectedCloseTag => {
                f.write_str("Unexpected close tag for context-changing tag.")
            }
            ErrorKind::BlockChangesContext { block, from, to } => write!(
                f,
                "{} changes context from '{from}' to '{to}'. Did you forget to close the {to}?",
                block.as_str()
            ),
            ErrorKind::BranchContextMismatch {
                construct,
                first,
                other,
            } => write!(
                f,
                "The branches of this {{{construct}}} end in different contexts ('{first}' and \
                 '{other}'). Every branch must end in the same context."
            ),
            ErrorKind::LoopChangesContext { from, to } => write!(
                f,
                "{{for}} loop body changes context from '{from}' to '{to}'. A loop body must \
                 end in the context it starts in."
            ),
            ErrorKind::UnclosedInBranch { construct } => write!(
                f,
                "Expected the {} to be closed before the end of this branch.",
                construct.as_str()
            ),
            ErrorKind::ClosedInOtherBlock { construct } => write!(
                f,
                "Found the end of an {} that was started in another block.",
                construct.as_str()
            ),
            ErrorKind::ExpectedWhitespaceAfterName => f.write_str(
                "Expected whitespace, '=', '/' or '>' after an html tag or attribute name.",
            ),
            ErrorKind::ControlFlowInTagName => {
                f.write_str("Control flow is not allowed in html tag names.")
            }
            ErrorKind::ExpectedTagName => f.write_str("Expected an html tag name."),
            ErrorKind::CloseTagWithAttributes => {
                f.write_str("Html close tags cannot have attributes.")
            }
            ErrorKind::ExtraContentAfterAttributeValue => f.write_str(
                "A branch that produces an attribute value cannot contain anything after the \
                 value.",
            ),
            ErrorKind::ControlFlowTooDeep { limit } => write!(
                f,
                "Control flow is nested more than {limit} levels deep inside html."
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewriteError {
    pub location: Span,
    pub kind: ErrorKind,
}

impl RewriteError {
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}: {}",
            self.location.start, self.location.end, self.kind
        )
    }
}

impl std::error::Error for RewriteError {}

/// Receiver of diagnostics, threaded through every recursive call.
pub trait ErrorSink {
    fn report(&mut self, location: Span, kind: ErrorKind);
}

impl ErrorSink for Vec<RewriteError> {
    fn report(&mut self, location: Span, kind: ErrorKind) {
        self.push(RewriteError { location, kind });
    }
}
