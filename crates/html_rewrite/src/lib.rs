//! Html structure rewrite for templates.
//!
//! Front-ends leave html as raw text interleaved with prints, calls,
//! statements and control flow. This pass lexes that text with a small
//! state machine and rebuilds each block with open tags, close tags,
//! attributes, attribute values and comments as structural nodes. Html may
//! be interrupted by any non-text node: a print can be a tag name, an
//! attribute name or an attribute value, and a conditional can supply whole
//! attributes or values. Control-flow branches are rebuilt independently
//! from a shared entry state and must agree on where they end.
//!
//! Diagnostics are reported through an [`ErrorSink`]; the pass never stops
//! early and always produces a tree.

mod builder;
mod context;
mod error;
mod lexer;
mod machine;
mod merge;
mod pass;
mod state;

pub use context::{RewriteConfig, RewriteStats};
pub use error::{BlockKind, Construct, ErrorKind, ErrorSink, RewriteError};
pub use pass::HtmlRewritePass;
pub use state::{ExitClass, LexState, NamePart};
