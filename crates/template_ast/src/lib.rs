//! Template syntax tree shared by the front-end and the rewrite passes.
//!
//! Nodes own their children; a block is rewritten by building a new child
//! list and swapping it in with [`Block::replace_children`].

mod id;
mod node;
pub mod shape;
pub mod source;
mod span;
pub mod traverse;

pub use id::{IdGenerator, IncrementingIdGenerator, NodeId};
pub use node::{
    Block, Branch, BranchKind, CallParam, ContentBlock, ContentKind, ControlFlowKind,
    ControlFlowNode, Node, Quotes, RcDataTag, TagName, Template, TemplateFile, TemplateParam,
    ValueSource,
};
pub use span::Span;
