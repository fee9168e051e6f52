//! Template node model.
//!
//! Invariants:
//! - The node variant set is closed; passes match on it exhaustively.
//! - Html structural nodes (`HtmlOpenTag` .. `HtmlComment`) only appear after
//!   the html rewrite pass; front-ends never produce them.
//! - A `Block` owns its children and is replaced wholesale by rewriting passes
//!   (`replace_children`), never patched piecemeal.

use crate::{NodeId, Span};

/// Content kind of a template or a content block (`{let}` / `{param}`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Html,
    Attributes,
    Text,
    Css,
    Js,
    Uri,
    TrustedResourceUri,
}

impl ContentKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "html" => ContentKind::Html,
            "attributes" => ContentKind::Attributes,
            "text" => ContentKind::Text,
            "css" => ContentKind::Css,
            "js" => ContentKind::Js,
            "uri" => ContentKind::Uri,
            "trusted_resource_uri" => ContentKind::TrustedResourceUri,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Html => "html",
            ContentKind::Attributes => "attributes",
            ContentKind::Text => "text",
            ContentKind::Css => "css",
            ContentKind::Js => "js",
            ContentKind::Uri => "uri",
            ContentKind::TrustedResourceUri => "trusted_resource_uri",
        }
    }
}

/// Quoting style of an attribute value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quotes {
    None,
    Single,
    Double,
}

impl Quotes {
    pub fn quote_char(self) -> Option<char> {
        match self {
            Quotes::None => None,
            Quotes::Single => Some('\''),
            Quotes::Double => Some('"'),
        }
    }
}

/// Context-changing elements: once opened, their content is raw text up to
/// the matching close tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RcDataTag {
    Script,
    Style,
    Title,
    Textarea,
    Xmp,
}

impl RcDataTag {
    pub const ALL: [RcDataTag; 5] = [
        RcDataTag::Script,
        RcDataTag::Style,
        RcDataTag::Title,
        RcDataTag::Textarea,
        RcDataTag::Xmp,
    ];

    /// ASCII case-insensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RcDataTag::Script => "script",
            RcDataTag::Style => "style",
            RcDataTag::Title => "title",
            RcDataTag::Textarea => "textarea",
            RcDataTag::Xmp => "xmp",
        }
    }
}

/// Name of an open or close tag: a raw text node for static names, a print
/// or call node for dynamic ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagName {
    pub node: Box<Node>,
    rcdata: Option<RcDataTag>,
}

impl TagName {
    pub fn new(node: Node) -> Self {
        let rcdata = match &node {
            Node::RawText { text, .. } => RcDataTag::from_name(text),
            _ => None,
        };
        Self {
            node: Box::new(node),
            rcdata,
        }
    }

    pub fn static_name(&self) -> Option<&str> {
        match &*self.node {
            Node::RawText { text, .. } => Some(text),
            _ => None,
        }
    }

    /// The context-changing element this name statically denotes, if any.
    pub fn rcdata_tag(&self) -> Option<RcDataTag> {
        self.rcdata
    }

    pub fn is_context_changing(&self) -> bool {
        self.rcdata.is_some()
    }
}

/// Ordered child list of a template, branch or content block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    children: Vec<Node>,
}

impl Block {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn push(&mut self, node: Node) {
        self.children.push(node);
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn take_children(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.children)
    }

    /// Swap in a new child list in one step, returning the previous one.
    pub fn replace_children(&mut self, children: Vec<Node>) -> Vec<Node> {
        std::mem::replace(&mut self.children, children)
    }
}

/// A `{let}` or `{param}` block body together with its declared kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentBlock {
    pub kind: Option<ContentKind>,
    pub block: Block,
}

impl ContentBlock {
    /// Undeclared kinds default to html.
    pub fn effective_kind(&self) -> ContentKind {
        self.kind.unwrap_or(ContentKind::Html)
    }
}

/// Value bound by a `{let}` or `{param}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueSource {
    Expr(String),
    Content(ContentBlock),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallParam {
    pub id: NodeId,
    pub location: Span,
    pub name: String,
    pub value: ValueSource,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlFlowKind {
    If,
    Switch { expr: String },
    For { var: String, expr: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BranchKind {
    /// `{if}`/`{elseif}` condition or `{case}` expression list.
    Cond(String),
    /// `{else}`, `{default}` or `{ifempty}`.
    Default,
    /// The repeated body of a `{for}`.
    LoopBody,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Branch {
    pub id: NodeId,
    pub kind: BranchKind,
    pub block: Block,
}

/// `{if}`, `{switch}` or `{for}` with its branches in source order.
///
/// Invariant: at most one `Default` branch, and it comes last.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlFlowNode {
    pub id: NodeId,
    pub location: Span,
    pub kind: ControlFlowKind,
    pub branches: Vec<Branch>,
}

impl ControlFlowNode {
    pub fn has_default(&self) -> bool {
        self.branches
            .iter()
            .any(|branch| branch.kind == BranchKind::Default)
    }

    pub fn is_loop(&self) -> bool {
        matches!(self.kind, ControlFlowKind::For { .. })
    }

    /// Short command name used in diagnostics (`if`, `switch`, `for`).
    pub fn command_name(&self) -> &'static str {
        match self.kind {
            ControlFlowKind::If => "if",
            ControlFlowKind::Switch { .. } => "switch",
            ControlFlowKind::For { .. } => "for",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    RawText {
        id: NodeId,
        location: Span,
        text: String,
    },
    Print {
        id: NodeId,
        location: Span,
        expr: String,
    },
    Call {
        id: NodeId,
        location: Span,
        callee: String,
        params: Vec<CallParam>,
    },
    Let {
        id: NodeId,
        location: Span,
        var: String,
        value: ValueSource,
    },
    ControlFlow(ControlFlowNode),
    HtmlOpenTag {
        id: NodeId,
        location: Span,
        tag_name: TagName,
        /// Attributes, and control flow or statements positioned among them.
        children: Vec<Node>,
        self_closing: bool,
    },
    HtmlCloseTag {
        id: NodeId,
        location: Span,
        tag_name: TagName,
    },
    HtmlAttribute {
        id: NodeId,
        location: Span,
        name: Box<Node>,
        /// An `HtmlAttributeValue`, or control flow whose branches each
        /// produce one.
        value: Option<Box<Node>>,
    },
    HtmlAttributeValue {
        id: NodeId,
        location: Span,
        quotes: Quotes,
        children: Vec<Node>,
    },
    HtmlComment {
        id: NodeId,
        location: Span,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::RawText { id, .. }
            | Node::Print { id, .. }
            | Node::Call { id, .. }
            | Node::Let { id, .. }
            | Node::HtmlOpenTag { id, .. }
            | Node::HtmlCloseTag { id, .. }
            | Node::HtmlAttribute { id, .. }
            | Node::HtmlAttributeValue { id, .. }
            | Node::HtmlComment { id, .. } => *id,
            Node::ControlFlow(node) => node.id,
        }
    }

    pub fn location(&self) -> Span {
        match self {
            Node::RawText { location, .. }
            | Node::Print { location, .. }
            | Node::Call { location, .. }
            | Node::Let { location, .. }
            | Node::HtmlOpenTag { location, .. }
            | Node::HtmlCloseTag { location, .. }
            | Node::HtmlAttribute { location, .. }
            | Node::HtmlAttributeValue { location, .. }
            | Node::HtmlComment { location, .. } => *location,
            Node::ControlFlow(node) => node.location,
        }
    }

    pub fn raw_text(id: NodeId, location: Span, text: impl Into<String>) -> Node {
        Node::RawText {
            id,
            location,
            text: text.into(),
        }
    }

    pub fn as_raw_text(&self) -> Option<&str> {
        match self {
            Node::RawText { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Print and call nodes: they produce output and may stand in for a
    /// name or a value inside a tag.
    pub fn is_printing(&self) -> bool {
        matches!(self, Node::Print { .. } | Node::Call { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateParam {
    pub name: String,
    pub ty: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    pub id: NodeId,
    pub location: Span,
    pub name: String,
    pub kind: ContentKind,
    pub params: Vec<TemplateParam>,
    pub block: Block,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateFile {
    pub namespace: Option<String>,
    pub templates: Vec<Template>,
}
