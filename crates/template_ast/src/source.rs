//! Source-string projection.
//!
//! Renders nodes back to template text. Html structure is printed in a
//! normalized form: attributes get exactly one leading space inside tags,
//! whitespace between attributes is otherwise dropped, and self-closing tags
//! print as `/>` with no space before the slash.

use crate::{
    Block, BranchKind, CallParam, ContentKind, ControlFlowKind, ControlFlowNode, Node, Template,
    ValueSource,
};

/// Source text of a template body.
pub fn template_source(template: &Template) -> String {
    block_source(&template.block)
}

pub fn block_source(block: &Block) -> String {
    source_string(block.children())
}

/// Source text of a node list in html content position.
pub fn source_string(nodes: &[Node]) -> String {
    let mut writer = SourceWriter::default();
    writer.nodes(nodes, &mut Spacing::between());
    writer.out
}

/// Attribute separator policy.
///
/// Inside a tag every attribute is preceded by a space. At the root of an
/// `attributes` block only the attributes after the first one are.
#[derive(Clone, Copy, Debug)]
struct Spacing {
    always: bool,
    emitted: bool,
}

impl Spacing {
    fn in_tag() -> Self {
        Self {
            always: true,
            emitted: true,
        }
    }

    fn between() -> Self {
        Self {
            always: false,
            emitted: false,
        }
    }

    fn needs_space(&self) -> bool {
        self.always || self.emitted
    }
}

#[derive(Default)]
struct SourceWriter {
    out: String,
}

impl SourceWriter {
    fn nodes(&mut self, nodes: &[Node], spacing: &mut Spacing) {
        for node in nodes {
            self.node(node, spacing);
        }
    }

    fn content(&mut self, nodes: &[Node]) {
        self.nodes(nodes, &mut Spacing::between());
    }

    fn node(&mut self, node: &Node, spacing: &mut Spacing) {
        match node {
            Node::RawText { text, .. } => self.out.push_str(text),
            Node::Print { expr, .. } => {
                self.out.push('{');
                self.out.push_str(expr);
                self.out.push('}');
            }
            Node::Call { callee, params, .. } => self.call(callee, params),
            Node::Let { var, value, .. } => match value {
                ValueSource::Expr(expr) => {
                    self.out.push_str(&format!("{{let ${var} : {expr} /}}"));
                }
                ValueSource::Content(content) => {
                    self.out.push_str(&format!("{{let ${var}"));
                    self.kind_attr(content.kind);
                    self.out.push('}');
                    self.content(content.block.children());
                    self.out.push_str("{/let}");
                }
            },
            Node::ControlFlow(flow) => self.control_flow(flow, spacing),
            Node::HtmlOpenTag {
                tag_name,
                children,
                self_closing,
                ..
            } => {
                self.out.push('<');
                self.content(std::slice::from_ref(&*tag_name.node));
                self.nodes(children, &mut Spacing::in_tag());
                self.out.push_str(if *self_closing { "/>" } else { ">" });
            }
            Node::HtmlCloseTag { tag_name, .. } => {
                self.out.push_str("</");
                self.content(std::slice::from_ref(&*tag_name.node));
                self.out.push('>');
            }
            Node::HtmlAttribute { name, value, .. } => {
                if spacing.needs_space() {
                    self.out.push(' ');
                }
                spacing.emitted = true;
                self.content(std::slice::from_ref(&**name));
                if let Some(value) = value {
                    self.out.push('=');
                    self.content(std::slice::from_ref(&**value));
                }
            }
            Node::HtmlAttributeValue {
                quotes, children, ..
            } => {
                let quote = quotes.quote_char();
                if let Some(q) = quote {
                    self.out.push(q);
                }
                self.content(children);
                if let Some(q) = quote {
                    self.out.push(q);
                }
            }
            Node::HtmlComment { children, .. } => {
                self.out.push_str("<!--");
                self.content(children);
                self.out.push_str("-->");
            }
        }
    }

    fn call(&mut self, callee: &str, params: &[CallParam]) {
        if params.is_empty() {
            self.out.push_str(&format!("{{call {callee} /}}"));
            return;
        }
        self.out.push_str(&format!("{{call {callee}}}"));
        for param in params {
            match &param.value {
                ValueSource::Expr(expr) => {
                    self.out
                        .push_str(&format!("{{param {}: {expr} /}}", param.name));
                }
                ValueSource::Content(content) => {
                    self.out.push_str(&format!("{{param {}", param.name));
                    self.kind_attr(content.kind);
                    self.out.push('}');
                    self.content(content.block.children());
                    self.out.push_str("{/param}");
                }
            }
        }
        self.out.push_str("{/call}");
    }

    fn kind_attr(&mut self, kind: Option<ContentKind>) {
        if let Some(kind) = kind {
            self.out.push_str(&format!(" kind=\"{}\"", kind.as_str()));
        }
    }

    fn control_flow(&mut self, flow: &ControlFlowNode, spacing: &mut Spacing) {
        let entry = *spacing;
        let mut any_emitted = entry.emitted;
        match &flow.kind {
            ControlFlowKind::If => {}
            ControlFlowKind::Switch { expr } => self.out.push_str(&format!("{{switch {expr}}}")),
            ControlFlowKind::For { var, expr } => {
                self.out.push_str(&format!("{{for ${var} in {expr}}}"))
            }
        }
        for (index, branch) in flow.branches.iter().enumerate() {
            match (&flow.kind, &branch.kind) {
                (ControlFlowKind::If, BranchKind::Cond(cond)) if index == 0 => {
                    self.out.push_str(&format!("{{if {cond}}}"))
                }
                (ControlFlowKind::If, BranchKind::Cond(cond)) => {
                    self.out.push_str(&format!("{{elseif {cond}}}"))
                }
                (ControlFlowKind::If, _) => self.out.push_str("{else}"),
                (ControlFlowKind::Switch { .. }, BranchKind::Cond(cond)) => {
                    self.out.push_str(&format!("{{case {cond}}}"))
                }
                (ControlFlowKind::Switch { .. }, _) => self.out.push_str("{default}"),
                (ControlFlowKind::For { .. }, BranchKind::Default) => {
                    self.out.push_str("{ifempty}")
                }
                (ControlFlowKind::For { .. }, _) => {}
            }
            let mut branch_spacing = entry;
            self.nodes(branch.block.children(), &mut branch_spacing);
            any_emitted |= branch_spacing.emitted;
        }
        self.out.push_str(match flow.kind {
            ControlFlowKind::If => "{/if}",
            ControlFlowKind::Switch { .. } => "{/switch}",
            ControlFlowKind::For { .. } => "{/for}",
        });
        spacing.emitted = any_emitted;
    }
}
