//! Shape projection: one line per node, indented two spaces per depth.

use crate::{Block, BranchKind, ControlFlowKind, ControlFlowNode, Node, ValueSource};

pub fn shape(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node, 0);
    }
    out
}

pub fn block_shape(block: &Block) -> String {
    shape(block.children())
}

/// Display name of a node kind in the shape projection.
pub fn kind_name(node: &Node) -> &'static str {
    match node {
        Node::RawText { .. } => "RAW_TEXT_NODE",
        Node::Print { .. } => "PRINT_NODE",
        Node::Call { .. } => "CALL_BASIC_NODE",
        Node::Let {
            value: ValueSource::Expr(_),
            ..
        } => "LET_VALUE_NODE",
        Node::Let { .. } => "LET_CONTENT_NODE",
        Node::ControlFlow(flow) => match flow.kind {
            ControlFlowKind::If => "IF_NODE",
            ControlFlowKind::Switch { .. } => "SWITCH_NODE",
            ControlFlowKind::For { .. } => "FOR_NODE",
        },
        Node::HtmlOpenTag { .. } => "HTML_OPEN_TAG_NODE",
        Node::HtmlCloseTag { .. } => "HTML_CLOSE_TAG_NODE",
        Node::HtmlAttribute { .. } => "HTML_ATTRIBUTE_NODE",
        Node::HtmlAttributeValue { .. } => "HTML_ATTRIBUTE_VALUE_NODE",
        Node::HtmlComment { .. } => "HTML_COMMENT_NODE",
    }
}

fn branch_name(flow: &ControlFlowNode, kind: &BranchKind) -> &'static str {
    match (&flow.kind, kind) {
        (ControlFlowKind::If, BranchKind::Default) => "IF_ELSE_NODE",
        (ControlFlowKind::If, _) => "IF_COND_NODE",
        (ControlFlowKind::Switch { .. }, BranchKind::Default) => "SWITCH_DEFAULT_NODE",
        (ControlFlowKind::Switch { .. }, _) => "SWITCH_CASE_NODE",
        (ControlFlowKind::For { .. }, BranchKind::Default) => "FOR_IFEMPTY_NODE",
        (ControlFlowKind::For { .. }, _) => "FOR_NONEMPTY_NODE",
    }
}

fn line(out: &mut String, depth: usize, name: &str) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(name);
    out.push('\n');
}

fn write_all(out: &mut String, nodes: &[Node], depth: usize) {
    for node in nodes {
        write_node(out, node, depth);
    }
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    line(out, depth, kind_name(node));
    let depth = depth + 1;
    match node {
        Node::RawText { .. } | Node::Print { .. } => {}
        Node::Call { params, .. } => {
            for param in params {
                match &param.value {
                    ValueSource::Expr(_) => line(out, depth, "CALL_PARAM_VALUE_NODE"),
                    ValueSource::Content(content) => {
                        line(out, depth, "CALL_PARAM_CONTENT_NODE");
                        write_all(out, content.block.children(), depth + 1);
                    }
                }
            }
        }
        Node::Let { value, .. } => {
            if let ValueSource::Content(content) = value {
                write_all(out, content.block.children(), depth);
            }
        }
        Node::ControlFlow(flow) => {
            for branch in &flow.branches {
                line(out, depth, branch_name(flow, &branch.kind));
                write_all(out, branch.block.children(), depth + 1);
            }
        }
        Node::HtmlOpenTag {
            tag_name, children, ..
        } => {
            write_node(out, &tag_name.node, depth);
            write_all(out, children, depth);
        }
        Node::HtmlCloseTag { tag_name, .. } => write_node(out, &tag_name.node, depth),
        Node::HtmlAttribute { name, value, .. } => {
            write_node(out, name, depth);
            if let Some(value) = value {
                write_node(out, value, depth);
            }
        }
        Node::HtmlAttributeValue { children, .. } | Node::HtmlComment { children, .. } => {
            write_all(out, children, depth)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::shape;
    use crate::{Node, NodeId, Quotes, Span, TagName};

    fn text(s: &str) -> Node {
        Node::raw_text(NodeId(0), Span::default(), s)
    }

    #[test]
    fn tag_name_is_first_child_of_tag() {
        let nodes = vec![
            Node::HtmlOpenTag {
                id: NodeId(1),
                location: Span::default(),
                tag_name: TagName::new(text("div")),
                children: vec![Node::HtmlAttribute {
                    id: NodeId(2),
                    location: Span::default(),
                    name: Box::new(text("a")),
                    value: Some(Box::new(Node::HtmlAttributeValue {
                        id: NodeId(3),
                        location: Span::default(),
                        quotes: Quotes::Double,
                        children: vec![text("b")],
                    })),
                }],
                self_closing: false,
            },
            Node::HtmlCloseTag {
                id: NodeId(4),
                location: Span::default(),
                tag_name: TagName::new(text("div")),
            },
        ];
        let expected = "\
HTML_OPEN_TAG_NODE
  RAW_TEXT_NODE
  HTML_ATTRIBUTE_NODE
    RAW_TEXT_NODE
    HTML_ATTRIBUTE_VALUE_NODE
      RAW_TEXT_NODE
HTML_CLOSE_TAG_NODE
  RAW_TEXT_NODE
";
        assert_eq!(shape(&nodes), expected);
    }

    #[test]
    fn empty_comment_has_no_children() {
        let nodes = vec![Node::HtmlComment {
            id: NodeId(1),
            location: Span::default(),
            children: vec![],
        }];
        assert_eq!(shape(&nodes), "HTML_COMMENT_NODE\n");
    }
}
