use crate::{Node, ValueSource};

/// Visit every node in `nodes` and all of their descendants, parents first.
///
/// Descends into tag names, attribute parts, branch blocks and content
/// blocks.
pub fn walk<F: FnMut(&Node)>(nodes: &[Node], visit: &mut F) {
    for node in nodes {
        walk_node(node, visit);
    }
}

fn walk_node<F: FnMut(&Node)>(node: &Node, visit: &mut F) {
    visit(node);
    match node {
        Node::RawText { .. } | Node::Print { .. } => {}
        Node::Call { params, .. } => {
            for param in params {
                if let ValueSource::Content(content) = &param.value {
                    walk(content.block.children(), visit);
                }
            }
        }
        Node::Let { value, .. } => {
            if let ValueSource::Content(content) = value {
                walk(content.block.children(), visit);
            }
        }
        Node::ControlFlow(flow) => {
            for branch in &flow.branches {
                walk(branch.block.children(), visit);
            }
        }
        Node::HtmlOpenTag {
            tag_name, children, ..
        } => {
            walk_node(&tag_name.node, visit);
            walk(children, visit);
        }
        Node::HtmlCloseTag { tag_name, .. } => walk_node(&tag_name.node, visit),
        Node::HtmlAttribute { name, value, .. } => {
            walk_node(name, visit);
            if let Some(value) = value {
                walk_node(value, visit);
            }
        }
        Node::HtmlAttributeValue { children, .. } | Node::HtmlComment { children, .. } => {
            walk(children, visit)
        }
    }
}

/// Number of nodes for which `pred` holds, descendants included.
pub fn count_nodes(nodes: &[Node], pred: impl Fn(&Node) -> bool) -> usize {
    let mut count = 0usize;
    walk(nodes, &mut |node| {
        if pred(node) {
            count += 1;
        }
    });
    count
}
