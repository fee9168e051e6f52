//! Branch-context merger.
//!
//! Every branch of a control-flow node is rebuilt from the same entry state
//! by its own builder. The exits must agree: an `{if}` or `{switch}` without
//! a default branch can also fall through, which exits in the entry state,
//! and a `{for}` body may run any number of times, so it must end where it
//! started.

use template_ast::{BranchKind, ControlFlowNode};

use crate::builder::Builder;
use crate::context::RewriteCx;
use crate::error::ErrorKind;
use crate::state::LexState;

/// Rebuild the branches of `flow` from `entry`; returns the node and the
/// state the builder continues in after it.
///
/// On disagreement the first branch's exit wins, so the caller keeps going.
pub(crate) fn merge(
    cx: &mut RewriteCx<'_>,
    mut flow: ControlFlowNode,
    entry: LexState,
) -> (ControlFlowNode, LexState) {
    let limit = cx.config.max_control_flow_depth;
    if cx.depth >= limit {
        cx.report(flow.location, ErrorKind::ControlFlowTooDeep { limit });
        return (flow, entry);
    }
    cx.depth += 1;
    let command = flow.command_name();
    let mut exits = Vec::with_capacity(flow.branches.len() + 1);
    for branch in &mut flow.branches {
        cx.stats.branches = cx.stats.branches.saturating_add(1);
        let mut builder = Builder::new(cx, entry, true, flow.location.start);
        builder.feed(branch.block.take_children());
        let (children, exit) = builder.finish_branch();
        branch.block.replace_children(children);
        log::trace!(
            target: "html_rewrite.merge",
            "{{{command}}} branch {:?}: {:?} -> {:?}",
            branch.id,
            entry,
            exit
        );
        exits.push((branch.kind.clone(), exit));
    }
    cx.depth -= 1;

    if flow.is_loop() {
        reconcile_loop(cx, &flow, entry, &exits);
        return (flow, entry);
    }
    if !flow.has_default() {
        exits.push((BranchKind::Default, entry));
    }
    let Some(&(_, first)) = exits.first() else {
        return (flow, entry);
    };
    let mismatch = exits
        .iter()
        .map(|&(_, exit)| exit)
        .find(|exit| exit.exit_class() != first.exit_class());
    if let Some(other) = mismatch {
        log::debug!(
            target: "html_rewrite.merge",
            "{{{command}}} at {} ends in {:?} and {:?}",
            flow.location.start,
            first,
            other
        );
        cx.report(
            flow.location,
            ErrorKind::BranchContextMismatch {
                construct: command,
                first: first.context_name(),
                other: other.context_name(),
            },
        );
    }
    (flow, first)
}

fn reconcile_loop(
    cx: &mut RewriteCx<'_>,
    flow: &ControlFlowNode,
    entry: LexState,
    exits: &[(BranchKind, LexState)],
) {
    for (kind, exit) in exits {
        let exit = *exit;
        if exit.exit_class() == entry.exit_class() {
            continue;
        }
        let kind = match kind {
            BranchKind::LoopBody => ErrorKind::LoopChangesContext {
                from: entry.context_name(),
                to: exit.context_name(),
            },
            _ => ErrorKind::BranchContextMismatch {
                construct: flow.command_name(),
                first: entry.context_name(),
                other: exit.context_name(),
            },
        };
        cx.report(flow.location, kind);
    }
}
