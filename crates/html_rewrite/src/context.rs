use template_ast::{IdGenerator, NodeId, Span};

use crate::error::{ErrorKind, ErrorSink};

/// Configuration for the rewrite.
#[derive(Clone, Debug)]
pub struct RewriteConfig {
    /// Lex adjacent raw-text nodes as one run, so constructs such as `<!--`
    /// or `</script` may straddle node boundaries.
    pub coalesce_text: bool,
    /// Control flow nested deeper than this inside html is reported and left
    /// unrewritten.
    pub max_control_flow_depth: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            coalesce_text: true,
            max_control_flow_depth: 256,
        }
    }
}

/// Minimal rewrite instrumentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub blocks: u64,
    pub branches: u64,
    pub raw_text_spans: u64,
    pub structural_nodes: u64,
    pub state_transitions: u64,
    pub errors: u64,
}

impl RewriteStats {
    pub fn merge(&mut self, other: RewriteStats) {
        self.blocks = self.blocks.saturating_add(other.blocks);
        self.branches = self.branches.saturating_add(other.branches);
        self.raw_text_spans = self.raw_text_spans.saturating_add(other.raw_text_spans);
        self.structural_nodes = self.structural_nodes.saturating_add(other.structural_nodes);
        self.state_transitions = self
            .state_transitions
            .saturating_add(other.state_transitions);
        self.errors = self.errors.saturating_add(other.errors);
    }
}

/// Collaborators and counters shared by every builder of one run.
pub(crate) struct RewriteCx<'a> {
    ids: &'a mut dyn IdGenerator,
    errors: &'a mut dyn ErrorSink,
    pub(crate) config: &'a RewriteConfig,
    pub(crate) stats: RewriteStats,
    /// Control-flow nodes currently being merged.
    pub(crate) depth: usize,
}

impl<'a> RewriteCx<'a> {
    pub(crate) fn new(
        ids: &'a mut dyn IdGenerator,
        errors: &'a mut dyn ErrorSink,
        config: &'a RewriteConfig,
    ) -> Self {
        Self {
            ids,
            errors,
            config,
            stats: RewriteStats::default(),
            depth: 0,
        }
    }

    pub(crate) fn next_id(&mut self) -> NodeId {
        self.ids.next_id()
    }

    pub(crate) fn report(&mut self, location: Span, kind: ErrorKind) {
        log::debug!(
            target: "html_rewrite",
            "error at {}..{}: {kind}",
            location.start,
            location.end
        );
        self.stats.errors = self.stats.errors.saturating_add(1);
        self.errors.report(location, kind);
    }
}
