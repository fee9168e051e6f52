//! Run the rewrite over template text and render the result as lines.

use html_rewrite::{HtmlRewritePass, RewriteConfig, RewriteError, RewriteStats};
use template_ast::shape::block_shape;
use template_ast::source::template_source;
use template_ast::{ContentKind, IncrementingIdGenerator, Template};
use template_syntax::parse_template_body;

use crate::escape_text;
use crate::fixture::shape_lines;

pub struct RewriteOutcome {
    pub template: Template,
    pub shape: Vec<String>,
    pub source: String,
    pub errors: Vec<RewriteError>,
    pub stats: RewriteStats,
}

impl RewriteOutcome {
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(RewriteError::message).collect()
    }

    /// Shape, source and errors as one list, for diffing.
    pub fn snapshot_lines(&self) -> Vec<String> {
        let mut lines = self.shape.clone();
        lines.push(format!("source \"{}\"", escape_text(&self.source)));
        lines.extend(
            self.errors
                .iter()
                .map(|error| format!("error {error}")),
        );
        lines
    }
}

pub fn run_pass(input: &str, kind: ContentKind) -> RewriteOutcome {
    run_pass_with(input, kind, RewriteConfig::default())
}

/// Parse `input` as a template body of `kind` and rewrite it. Parse errors
/// panic: fixtures are expected to be syntactically valid.
pub fn run_pass_with(input: &str, kind: ContentKind, config: RewriteConfig) -> RewriteOutcome {
    let mut ids = IncrementingIdGenerator::new();
    let mut template = parse_template_body(input, kind, &mut ids)
        .unwrap_or_else(|err| panic!("failed to parse {:?}: {err}", escape_text(input)));
    let mut errors: Vec<RewriteError> = Vec::new();
    let stats = HtmlRewritePass::new(config).rewrite_template(&mut template, &mut ids, &mut errors);
    outcome(template, errors, stats)
}

/// Rewrite an already rewritten template again.
pub fn rerun(previous: RewriteOutcome) -> RewriteOutcome {
    let mut template = previous.template;
    let mut ids = IncrementingIdGenerator::starting_at(1 << 20);
    let mut errors: Vec<RewriteError> = Vec::new();
    let stats = HtmlRewritePass::default().rewrite_template(&mut template, &mut ids, &mut errors);
    outcome(template, errors, stats)
}

fn outcome(template: Template, errors: Vec<RewriteError>, stats: RewriteStats) -> RewriteOutcome {
    RewriteOutcome {
        shape: shape_lines(&block_shape(&template.block)),
        source: template_source(&template),
        template,
        errors,
        stats,
    }
}
