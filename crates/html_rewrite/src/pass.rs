use template_ast::{Block, ContentKind, IdGenerator, Span, Template, TemplateFile};

use crate::builder;
use crate::context::{RewriteConfig, RewriteCx, RewriteStats};
use crate::error::{BlockKind, ErrorSink};

/// The html rewrite pass.
///
/// Replaces the children of every html and attributes block with a child
/// list in which html tags, attributes, attribute values and comments are
/// structural nodes. Running it again over its own output changes nothing.
#[derive(Clone, Debug, Default)]
pub struct HtmlRewritePass {
    config: RewriteConfig,
}

impl HtmlRewritePass {
    pub fn new(config: RewriteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    pub fn rewrite_file(
        &self,
        file: &mut TemplateFile,
        ids: &mut dyn IdGenerator,
        errors: &mut dyn ErrorSink,
    ) -> RewriteStats {
        let mut stats = RewriteStats::default();
        for template in &mut file.templates {
            stats.merge(self.rewrite_template(template, ids, errors));
        }
        stats
    }

    pub fn rewrite_template(
        &self,
        template: &mut Template,
        ids: &mut dyn IdGenerator,
        errors: &mut dyn ErrorSink,
    ) -> RewriteStats {
        let stats = self.rewrite_block(
            &mut template.block,
            template.kind,
            BlockKind::Template,
            template.location,
            ids,
            errors,
        );
        log::debug!(
            target: "html_rewrite",
            "rewrote {} ({}): {:?}",
            template.name,
            template.kind.as_str(),
            stats
        );
        stats
    }

    /// Rewrite one block whose content is of `kind`. `location` is used for
    /// diagnostics about the block as a whole.
    pub fn rewrite_block(
        &self,
        block: &mut Block,
        kind: ContentKind,
        block_kind: BlockKind,
        location: Span,
        ids: &mut dyn IdGenerator,
        errors: &mut dyn ErrorSink,
    ) -> RewriteStats {
        let mut cx = RewriteCx::new(ids, errors, &self.config);
        builder::rewrite_block(&mut cx, block, kind, block_kind, location);
        cx.stats
    }
}
