#![no_main]
//! Arbitrary template text through the front-end and the html rewrite.
//!
//! Checked:
//! - the pass never panics, whatever the lexer states and branch shapes;
//! - rewriting the output again reports nothing new and changes nothing.

use html_rewrite::{HtmlRewritePass, RewriteError};
use libfuzzer_sys::fuzz_target;
use template_ast::shape::block_shape;
use template_ast::source::template_source;
use template_ast::{ContentKind, IncrementingIdGenerator};
use template_syntax::parse_template_body;

const KINDS: [ContentKind; 3] = [ContentKind::Html, ContentKind::Attributes, ContentKind::Text];

fuzz_target!(|data: &[u8]| {
    if data.len() > 32 * 1024 {
        return;
    }
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let kind = KINDS[usize::from(selector) % KINDS.len()];
    let src = String::from_utf8_lossy(rest);

    let mut ids = IncrementingIdGenerator::new();
    let Ok(mut template) = parse_template_body(&src, kind, &mut ids) else {
        return;
    };
    let pass = HtmlRewritePass::default();
    let mut errors: Vec<RewriteError> = Vec::new();
    pass.rewrite_template(&mut template, &mut ids, &mut errors);
    if !errors.is_empty() {
        return;
    }

    let shape = block_shape(&template.block);
    let source = template_source(&template);
    pass.rewrite_template(&mut template, &mut ids, &mut errors);
    assert!(errors.is_empty(), "second rewrite reported {errors:?}");
    assert_eq!(block_shape(&template.block), shape);
    assert_eq!(template_source(&template), source);
});
