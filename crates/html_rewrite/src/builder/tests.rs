use template_ast::shape::block_shape;
use template_ast::source::template_source;
use template_ast::traverse::walk;
use template_ast::{ContentKind, IncrementingIdGenerator, Node, Quotes, Span, Template};
use template_syntax::parse_template_body;

use crate::{HtmlRewritePass, RewriteConfig, RewriteError, RewriteStats};

fn rewrite(input: &str, kind: ContentKind, config: RewriteConfig) -> (Template, Vec<RewriteError>, RewriteStats) {
    let mut ids = IncrementingIdGenerator::new();
    let mut template = parse_template_body(input, kind, &mut ids)
        .unwrap_or_else(|err| panic!("failed to parse {input:?}: {err}"));
    let mut errors: Vec<RewriteError> = Vec::new();
    let stats = HtmlRewritePass::new(config).rewrite_template(&mut template, &mut ids, &mut errors);
    (template, errors, stats)
}

fn run_pass(input: &str) -> Template {
    let (template, errors, _) = rewrite(input, ContentKind::Html, RewriteConfig::default());
    assert!(errors.is_empty(), "unexpected errors for {input:?}: {errors:?}");
    template
}

fn error_messages(input: &str) -> Vec<String> {
    let (_, errors, _) = rewrite(input, ContentKind::Html, RewriteConfig::default());
    errors.iter().map(RewriteError::message).collect()
}

fn only_error(input: &str) -> String {
    let messages = error_messages(input);
    assert_eq!(messages.len(), 1, "expected one error for {input:?}: {messages:?}");
    messages.into_iter().next().unwrap_or_default()
}

fn ast(template: &Template) -> String {
    block_shape(&template.block)
}

fn lines(lines: &[&str]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn open_tags(template: &Template) -> Vec<(String, bool)> {
    let mut tags = Vec::new();
    walk(template.block.children(), &mut |node| {
        if let Node::HtmlOpenTag {
            tag_name,
            self_closing,
            ..
        } = node
        {
            let name = tag_name.static_name().unwrap_or("<dynamic>").to_string();
            tags.push((name, *self_closing));
        }
    });
    tags
}

fn attribute_values(template: &Template) -> Vec<(Quotes, String)> {
    let mut values = Vec::new();
    walk(template.block.children(), &mut |node| {
        if let Node::HtmlAttributeValue {
            quotes, children, ..
        } = node
        {
            let text: String = children.iter().filter_map(Node::as_raw_text).collect();
            values.push((*quotes, text));
        }
    });
    values
}

#[test]
fn tags() {
    let template = run_pass("<div></div>");
    assert_eq!(
        ast(&template),
        lines(&[
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
            "HTML_CLOSE_TAG_NODE",
            "  RAW_TEXT_NODE",
        ])
    );
    assert_eq!(template_source(&template), "<div></div>");
}

#[test]
fn attributes_with_each_quoting_style() {
    let expected = lines(&[
        "HTML_OPEN_TAG_NODE",
        "  RAW_TEXT_NODE",
        "  HTML_ATTRIBUTE_NODE",
        "    RAW_TEXT_NODE",
        "    HTML_ATTRIBUTE_VALUE_NODE",
        "      RAW_TEXT_NODE",
        "HTML_CLOSE_TAG_NODE",
        "  RAW_TEXT_NODE",
    ]);
    for (input, quotes) in [
        ("<div class=\"foo\"></div>", Quotes::Double),
        ("<div class='foo'></div>", Quotes::Single),
        ("<div class=foo></div>", Quotes::None),
    ] {
        let template = run_pass(input);
        assert_eq!(ast(&template), expected, "{input}");
        assert_eq!(attribute_values(&template), vec![(quotes, "foo".to_string())]);
        assert_eq!(template_source(&template), input);
    }
}

#[test]
fn unquoted_value_keeps_trailing_slash() {
    let template = run_pass("<input class=foo/>");
    assert_eq!(
        attribute_values(&template),
        vec![(Quotes::None, "foo/".to_string())]
    );
    assert_eq!(open_tags(&template), vec![("input".to_string(), false)]);
    assert_eq!(template_source(&template), "<input class=foo/>");
}

#[test]
fn self_closing_tags() {
    for input in ["<input/>", "<input />"] {
        let template = run_pass(input);
        assert_eq!(open_tags(&template), vec![("input".to_string(), true)]);
        assert_eq!(template_source(&template), "<input/>");
    }
    let template = run_pass("<img class=foo />");
    assert_eq!(open_tags(&template), vec![("img".to_string(), true)]);
    let template = run_pass("<img class=foo/>");
    assert_eq!(open_tags(&template), vec![("img".to_string(), false)]);
    let template = run_pass("<img class/>");
    assert_eq!(open_tags(&template), vec![("img".to_string(), true)]);
    assert_eq!(template_source(&template), "<img class/>");
}

#[test]
fn text_around_tags() {
    let template = run_pass("x x<div>content</div> <div>{sp}</div>");
    assert_eq!(
        template_source(&template),
        "x x<div>content</div> <div> </div>"
    );
    assert_eq!(
        ast(&template),
        lines(&[
            "RAW_TEXT_NODE",
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
            "RAW_TEXT_NODE",
            "HTML_CLOSE_TAG_NODE",
            "  RAW_TEXT_NODE",
            "RAW_TEXT_NODE",
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
            "RAW_TEXT_NODE",
            "HTML_CLOSE_TAG_NODE",
            "  RAW_TEXT_NODE",
        ])
    );
}

#[test]
fn dynamic_tag_name() {
    let template = run_pass("{let $t : 'div' /}<{$t}>content</{$t}>");
    assert_eq!(
        ast(&template),
        lines(&[
            "LET_VALUE_NODE",
            "HTML_OPEN_TAG_NODE",
            "  PRINT_NODE",
            "RAW_TEXT_NODE",
            "HTML_CLOSE_TAG_NODE",
            "  PRINT_NODE",
        ])
    );
    assert_eq!(
        template_source(&template),
        "{let $t : 'div' /}<{$t}>content</{$t}>"
    );
}

#[test]
fn dynamic_attribute_value() {
    let expected = lines(&[
        "HTML_OPEN_TAG_NODE",
        "  RAW_TEXT_NODE",
        "  HTML_ATTRIBUTE_NODE",
        "    RAW_TEXT_NODE",
        "    HTML_ATTRIBUTE_VALUE_NODE",
        "      PRINT_NODE",
        "HTML_CLOSE_TAG_NODE",
        "  RAW_TEXT_NODE",
    ]);
    for input in [
        "{@param t : ?}<div class={$t}></div>",
        "{@param t : ?}<div class=\"{$t}\"></div>",
        "{@param t : ?}<div class='{$t}'></div>",
    ] {
        let template = run_pass(input);
        assert_eq!(ast(&template), expected, "{input}");
    }
}

#[test]
fn dynamic_attribute() {
    let template = run_pass("{@param t : ?}<div {$t}>");
    assert_eq!(
        ast(&template),
        lines(&[
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
            "  HTML_ATTRIBUTE_NODE",
            "    PRINT_NODE",
        ])
    );
    assert_eq!(template_source(&template), "<div {$t}>");

    let template = run_pass("{@param t : ?}<div {$t}=x>");
    assert_eq!(
        ast(&template),
        lines(&[
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
            "  HTML_ATTRIBUTE_NODE",
            "    PRINT_NODE",
            "    HTML_ATTRIBUTE_VALUE_NODE",
            "      RAW_TEXT_NODE",
        ])
    );

    let template = run_pass("{@param t : ?}<div {$t}={$t}>");
    assert_eq!(
        ast(&template),
        lines(&[
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
            "  HTML_ATTRIBUTE_NODE",
            "    PRINT_NODE",
            "    HTML_ATTRIBUTE_VALUE_NODE",
            "      PRINT_NODE",
        ])
    );
    assert_eq!(template_source(&template), "<div {$t}={$t}>");

    let template = run_pass("<div {call .name /}=x>content</div>");
    assert_eq!(
        ast(&template),
        lines(&[
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
            "  HTML_ATTRIBUTE_NODE",
            "    CALL_BASIC_NODE",
            "    HTML_ATTRIBUTE_VALUE_NODE",
            "      RAW_TEXT_NODE",
            "RAW_TEXT_NODE",
            "HTML_CLOSE_TAG_NODE",
            "  RAW_TEXT_NODE",
        ])
    );
}

#[test]
fn conditional_attribute() {
    let template = run_pass("{@param t : ?}<div {if $t}foo{else}bar{/if}>");
    assert_eq!(template_source(&template), "<div{if $t} foo{else} bar{/if}>");
    assert_eq!(
        ast(&template),
        lines(&[
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
            "  IF_NODE",
            "    IF_COND_NODE",
            "      HTML_ATTRIBUTE_NODE",
            "        RAW_TEXT_NODE",
            "    IF_ELSE_NODE",
            "      HTML_ATTRIBUTE_NODE",
            "        RAW_TEXT_NODE",
        ])
    );
}

#[test]
fn conditional_attribute_value() {
    let template = run_pass("{@param t : ?}<div class=\"{if $t}foo{else}bar{/if}\">content</div>");
    assert_eq!(
        ast(&template),
        lines(&[
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
            "  HTML_ATTRIBUTE_NODE",
            "    RAW_TEXT_NODE",
            "    HTML_ATTRIBUTE_VALUE_NODE",
            "      IF_NODE",
            "        IF_COND_NODE",
            "          RAW_TEXT_NODE",
            "        IF_ELSE_NODE",
            "          RAW_TEXT_NODE",
            "RAW_TEXT_NODE",
            "HTML_CLOSE_TAG_NODE",
            "  RAW_TEXT_NODE",
        ])
    );
}

#[test]
fn conditional_context_merging() {
    let template = run_pass("{@param p : ?}<div {if $p}foo=bar{else}baz{/if}>");
    assert_eq!(template_source(&template), "<div{if $p} foo=bar{else} baz{/if}>");
    assert_eq!(
        ast(&template),
        lines(&[
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
            "  IF_NODE",
            "    IF_COND_NODE",
            "      HTML_ATTRIBUTE_NODE",
            "        RAW_TEXT_NODE",
            "        HTML_ATTRIBUTE_VALUE_NODE",
            "          RAW_TEXT_NODE",
            "    IF_ELSE_NODE",
            "      HTML_ATTRIBUTE_NODE",
            "        RAW_TEXT_NODE",
        ])
    );
    let template = run_pass("{@param p : ?}<div {if $p}class=x{else}style=\"baz\"{/if}>");
    assert_eq!(
        template_source(&template),
        "<div{if $p} class=x{else} style=\"baz\"{/if}>"
    );
    let template = run_pass("{@param p : ?}<div {if $p}class='x'{else}style=\"baz\"{/if}>");
    assert_eq!(
        template_source(&template),
        "<div{if $p} class='x'{else} style=\"baz\"{/if}>"
    );
}

#[test]
fn conditional_quoted_attribute_values() {
    let template = run_pass("{@param p : ?}<div x={if $p}'foo'{else}'bar'{/if} {$p}>");
    assert_eq!(
        template_source(&template),
        "<div x={if $p}'foo'{else}'bar'{/if} {$p}>"
    );
    assert_eq!(
        ast(&template),
        lines(&[
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
            "  HTML_ATTRIBUTE_NODE",
            "    RAW_TEXT_NODE",
            "    IF_NODE",
            "      IF_COND_NODE",
            "        HTML_ATTRIBUTE_VALUE_NODE",
            "          RAW_TEXT_NODE",
            "      IF_ELSE_NODE",
            "        HTML_ATTRIBUTE_VALUE_NODE",
            "          RAW_TEXT_NODE",
            "  HTML_ATTRIBUTE_NODE",
            "    PRINT_NODE",
        ])
    );

    let template = run_pass(
        "{@param p : ?}{@param p2 : ?}<div x={if $p}{if $p2}'foo'{else}'bar'{/if}\
         {else}{if $p2}'foo'{else}'bar'{/if}{/if} {$p}>",
    );
    assert_eq!(
        template_source(&template),
        "<div x={if $p}{if $p2}'foo'{else}'bar'{/if}{else}{if $p2}'foo'{else}'bar'{/if}{/if} {$p}>"
    );
    assert_eq!(
        ast(&template),
        lines(&[
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
            "  HTML_ATTRIBUTE_NODE",
            "    RAW_TEXT_NODE",
            "    IF_NODE",
            "      IF_COND_NODE",
            "        IF_NODE",
            "          IF_COND_NODE",
            "            HTML_ATTRIBUTE_VALUE_NODE",
            "              RAW_TEXT_NODE",
            "          IF_ELSE_NODE",
            "            HTML_ATTRIBUTE_VALUE_NODE",
            "              RAW_TEXT_NODE",
            "      IF_ELSE_NODE",
            "        IF_NODE",
            "          IF_COND_NODE",
            "            HTML_ATTRIBUTE_VALUE_NODE",
            "              RAW_TEXT_NODE",
            "          IF_ELSE_NODE",
            "            HTML_ATTRIBUTE_VALUE_NODE",
            "              RAW_TEXT_NODE",
            "  HTML_ATTRIBUTE_NODE",
            "    PRINT_NODE",
        ])
    );
}

#[test]
fn conditional_unquoted_attribute_value() {
    let template = run_pass("{@param p : ?}<div class={if $p}x{else}y{/if}>");
    assert_eq!(template_source(&template), "<div class={if $p}x{else}y{/if}>");
}

#[test]
fn unmatched_context_changing_close_tags() {
    run_pass("<script>xxx</script>");
    run_pass("</div>");
    for tag in ["</script>", "</style>", "</title>", "</textarea>", "</xmp>"] {
        assert_eq!(
            only_error(tag),
            "Unexpected close tag for context-changing tag.",
            "error message for: {tag}"
        );
    }
}

#[test]
fn rcdata_content_is_preserved() {
    let template = run_pass("<script>xxx</script>");
    assert_eq!(template_source(&template), "<script>xxx</script>");

    let template = run_pass("<script>a < b && \"</div>\"</SCRIPT>");
    assert_eq!(
        ast(&template),
        lines(&[
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
            "RAW_TEXT_NODE",
            "HTML_CLOSE_TAG_NODE",
            "  RAW_TEXT_NODE",
        ])
    );

    let template = run_pass("{@param x : ?}<textarea>{$x}<b></textarea><b>");
    assert_eq!(
        ast(&template),
        lines(&[
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
            "PRINT_NODE",
            "RAW_TEXT_NODE",
            "HTML_CLOSE_TAG_NODE",
            "  RAW_TEXT_NODE",
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
        ])
    );
}

#[test]
fn bad_tag_name() {
    assert_eq!(only_error("<3 >"), "Illegal tag name character.");
    let template = rewrite("<3 >", ContentKind::Html, RewriteConfig::default()).0;
    assert_eq!(ast(&template), lines(&["RAW_TEXT_NODE"]));
}

#[test]
fn bad_attribute_name() {
    assert_eq!(only_error("<div foo-->"), "Illegal attribute name character.");
    assert_eq!(only_error("<div 0a>"), "Illegal attribute name character.");
    let (template, _, _) = rewrite("<div foo-->", ContentKind::Html, RewriteConfig::default());
    assert_eq!(ast(&template), lines(&["HTML_OPEN_TAG_NODE", "  RAW_TEXT_NODE"]));
    assert_eq!(template_source(&template), "<div>");
    run_pass("<div _src='foo'>");
    run_pass("<div $src='foo'>");
    run_pass("<div $src_='foo'>");
}

#[test]
fn illegal_attribute_is_dropped_and_siblings_survive() {
    let (template, errors, _) = rewrite(
        "<div a=1 0b c=2>",
        ContentKind::Html,
        RewriteConfig::default(),
    );
    assert_eq!(errors.len(), 1);
    assert_eq!(template_source(&template), "<div a=1 c=2>");
}

#[test]
fn illegal_character_inside_a_name_drops_the_attribute() {
    for input in [
        "<div a=1 foo-- c=2>",
        "<div a=1 foo- c=2>",
        "<div a=1 fo%o c=2>",
        "<div a=1 fo%o=3 c=2>",
    ] {
        let (template, errors, _) = rewrite(input, ContentKind::Html, RewriteConfig::default());
        let messages: Vec<String> = errors.iter().map(RewriteError::message).collect();
        assert_eq!(messages, vec!["Illegal attribute name character."], "{input}");
        assert_eq!(template_source(&template), "<div a=1 c=2>", "{input}");
        assert_eq!(attribute_values(&template).len(), 2, "{input}");
    }
}

#[test]
fn html_comment_with_only_raw_text() {
    let template = run_pass("<!--foo-->");
    assert_eq!(ast(&template), lines(&["HTML_COMMENT_NODE", "  RAW_TEXT_NODE"]));
    assert_eq!(template_source(&template), "<!--foo-->");

    let template = run_pass("<!---->");
    assert_eq!(ast(&template), lines(&["HTML_COMMENT_NODE"]));
    assert_eq!(template_source(&template), "<!---->");

    let template = run_pass("<!-- foo -->");
    assert_eq!(ast(&template), lines(&["HTML_COMMENT_NODE", "  RAW_TEXT_NODE"]));
    assert_eq!(template_source(&template), "<!-- foo -->");

    let template = run_pass("<!-- <script>alert(\"Hi\");</script> -->");
    assert_eq!(ast(&template), lines(&["HTML_COMMENT_NODE", "  RAW_TEXT_NODE"]));
    assert_eq!(
        template_source(&template),
        "<!-- <script>alert(\"Hi\");</script> -->"
    );

    let template = run_pass("-->");
    assert_eq!(ast(&template), lines(&["RAW_TEXT_NODE"]));
    assert_eq!(template_source(&template), "-->");
}

#[test]
fn html_comment_with_print_node() {
    let template = run_pass("{@param foo : ?}<!--{$foo}-->");
    assert_eq!(ast(&template), lines(&["HTML_COMMENT_NODE", "  PRINT_NODE"]));
    assert_eq!(template_source(&template), "<!--{$foo}-->");

    let template = run_pass("{@param foo : ?}{@param bar : ?}<!--{$foo}hello{$bar}-->");
    assert_eq!(
        ast(&template),
        lines(&[
            "HTML_COMMENT_NODE",
            "  PRINT_NODE",
            "  RAW_TEXT_NODE",
            "  PRINT_NODE",
        ])
    );
    assert_eq!(template_source(&template), "<!--{$foo}hello{$bar}-->");
}

#[test]
fn html_comment_with_control_flow() {
    let template = run_pass("{@param foo : ?}<!-- {if $foo} foo {else} bar {/if} -->");
    assert_eq!(
        ast(&template),
        lines(&[
            "HTML_COMMENT_NODE",
            "  RAW_TEXT_NODE",
            "  IF_NODE",
            "    IF_COND_NODE",
            "      RAW_TEXT_NODE",
            "    IF_ELSE_NODE",
            "      RAW_TEXT_NODE",
            "  RAW_TEXT_NODE",
        ])
    );
    assert_eq!(
        template_source(&template),
        "<!-- {if $foo} foo {else} bar {/if} -->"
    );
}

#[test]
fn unterminated_html_comment() {
    for text in ["<!--", "<!-- --", "<!--->"] {
        assert_eq!(
            only_error(text),
            "template changes context from 'pcdata' to 'html comment'. \
             Did you forget to close the html comment?",
            "error message for: {text}"
        );
    }
}

#[test]
fn declarations_and_cdata_stay_text() {
    let template = run_pass("<!DOCTYPE html><p>x<![CDATA[<a>]]>");
    assert_eq!(
        ast(&template),
        lines(&[
            "RAW_TEXT_NODE",
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
            "RAW_TEXT_NODE",
        ])
    );
    assert_eq!(
        only_error("<![CDATA[x"),
        "template changes context from 'pcdata' to 'cdata'. Did you forget to close the cdata?"
    );
}

#[test]
fn unterminated_rcdata_is_an_error() {
    assert_eq!(
        only_error("<script>x"),
        "template changes context from 'pcdata' to 'script'. Did you forget to close the script?"
    );
}

#[test]
fn switch_merges_like_if() {
    let template =
        run_pass("{@param x : ?}<div {switch $x}{case 1}a{case 2}b=c{default}d='e'{/switch}>");
    assert_eq!(
        template_source(&template),
        "<div{switch $x}{case 1} a{case 2} b=c{default} d='e'{/switch}>"
    );
    assert_eq!(
        ast(&template),
        lines(&[
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
            "  SWITCH_NODE",
            "    SWITCH_CASE_NODE",
            "      HTML_ATTRIBUTE_NODE",
            "        RAW_TEXT_NODE",
            "    SWITCH_CASE_NODE",
            "      HTML_ATTRIBUTE_NODE",
            "        RAW_TEXT_NODE",
            "        HTML_ATTRIBUTE_VALUE_NODE",
            "          RAW_TEXT_NODE",
            "    SWITCH_DEFAULT_NODE",
            "      HTML_ATTRIBUTE_NODE",
            "        RAW_TEXT_NODE",
            "        HTML_ATTRIBUTE_VALUE_NODE",
            "          RAW_TEXT_NODE",
        ])
    );
}

#[test]
fn loop_body_keeps_its_context() {
    let template = run_pass("{@param xs : ?}<ul>{for $x in $xs}<li>{$x}</li>{ifempty}<li>none</li>{/for}</ul>");
    assert_eq!(
        template_source(&template),
        "<ul>{for $x in $xs}<li>{$x}</li>{ifempty}<li>none</li>{/for}</ul>"
    );
    assert_eq!(
        only_error("{@param xs : ?}{for $x in $xs}<script>{/for}"),
        "{for} loop body changes context from 'pcdata' to 'script'. \
         A loop body must end in the context it starts in."
    );
}

#[test]
fn branches_ending_in_different_contexts() {
    assert_eq!(
        only_error("{@param p : ?}{if $p}<script>{/if}</script>"),
        "The branches of this {if} end in different contexts ('script' and 'pcdata'). \
         Every branch must end in the same context."
    );
}

#[test]
fn branch_must_close_what_it_opens() {
    assert_eq!(
        only_error("{@param p : ?}{if $p}<div{/if}"),
        "Expected the html tag to be closed before the end of this branch."
    );
    assert_eq!(
        only_error("{@param p : ?}<div {if $p}class=\"x{/if}>"),
        "Expected the attribute value to be closed before the end of this branch."
    );
}

#[test]
fn branch_closing_construct_opened_outside() {
    let messages = error_messages("{@param p : ?}<div {if $p}>{else}>{/if}");
    assert_eq!(
        messages,
        vec![
            "Found the end of an html tag that was started in another block.".to_string(),
            "Found the end of an html tag that was started in another block.".to_string(),
        ]
    );
}

#[test]
fn statement_diagnostics() {
    assert_eq!(
        only_error("{@param p : ?}<div{$p}>"),
        "Expected whitespace, '=', '/' or '>' after an html tag or attribute name."
    );
    assert_eq!(
        only_error("{@param p : ?}<{if $p}div{/if}>"),
        "Control flow is not allowed in html tag names."
    );
    assert_eq!(
        only_error("<{let $x : 1 /}div>"),
        "Expected an html tag name."
    );
    assert_eq!(
        only_error("<div x={if $p}'a' b{else}'c'{/if}>"),
        "A branch that produces an attribute value cannot contain anything after the value."
    );
}

#[test]
fn close_tag_attributes_are_reported_once() {
    let (template, errors, _) = rewrite(
        "</div class=\"x\" id=y>",
        ContentKind::Html,
        RewriteConfig::default(),
    );
    let messages: Vec<String> = errors.iter().map(RewriteError::message).collect();
    assert_eq!(messages, vec!["Html close tags cannot have attributes."]);
    assert_eq!(template_source(&template), "</div>");
}

#[test]
fn control_flow_depth_limit_keeps_node_unrewritten() {
    let config = RewriteConfig {
        max_control_flow_depth: 1,
        ..RewriteConfig::default()
    };
    let (template, errors, _) = rewrite(
        "{@param a : ?}{@param b : ?}{if $a}{if $b}<div>{/if}{/if}",
        ContentKind::Html,
        config,
    );
    let messages: Vec<String> = errors.iter().map(RewriteError::message).collect();
    assert_eq!(
        messages,
        vec!["Control flow is nested more than 1 levels deep inside html."]
    );
    assert_eq!(
        ast(&template),
        lines(&[
            "IF_NODE",
            "  IF_COND_NODE",
            "    IF_NODE",
            "      IF_COND_NODE",
            "        RAW_TEXT_NODE",
        ])
    );
}

#[test]
fn content_blocks_are_rewritten_by_kind() {
    let template = run_pass("{let $a kind=\"html\"}<b>x</b>{/let}{let $t kind=\"text\"}<b>{/let}");
    assert_eq!(
        ast(&template),
        lines(&[
            "LET_CONTENT_NODE",
            "  HTML_OPEN_TAG_NODE",
            "    RAW_TEXT_NODE",
            "  RAW_TEXT_NODE",
            "  HTML_CLOSE_TAG_NODE",
            "    RAW_TEXT_NODE",
            "LET_CONTENT_NODE",
            "  RAW_TEXT_NODE",
        ])
    );

    let template = run_pass("{let $attrs kind=\"attributes\"}class=\"x\" id=y{/let}<div {$attrs}>");
    assert_eq!(
        ast(&template),
        lines(&[
            "LET_CONTENT_NODE",
            "  HTML_ATTRIBUTE_NODE",
            "    RAW_TEXT_NODE",
            "    HTML_ATTRIBUTE_VALUE_NODE",
            "      RAW_TEXT_NODE",
            "  HTML_ATTRIBUTE_NODE",
            "    RAW_TEXT_NODE",
            "    HTML_ATTRIBUTE_VALUE_NODE",
            "      RAW_TEXT_NODE",
            "HTML_OPEN_TAG_NODE",
            "  RAW_TEXT_NODE",
            "  HTML_ATTRIBUTE_NODE",
            "    PRINT_NODE",
        ])
    );
    assert_eq!(
        template_source(&template),
        "{let $attrs kind=\"attributes\"}class=\"x\" id=y{/let}<div {$attrs}>"
    );

    let template = run_pass("{call .foo}{param p kind=\"html\"}<i>x</i>{/param}{/call}");
    assert_eq!(
        ast(&template),
        lines(&[
            "CALL_BASIC_NODE",
            "  CALL_PARAM_CONTENT_NODE",
            "    HTML_OPEN_TAG_NODE",
            "      RAW_TEXT_NODE",
            "    RAW_TEXT_NODE",
            "    HTML_CLOSE_TAG_NODE",
            "      RAW_TEXT_NODE",
        ])
    );
}

#[test]
fn content_block_end_is_checked_separately() {
    assert_eq!(
        only_error("{let $a kind=\"html\"}<script>{/let}"),
        "let content changes context from 'pcdata' to 'script'. Did you forget to close the script?"
    );
    assert_eq!(
        only_error("{call .foo}{param p kind=\"html\"}<!--{/param}{/call}"),
        "param content changes context from 'pcdata' to 'html comment'. \
         Did you forget to close the html comment?"
    );
}

#[test]
fn text_templates_only_rewrite_nested_html() {
    let (template, errors, _) = rewrite(
        "<b>{let $a kind=\"html\"}<i>{/let}",
        ContentKind::Text,
        RewriteConfig::default(),
    );
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(
        ast(&template),
        lines(&[
            "RAW_TEXT_NODE",
            "LET_CONTENT_NODE",
            "  HTML_OPEN_TAG_NODE",
            "    RAW_TEXT_NODE",
        ])
    );
}

#[test]
fn constructs_may_straddle_text_nodes_when_coalescing() {
    let input = "<!--x-{nil}->";
    let (template, errors, _) = rewrite(input, ContentKind::Html, RewriteConfig::default());
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(ast(&template), lines(&["HTML_COMMENT_NODE", "  RAW_TEXT_NODE"]));

    let config = RewriteConfig {
        coalesce_text: false,
        ..RewriteConfig::default()
    };
    let (_, errors, _) = rewrite(input, ContentKind::Html, config);
    assert_eq!(errors.len(), 1, "{errors:?}");
}

#[test]
fn rewriting_twice_changes_nothing() {
    for input in [
        "<div class=\"foo\" hidden>text<br/></div>",
        "{@param p : ?}<div {if $p}foo=bar{else}baz{/if}>",
        "{@param p : ?}<div x={if $p}'foo'{else}'bar'{/if} {$p}>",
        "<script>a < b</script><!-- c -->",
        "{let $attrs kind=\"attributes\"}class=\"x\"{/let}",
    ] {
        let mut template = run_pass(input);
        let shape = ast(&template);
        let source = template_source(&template);
        let mut ids = IncrementingIdGenerator::starting_at(10_000);
        let mut errors: Vec<RewriteError> = Vec::new();
        HtmlRewritePass::default().rewrite_template(&mut template, &mut ids, &mut errors);
        assert!(errors.is_empty(), "{input}: {errors:?}");
        assert_eq!(ast(&template), shape, "{input}");
        assert_eq!(template_source(&template), source, "{input}");
    }
}

#[test]
fn locations_cover_source_text() {
    let template = run_pass("<div class=\"a\">");
    let Some(Node::HtmlOpenTag {
        location, children, ..
    }) = template.block.children().first()
    else {
        panic!("expected an open tag");
    };
    assert_eq!(*location, Span::new(0, 15));
    let Some(Node::HtmlAttribute {
        location, value, ..
    }) = children.first()
    else {
        panic!("expected an attribute");
    };
    assert_eq!(*location, Span::new(5, 14));
    assert_eq!(value.as_ref().map(|value| value.location()), Some(Span::new(11, 14)));
}

#[test]
fn stats_count_structural_nodes() {
    let (_, errors, stats) = rewrite(
        "{@param p : ?}<div class=\"a\">{if $p}x{/if}</div>",
        ContentKind::Html,
        RewriteConfig::default(),
    );
    assert!(errors.is_empty());
    assert_eq!(stats.blocks, 1);
    assert_eq!(stats.branches, 1);
    assert_eq!(stats.structural_nodes, 4);
    assert_eq!(stats.errors, 0);
    assert!(stats.state_transitions > 0);
}
