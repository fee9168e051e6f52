use super::*;
use template_ast::RcDataTag;

/// Run the machine over `input` from `state`, rendering each step as
/// `Event "text"` with `!` marking steps that report an error.
fn run(state: LexState, input: &str) -> (Vec<String>, LexState) {
    let mut lexer = Lexer::new(input);
    let mut state = state;
    let mut out = Vec::new();
    while !lexer.at_end() {
        let step = advance(state, &lexer);
        assert!(
            step.len > 0 || step.next != state,
            "no progress in {state:?} at {}",
            lexer.pos()
        );
        let text = &lexer.rest()[..step.len];
        let marker = if step.error.is_some() { "!" } else { "" };
        out.push(format!("{marker}{:?} {text:?}", step.event));
        lexer.advance(step.len);
        state = step.next;
    }
    (out, state)
}

fn events(state: LexState, input: &str) -> Vec<String> {
    run(state, input).0
}

#[test]
fn open_tag_with_quoted_attribute() {
    assert_eq!(
        events(LexState::Pcdata, "<div class=\"foo\">x"),
        vec![
            "TagStart { close: false } \"<\"",
            "TagNameChar \"div\"",
            "TagNameEnd \"\"",
            "Skip \" \"",
            "AttrNameStart \"\"",
            "AttrNameChar \"c\"",
            "AttrNameChar \"l\"",
            "AttrNameChar \"a\"",
            "AttrNameChar \"s\"",
            "AttrNameChar \"s\"",
            "AttrEquals \"=\"",
            "ValueStart(Double) \"\\\"\"",
            "Text \"foo\"",
            "ValueEnd \"\\\"\"",
            "TagEnd { self_closing: false } \">\"",
            "Text \"x\"",
        ]
    );
}

#[test]
fn unquoted_value_absorbs_trailing_slash() {
    let (steps, state) = run(LexState::BeforeAttrValue, "foo/>");
    assert_eq!(
        steps,
        vec![
            "ValueStart(None) \"\"",
            "Text \"foo/\"",
            "ValueEnd \"\"",
            "TagEnd { self_closing: false } \">\"",
        ]
    );
    assert_eq!(state, LexState::Pcdata);
}

#[test]
fn self_closing_only_from_before_attribute_name() {
    assert_eq!(
        events(LexState::BeforeAttrName, " / />"),
        vec![
            "Skip \" \"",
            "Skip \"/\"",
            "Skip \" \"",
            "TagEnd { self_closing: true } \"/>\"",
        ]
    );
}

#[test]
fn illegal_tag_name_start_is_text() {
    assert_eq!(
        events(LexState::Pcdata, "<3 >"),
        vec!["!Text \"<\"", "Text \"3 >\""]
    );
    assert_eq!(
        events(LexState::Pcdata, "</ x"),
        vec!["!Text \"</\"", "Text \" x\""]
    );
}

#[test]
fn tag_start_at_end_of_text_awaits_dynamic_name() {
    let (steps, state) = run(LexState::Pcdata, "a</");
    assert_eq!(steps, vec!["Text \"a\"", "TagStart { close: true } \"</\""]);
    assert_eq!(
        state,
        LexState::TagName {
            name: NamePart::Empty
        }
    );
    let (_, state) = run(LexState::Pcdata, "<");
    assert_eq!(
        state,
        LexState::TagName {
            name: NamePart::Empty
        }
    );
}

#[test]
fn illegal_character_inside_tag_name_aborts() {
    let (steps, state) = run(LexState::Pcdata, "<di#v>");
    assert_eq!(
        steps,
        vec![
            "TagStart { close: false } \"<\"",
            "TagNameChar \"di\"",
            "!TagAbort \"\"",
            "Text \"#v>\"",
        ]
    );
    assert_eq!(state, LexState::Pcdata);
}

#[test]
fn repeated_or_trailing_separator_discards_attribute() {
    assert_eq!(
        events(LexState::BeforeAttrName, "foo-->"),
        vec![
            "AttrNameStart \"\"",
            "AttrNameChar \"f\"",
            "AttrNameChar \"o\"",
            "AttrNameChar \"o\"",
            "AttrNameChar \"-\"",
            "!Skip \"\"",
            "Skip \"-\"",
            "AttrNameEnd \"\"",
            "TagEnd { self_closing: false } \">\"",
        ]
    );
    assert_eq!(
        events(LexState::BeforeAttrName, "a- "),
        vec![
            "AttrNameStart \"\"",
            "AttrNameChar \"a\"",
            "AttrNameChar \"-\"",
            "!Skip \"\"",
            "AttrNameEnd \"\"",
            "Skip \" \"",
        ]
    );
}

#[test]
fn attribute_name_start_rules() {
    assert_eq!(
        events(LexState::BeforeAttrName, "0a>"),
        vec![
            "!AttrNameStart \"\"",
            "Skip \"0\"",
            "Skip \"a\"",
            "AttrNameEnd \"\"",
            "TagEnd { self_closing: false } \">\"",
        ]
    );
    for name in ["_src", "$src", "$src_", "data-x", "xlink:href"] {
        let steps = events(LexState::BeforeAttrName, name);
        assert!(
            steps.iter().all(|step| !step.starts_with('!')),
            "{name}: {steps:?}"
        );
    }
}

#[test]
fn dynamic_name_followed_by_name_characters() {
    let state = LexState::AttrName {
        name: NamePart::Dynamic,
        after_separator: false,
        discard: false,
    };
    assert_eq!(
        events(state, "x"),
        vec![
            "!AttrNameEnd \"\"",
            "AttrNameStart \"\"",
            "AttrNameChar \"x\""
        ]
    );
    let state = LexState::TagName {
        name: NamePart::Dynamic,
    };
    assert_eq!(events(state, ">"), vec!["TagNameEnd \"\"", "TagEnd { self_closing: false } \">\""]);
}

#[test]
fn comments() {
    let (steps, state) = run(LexState::Pcdata, "<!---->");
    assert_eq!(steps, vec!["CommentStart \"<!--\"", "CommentEnd \"-->\""]);
    assert_eq!(state, LexState::Pcdata);

    let (steps, state) = run(LexState::Pcdata, "<!--->");
    assert_eq!(steps, vec!["CommentStart \"<!--\"", "Text \"->\""]);
    assert_eq!(state, LexState::Comment);

    let (steps, state) = run(LexState::Comment, " <b> -->-->");
    assert_eq!(
        steps,
        vec!["Text \" <b> \"", "CommentEnd \"-->\"", "Text \"-->\""]
    );
    assert_eq!(state, LexState::Pcdata);
}

#[test]
fn declarations_and_cdata_are_text() {
    let (steps, state) = run(LexState::Pcdata, "<!DOCTYPE html><![CDATA[<a>]]>x");
    assert_eq!(
        steps,
        vec![
            "Text \"<!\"",
            "Text \"DOCTYPE html>\"",
            "Text \"<![CDATA[\"",
            "Text \"<a>]]>\"",
            "Text \"x\"",
        ]
    );
    assert_eq!(state, LexState::Pcdata);
    let (_, state) = run(LexState::Pcdata, "<?xml version");
    assert_eq!(state, LexState::Declaration);
}

#[test]
fn rcdata_ends_only_at_matching_close_tag() {
    let script = LexState::RcData(RcDataTag::Script);
    let (steps, state) = run(script, "a</b><</scripts></SCRIPT >");
    assert_eq!(
        steps,
        vec![
            "Text \"a</b><</scripts>\"",
            "TagStart { close: true } \"</\"",
            "TagNameChar \"SCRIPT\"",
            "TagNameEnd \"\"",
            "Skip \" \"",
            "TagEnd { self_closing: false } \">\"",
        ]
    );
    assert_eq!(state, LexState::Pcdata);

    let (steps, state) = run(script, "x</scr");
    assert_eq!(steps, vec!["Text \"x</scr\""]);
    assert_eq!(state, script);

    let (steps, state) = run(LexState::RcData(RcDataTag::Title), "<b>x</b>");
    assert_eq!(steps, vec!["Text \"<b>x</b>\""]);
    assert_eq!(state, LexState::RcData(RcDataTag::Title));
}

#[test]
fn quoted_value_ends_on_matching_quote_only() {
    let (steps, state) = run(LexState::AttrValue(Quotes::Single), "a\"b' c");
    assert_eq!(
        steps,
        vec![
            "Text \"a\\\"b\"",
            "ValueEnd \"'\"",
            "Skip \" \"",
            "AttrNameStart \"\"",
            "AttrNameChar \"c\"",
        ]
    );
    assert!(matches!(state, LexState::AttrName { .. }));
}
