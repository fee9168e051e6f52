//! Classification of `{...}` command text.

use template_ast::ContentKind;

use crate::{SyntaxError, SyntaxErrorKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Command<'s> {
    /// `{sp}`, `{nil}`, `{lb}`, `{rb}`, `{\n}`, `{\r}`, `{\t}`.
    Special(&'static str),
    Print(&'s str),
    Call {
        callee: &'s str,
        self_closing: bool,
    },
    Param {
        name: &'s str,
        expr: Option<&'s str>,
        kind: Option<ContentKind>,
    },
    Let {
        var: &'s str,
        expr: Option<&'s str>,
        kind: Option<ContentKind>,
    },
    If(&'s str),
    ElseIf(&'s str),
    Else,
    Switch(&'s str),
    Case(&'s str),
    Default,
    For {
        var: &'s str,
        expr: &'s str,
    },
    IfEmpty,
    Close(&'s str),
    Namespace(&'s str),
    Template {
        name: &'s str,
        kind: Option<ContentKind>,
    },
    ParamDecl {
        name: &'s str,
        ty: &'s str,
    },
}

impl Command<'_> {
    /// Commands that end the enclosing body rather than produce a node.
    pub(crate) fn is_terminator(&self) -> bool {
        matches!(
            self,
            Command::ElseIf(_)
                | Command::Else
                | Command::Case(_)
                | Command::Default
                | Command::IfEmpty
                | Command::Close(_)
                | Command::Param { .. }
                | Command::Template { .. }
                | Command::Namespace(_)
        )
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Command::Close(name) => format!("{{/{name}}}"),
            Command::ElseIf(_) => "{elseif}".to_string(),
            Command::Else => "{else}".to_string(),
            Command::Case(_) => "{case}".to_string(),
            Command::Default => "{default}".to_string(),
            Command::IfEmpty => "{ifempty}".to_string(),
            Command::Param { .. } => "{param}".to_string(),
            Command::Template { .. } => "{template}".to_string(),
            Command::Namespace(_) => "{namespace}".to_string(),
            other => format!("{other:?}"),
        }
    }
}

fn split_word(text: &str) -> (&str, &str) {
    match text.find(|c: char| c.is_ascii_whitespace()) {
        Some(idx) => (&text[..idx], text[idx..].trim()),
        None => (text, ""),
    }
}

/// Value of a `kind="..."` attribute inside command text.
fn kind_attribute(text: &str, offset: usize) -> Result<Option<ContentKind>, SyntaxError> {
    let Some(idx) = text.find("kind=") else {
        return Ok(None);
    };
    let rest = &text[idx + "kind=".len()..];
    let value = rest
        .strip_prefix('"')
        .and_then(|rest| rest.split('"').next())
        .ok_or(SyntaxError {
            kind: SyntaxErrorKind::MalformedCommand(text.to_string()),
            offset,
        })?;
    ContentKind::from_name(value).map(Some).ok_or(SyntaxError {
        kind: SyntaxErrorKind::UnknownKind(value.to_string()),
        offset,
    })
}

fn require<'s>(value: &'s str, text: &str, offset: usize) -> Result<&'s str, SyntaxError> {
    if value.is_empty() {
        return Err(SyntaxError {
            kind: SyntaxErrorKind::MalformedCommand(text.to_string()),
            offset,
        });
    }
    Ok(value)
}

/// Classify the trimmed text between `{` and `}`; `offset` locates errors.
pub(crate) fn classify(inner: &str, offset: usize) -> Result<Command<'_>, SyntaxError> {
    let (body, self_closing) = match inner.strip_suffix('/') {
        Some(body) => (body.trim_end(), true),
        None => (inner, false),
    };
    let special = match body {
        "sp" => Some(" "),
        "nil" => Some(""),
        "lb" => Some("{"),
        "rb" => Some("}"),
        "\\n" => Some("\n"),
        "\\r" => Some("\r"),
        "\\t" => Some("\t"),
        _ => None,
    };
    if let Some(text) = special {
        return Ok(Command::Special(text));
    }
    if let Some(name) = body.strip_prefix('/') {
        return Ok(Command::Close(name.trim()));
    }
    let (word, rest) = split_word(body);
    let command = match word {
        "print" => Command::Print(require(rest, inner, offset)?),
        "call" => Command::Call {
            callee: require(split_word(rest).0, inner, offset)?,
            self_closing,
        },
        "param" => {
            let (name, expr) = match rest.split_once(':') {
                Some((name, expr)) => (name.trim(), Some(require(expr.trim(), inner, offset)?)),
                None => (split_word(rest).0, None),
            };
            Command::Param {
                name: require(name, inner, offset)?,
                expr,
                kind: kind_attribute(rest, offset)?,
            }
        }
        "let" => {
            let (var, expr) = match rest.split_once(':') {
                Some((var, expr)) => (var.trim(), Some(require(expr.trim(), inner, offset)?)),
                None => (split_word(rest).0, None),
            };
            let var = var.strip_prefix('$').ok_or(SyntaxError {
                kind: SyntaxErrorKind::MalformedCommand(inner.to_string()),
                offset,
            })?;
            Command::Let {
                var,
                expr,
                kind: kind_attribute(rest, offset)?,
            }
        }
        "if" => Command::If(require(rest, inner, offset)?),
        "elseif" => Command::ElseIf(require(rest, inner, offset)?),
        "else" => Command::Else,
        "switch" => Command::Switch(require(rest, inner, offset)?),
        "case" => Command::Case(require(rest, inner, offset)?),
        "default" => Command::Default,
        "for" | "foreach" => {
            let (var, expr) = rest.split_once(" in ").ok_or(SyntaxError {
                kind: SyntaxErrorKind::MalformedCommand(inner.to_string()),
                offset,
            })?;
            let var = var.trim().strip_prefix('$').ok_or(SyntaxError {
                kind: SyntaxErrorKind::MalformedCommand(inner.to_string()),
                offset,
            })?;
            Command::For {
                var,
                expr: require(expr.trim(), inner, offset)?,
            }
        }
        "ifempty" => Command::IfEmpty,
        "namespace" => Command::Namespace(require(split_word(rest).0, inner, offset)?),
        "template" => Command::Template {
            name: require(split_word(rest).0, inner, offset)?,
            kind: kind_attribute(rest, offset)?,
        },
        "@param" | "@param?" => {
            let (name, ty) = rest.split_once(':').ok_or(SyntaxError {
                kind: SyntaxErrorKind::MalformedCommand(inner.to_string()),
                offset,
            })?;
            Command::ParamDecl {
                name: require(name.trim(), inner, offset)?,
                ty: ty.trim(),
            }
        }
        _ => Command::Print(require(body, inner, offset)?),
    };
    Ok(command)
}
