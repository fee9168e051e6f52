use memchr::memchr;
use template_ast::{
    Block, Branch, BranchKind, CallParam, ContentBlock, ContentKind, ControlFlowKind,
    ControlFlowNode, IdGenerator, Node, Span, Template, TemplateFile, TemplateParam, ValueSource,
};

use crate::command::{Command, classify};
use crate::{SyntaxError, SyntaxErrorKind};

/// The command that ended a body, or `None` at end of input.
type Stop<'s> = Option<(Command<'s>, Span)>;

pub struct Parser<'s, 'i> {
    src: &'s str,
    pos: usize,
    ids: &'i mut dyn IdGenerator,
    params: Vec<TemplateParam>,
}

impl<'s, 'i> Parser<'s, 'i> {
    pub fn new(src: &'s str, ids: &'i mut dyn IdGenerator) -> Self {
        Self {
            src,
            pos: 0,
            ids,
            params: Vec::new(),
        }
    }

    pub fn parse_file(mut self) -> Result<TemplateFile, SyntaxError> {
        let mut file = TemplateFile::default();
        let src = self.src;
        loop {
            let rest = &src[self.pos..];
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();
            if trimmed.is_empty() {
                return Ok(file);
            }
            if !trimmed.starts_with('{') {
                return Err(self.error(SyntaxErrorKind::TextOutsideTemplate, self.pos));
            }
            let (command, span) = self.read_command()?;
            match command {
                Command::Namespace(name) => file.namespace = Some(name.to_string()),
                Command::Template { name, kind } => {
                    self.params.clear();
                    let (children, stop) = self.parse_body()?;
                    let end = self.expect_close(stop, "template", span.start)?;
                    file.templates.push(Template {
                        id: self.ids.next_id(),
                        location: span.union(end),
                        name: name.to_string(),
                        kind: kind.unwrap_or(ContentKind::Html),
                        params: std::mem::take(&mut self.params),
                        block: Block::new(children),
                    });
                }
                other => {
                    return Err(self.error(
                        SyntaxErrorKind::UnexpectedCommand(other.describe()),
                        span.start,
                    ));
                }
            }
        }
    }

    pub fn parse_body_as_template(
        mut self,
        name: &str,
        kind: ContentKind,
    ) -> Result<Template, SyntaxError> {
        let (children, stop) = self.parse_body()?;
        if let Some((command, span)) = stop {
            return Err(self.error(
                SyntaxErrorKind::UnexpectedCommand(command.describe()),
                span.start,
            ));
        }
        Ok(Template {
            id: self.ids.next_id(),
            location: Span::new(0, self.src.len()),
            name: name.to_string(),
            kind,
            params: std::mem::take(&mut self.params),
            block: Block::new(children),
        })
    }

    fn error(&self, kind: SyntaxErrorKind, offset: usize) -> SyntaxError {
        SyntaxError { kind, offset }
    }

    /// Read the command starting at `self.pos`, which must be `{`.
    fn read_command(&mut self) -> Result<(Command<'s>, Span), SyntaxError> {
        let src = self.src;
        let start = self.pos;
        let bytes = src.as_bytes();
        let mut quote: Option<u8> = None;
        let mut idx = start + 1;
        while idx < bytes.len() {
            let b = bytes[idx];
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None if b == b'\'' || b == b'"' => quote = Some(b),
                None if b == b'}' => break,
                None => {}
            }
            idx += 1;
        }
        if idx >= bytes.len() {
            return Err(self.error(SyntaxErrorKind::UnterminatedCommand, start));
        }
        let inner = src[start + 1..idx].trim();
        self.pos = idx + 1;
        let command = classify(inner, start)?;
        Ok((command, Span::new(start, self.pos)))
    }

    fn raw_text(&mut self, start: usize, end: usize) -> Node {
        let text = &self.src[start..end];
        Node::raw_text(self.ids.next_id(), Span::new(start, end), text)
    }

    fn parse_body(&mut self) -> Result<(Vec<Node>, Stop<'s>), SyntaxError> {
        let src = self.src;
        let mut nodes = Vec::new();
        loop {
            let rest = &src.as_bytes()[self.pos..];
            let Some(rel) = memchr(b'{', rest) else {
                if self.pos < self.src.len() {
                    nodes.push(self.raw_text(self.pos, self.src.len()));
                    self.pos = self.src.len();
                }
                return Ok((nodes, None));
            };
            if rel > 0 {
                nodes.push(self.raw_text(self.pos, self.pos + rel));
                self.pos += rel;
            }
            let (command, span) = self.read_command()?;
            if command.is_terminator() {
                return Ok((nodes, Some((command, span))));
            }
            match command {
                Command::Special(text) => {
                    if !text.is_empty() {
                        nodes.push(Node::raw_text(self.ids.next_id(), span, text));
                    }
                }
                Command::Print(expr) => nodes.push(Node::Print {
                    id: self.ids.next_id(),
                    location: span,
                    expr: expr.to_string(),
                }),
                Command::Call {
                    callee,
                    self_closing,
                } => {
                    let (params, end) = if self_closing {
                        (Vec::new(), span)
                    } else {
                        self.parse_call_params(span)?
                    };
                    nodes.push(Node::Call {
                        id: self.ids.next_id(),
                        location: span.union(end),
                        callee: callee.to_string(),
                        params,
                    });
                }
                Command::Let { var, expr, kind } => {
                    let (value, end) = match expr {
                        Some(expr) => (ValueSource::Expr(expr.to_string()), span),
                        None => {
                            let (children, stop) = self.parse_body()?;
                            let end = self.expect_close(stop, "let", span.start)?;
                            let block = Block::new(children);
                            (ValueSource::Content(ContentBlock { kind, block }), end)
                        }
                    };
                    nodes.push(Node::Let {
                        id: self.ids.next_id(),
                        location: span.union(end),
                        var: var.to_string(),
                        value,
                    });
                }
                Command::If(cond) => nodes.push(self.parse_if(cond, span)?),
                Command::Switch(expr) => nodes.push(self.parse_switch(expr, span)?),
                Command::For { var, expr } => nodes.push(self.parse_for(var, expr, span)?),
                Command::ParamDecl { name, ty } => self.params.push(TemplateParam {
                    name: name.to_string(),
                    ty: ty.to_string(),
                }),
                other => {
                    return Err(self.error(
                        SyntaxErrorKind::UnexpectedCommand(other.describe()),
                        span.start,
                    ));
                }
            }
        }
    }

    fn expect_close(
        &self,
        stop: Stop<'s>,
        name: &'static str,
        open: usize,
    ) -> Result<Span, SyntaxError> {
        match stop {
            Some((Command::Close(found), span)) if found == name => Ok(span),
            Some((command, span)) => Err(self.error(
                SyntaxErrorKind::UnexpectedCommand(command.describe()),
                span.start,
            )),
            None => Err(self.error(SyntaxErrorKind::Unclosed(name), open)),
        }
    }

    /// Text between structural commands (before the first `{case}`, between
    /// `{param}`s) may only be whitespace.
    fn expect_blank(&self, nodes: &[Node], context: &str) -> Result<(), SyntaxError> {
        for node in nodes {
            let blank = node
                .as_raw_text()
                .is_some_and(|text| text.trim().is_empty());
            if !blank {
                return Err(self.error(
                    SyntaxErrorKind::UnexpectedCommand(format!("content directly inside {context}")),
                    node.location().start,
                ));
            }
        }
        Ok(())
    }

    fn parse_call_params(&mut self, open: Span) -> Result<(Vec<CallParam>, Span), SyntaxError> {
        let mut params = Vec::new();
        loop {
            let (between, stop) = self.parse_body()?;
            self.expect_blank(&between, "{call}")?;
            match stop {
                Some((Command::Param { name, expr, kind }, span)) => {
                    let (value, end) = match expr {
                        Some(expr) => (ValueSource::Expr(expr.to_string()), span),
                        None => {
                            let (children, stop) = self.parse_body()?;
                            let end = self.expect_close(stop, "param", span.start)?;
                            let block = Block::new(children);
                            (ValueSource::Content(ContentBlock { kind, block }), end)
                        }
                    };
                    params.push(CallParam {
                        id: self.ids.next_id(),
                        location: span.union(end),
                        name: name.to_string(),
                        value,
                    });
                }
                stop => {
                    let end = self.expect_close(stop, "call", open.start)?;
                    return Ok((params, end));
                }
            }
        }
    }

    fn parse_if(&mut self, cond: &str, open: Span) -> Result<Node, SyntaxError> {
        let mut branches = Vec::new();
        let mut kind = BranchKind::Cond(cond.to_string());
        loop {
            let (children, stop) = self.parse_body()?;
            branches.push(Branch {
                id: self.ids.next_id(),
                kind: kind.clone(),
                block: Block::new(children),
            });
            let seen_else = kind == BranchKind::Default;
            match stop {
                Some((Command::ElseIf(cond), _)) if !seen_else => {
                    kind = BranchKind::Cond(cond.to_string());
                }
                Some((Command::Else, _)) if !seen_else => kind = BranchKind::Default,
                stop => {
                    let end = self.expect_close(stop, "if", open.start)?;
                    return Ok(Node::ControlFlow(ControlFlowNode {
                        id: self.ids.next_id(),
                        location: open.union(end),
                        kind: ControlFlowKind::If,
                        branches,
                    }));
                }
            }
        }
    }

    fn parse_switch(&mut self, expr: &str, open: Span) -> Result<Node, SyntaxError> {
        let (leading, mut stop) = self.parse_body()?;
        self.expect_blank(&leading, "{switch}")?;
        let mut branches = Vec::new();
        loop {
            let kind = match stop {
                Some((Command::Case(cond), _)) => BranchKind::Cond(cond.to_string()),
                Some((Command::Default, _)) => BranchKind::Default,
                stop => {
                    let end = self.expect_close(stop, "switch", open.start)?;
                    return Ok(Node::ControlFlow(ControlFlowNode {
                        id: self.ids.next_id(),
                        location: open.union(end),
                        kind: ControlFlowKind::Switch {
                            expr: expr.to_string(),
                        },
                        branches,
                    }));
                }
            };
            let (children, next) = self.parse_body()?;
            if kind == BranchKind::Default {
                if let Some((Command::Case(_) | Command::Default, span)) = &next {
                    return Err(self.error(
                        SyntaxErrorKind::UnexpectedCommand("branch after {default}".to_string()),
                        span.start,
                    ));
                }
            }
            branches.push(Branch {
                id: self.ids.next_id(),
                kind,
                block: Block::new(children),
            });
            stop = next;
        }
    }

    fn parse_for(&mut self, var: &str, expr: &str, open: Span) -> Result<Node, SyntaxError> {
        let (body, stop) = self.parse_body()?;
        let mut branches = vec![Branch {
            id: self.ids.next_id(),
            kind: BranchKind::LoopBody,
            block: Block::new(body),
        }];
        let stop = match stop {
            Some((Command::IfEmpty, _)) => {
                let (children, stop) = self.parse_body()?;
                branches.push(Branch {
                    id: self.ids.next_id(),
                    kind: BranchKind::Default,
                    block: Block::new(children),
                });
                stop
            }
            stop => stop,
        };
        let end = self.expect_close(stop, "for", open.start)?;
        Ok(Node::ControlFlow(ControlFlowNode {
            id: self.ids.next_id(),
            location: open.union(end),
            kind: ControlFlowKind::For {
                var: var.to_string(),
                expr: expr.to_string(),
            },
            branches,
        }))
    }
}
