//! Tree builder: one left-to-right pass over a block's children.
//!
//! Raw text is lexed with the state machine; its events open and close
//! structural nodes. Print, call and statement nodes are placed according to
//! the current state: as content, as a dynamic tag or attribute name, as an
//! attribute value, or among a tag's attributes. Control flow is handed to
//! the merger, which rebuilds each branch with a child builder.
//!
//! Invariants:
//! - At most one tag, attribute, attribute value and comment is under
//!   construction at a time, and only in the states that build them.
//! - Adjacent text emitted into the same container is joined into one node.
//! - The lexer loop makes progress on every step: it consumes input or
//!   changes state.

use template_ast::{
    Block, ContentBlock, ContentKind, ControlFlowNode, Node, NodeId, Quotes, RcDataTag, Span,
    TagName, ValueSource,
};

use crate::context::RewriteCx;
use crate::error::{BlockKind, Construct, ErrorKind};
use crate::lexer::{Lexer, RawSpan};
use crate::machine::{self, Event, LexError, Step};
use crate::merge;
use crate::state::{LexState, NamePart};

struct PendingTag {
    close: bool,
    /// Offset of the `<`.
    start: usize,
    name_text: String,
    name_location: Span,
    name: Option<Node>,
    /// Attributes and the statements placed among them.
    children: Vec<Node>,
    /// Element whose body this close tag ends.
    rcdata: Option<RcDataTag>,
    reported_attributes: bool,
}

struct PendingAttr {
    start: usize,
    name_text: String,
    name_location: Span,
    name: Option<Node>,
    discard: bool,
}

struct PendingValue {
    quotes: Quotes,
    start: usize,
    children: Vec<Node>,
}

struct PendingComment {
    start: usize,
    children: Vec<Node>,
}

pub(crate) struct Builder<'c, 'a> {
    cx: &'c mut RewriteCx<'a>,
    entry: LexState,
    state: LexState,
    in_branch: bool,
    out: Vec<Node>,
    tag: Option<PendingTag>,
    attr: Option<PendingAttr>,
    value: Option<PendingValue>,
    comment: Option<PendingComment>,
    /// A branch entered before an attribute value has produced that value.
    slot_filled: bool,
    raw_context_start: Option<usize>,
    /// Source offset reached so far.
    last_offset: usize,
}

impl<'c, 'a> Builder<'c, 'a> {
    pub(crate) fn new(cx: &'c mut RewriteCx<'a>, entry: LexState, in_branch: bool, at: usize) -> Self {
        Self {
            cx,
            entry,
            state: entry,
            in_branch,
            out: Vec::new(),
            tag: None,
            attr: None,
            value: None,
            comment: None,
            slot_filled: false,
            raw_context_start: entry.is_raw_context().then_some(at),
            last_offset: at,
        }
    }

    /// Process `nodes` in order.
    pub(crate) fn feed(&mut self, nodes: Vec<Node>) {
        let mut pending: Option<RawSpan> = None;
        for node in nodes {
            match node {
                Node::RawText { location, text, .. } => match pending.as_mut() {
                    Some(span) if self.cx.config.coalesce_text => span.push(&text, location),
                    _ => {
                        if let Some(span) = pending.take() {
                            self.feed_text(&span);
                        }
                        pending = Some(RawSpan::new(text, location));
                    }
                },
                other => {
                    if let Some(span) = pending.take() {
                        self.feed_text(&span);
                    }
                    self.feed_node(other);
                }
            }
        }
        if let Some(span) = pending.take() {
            self.feed_text(&span);
        }
    }

    /// End of a template or content block. Only an unterminated raw context
    /// is an error here; open tags and attributes are closed silently.
    pub(crate) fn finish_block(mut self, block: BlockKind) -> Vec<Node> {
        if self.state != self.entry && self.state.is_raw_context() {
            let start = self.raw_context_start.unwrap_or(self.last_offset);
            let location = Span::new(start, self.last_offset.max(start));
            self.cx.report(
                location,
                ErrorKind::BlockChangesContext {
                    block,
                    from: self.entry.context_name(),
                    to: self.state.context_name(),
                },
            );
        }
        self.close_pending();
        self.out
    }

    /// End of a control-flow branch: anything the branch opened must be
    /// closed by it.
    pub(crate) fn finish_branch(mut self) -> (Vec<Node>, LexState) {
        self.close_pending();
        (self.out, self.state)
    }

    fn transition_to(&mut self, next: LexState, at: usize) {
        if self.state == next {
            return;
        }
        #[cfg(any(test, feature = "debug-stats"))]
        {
            log::trace!(
                target: "html_rewrite.lexer",
                "state {:?} -> {:?} @{}",
                self.state,
                next,
                at
            );
        }
        if next.is_raw_context() && !self.state.is_raw_context() {
            self.raw_context_start = Some(at);
        }
        self.state = next;
        self.cx.stats.state_transitions = self.cx.stats.state_transitions.saturating_add(1);
    }

    fn report(&mut self, location: Span, kind: ErrorKind) {
        self.cx.report(location, kind);
    }

    fn structural_id(&mut self) -> NodeId {
        self.cx.stats.structural_nodes = self.cx.stats.structural_nodes.saturating_add(1);
        self.cx.next_id()
    }

    /// Where content of the current state goes.
    fn content_container(&mut self) -> &mut Vec<Node> {
        match (self.state, self.value.as_mut(), self.comment.as_mut()) {
            (LexState::AttrValue(_), Some(value), _) => &mut value.children,
            (LexState::Comment, _, Some(comment)) => &mut comment.children,
            _ => &mut self.out,
        }
    }

    /// Where attributes and the statements among them go.
    fn attribute_container(&mut self) -> &mut Vec<Node> {
        match self.tag.as_mut() {
            Some(tag) => &mut tag.children,
            None => &mut self.out,
        }
    }

    fn push_text(&mut self, text: &str, location: Span) {
        if let Some(Node::RawText {
            text: last,
            location: last_location,
            ..
        }) = self.content_container().last_mut()
        {
            last.push_str(text);
            *last_location = last_location.union(location);
            return;
        }
        let id = self.cx.next_id();
        self.content_container()
            .push(Node::raw_text(id, location, text));
    }

    fn feed_text(&mut self, span: &RawSpan) {
        self.cx.stats.raw_text_spans = self.cx.stats.raw_text_spans.saturating_add(1);
        let mut lexer = Lexer::new(span.text());
        let mut run: Option<usize> = None;
        while !lexer.at_end() {
            let pos = lexer.pos();
            let before = self.state;
            let step = machine::advance(self.state, &lexer);
            if let Some(error) = step.error {
                let location = span.location(pos, pos + step.len.max(lexer.char_len()));
                self.lex_error(error, location);
            }
            if step.event == Event::Text {
                run.get_or_insert(pos);
                lexer.advance(step.len);
                self.transition_to(step.next, span.locate(pos));
                continue;
            }
            if let Some(start) = run.take() {
                self.push_text(&span.text()[start..pos], span.location(start, pos));
            }
            let consumed = self.apply(step, span, pos);
            assert!(
                consumed > 0 || self.state != before,
                "html lexer made no progress: state={before:?} pos={pos}"
            );
            lexer.advance(consumed);
        }
        if let Some(start) = run.take() {
            let end = lexer.pos();
            self.push_text(&span.text()[start..end], span.location(start, end));
        }
        self.last_offset = span.locate_end(span.text().len());
    }

    fn lex_error(&mut self, error: LexError, location: Span) {
        let kind = match error {
            LexError::IllegalTagName => ErrorKind::IllegalTagNameCharacter,
            LexError::IllegalAttributeName => ErrorKind::IllegalAttributeNameCharacter,
            LexError::ExpectedWhitespace => ErrorKind::ExpectedWhitespaceAfterName,
        };
        self.report(location, kind);
    }

    /// Apply a structural event; returns the number of bytes consumed.
    fn apply(&mut self, step: Step, span: &RawSpan, pos: usize) -> usize {
        let at = span.locate(pos);
        let end = span.locate_end(pos + step.len).max(at);
        let piece = &span.text()[pos..pos + step.len];
        match step.event {
            Event::Text => self.push_text(piece, Span::new(at, end)),
            Event::Skip => {
                // An illegal character part way through a name drops the
                // whole attribute.
                let aborts_name = matches!(step.next, LexState::AttrName { discard: true, .. })
                    && !matches!(self.state, LexState::AttrName { discard: true, .. });
                if aborts_name {
                    if let Some(attr) = self.attr.as_mut() {
                        attr.discard = true;
                    }
                }
            }
            Event::TagStart { close } => {
                let rcdata = match self.state {
                    LexState::RcData(tag) => Some(tag),
                    _ => None,
                };
                self.tag = Some(PendingTag {
                    close,
                    start: at,
                    name_text: String::new(),
                    name_location: Span::new(end, end),
                    name: None,
                    children: Vec::new(),
                    rcdata,
                    reported_attributes: false,
                });
            }
            Event::TagNameChar => {
                if let Some(tag) = self.tag.as_mut() {
                    if tag.name_text.is_empty() {
                        tag.name_location = Span::new(at, end);
                    } else {
                        tag.name_location = tag.name_location.union(Span::new(at, end));
                    }
                    tag.name_text.push_str(piece);
                }
            }
            Event::TagNameEnd => self.finish_tag_name(),
            Event::TagAbort => {
                self.abort_tag();
                return step.len;
            }
            Event::TagEnd { self_closing } => {
                if self.tag.is_none() {
                    let construct = Construct::Tag;
                    self.report(Span::new(at, end), ErrorKind::ClosedInOtherBlock { construct });
                    return step.len;
                }
                self.complete_tag(self_closing, end, true);
                return step.len;
            }
            Event::AttrNameStart => {
                let forced = matches!(step.next, LexState::AttrName { discard: true, .. });
                let discard = self.begin_attribute(Span::new(at, at), None, forced);
                let next = LexState::AttrName {
                    name: NamePart::Empty,
                    after_separator: false,
                    discard,
                };
                self.transition_to(next, at);
                return step.len;
            }
            Event::AttrNameChar => {
                if let Some(attr) = self.attr.as_mut().filter(|attr| !attr.discard) {
                    if attr.name_text.is_empty() {
                        attr.name_location = Span::new(at, end);
                    } else {
                        attr.name_location = attr.name_location.union(Span::new(at, end));
                    }
                    attr.name_text.push_str(piece);
                }
            }
            Event::AttrNameEnd => {
                self.complete_attr(at);
                return step.len;
            }
            Event::AttrEquals => self.finish_attr_name(),
            Event::ValueStart(quotes) => {
                self.value = Some(PendingValue {
                    quotes,
                    start: at,
                    children: Vec::new(),
                });
            }
            Event::ValueEnd => {
                if self.value.is_some() {
                    self.complete_value(end);
                    return step.len;
                }
                let construct = Construct::AttributeValue;
                self.report(Span::new(at, end), ErrorKind::ClosedInOtherBlock { construct });
                if step.len > 0 {
                    // The quote stays part of the value text.
                    self.push_text(piece, Span::new(at, end));
                    return step.len;
                }
            }
            Event::CommentStart => {
                self.comment = Some(PendingComment {
                    start: at,
                    children: Vec::new(),
                });
            }
            Event::CommentEnd => match self.comment.take() {
                Some(comment) => {
                    let id = self.structural_id();
                    self.out.push(Node::HtmlComment {
                        id,
                        location: Span::new(comment.start, end.max(comment.start)),
                        children: comment.children,
                    });
                }
                None => {
                    let construct = Construct::Comment;
                    self.report(Span::new(at, end), ErrorKind::ClosedInOtherBlock { construct });
                    self.push_text(piece, Span::new(at, end));
                    return step.len;
                }
            },
        }
        self.transition_to(step.next, at);
        step.len
    }

    fn finish_tag_name(&mut self) {
        let ready = matches!(&self.tag, Some(tag) if tag.name.is_none() && !tag.name_text.is_empty());
        if !ready {
            return;
        }
        let id = self.cx.next_id();
        if let Some(tag) = self.tag.as_mut() {
            let text = std::mem::take(&mut tag.name_text);
            tag.name = Some(Node::raw_text(id, tag.name_location, text));
        }
    }

    /// Give up on the tag under construction: its text becomes content.
    fn abort_tag(&mut self) {
        let Some(tag) = self.tag.take() else {
            return;
        };
        let prefix = if tag.close { "</" } else { "<" };
        let literal = format!("{prefix}{}", tag.name_text);
        let location = Span::new(tag.start, tag.name_location.end.max(tag.start));
        let next = tag.rcdata.map_or(LexState::Pcdata, LexState::RcData);
        self.transition_to(next, tag.start);
        self.push_text(&literal, location);
        if let Some(name) = tag.name {
            self.out.push(name);
        }
    }

    fn complete_tag(&mut self, self_closing: bool, end: usize, enter_rcdata: bool) {
        let Some(mut tag) = self.tag.take() else {
            return;
        };
        let Some(name) = tag.name.take() else {
            self.tag = Some(tag);
            self.abort_tag();
            return;
        };
        let tag_name = TagName::new(name);
        let location = Span::new(tag.start, end.max(tag.start));
        let id = self.structural_id();
        if tag.close {
            if tag_name.is_context_changing() && tag.rcdata.is_none() {
                self.report(location, ErrorKind::UnexpectedCloseTag);
            }
            if !tag.children.is_empty() && !tag.reported_attributes {
                self.report(location, ErrorKind::CloseTagWithAttributes);
            }
            self.out.push(Node::HtmlCloseTag {
                id,
                location,
                tag_name,
            });
            // Statements placed inside a close tag move after it.
            self.out.append(&mut tag.children);
            self.transition_to(LexState::Pcdata, tag.start);
            return;
        }
        let next = match tag_name.rcdata_tag() {
            Some(rcdata) if enter_rcdata && !self_closing => LexState::RcData(rcdata),
            _ => LexState::Pcdata,
        };
        self.out.push(Node::HtmlOpenTag {
            id,
            location,
            tag_name,
            children: tag.children,
            self_closing,
        });
        self.transition_to(next, tag.start);
    }

    /// Start an attribute; returns whether it is discarded.
    fn begin_attribute(&mut self, location: Span, name: Option<Node>, discard: bool) -> bool {
        let mut discard = discard;
        if let Some(tag) = self.tag.as_mut().filter(|tag| tag.close) {
            if !tag.reported_attributes {
                tag.reported_attributes = true;
                self.cx.report(location, ErrorKind::CloseTagWithAttributes);
            }
            discard = true;
        } else if self.tag.is_none() && self.entry == LexState::BeforeAttrValue && self.slot_filled
        {
            self.report(location, ErrorKind::ExtraContentAfterAttributeValue);
            discard = true;
        }
        self.attr = Some(PendingAttr {
            start: location.start,
            name_text: String::new(),
            name_location: location,
            name,
            discard,
        });
        discard
    }

    fn finish_attr_name(&mut self) {
        let ready = matches!(&self.attr, Some(attr) if attr.name.is_none() && !attr.name_text.is_empty());
        if !ready {
            return;
        }
        let id = self.cx.next_id();
        if let Some(attr) = self.attr.as_mut() {
            let text = std::mem::take(&mut attr.name_text);
            attr.name = Some(Node::raw_text(id, attr.name_location, text));
        }
    }

    /// Close the attribute under construction without a value.
    fn complete_attr(&mut self, end: usize) {
        self.finish_attr_name();
        if let Some(attr) = self.attr.take() {
            self.emit_attribute(attr, None, end);
        }
        self.transition_to(LexState::BeforeAttrName, end);
    }

    fn emit_attribute(&mut self, attr: PendingAttr, value: Option<Node>, end: usize) {
        if attr.discard {
            return;
        }
        let Some(name) = attr.name else {
            return;
        };
        let id = self.structural_id();
        let node = Node::HtmlAttribute {
            id,
            location: Span::new(attr.start, end.max(attr.start)),
            name: Box::new(name),
            value: value.map(Box::new),
        };
        self.attribute_container().push(node);
    }

    fn complete_value(&mut self, end: usize) {
        let Some(value) = self.value.take() else {
            return;
        };
        let id = self.structural_id();
        let node = Node::HtmlAttributeValue {
            id,
            location: Span::new(value.start, end.max(value.start)),
            quotes: value.quotes,
            children: value.children,
        };
        self.fill_value_slot(node, end);
    }

    /// Attach a finished value (or control flow producing one) to the
    /// attribute awaiting it. In a branch entered before the value there is
    /// no such attribute; the value becomes the branch's output.
    fn fill_value_slot(&mut self, value: Node, end: usize) {
        match self.attr.take() {
            Some(attr) => self.emit_attribute(attr, Some(value), end),
            None => {
                self.out.push(value);
                self.slot_filled = true;
            }
        }
        self.transition_to(LexState::BeforeAttrName, end);
    }

    fn feed_node(&mut self, mut node: Node) {
        rewrite_nested(self.cx, &mut node);
        let end = node.location().end;
        match node {
            Node::ControlFlow(flow) => self.control_flow(flow),
            other => self.place(other),
        }
        self.last_offset = self.last_offset.max(end);
    }

    fn place(&mut self, node: Node) {
        let location = node.location();
        match self.state {
            LexState::Pcdata
            | LexState::RcData(_)
            | LexState::Comment
            | LexState::Declaration
            | LexState::CData
            | LexState::AttrValue(_) => self.push_content(node),
            LexState::TagName {
                name: NamePart::Empty,
            } => {
                if !node.is_printing() {
                    self.report(location, ErrorKind::ExpectedTagName);
                    self.abort_tag();
                    self.place(node);
                    return;
                }
                match self.tag.as_mut() {
                    Some(tag) => tag.name = Some(node),
                    None => self.out.push(node),
                }
                let next = LexState::TagName {
                    name: NamePart::Dynamic,
                };
                self.transition_to(next, location.start);
            }
            LexState::TagName { .. } => {
                if node.is_printing() {
                    self.report(location, ErrorKind::ExpectedWhitespaceAfterName);
                }
                self.finish_tag_name();
                self.transition_to(LexState::BeforeAttrName, location.start);
                self.place(node);
            }
            LexState::BeforeAttrName => {
                if !node.is_printing() {
                    self.attribute_container().push(node);
                    return;
                }
                let discard = self.begin_attribute(location, Some(node), false);
                let next = LexState::AttrName {
                    name: NamePart::Dynamic,
                    after_separator: false,
                    discard,
                };
                self.transition_to(next, location.start);
            }
            // A dynamic piece of a discarded name is discarded with it.
            LexState::AttrName { discard: true, .. } if node.is_printing() => {}
            LexState::AttrName { .. } => {
                if node.is_printing() {
                    self.report(location, ErrorKind::ExpectedWhitespaceAfterName);
                }
                self.complete_attr(location.start);
                self.place(node);
            }
            LexState::BeforeAttrValue => {
                if node.is_printing() {
                    self.value = Some(PendingValue {
                        quotes: Quotes::None,
                        start: location.start,
                        children: vec![node],
                    });
                    self.transition_to(LexState::AttrValue(Quotes::None), location.start);
                } else if matches!(node, Node::HtmlAttributeValue { .. }) {
                    self.fill_value_slot(node, location.end);
                } else {
                    self.attribute_container().push(node);
                }
            }
        }
    }

    /// Content position. Structural nodes from an earlier run are opaque but
    /// still move the state in and out of context-changing elements.
    fn push_content(&mut self, node: Node) {
        let next = match (&node, self.state) {
            (
                Node::HtmlOpenTag {
                    tag_name,
                    self_closing: false,
                    ..
                },
                LexState::Pcdata,
            ) => tag_name.rcdata_tag().map(LexState::RcData),
            (Node::HtmlCloseTag { tag_name, .. }, LexState::RcData(open))
                if tag_name.rcdata_tag() == Some(open) =>
            {
                Some(LexState::Pcdata)
            }
            _ => None,
        };
        let at = node.location().start;
        self.content_container().push(node);
        if let Some(next) = next {
            self.transition_to(next, at);
        }
    }

    fn control_flow(&mut self, flow: ControlFlowNode) {
        let location = flow.location;
        match self.state {
            LexState::TagName {
                name: NamePart::Empty,
            } => {
                self.report(location, ErrorKind::ControlFlowInTagName);
                self.abort_tag();
            }
            LexState::TagName { .. } => {
                self.finish_tag_name();
                self.transition_to(LexState::BeforeAttrName, location.start);
            }
            LexState::AttrName { .. } => self.complete_attr(location.start),
            _ => {}
        }
        let entry = self.state;
        let (flow, exit) = merge::merge(self.cx, flow, entry);
        let node = Node::ControlFlow(flow);
        match entry {
            LexState::BeforeAttrValue if exit == LexState::BeforeAttrName => {
                self.fill_value_slot(node, location.end);
                return;
            }
            LexState::BeforeAttrName | LexState::BeforeAttrValue => {
                self.attribute_container().push(node)
            }
            _ => self.content_container().push(node),
        }
        self.transition_to(exit, location.start);
    }

    /// Close whatever is still under construction at the end of the block or
    /// branch. In a branch, the innermost construct the branch opened itself
    /// is reported.
    fn close_pending(&mut self) {
        let end = self.last_offset;
        let mut unclosed: Option<(Construct, usize)> = None;
        match self.state {
            LexState::TagName {
                name: NamePart::Empty,
            } => self.abort_tag(),
            LexState::TagName { .. } => {
                self.finish_tag_name();
                self.transition_to(LexState::BeforeAttrName, end);
            }
            LexState::AttrName { .. } => self.complete_attr(end),
            _ => {}
        }
        if let Some(value) = &self.value {
            if value.quotes != Quotes::None {
                unclosed.get_or_insert((Construct::AttributeValue, value.start));
            }
            self.complete_value(end);
        }
        if let Some(attr) = &self.attr {
            unclosed.get_or_insert((Construct::Attribute, attr.start));
            self.complete_attr(end);
        }
        if let Some(tag) = &self.tag {
            unclosed.get_or_insert((Construct::Tag, tag.start));
            self.complete_tag(false, end, false);
        }
        if let Some(comment) = self.comment.take() {
            unclosed.get_or_insert((Construct::Comment, comment.start));
            let id = self.structural_id();
            self.out.push(Node::HtmlComment {
                id,
                location: Span::new(comment.start, end.max(comment.start)),
                children: comment.children,
            });
            self.transition_to(LexState::Pcdata, end);
        }
        if !self.in_branch {
            return;
        }
        if let Some((construct, start)) = unclosed {
            let location = Span::new(start, end.max(start));
            self.report(location, ErrorKind::UnclosedInBranch { construct });
        }
    }
}

/// Rewrite `block` as content of `kind`, replacing its children.
pub(crate) fn rewrite_block(
    cx: &mut RewriteCx<'_>,
    block: &mut Block,
    kind: ContentKind,
    block_kind: BlockKind,
    location: Span,
) {
    cx.stats.blocks = cx.stats.blocks.saturating_add(1);
    let children = block.take_children();
    let children = match LexState::entry_for(kind) {
        Some(entry) => {
            let mut builder = Builder::new(cx, entry, false, location.start);
            builder.feed(children);
            builder.finish_block(block_kind)
        }
        None => rewrite_nested_only(cx, children),
    };
    block.replace_children(children);
}

fn rewrite_content(
    cx: &mut RewriteCx<'_>,
    content: &mut ContentBlock,
    block_kind: BlockKind,
    location: Span,
) {
    let kind = content.effective_kind();
    rewrite_block(cx, &mut content.block, kind, block_kind, location);
}

/// Rewrite the html content blocks of a `{let}` or `{call}`.
fn rewrite_nested(cx: &mut RewriteCx<'_>, node: &mut Node) {
    match node {
        Node::Let {
            location,
            value: ValueSource::Content(content),
            ..
        } => rewrite_content(cx, content, BlockKind::LetContent, *location),
        Node::Call { params, .. } => {
            for param in params {
                if let ValueSource::Content(content) = &mut param.value {
                    rewrite_content(cx, content, BlockKind::ParamContent, param.location);
                }
            }
        }
        _ => {}
    }
}

/// Children of a block without html structure are left as they are, but
/// html content blocks nested inside them are still rewritten.
fn rewrite_nested_only(cx: &mut RewriteCx<'_>, mut children: Vec<Node>) -> Vec<Node> {
    for node in &mut children {
        if let Node::ControlFlow(flow) = node {
            for branch in &mut flow.branches {
                let nested = rewrite_nested_only(cx, branch.block.take_children());
                branch.block.replace_children(nested);
            }
        } else {
            rewrite_nested(cx, node);
        }
    }
    children
}

#[cfg(test)]
mod tests;
