//! The line-driven block processor: a state machine over an explicit stack of
//! open containers (block quotes and lists) plus at most one open leaf block
//! (paragraph, fenced code, indented code, or HTML block).
//!
//! Paragraph and heading content is not scanned for inline constructs here;
//! it is buffered and recorded as a deferred span for the inline processor to
//! resolve once block processing has finished and every link reference
//! definition is known.

use log::debug;

use crate::entities::EntityTable;
use crate::text::{extract_spaces, is_blank, whitespace_width};
use crate::token::{MarkdownToken, TokenData, TokenName};

use self::html_block::{detect_html_block_start, line_ends_html_block, HtmlBlockKind};
use self::leaf::{
    is_fence_close, is_thematic_break, parse_atx_prefix, parse_fence_open, parse_list_marker,
    parse_setext_underline, AtxPrefix, ListMarker,
};
use self::link_reference::{parse_reference_definition, LinkReference, LinkReferenceRegistry};
use crate::text::split_final_whitespace;

pub(crate) mod html_block;
pub(crate) mod leaf;
pub(crate) mod link_reference;

/// Where a line of deferred inline content began in the original source.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LineOrigin {
    pub line_number: usize,
    pub column_number: usize,
}

/// A buffered raw-text span waiting for the inline pass, tied to the
/// placeholder text token at `token_index` in the block token stream.
pub(crate) struct DeferredInline {
    pub token_index: usize,
    pub text: String,
    pub origins: Vec<LineOrigin>,
    /// Hard breaks only form inside paragraph-like content, not in ATX
    /// headings.
    pub allow_hard_breaks: bool,
}

pub(crate) struct BlockProcessingResult {
    pub tokens: Vec<MarkdownToken>,
    pub deferred: Vec<DeferredInline>,
    pub registry: LinkReferenceRegistry,
}

/// One open container on the stack.
enum Container {
    BlockQuote,
    List(ListState),
}

struct ListState {
    ordered: bool,
    sequence_character: char,
    /// 0-based column (relative to the innermost enclosing block quote) of
    /// the most recent item's marker.
    marker_column: usize,
    /// 0-based column at which item content begins.
    indent_level: usize,
    token_index: usize,
    /// A blank line was seen and no content has arrived since. If content
    /// does arrive before the list closes, the list is loose.
    pending_blank: bool,
    loose: bool,
}

/// A line captured verbatim inside a code or HTML block.
enum CodeLine {
    Content {
        line_number: usize,
        column_number: usize,
        whitespace: String,
        text: String,
    },
    Blank {
        line_number: usize,
        column_number: usize,
        whitespace: String,
    },
}

struct ParagraphState {
    ws_lines: Vec<String>,
    text_lines: Vec<String>,
    origins: Vec<LineOrigin>,
}

struct FencedCodeState {
    fence_character: char,
    fence_count: usize,
    /// Columns of indentation to strip from each content line, matching the
    /// indent of the opening fence.
    strip_width: usize,
    lines: Vec<CodeLine>,
}

struct IndentedCodeState {
    lines: Vec<CodeLine>,
    /// Blank lines that will only belong to the block if more code follows;
    /// otherwise they re-attach after the block's end token.
    trailing_blanks: Vec<CodeLine>,
}

struct HtmlBlockState {
    kind: HtmlBlockKind,
    lines: Vec<CodeLine>,
}

enum Leaf {
    None,
    Paragraph(ParagraphState),
    FencedCode(FencedCodeState),
    IndentedCode(IndentedCodeState),
    Html(HtmlBlockState),
}

/// The result of walking the open container stack against a new line.
struct ContainerMatch {
    /// How many containers, outermost first, matched their continuation
    /// condition.
    matched: usize,
    /// Byte index into the line just past the matched prefixes.
    index: usize,
    /// Columns consumed by the matched prefixes.
    columns: usize,
    /// Columns consumed up to and including the innermost matched block
    /// quote prefix. List indents are measured relative to this.
    bq_base: usize,
}

pub(crate) struct BlockProcessor<'e> {
    entities: &'e EntityTable,
    tokens: Vec<MarkdownToken>,
    deferred: Vec<DeferredInline>,
    stack: Vec<Container>,
    leaf: Leaf,
    registry: LinkReferenceRegistry,
    line_number: usize,
}

impl<'e> BlockProcessor<'e> {
    pub(crate) fn new(entities: &'e EntityTable) -> Self {
        Self {
            entities,
            tokens: Vec::new(),
            deferred: Vec::new(),
            stack: Vec::new(),
            leaf: Leaf::None,
            registry: LinkReferenceRegistry::new(),
            line_number: 0,
        }
    }

    pub(crate) fn finish(mut self) -> BlockProcessingResult {
        self.close_leaf();
        self.close_containers(0);
        BlockProcessingResult {
            tokens: self.tokens,
            deferred: self.deferred,
            registry: self.registry,
        }
    }

    pub(crate) fn process_line(&mut self, line: &str) {
        self.line_number += 1;
        let m = self.match_containers(line);
        let rest = &line[m.index..];

        // Code and HTML leaves consume continuation lines verbatim while
        // their containers keep matching; they end as soon as one fails.
        if m.matched == self.stack.len() {
            enum LeafContinuation {
                None,
                Fenced,
                Html,
                HtmlEndedByBlank,
                Indented,
            }
            let continuation = match &self.leaf {
                Leaf::FencedCode(_) => LeafContinuation::Fenced,
                Leaf::Html(state) => {
                    if state.kind.ends_at_blank_line() && is_blank(rest) {
                        LeafContinuation::HtmlEndedByBlank
                    } else {
                        LeafContinuation::Html
                    }
                }
                Leaf::IndentedCode(_) => LeafContinuation::Indented,
                _ => LeafContinuation::None,
            };
            match continuation {
                LeafContinuation::Fenced => {
                    self.continue_fenced_code(line, &m);
                    return;
                }
                LeafContinuation::Html => {
                    self.continue_html_block(line, &m);
                    return;
                }
                LeafContinuation::HtmlEndedByBlank => self.close_leaf(),
                LeafContinuation::Indented => {
                    if self.try_continue_indented_code(line, &m) {
                        return;
                    }
                    self.close_leaf();
                }
                LeafContinuation::None => {}
            }
        } else if !matches!(self.leaf, Leaf::None | Leaf::Paragraph(_)) {
            self.close_leaf();
        }

        if is_blank(rest) {
            self.handle_blank_line(rest, &m);
            return;
        }

        let (content_index, ws) = extract_spaces(line, m.index);
        let ws_width = whitespace_width(ws, m.columns);
        let content = &line[content_index..];

        if matches!(self.leaf, Leaf::Paragraph(_)) {
            // Setext promotion outranks every interruption check, but only
            // when the paragraph's containers all matched.
            if m.matched == self.stack.len() && ws_width <= 3 {
                if let Some((heading_character, _)) = parse_setext_underline(content) {
                    self.promote_setext(heading_character, content, &m, ws_width);
                    return;
                }
            }
            if !self.line_can_interrupt_paragraph(content, ws_width, &m) {
                // A normal or lazy continuation; unmatched containers stay
                // open.
                self.append_paragraph_line(ws, content, &m, ws_width);
                return;
            }
            self.close_leaf();
        }

        // The line starts something new. Unmatched block quotes (and
        // anything nested inside them) close immediately; unmatched lists
        // wait for the marker walk, since a marker at a shallower column can
        // still continue an outer list.
        let mut unmatched_from = m.matched;
        if let Some(position) = self
            .stack
            .iter()
            .enumerate()
            .skip(m.matched)
            .find(|(_, container)| matches!(container, Container::BlockQuote))
            .map(|(index, _)| index)
        {
            self.close_containers(position);
            unmatched_from = unmatched_from.min(self.stack.len());
        }

        // Container openings: block quotes and list items, repeatedly, until
        // the remaining text is leaf content.
        let mut cursor_index = m.index;
        let mut cursor_columns = m.columns;
        let mut bq_base = m.bq_base.min(cursor_columns);
        loop {
            let (ws_end, ws) = extract_spaces(line, cursor_index);
            let ws_width = whitespace_width(ws, cursor_columns);
            if ws_width >= 4 {
                break;
            }
            let content = &line[ws_end..];
            if content.starts_with('>') {
                if unmatched_from < self.stack.len() {
                    self.close_containers(unmatched_from);
                }
                self.consume_pending_blanks();
                let token = MarkdownToken::new(
                    self.line_number,
                    cursor_columns + ws_width + 1,
                    TokenData::BlockQuote {
                        extracted_whitespace: ws.to_string(),
                    },
                );
                debug!("opening block quote at line {}", self.line_number);
                self.tokens.push(token);
                self.stack.push(Container::BlockQuote);
                cursor_index = ws_end + 1;
                cursor_columns += ws_width + 1;
                if line.as_bytes().get(cursor_index) == Some(&b' ') {
                    cursor_index += 1;
                    cursor_columns += 1;
                }
                bq_base = cursor_columns;
                unmatched_from = self.stack.len();
                continue;
            }
            // A line like `* * *` is a thematic break, never a list item.
            if is_thematic_break(content) {
                break;
            }
            if let Some(marker) = parse_list_marker(content) {
                let relative_column = cursor_columns + ws_width - bq_base;
                let consumed =
                    self.resolve_list_marker(&marker, relative_column, bq_base, ws, content);
                cursor_index = ws_end + marker.content_index;
                cursor_columns += ws_width + consumed;
                unmatched_from = self.stack.len();
                continue;
            }
            break;
        }

        if unmatched_from < self.stack.len() {
            self.close_containers(unmatched_from);
        }

        self.classify_leaf(line, cursor_index, cursor_columns);
    }

    //#region Container matching

    fn match_containers(&self, line: &str) -> ContainerMatch {
        let mut index = 0;
        let mut columns = 0;
        let mut matched = 0;
        let mut bq_base = 0;

        for container in &self.stack {
            match container {
                Container::BlockQuote => {
                    let (ws_end, ws) = extract_spaces(line, index);
                    let width = whitespace_width(ws, columns);
                    if width <= 3 && line.as_bytes().get(ws_end) == Some(&b'>') {
                        index = ws_end + 1;
                        columns += width + 1;
                        if line.as_bytes().get(index) == Some(&b' ') {
                            index += 1;
                            columns += 1;
                        }
                        bq_base = columns;
                        matched += 1;
                    } else {
                        break;
                    }
                }
                Container::List(list) => {
                    if is_blank(&line[index..]) {
                        matched += 1;
                        continue;
                    }
                    let (_, ws) = extract_spaces(line, index);
                    let width = whitespace_width(ws, columns);
                    let relative = columns - bq_base;
                    if relative + width >= list.indent_level {
                        let needed = list.indent_level - relative;
                        let (next_index, consumed) =
                            consume_columns(line, index, columns, needed);
                        index = next_index;
                        columns += consumed;
                        matched += 1;
                    } else {
                        break;
                    }
                }
            }
        }

        ContainerMatch {
            matched,
            index,
            columns,
            bq_base,
        }
    }

    //#endregion

    //#region Blank lines and paragraph continuation

    fn handle_blank_line(&mut self, rest: &str, m: &ContainerMatch) {
        if matches!(self.leaf, Leaf::Paragraph(_)) {
            self.close_leaf();
        }
        // A container that failed to match on a blank line can only be a
        // block quote; blank lines always continue lists.
        if m.matched < self.stack.len() {
            self.close_containers(m.matched);
        }
        self.tokens.push(MarkdownToken::new(
            self.line_number,
            m.columns + 1,
            TokenData::BlankLine {
                extracted_whitespace: rest.to_string(),
            },
        ));
        for container in &mut self.stack {
            if let Container::List(list) = container {
                list.pending_blank = true;
            }
        }
    }

    /// "a paragraph can be interrupted by..." — the checks that allow a new
    /// block to begin while a paragraph is open. Everything else is a
    /// continuation line.
    fn line_can_interrupt_paragraph(
        &self,
        content: &str,
        ws_width: usize,
        m: &ContainerMatch,
    ) -> bool {
        if ws_width >= 4 {
            return false;
        }
        if content.starts_with('>') {
            return true;
        }
        if is_thematic_break(content) {
            return true;
        }
        if parse_fence_open(content).is_some() || parse_atx_prefix(content).is_some() {
            return true;
        }
        if detect_html_block_start(content, true).is_some() {
            return true;
        }
        if let Some(marker) = parse_list_marker(content) {
            if marker.is_empty_item {
                return false;
            }
            // When a container failed to match, the paragraph tip sits
            // inside an unmatched item and the marker starts or continues a
            // list at an outer level; the start-number restriction only
            // applies when the marker would interrupt the paragraph
            // directly.
            if m.matched < self.stack.len() {
                return true;
            }
            return !marker.ordered || marker.start_content == "1";
        }
        false
    }

    fn append_paragraph_line(
        &mut self,
        ws: &str,
        content: &str,
        m: &ContainerMatch,
        ws_width: usize,
    ) {
        self.consume_pending_blanks();
        if let Leaf::Paragraph(state) = &mut self.leaf {
            state.ws_lines.push(ws.to_string());
            state.text_lines.push(content.to_string());
            state.origins.push(LineOrigin {
                line_number: self.line_number,
                column_number: m.columns + ws_width + 1,
            });
        }
    }

    fn consume_pending_blanks(&mut self) {
        for container in &mut self.stack {
            if let Container::List(list) = container {
                if list.pending_blank {
                    list.pending_blank = false;
                    list.loose = true;
                }
            }
        }
    }

    //#endregion

    //#region Lists

    /// Walk the open list stack to decide whether a marker starts a new item
    /// of an existing list, a sibling list, or a nested one, closing lists
    /// that the marker falls outside of. Returns the columns consumed by the
    /// marker and its post-marker whitespace.
    fn resolve_list_marker(
        &mut self,
        marker: &ListMarker,
        relative_column: usize,
        bq_base: usize,
        ws: &str,
        content: &str,
    ) -> usize {
        let indent_level = relative_column + marker.indent_width;
        let consumed_spaces = &content[marker.marker_width..marker.content_index];
        let consumed_width = marker.marker_width
            + whitespace_width(consumed_spaces, relative_column + marker.marker_width);
        let absolute_column = bq_base + relative_column + 1;

        enum MarkerPlacement {
            NestedList,
            NewItem,
            SiblingList,
            OutsideList,
        }
        loop {
            let placement = match self.stack.last() {
                Some(Container::List(list)) => {
                    if relative_column >= list.indent_level {
                        // Content position within the item: a nested list.
                        MarkerPlacement::NestedList
                    } else if relative_column >= list.marker_column {
                        if list.ordered == marker.ordered
                            && list.sequence_character == marker.sequence_character
                        {
                            MarkerPlacement::NewItem
                        } else {
                            MarkerPlacement::SiblingList
                        }
                    } else {
                        MarkerPlacement::OutsideList
                    }
                }
                _ => MarkerPlacement::NestedList,
            };

            match placement {
                MarkerPlacement::NestedList => break,
                MarkerPlacement::SiblingList => {
                    // A different marker at the same level starts a sibling
                    // list.
                    let keep = self.stack.len() - 1;
                    self.close_containers(keep);
                    break;
                }
                MarkerPlacement::OutsideList => {
                    let keep = self.stack.len() - 1;
                    self.close_containers(keep);
                }
                MarkerPlacement::NewItem => {
                    self.consume_pending_blanks();
                    self.tokens.push(MarkdownToken::new(
                        self.line_number,
                        absolute_column,
                        TokenData::NewListItem { indent_level },
                    ));
                    if let Some(Container::List(list)) = self.stack.last_mut() {
                        list.marker_column = relative_column;
                        list.indent_level = indent_level;
                    }
                    return consumed_width;
                }
            }
        }

        // No aligned list: open a new one.
        self.consume_pending_blanks();
        let data = if marker.ordered {
            TokenData::OrderedListStart {
                list_start_sequence: marker.sequence_character,
                list_start_content: marker.start_content.clone(),
                indent_level,
                extracted_whitespace: ws.to_string(),
                is_loose: false,
            }
        } else {
            TokenData::UnorderedListStart {
                list_start_sequence: marker.sequence_character,
                indent_level,
                extracted_whitespace: ws.to_string(),
                is_loose: false,
            }
        };
        debug!(
            "opening {} list at line {}, indent {}",
            if marker.ordered { "ordered" } else { "unordered" },
            self.line_number,
            indent_level
        );
        self.tokens
            .push(MarkdownToken::new(self.line_number, absolute_column, data));
        self.stack.push(Container::List(ListState {
            ordered: marker.ordered,
            sequence_character: marker.sequence_character,
            marker_column: relative_column,
            indent_level,
            token_index: self.tokens.len() - 1,
            pending_blank: false,
            loose: false,
        }));
        consumed_width
    }

    //#endregion

    //#region Leaf blocks

    fn classify_leaf(&mut self, line: &str, cursor_index: usize, cursor_columns: usize) {
        let (content_index, ws) = extract_spaces(line, cursor_index);
        let ws_width = whitespace_width(ws, cursor_columns);
        let content = &line[content_index..];
        let content_column = cursor_columns + ws_width + 1;

        self.consume_pending_blanks();

        if content.is_empty() {
            // Only container markers on this line (an empty list item).
            self.tokens.push(MarkdownToken::new(
                self.line_number,
                cursor_columns + 1,
                TokenData::BlankLine {
                    extracted_whitespace: ws.to_string(),
                },
            ));
            return;
        }

        if ws_width >= 4 {
            self.open_or_continue_indented_code(line, cursor_index, cursor_columns);
            return;
        }

        if let Some(fence) = parse_fence_open(content) {
            self.tokens.push(MarkdownToken::new(
                self.line_number,
                content_column,
                TokenData::FencedCodeBlock {
                    fence_character: fence.fence_character,
                    fence_count: fence.fence_count,
                    info_string: fence.info_string,
                    text_after_info: fence.text_after_info,
                    extracted_whitespace: ws.to_string(),
                    pre_info_whitespace: fence.pre_info_whitespace,
                },
            ));
            self.leaf = Leaf::FencedCode(FencedCodeState {
                fence_character: fence.fence_character,
                fence_count: fence.fence_count,
                strip_width: ws_width,
                lines: Vec::new(),
            });
            return;
        }

        if let Some(prefix) = parse_atx_prefix(content) {
            self.handle_atx_heading(&prefix, content, ws, content_column);
            return;
        }

        if let Some(kind) = detect_html_block_start(content, false) {
            debug!("opening html block ({kind:?}) at line {}", self.line_number);
            self.tokens.push(MarkdownToken::new(
                self.line_number,
                cursor_columns + 1,
                TokenData::HtmlBlock,
            ));
            let state = HtmlBlockState {
                kind,
                lines: vec![CodeLine::Content {
                    line_number: self.line_number,
                    column_number: content_column,
                    whitespace: ws.to_string(),
                    text: content.to_string(),
                }],
            };
            if line_ends_html_block(kind, content) {
                self.flush_code_lines(state.lines);
                self.tokens
                    .push(MarkdownToken::end(TokenName::HtmlBlock, "", None));
            } else {
                self.leaf = Leaf::Html(state);
            }
            return;
        }

        if is_thematic_break(content) {
            self.tokens.push(MarkdownToken::new(
                self.line_number,
                content_column,
                TokenData::ThematicBreak {
                    start_character: content.chars().next().unwrap_or('-'),
                    extracted_whitespace: ws.to_string(),
                    rest_of_line: content.to_string(),
                },
            ));
            return;
        }

        // Fallback: open a paragraph.
        self.leaf = Leaf::Paragraph(ParagraphState {
            ws_lines: vec![ws.to_string()],
            text_lines: vec![content.to_string()],
            origins: vec![LineOrigin {
                line_number: self.line_number,
                column_number: content_column,
            }],
        });
    }

    fn handle_atx_heading(
        &mut self,
        prefix: &AtxPrefix,
        content: &str,
        ws: &str,
        content_column: usize,
    ) {
        let body = &content[prefix.content_index..];
        let (body_end, trailing_ws) = crate::text::extract_spaces_from_end(body);
        let trimmed = &body[..body_end];

        // A trailing run of hashes closes the heading when it stands alone
        // or follows whitespace.
        let closing_run_start = trimmed
            .rfind(|c: char| c != '#')
            .map_or(0, |index| index + 1);
        let closing_count = trimmed.len() - closing_run_start;
        let has_closing_run = closing_count > 0
            && (closing_run_start == 0
                || matches!(
                    trimmed.as_bytes()[closing_run_start - 1],
                    b' ' | b'\t'
                ));

        let (heading_text, remove_trailing_count, end_whitespace, end_extra) = if has_closing_run {
            let before_hashes = &trimmed[..closing_run_start];
            let (text_end, pre_hash_ws) = crate::text::extract_spaces_from_end(before_hashes);
            let extra = if trailing_ws.is_empty() {
                None
            } else {
                Some(trailing_ws)
            };
            (&before_hashes[..text_end], closing_count, pre_hash_ws, extra)
        } else {
            (trimmed, 0, trailing_ws, None)
        };

        self.tokens.push(MarkdownToken::new(
            self.line_number,
            content_column,
            TokenData::AtxHeading {
                hash_count: prefix.hash_count,
                remove_trailing_count,
                extracted_whitespace: ws.to_string(),
            },
        ));
        if !heading_text.is_empty() {
            let text_column = content_column + prefix.content_index;
            self.tokens.push(MarkdownToken::new(
                self.line_number,
                text_column,
                TokenData::Text {
                    token_text: heading_text.to_string(),
                    extracted_whitespace: prefix.separator_whitespace.clone(),
                    end_whitespace: String::new(),
                },
            ));
            self.deferred.push(DeferredInline {
                token_index: self.tokens.len() - 1,
                text: heading_text.to_string(),
                origins: vec![LineOrigin {
                    line_number: self.line_number,
                    column_number: text_column,
                }],
                allow_hard_breaks: false,
            });
        }
        self.tokens
            .push(MarkdownToken::end(TokenName::AtxHeading, end_whitespace, end_extra));
    }

    fn promote_setext(
        &mut self,
        heading_character: char,
        content: &str,
        m: &ContainerMatch,
        ws_width: usize,
    ) {
        let Leaf::Paragraph(state) = std::mem::replace(&mut self.leaf, Leaf::None) else {
            return;
        };
        debug!(
            "promoting paragraph at line {} to setext heading",
            state.origins[0].line_number
        );

        let (underline_end, underline_trailing) = crate::text::extract_spaces_from_end(content);
        let joined = state.text_lines.join("\n");
        let (text, final_whitespace) = split_final_whitespace(&joined);

        self.tokens.push(MarkdownToken::new(
            self.line_number,
            m.columns + ws_width + 1,
            TokenData::SetextHeading {
                heading_character,
                underline: content[..underline_end].to_string(),
                original_line_number: state.origins[0].line_number,
                original_column_number: state.origins[0].column_number,
                final_whitespace,
            },
        ));
        self.tokens.push(MarkdownToken::new(
            state.origins[0].line_number,
            state.origins[0].column_number,
            TokenData::Text {
                token_text: text.clone(),
                extracted_whitespace: state.ws_lines.join("\n"),
                end_whitespace: String::new(),
            },
        ));
        self.deferred.push(DeferredInline {
            token_index: self.tokens.len() - 1,
            text,
            origins: state.origins,
            allow_hard_breaks: true,
        });
        self.tokens.push(MarkdownToken::end(
            TokenName::SetextHeading,
            underline_trailing,
            None,
        ));
    }

    fn open_or_continue_indented_code(
        &mut self,
        line: &str,
        cursor_index: usize,
        cursor_columns: usize,
    ) {
        let (strip_end, stripped) = consume_columns(line, cursor_index, cursor_columns, 4);
        let whitespace = line[cursor_index..strip_end].to_string();
        let text = line[strip_end..].to_string();
        let column_number = cursor_columns + stripped + 1;

        match &mut self.leaf {
            Leaf::IndentedCode(state) => {
                // Interior blank lines become part of the block as soon as
                // more code arrives.
                state.lines.append(&mut state.trailing_blanks);
                state.lines.push(CodeLine::Content {
                    line_number: self.line_number,
                    column_number,
                    whitespace,
                    text,
                });
            }
            _ => {
                // The opening line's indent lives on the block token itself;
                // later lines carry theirs on the text token.
                self.tokens.push(MarkdownToken::new(
                    self.line_number,
                    column_number,
                    TokenData::IndentedCodeBlock {
                        extracted_whitespace: whitespace,
                    },
                ));
                self.leaf = Leaf::IndentedCode(IndentedCodeState {
                    lines: vec![CodeLine::Content {
                        line_number: self.line_number,
                        column_number,
                        whitespace: String::new(),
                        text,
                    }],
                    trailing_blanks: Vec::new(),
                });
            }
        }
    }

    fn try_continue_indented_code(&mut self, line: &str, m: &ContainerMatch) -> bool {
        let rest = &line[m.index..];
        let (_, ws) = extract_spaces(line, m.index);
        let width = whitespace_width(ws, m.columns);

        if is_blank(rest) {
            if let Leaf::IndentedCode(state) = &mut self.leaf {
                state.trailing_blanks.push(CodeLine::Blank {
                    line_number: self.line_number,
                    column_number: m.columns + 1,
                    whitespace: rest.to_string(),
                });
            }
            return true;
        }
        if width >= 4 {
            self.open_or_continue_indented_code(line, m.index, m.columns);
            return true;
        }
        false
    }

    fn continue_fenced_code(&mut self, line: &str, m: &ContainerMatch) {
        let (ws_end, ws) = extract_spaces(line, m.index);
        let ws_width = whitespace_width(ws, m.columns);
        let content = &line[ws_end..];

        let (fence_character, fence_count, strip_width) = match &self.leaf {
            Leaf::FencedCode(state) => {
                (state.fence_character, state.fence_count, state.strip_width)
            }
            _ => return,
        };

        if ws_width <= 3 && !content.is_empty() && is_fence_close(content, fence_character, fence_count)
        {
            let Leaf::FencedCode(state) = std::mem::replace(&mut self.leaf, Leaf::None) else {
                return;
            };
            self.flush_code_lines(state.lines);
            self.tokens.push(MarkdownToken::end(
                TokenName::FencedCodeBlock,
                ws,
                Some(content),
            ));
            return;
        }

        let rest = &line[m.index..];
        let code_line = if is_blank(rest) {
            CodeLine::Blank {
                line_number: self.line_number,
                column_number: m.columns + 1,
                whitespace: rest.to_string(),
            }
        } else {
            let (strip_end, stripped) = consume_columns(line, m.index, m.columns, strip_width);
            CodeLine::Content {
                line_number: self.line_number,
                column_number: m.columns + stripped + 1,
                whitespace: line[m.index..strip_end].to_string(),
                text: line[strip_end..].to_string(),
            }
        };
        if let Leaf::FencedCode(state) = &mut self.leaf {
            state.lines.push(code_line);
        }
    }

    fn continue_html_block(&mut self, line: &str, m: &ContainerMatch) {
        let (ws_end, ws) = extract_spaces(line, m.index);
        let content = &line[ws_end..];
        let rest = &line[m.index..];

        let ends = match &mut self.leaf {
            Leaf::Html(state) => {
                if is_blank(rest) {
                    state.lines.push(CodeLine::Blank {
                        line_number: self.line_number,
                        column_number: m.columns + 1,
                        whitespace: rest.to_string(),
                    });
                } else {
                    state.lines.push(CodeLine::Content {
                        line_number: self.line_number,
                        column_number: m.columns + whitespace_width(ws, m.columns) + 1,
                        whitespace: ws.to_string(),
                        text: content.to_string(),
                    });
                }
                line_ends_html_block(state.kind, content)
            }
            _ => false,
        };
        if ends {
            self.close_leaf();
        }
    }

    //#endregion

    //#region Closing

    fn close_leaf(&mut self) {
        match std::mem::replace(&mut self.leaf, Leaf::None) {
            Leaf::None => {}
            Leaf::Paragraph(state) => self.close_paragraph(state),
            Leaf::FencedCode(state) => {
                // Terminated by container close or end of input; there is no
                // closing fence to capture.
                self.flush_code_lines(state.lines);
                self.tokens
                    .push(MarkdownToken::end(TokenName::FencedCodeBlock, "", None));
            }
            Leaf::IndentedCode(state) => {
                self.flush_code_lines(state.lines);
                self.tokens
                    .push(MarkdownToken::end(TokenName::IndentedCodeBlock, "", None));
                // Trailing blank lines are not part of the block; they
                // re-attach after it and count against list tightness.
                let had_trailing = !state.trailing_blanks.is_empty();
                for blank in state.trailing_blanks {
                    if let CodeLine::Blank {
                        line_number,
                        column_number,
                        whitespace,
                    } = blank
                    {
                        self.tokens.push(MarkdownToken::new(
                            line_number,
                            column_number,
                            TokenData::BlankLine {
                                extracted_whitespace: whitespace,
                            },
                        ));
                    }
                }
                if had_trailing {
                    for container in &mut self.stack {
                        if let Container::List(list) = container {
                            list.pending_blank = true;
                        }
                    }
                }
            }
            Leaf::Html(state) => {
                self.flush_code_lines(state.lines);
                self.tokens
                    .push(MarkdownToken::end(TokenName::HtmlBlock, "", None));
            }
        }
    }

    fn close_paragraph(&mut self, state: ParagraphState) {
        // Link reference definitions are carved off the front of the
        // paragraph; whatever remains (if anything) is the real paragraph.
        let mut line_cursor = 0;
        while line_cursor < state.text_lines.len() {
            let raw = reconstruct_lines(&state.ws_lines, &state.text_lines, line_cursor);
            let Some(def) = parse_reference_definition(&raw, self.entities) else {
                break;
            };
            let origin = state.origins[line_cursor];
            let did_add_definition = self.registry.add(
                &def.normalized_label,
                LinkReference {
                    destination: def.destination.clone(),
                    title: def.title.clone(),
                    original_label: def.raw_label.clone(),
                },
            );
            let name_debug = if def.raw_label == def.normalized_label {
                String::new()
            } else {
                def.raw_label.clone()
            };
            let destination_raw = if def.raw_destination == def.destination {
                String::new()
            } else {
                def.raw_destination.clone()
            };
            let title_raw = if def.raw_title.is_empty()
                || def.raw_title[1..def.raw_title.len() - 1] == def.title
            {
                String::new()
            } else {
                def.raw_title.clone()
            };
            self.tokens.push(MarkdownToken::new(
                origin.line_number,
                origin.column_number,
                TokenData::LinkReferenceDefinition {
                    did_add_definition,
                    extracted_whitespace: def.extracted_whitespace,
                    link_name: def.normalized_label,
                    link_name_debug: name_debug,
                    link_destination_whitespace: def.destination_whitespace,
                    link_destination: def.destination,
                    link_destination_raw: destination_raw,
                    link_title_whitespace: def.title_whitespace,
                    link_title: def.title,
                    link_title_raw: title_raw,
                    end_whitespace: def.end_whitespace,
                },
            ));
            line_cursor += def.consumed_lines;
        }

        if line_cursor >= state.text_lines.len() {
            return;
        }

        let joined = state.text_lines[line_cursor..].join("\n");
        let (text, final_whitespace) = split_final_whitespace(&joined);
        let origin = state.origins[line_cursor];

        self.tokens.push(MarkdownToken::new(
            origin.line_number,
            origin.column_number,
            TokenData::Paragraph {
                extracted_whitespace: state.ws_lines[line_cursor..].join("\n"),
                final_whitespace,
            },
        ));
        self.tokens.push(MarkdownToken::new(
            origin.line_number,
            origin.column_number,
            TokenData::Text {
                token_text: text.clone(),
                extracted_whitespace: String::new(),
                end_whitespace: String::new(),
            },
        ));
        self.deferred.push(DeferredInline {
            token_index: self.tokens.len() - 1,
            text,
            origins: state.origins[line_cursor..].to_vec(),
            allow_hard_breaks: true,
        });
        self.tokens
            .push(MarkdownToken::end(TokenName::Paragraph, "", None));
    }

    fn close_containers(&mut self, keep: usize) {
        if self.stack.len() > keep {
            self.close_leaf();
        }
        while self.stack.len() > keep {
            match self.stack.pop() {
                Some(Container::BlockQuote) => {
                    self.tokens
                        .push(MarkdownToken::end(TokenName::BlockQuote, "", None));
                }
                Some(Container::List(list)) => {
                    debug!(
                        "closing list opened at token {}, loose: {}",
                        list.token_index, list.loose
                    );
                    self.tokens[list.token_index].set_loose(list.loose);
                    let name = if list.ordered {
                        TokenName::OrderedListStart
                    } else {
                        TokenName::UnorderedListStart
                    };
                    self.tokens.push(MarkdownToken::end(name, "", None));
                }
                None => break,
            }
        }
    }

    /// Emit buffered code/HTML lines: contiguous content runs combine into
    /// one text token, blank lines become `BLANK` tokens between them.
    fn flush_code_lines(&mut self, lines: Vec<CodeLine>) {
        let mut run_text: Vec<String> = Vec::new();
        let mut run_whitespace: Vec<String> = Vec::new();
        let mut run_start: Option<(usize, usize)> = None;

        let mut flush_run =
            |tokens: &mut Vec<MarkdownToken>,
             run_text: &mut Vec<String>,
             run_whitespace: &mut Vec<String>,
             run_start: &mut Option<(usize, usize)>| {
                if let Some((line_number, column_number)) = run_start.take() {
                    tokens.push(MarkdownToken::new(
                        line_number,
                        column_number,
                        TokenData::Text {
                            token_text: run_text.join("\n"),
                            extracted_whitespace: run_whitespace.join("\n"),
                            end_whitespace: String::new(),
                        },
                    ));
                    run_text.clear();
                    run_whitespace.clear();
                }
            };

        for line in lines {
            match line {
                CodeLine::Content {
                    line_number,
                    column_number,
                    whitespace,
                    text,
                } => {
                    if run_start.is_none() {
                        run_start = Some((line_number, column_number));
                    }
                    run_text.push(text);
                    run_whitespace.push(whitespace);
                }
                CodeLine::Blank {
                    line_number,
                    column_number,
                    whitespace,
                } => {
                    flush_run(
                        &mut self.tokens,
                        &mut run_text,
                        &mut run_whitespace,
                        &mut run_start,
                    );
                    self.tokens.push(MarkdownToken::new(
                        line_number,
                        column_number,
                        TokenData::BlankLine {
                            extracted_whitespace: whitespace,
                        },
                    ));
                }
            }
        }
        flush_run(
            &mut self.tokens,
            &mut run_text,
            &mut run_whitespace,
            &mut run_start,
        );
    }

    //#endregion
}

/// Reassemble buffered paragraph lines (leading whitespace included) from
/// `start` onward, joined with newlines, for definition parsing.
fn reconstruct_lines(ws_lines: &[String], text_lines: &[String], start: usize) -> String {
    let mut raw = String::new();
    for index in start..text_lines.len() {
        if index > start {
            raw.push('\n');
        }
        raw.push_str(&ws_lines[index]);
        raw.push_str(&text_lines[index]);
    }
    raw
}

/// Consume whitespace bytes from `index` until `target` columns have been
/// covered, expanding tabs to 4-column stops. A tab that overshoots the
/// target is still consumed.
fn consume_columns(line: &str, mut index: usize, column: usize, target: usize) -> (usize, usize) {
    let bytes = line.as_bytes();
    let mut consumed = 0;
    while consumed < target && index < bytes.len() {
        match bytes[index] {
            b' ' => {
                consumed += 1;
                index += 1;
            }
            b'\t' => {
                consumed += 4 - ((column + consumed) % 4);
                index += 1;
            }
            _ => break,
        }
    }
    (index, consumed)
}
