//! The inline processor: re-scans the raw text of paragraphs and headings,
//! emitting text, code spans, autolinks, raw HTML, hard breaks, links,
//! images, and emphasis. Delimiter runs are arena entries referenced by
//! index from the working item sequence, so the stack can be walked and
//! mutated without any pointer entanglement.

use crate::block::link_reference::LinkReferenceRegistry;
use crate::block::LineOrigin;
use crate::byte_lookup::{
    byte_is_inline_significant, char_length_from_byte, is_unicode_punctuation,
    is_unicode_whitespace,
};
use crate::entities::EntityTable;
use crate::text::collect_while_char;
use crate::token::{MarkdownToken, TokenData};

pub(crate) mod autolink;
pub(crate) mod code_span;
pub(crate) mod emphasis;
pub(crate) mod link;
pub(crate) mod raw_html;

/// One element of the working sequence: either a finished token or a
/// reference into the delimiter arena.
pub(crate) enum InlineItem {
    Token(MarkdownToken),
    Delimiter(usize),
}

bitflags::bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct DelimiterFlags: u8 {
        const CAN_OPEN = 1;
        const CAN_CLOSE = 1 << 1;
        /// Inactive delimiters stay in the arena but can no longer match.
        const ACTIVE = 1 << 2;
        /// For link openers: the bracket has been claimed by a `]` and must
        /// not match again.
        const SPENT = 1 << 3;
    }
}

/// A run of `*`/`_` characters, or a `[`/`![` link opener, recorded in the
/// arena. Emphasis consumption eats openers from the right edge of the run
/// and closers from the left edge, so leftover literal text always sits
/// between the consumed parts.
pub(crate) struct DelimiterRun {
    pub character: char,
    pub is_image: bool,
    pub original_count: usize,
    pub left_consumed: usize,
    pub right_consumed: usize,
    pub flags: DelimiterFlags,
    /// Byte offset just past the run; for link openers this is where the
    /// bracketed content begins.
    pub source_offset: usize,
    /// Index of this delimiter's entry in the working item sequence.
    pub item_index: usize,
    pub line_number: usize,
    pub column_number: usize,
    /// Emphasis start tokens attached by matches, in match order (inner
    /// matches first).
    pub starts: Vec<MarkdownToken>,
    /// Emphasis end tokens attached by matches, in match order.
    pub ends: Vec<MarkdownToken>,
    /// A link or image start token that replaced this opener.
    pub resolved: Option<MarkdownToken>,
}

impl DelimiterRun {
    pub(crate) fn remaining(&self) -> usize {
        self.original_count - self.left_consumed - self.right_consumed
    }

    pub(crate) fn is_emphasis(&self) -> bool {
        matches!(self.character, '*' | '_')
    }

    pub(crate) fn can_open(&self) -> bool {
        self.flags.contains(DelimiterFlags::CAN_OPEN)
    }

    pub(crate) fn can_close(&self) -> bool {
        self.flags.contains(DelimiterFlags::CAN_CLOSE)
    }

    pub(crate) fn can_open_and_close(&self) -> bool {
        self.can_open() && self.can_close()
    }

    pub(crate) fn is_active(&self) -> bool {
        self.flags.contains(DelimiterFlags::ACTIVE)
    }

    pub(crate) fn deactivate(&mut self) {
        self.flags.remove(DelimiterFlags::ACTIVE);
    }

    pub(crate) fn is_spent(&self) -> bool {
        self.flags.contains(DelimiterFlags::SPENT)
    }

    pub(crate) fn mark_spent(&mut self) {
        self.flags.insert(DelimiterFlags::SPENT);
    }
}

pub(crate) struct InlineProcessor<'a> {
    pub(crate) text: &'a str,
    pub(crate) entities: &'a EntityTable,
    pub(crate) registry: &'a LinkReferenceRegistry,
    origins: &'a [LineOrigin],
    line_offsets: Vec<usize>,
    allow_hard_breaks: bool,
    pub(crate) position: usize,
    pub(crate) items: Vec<InlineItem>,
    pub(crate) delimiters: Vec<DelimiterRun>,
    run_start: Option<usize>,
}

/// Resolve one deferred raw-text span into its inline tokens.
pub(crate) fn process_inline_span(
    text: &str,
    origins: &[LineOrigin],
    allow_hard_breaks: bool,
    entities: &EntityTable,
    registry: &LinkReferenceRegistry,
) -> Vec<MarkdownToken> {
    InlineProcessor::new(text, origins, allow_hard_breaks, entities, registry).process()
}

impl<'a> InlineProcessor<'a> {
    fn new(
        text: &'a str,
        origins: &'a [LineOrigin],
        allow_hard_breaks: bool,
        entities: &'a EntityTable,
        registry: &'a LinkReferenceRegistry,
    ) -> Self {
        let mut line_offsets = vec![0];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_offsets.push(offset + 1);
            }
        }
        Self {
            text,
            entities,
            registry,
            origins,
            line_offsets,
            allow_hard_breaks,
            position: 0,
            items: Vec::new(),
            delimiters: Vec::new(),
            run_start: None,
        }
    }

    fn process(mut self) -> Vec<MarkdownToken> {
        while self.position < self.text.len() {
            let byte = self.text.as_bytes()[self.position];
            if !byte_is_inline_significant(byte) {
                self.keep_literal(self.position, self.position + char_length_from_byte(byte).max(1));
                continue;
            }
            match byte {
                b'\\' => self.handle_backslash(),
                b'\n' => self.handle_line_ending(),
                b'`' => code_span::parse_code_span(&mut self),
                b'<' => self.handle_angle_open(),
                b'*' | b'_' => self.handle_emphasis_delimiter(),
                b'[' => self.handle_bracket_open(false),
                b'!' => {
                    if self.text.as_bytes().get(self.position + 1) == Some(&b'[') {
                        self.handle_bracket_open(true);
                    } else {
                        self.keep_literal(self.position, self.position + 1);
                    }
                }
                b']' => link::handle_close_bracket(&mut self),
                _ => self.keep_literal(self.position, self.position + 1),
            }
        }
        self.flush_text_run(self.text.len());
        emphasis::process_emphasis(&mut self, 0, usize::MAX);
        self.flatten()
    }

    //#region Scanner pieces

    fn handle_backslash(&mut self) {
        let next = self.text.as_bytes().get(self.position + 1).copied();
        match next {
            Some(b'\n') if self.allow_hard_breaks => {
                self.flush_text_run(self.position);
                let (line, column) = self.position_at(self.position);
                self.items.push(InlineItem::Token(MarkdownToken::new(
                    line,
                    column,
                    TokenData::HardBreak {
                        line_end: "\\".to_string(),
                    },
                )));
                self.position += 2;
            }
            Some(b) if b.is_ascii_punctuation() => {
                // The escaped pair stays literal in the token text; the
                // escape only suppresses the character's significance.
                self.keep_literal(self.position, self.position + 2);
            }
            _ => self.keep_literal(self.position, self.position + 1),
        }
    }

    fn handle_line_ending(&mut self) {
        // "two or more spaces at the end of a source line" form a hard
        // break, as long as another line follows.
        let mut space_start = self.position;
        while space_start > 0 && self.text.as_bytes()[space_start - 1] == b' ' {
            space_start -= 1;
        }
        let space_count = self.position - space_start;
        let run_covers_spaces = self.run_start.map_or(false, |start| start <= space_start);

        if self.allow_hard_breaks && space_count >= 2 && run_covers_spaces {
            self.flush_text_run(space_start);
            let (line, column) = self.position_at(space_start);
            self.items.push(InlineItem::Token(MarkdownToken::new(
                line,
                column,
                TokenData::HardBreak {
                    line_end: " ".repeat(space_count),
                },
            )));
            self.position += 1;
        } else {
            self.keep_literal(self.position, self.position + 1);
        }
    }

    fn handle_angle_open(&mut self) {
        if let Some((token, end)) = autolink::parse_autolink(self.text, self.position) {
            self.flush_text_run(self.position);
            let (line, column) = self.position_at(self.position);
            self.items.push(InlineItem::Token(MarkdownToken::new(
                line,
                column,
                token,
            )));
            self.position = end;
            return;
        }
        if let Some(end) = raw_html::scan_html_construct(self.text, self.position) {
            self.flush_text_run(self.position);
            let (line, column) = self.position_at(self.position);
            self.items.push(InlineItem::Token(MarkdownToken::new(
                line,
                column,
                TokenData::RawHtml {
                    raw_tag: self.text[self.position + 1..end - 1].to_string(),
                },
            )));
            self.position = end;
            return;
        }
        self.keep_literal(self.position, self.position + 1);
    }

    fn handle_emphasis_delimiter(&mut self) {
        let character = self.text.as_bytes()[self.position] as char;
        let (count, after) = collect_while_char(self.text, self.position, character as u8);

        let before_char = self.text[..self.position].chars().next_back();
        let after_char = self.text[after..].chars().next();
        let before_is_whitespace = before_char.map_or(true, is_unicode_whitespace);
        let after_is_whitespace = after_char.map_or(true, is_unicode_whitespace);
        let before_is_punctuation = before_char.map_or(false, is_unicode_punctuation);
        let after_is_punctuation = after_char.map_or(false, is_unicode_punctuation);

        // CommonMark flanking rules.
        let left_flanking = !after_is_whitespace
            && (!after_is_punctuation || before_is_whitespace || before_is_punctuation);
        let right_flanking = !before_is_whitespace
            && (!before_is_punctuation || after_is_whitespace || after_is_punctuation);

        let (can_open, can_close) = if character == '_' {
            // `_` uses the stricter intraword rule.
            (
                left_flanking && (!right_flanking || before_is_punctuation),
                right_flanking && (!left_flanking || after_is_punctuation),
            )
        } else {
            (left_flanking, right_flanking)
        };

        let mut flags = DelimiterFlags::ACTIVE;
        flags.set(DelimiterFlags::CAN_OPEN, can_open);
        flags.set(DelimiterFlags::CAN_CLOSE, can_close);

        self.flush_text_run(self.position);
        let (line, column) = self.position_at(self.position);
        let index = self.delimiters.len();
        self.delimiters.push(DelimiterRun {
            character,
            is_image: false,
            original_count: count,
            left_consumed: 0,
            right_consumed: 0,
            flags,
            source_offset: after,
            item_index: self.items.len(),
            line_number: line,
            column_number: column,
            starts: Vec::new(),
            ends: Vec::new(),
            resolved: None,
        });
        self.items.push(InlineItem::Delimiter(index));
        self.position = after;
    }

    fn handle_bracket_open(&mut self, is_image: bool) {
        self.flush_text_run(self.position);
        let (line, column) = self.position_at(self.position);
        let width = if is_image { 2 } else { 1 };
        let index = self.delimiters.len();
        self.delimiters.push(DelimiterRun {
            character: '[',
            is_image,
            original_count: 1,
            left_consumed: 0,
            right_consumed: 0,
            flags: DelimiterFlags::ACTIVE | DelimiterFlags::CAN_OPEN,
            source_offset: self.position + width,
            item_index: self.items.len(),
            line_number: line,
            column_number: column,
            starts: Vec::new(),
            ends: Vec::new(),
            resolved: None,
        });
        self.items.push(InlineItem::Delimiter(index));
        self.position += width;
    }

    //#endregion

    //#region Working-sequence helpers

    /// Extend the pending plain-text run to cover `from..to` and move the
    /// cursor past it.
    pub(crate) fn keep_literal(&mut self, from: usize, to: usize) {
        if self.run_start.is_none() {
            self.run_start = Some(from);
        }
        self.position = to;
    }

    /// Emit the pending plain-text run (if any) as a text token ending at
    /// `end`.
    pub(crate) fn flush_text_run(&mut self, end: usize) {
        if let Some(start) = self.run_start.take() {
            if start < end {
                let (line, column) = self.position_at(start);
                self.items.push(InlineItem::Token(MarkdownToken::new(
                    line,
                    column,
                    TokenData::Text {
                        token_text: self.text[start..end].to_string(),
                        extracted_whitespace: String::new(),
                        end_whitespace: String::new(),
                    },
                )));
            }
        }
    }

    /// The (line, column) of a byte offset within this span, derived from
    /// the per-line origins recorded during block processing.
    pub(crate) fn position_at(&self, offset: usize) -> (usize, usize) {
        let index = match self.line_offsets.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        };
        match self.origins.get(index) {
            Some(origin) => (
                origin.line_number,
                origin.column_number + (offset - self.line_offsets[index]),
            ),
            None => (0, 0),
        }
    }

    pub(crate) fn push_token(&mut self, token: MarkdownToken) {
        self.items.push(InlineItem::Token(token));
    }

    //#endregion

    /// Convert the finished working sequence into the final token list.
    /// Delimiter entries expand to their attached emphasis tokens plus any
    /// leftover literal text.
    fn flatten(mut self) -> Vec<MarkdownToken> {
        let mut tokens = Vec::new();
        let items = std::mem::take(&mut self.items);
        for item in items {
            match item {
                InlineItem::Token(token) => tokens.push(token),
                InlineItem::Delimiter(index) => {
                    let node = &mut self.delimiters[index];
                    if let Some(resolved) = node.resolved.take() {
                        tokens.push(resolved);
                        continue;
                    }
                    // Ends close content to the left, then leftover literal
                    // text, then starts opening content to the right.
                    tokens.append(&mut node.ends);
                    if node.is_emphasis() {
                        if node.remaining() > 0 {
                            let literal = node.character.to_string().repeat(node.remaining());
                            tokens.push(MarkdownToken::new(
                                node.line_number,
                                node.column_number + node.left_consumed,
                                TokenData::Text {
                                    token_text: literal,
                                    extracted_whitespace: String::new(),
                                    end_whitespace: String::new(),
                                },
                            ));
                        }
                    } else {
                        // An unresolved bracket stays literal.
                        let literal = if node.is_image { "![" } else { "[" };
                        tokens.push(MarkdownToken::new(
                            node.line_number,
                            node.column_number,
                            TokenData::Text {
                                token_text: literal.to_string(),
                                extracted_whitespace: String::new(),
                                end_whitespace: String::new(),
                            },
                        ));
                    }
                    let starts = std::mem::take(&mut node.starts);
                    for start in starts.into_iter().rev() {
                        tokens.push(start);
                    }
                }
            }
        }
        tokens
    }
}
