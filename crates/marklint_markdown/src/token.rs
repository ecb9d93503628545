use std::fmt;

use serde::Serialize;

use crate::position::PositionMarker;

/// Guidance on what class of element a token represents. Rule plugins use
/// this to quickly partition a stream without matching every kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TokenClass {
    ContainerBlock,
    LeafBlock,
    Inline,
}

/// The kind tag for every token in a stream. End markers reuse the tag of the
/// scope they close, wrapped in [`TokenData::End`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TokenName {
    BlankLine,
    Paragraph,
    AtxHeading,
    SetextHeading,
    IndentedCodeBlock,
    FencedCodeBlock,
    HtmlBlock,
    ThematicBreak,
    LinkReferenceDefinition,
    BlockQuote,
    UnorderedListStart,
    OrderedListStart,
    NewListItem,
    Text,
    InlineCodeSpan,
    HardBreak,
    UriAutolink,
    EmailAutolink,
    RawHtml,
    Emphasis,
    Link,
    Image,
}

impl TokenName {
    /// The serialized name used in the canonical textual form of a stream.
    /// These strings are an external contract shared with rule plugins; they
    /// must never change.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenName::BlankLine => "BLANK",
            TokenName::Paragraph => "para",
            TokenName::AtxHeading => "atx",
            TokenName::SetextHeading => "setext",
            TokenName::IndentedCodeBlock => "icode-block",
            TokenName::FencedCodeBlock => "fcode-block",
            TokenName::HtmlBlock => "html-block",
            TokenName::ThematicBreak => "tbreak",
            TokenName::LinkReferenceDefinition => "link-ref-def",
            TokenName::BlockQuote => "block-quote",
            TokenName::UnorderedListStart => "ulist",
            TokenName::OrderedListStart => "olist",
            TokenName::NewListItem => "li",
            TokenName::Text => "text",
            TokenName::InlineCodeSpan => "icode-span",
            TokenName::HardBreak => "hard-break",
            TokenName::UriAutolink => "uri-autolink",
            TokenName::EmailAutolink => "email-autolink",
            TokenName::RawHtml => "raw-html",
            TokenName::Emphasis => "emphasis",
            TokenName::Link => "link",
            TokenName::Image => "image",
        }
    }
}

/// The per-kind payload of a token. Every field here is a reconstruction
/// field: concatenated in stream order they reproduce the original source,
/// modulo the normalizations the grammar itself performs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum TokenData {
    BlankLine {
        extracted_whitespace: String,
    },
    Paragraph {
        /// Leading whitespace for the opening line and each continuation
        /// line, joined with `\n`.
        extracted_whitespace: String,
        /// Whitespace trimmed from the very end of the paragraph so that it
        /// does not terminate with a spurious hard break.
        final_whitespace: String,
    },
    AtxHeading {
        hash_count: usize,
        remove_trailing_count: usize,
        extracted_whitespace: String,
    },
    SetextHeading {
        heading_character: char,
        underline: String,
        original_line_number: usize,
        original_column_number: usize,
        final_whitespace: String,
    },
    IndentedCodeBlock {
        extracted_whitespace: String,
    },
    FencedCodeBlock {
        fence_character: char,
        fence_count: usize,
        info_string: String,
        text_after_info: String,
        extracted_whitespace: String,
        pre_info_whitespace: String,
    },
    HtmlBlock,
    ThematicBreak {
        start_character: char,
        extracted_whitespace: String,
        rest_of_line: String,
    },
    LinkReferenceDefinition {
        did_add_definition: bool,
        extracted_whitespace: String,
        link_name: String,
        link_name_debug: String,
        link_destination_whitespace: String,
        link_destination: String,
        link_destination_raw: String,
        link_title_whitespace: String,
        link_title: String,
        link_title_raw: String,
        end_whitespace: String,
    },
    BlockQuote {
        extracted_whitespace: String,
    },
    UnorderedListStart {
        list_start_sequence: char,
        indent_level: usize,
        extracted_whitespace: String,
        is_loose: bool,
    },
    OrderedListStart {
        list_start_sequence: char,
        list_start_content: String,
        indent_level: usize,
        extracted_whitespace: String,
        is_loose: bool,
    },
    NewListItem {
        indent_level: usize,
    },
    Text {
        token_text: String,
        extracted_whitespace: String,
        end_whitespace: String,
    },
    InlineCodeSpan {
        span_text: String,
        backtick_count: usize,
        leading_whitespace: String,
        trailing_whitespace: String,
    },
    HardBreak {
        line_end: String,
    },
    UriAutolink {
        autolink_text: String,
    },
    EmailAutolink {
        autolink_text: String,
    },
    RawHtml {
        raw_tag: String,
    },
    Emphasis {
        emphasis_length: usize,
        emphasis_character: char,
    },
    Link {
        link_uri: String,
        link_title: String,
        label_debug: String,
    },
    Image {
        image_uri: String,
        image_title: String,
        image_alt_text: String,
    },
    /// The end marker for any scope-opening token. `extra_end_data` captures
    /// a closing sequence when one exists in the source (a closing code
    /// fence, a trailing ATX hash run).
    End {
        name: TokenName,
        extracted_whitespace: String,
        extra_end_data: Option<String>,
    },
}

/// A single element of a tokenized stream, carrying the original source
/// position and the per-kind reconstruction payload. A `(0,0)` position marks
/// a synthesized token (most end markers) that inherits its location from its
/// start.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarkdownToken {
    pub line_number: usize,
    pub column_number: usize,
    pub data: TokenData,
}

impl MarkdownToken {
    pub fn new(line_number: usize, column_number: usize, data: TokenData) -> Self {
        Self {
            line_number,
            column_number,
            data,
        }
    }

    pub fn at_marker(marker: &PositionMarker, data: TokenData) -> Self {
        Self {
            line_number: marker.line_number,
            column_number: marker.column_number(),
            data,
        }
    }

    pub fn synthesized(data: TokenData) -> Self {
        Self {
            line_number: 0,
            column_number: 0,
            data,
        }
    }

    pub fn end(name: TokenName, extracted_whitespace: &str, extra_end_data: Option<&str>) -> Self {
        Self::synthesized(TokenData::End {
            name,
            extracted_whitespace: extracted_whitespace.to_string(),
            extra_end_data: extra_end_data.map(str::to_string),
        })
    }

    pub fn end_at(
        line_number: usize,
        column_number: usize,
        name: TokenName,
        extracted_whitespace: &str,
        extra_end_data: Option<&str>,
    ) -> Self {
        Self::new(
            line_number,
            column_number,
            TokenData::End {
                name,
                extracted_whitespace: extracted_whitespace.to_string(),
                extra_end_data: extra_end_data.map(str::to_string),
            },
        )
    }

    /// The kind tag for this token, independent of whether it is a start or
    /// an end marker.
    pub fn name(&self) -> TokenName {
        match &self.data {
            TokenData::BlankLine { .. } => TokenName::BlankLine,
            TokenData::Paragraph { .. } => TokenName::Paragraph,
            TokenData::AtxHeading { .. } => TokenName::AtxHeading,
            TokenData::SetextHeading { .. } => TokenName::SetextHeading,
            TokenData::IndentedCodeBlock { .. } => TokenName::IndentedCodeBlock,
            TokenData::FencedCodeBlock { .. } => TokenName::FencedCodeBlock,
            TokenData::HtmlBlock => TokenName::HtmlBlock,
            TokenData::ThematicBreak { .. } => TokenName::ThematicBreak,
            TokenData::LinkReferenceDefinition { .. } => TokenName::LinkReferenceDefinition,
            TokenData::BlockQuote { .. } => TokenName::BlockQuote,
            TokenData::UnorderedListStart { .. } => TokenName::UnorderedListStart,
            TokenData::OrderedListStart { .. } => TokenName::OrderedListStart,
            TokenData::NewListItem { .. } => TokenName::NewListItem,
            TokenData::Text { .. } => TokenName::Text,
            TokenData::InlineCodeSpan { .. } => TokenName::InlineCodeSpan,
            TokenData::HardBreak { .. } => TokenName::HardBreak,
            TokenData::UriAutolink { .. } => TokenName::UriAutolink,
            TokenData::EmailAutolink { .. } => TokenName::EmailAutolink,
            TokenData::RawHtml { .. } => TokenName::RawHtml,
            TokenData::Emphasis { .. } => TokenName::Emphasis,
            TokenData::Link { .. } => TokenName::Link,
            TokenData::Image { .. } => TokenName::Image,
            TokenData::End { name, .. } => *name,
        }
    }

    pub fn class(&self) -> TokenClass {
        match self.name() {
            TokenName::BlockQuote
            | TokenName::UnorderedListStart
            | TokenName::OrderedListStart
            | TokenName::NewListItem => TokenClass::ContainerBlock,
            TokenName::BlankLine
            | TokenName::Paragraph
            | TokenName::AtxHeading
            | TokenName::SetextHeading
            | TokenName::IndentedCodeBlock
            | TokenName::FencedCodeBlock
            | TokenName::HtmlBlock
            | TokenName::ThematicBreak
            | TokenName::LinkReferenceDefinition => TokenClass::LeafBlock,
            _ => TokenClass::Inline,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self.data, TokenData::End { .. })
    }

    pub fn is_end_of(&self, name: TokenName) -> bool {
        matches!(&self.data, TokenData::End { name: end_name, .. } if *end_name == name)
    }

    pub fn is_blank_line(&self) -> bool {
        matches!(self.data, TokenData::BlankLine { .. })
    }

    pub fn is_paragraph(&self) -> bool {
        matches!(self.data, TokenData::Paragraph { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self.data, TokenData::Text { .. })
    }

    pub fn is_setext_heading(&self) -> bool {
        matches!(self.data, TokenData::SetextHeading { .. })
    }

    pub fn is_atx_heading(&self) -> bool {
        matches!(self.data, TokenData::AtxHeading { .. })
    }

    pub fn is_list_start(&self) -> bool {
        matches!(
            self.data,
            TokenData::UnorderedListStart { .. } | TokenData::OrderedListStart { .. }
        )
    }

    pub fn is_new_list_item(&self) -> bool {
        matches!(self.data, TokenData::NewListItem { .. })
    }

    pub fn is_any_list_token(&self) -> bool {
        self.is_list_start() || self.is_new_list_item()
    }

    pub fn is_indented_code_block(&self) -> bool {
        matches!(self.data, TokenData::IndentedCodeBlock { .. })
    }

    pub fn is_fenced_code_block(&self) -> bool {
        matches!(self.data, TokenData::FencedCodeBlock { .. })
    }

    pub fn is_code_block(&self) -> bool {
        self.is_indented_code_block() || self.is_fenced_code_block()
    }

    pub fn is_html_block(&self) -> bool {
        matches!(self.data, TokenData::HtmlBlock)
    }

    pub fn is_block_quote(&self) -> bool {
        matches!(self.data, TokenData::BlockQuote { .. })
    }

    pub fn is_link_reference_definition(&self) -> bool {
        matches!(self.data, TokenData::LinkReferenceDefinition { .. })
    }

    /// Returns whether the token is one of the block tokens.
    pub fn is_block(&self) -> bool {
        !self.is_end()
            && matches!(
                self.class(),
                TokenClass::LeafBlock | TokenClass::ContainerBlock
            )
            && !self.is_blank_line()
            && !self.is_link_reference_definition()
    }

    /// Set the whitespace trimmed from the very end of a paragraph or setext
    /// heading, removed to prevent hard breaks at the end of the block.
    pub(crate) fn set_final_whitespace(&mut self, whitespace: String) {
        match &mut self.data {
            TokenData::Paragraph {
                final_whitespace, ..
            }
            | TokenData::SetextHeading {
                final_whitespace, ..
            } => *final_whitespace = whitespace,
            _ => {}
        }
    }

    /// Record the loose/tight determination for a list once it closes.
    pub(crate) fn set_loose(&mut self, loose: bool) {
        match &mut self.data {
            TokenData::UnorderedListStart { is_loose, .. }
            | TokenData::OrderedListStart { is_loose, .. } => *is_loose = loose,
            _ => {}
        }
    }

    /// Whether the list start token was determined to be loose. Only
    /// meaningful for `ulist` and `olist` tokens.
    pub fn is_loose(&self) -> bool {
        match &self.data {
            TokenData::UnorderedListStart { is_loose, .. }
            | TokenData::OrderedListStart { is_loose, .. } => *is_loose,
            _ => false,
        }
    }

    fn compose_extra_data(&self) -> String {
        match &self.data {
            TokenData::BlankLine {
                extracted_whitespace,
            } => extracted_whitespace.clone(),
            TokenData::Paragraph {
                extracted_whitespace,
                final_whitespace,
            } => {
                if final_whitespace.is_empty() {
                    extracted_whitespace.clone()
                } else {
                    format!("{extracted_whitespace}:{final_whitespace}")
                }
            }
            TokenData::AtxHeading {
                hash_count,
                remove_trailing_count,
                extracted_whitespace,
            } => format!("{hash_count}:{remove_trailing_count}:{extracted_whitespace}"),
            TokenData::SetextHeading {
                heading_character,
                underline,
                original_line_number,
                original_column_number,
                final_whitespace,
            } => {
                let mut extra = format!(
                    "{heading_character}:{underline}:({original_line_number},{original_column_number})"
                );
                if !final_whitespace.is_empty() {
                    extra.push(':');
                    extra.push_str(final_whitespace);
                }
                extra
            }
            TokenData::IndentedCodeBlock {
                extracted_whitespace,
            } => extracted_whitespace.clone(),
            TokenData::FencedCodeBlock {
                fence_character,
                fence_count,
                info_string,
                text_after_info,
                extracted_whitespace,
                pre_info_whitespace,
            } => format!(
                "{fence_character}:{fence_count}:{info_string}:{text_after_info}:{extracted_whitespace}:{pre_info_whitespace}"
            ),
            TokenData::HtmlBlock => String::new(),
            TokenData::ThematicBreak {
                start_character,
                extracted_whitespace,
                rest_of_line,
            } => format!("{start_character}:{extracted_whitespace}:{rest_of_line}"),
            TokenData::LinkReferenceDefinition {
                did_add_definition,
                extracted_whitespace,
                link_name,
                link_name_debug,
                link_destination_whitespace,
                link_destination,
                link_destination_raw,
                link_title_whitespace,
                link_title,
                link_title_raw,
                end_whitespace,
            } => format!(
                "{did_add_definition}:{extracted_whitespace}:{link_name}:{link_name_debug}:{link_destination_whitespace}:{link_destination}:{link_destination_raw}:{link_title_whitespace}:{link_title}:{link_title_raw}:{end_whitespace}"
            ),
            TokenData::BlockQuote {
                extracted_whitespace,
            } => extracted_whitespace.clone(),
            TokenData::UnorderedListStart {
                list_start_sequence,
                indent_level,
                extracted_whitespace,
                ..
            } => format!("{list_start_sequence}::{indent_level}:{extracted_whitespace}"),
            TokenData::OrderedListStart {
                list_start_sequence,
                list_start_content,
                indent_level,
                extracted_whitespace,
                ..
            } => format!(
                "{list_start_sequence}:{list_start_content}:{indent_level}:{extracted_whitespace}"
            ),
            TokenData::NewListItem { indent_level } => format!("{indent_level}"),
            TokenData::Text {
                token_text,
                extracted_whitespace,
                end_whitespace,
            } => {
                if end_whitespace.is_empty() {
                    format!("{token_text}:{extracted_whitespace}")
                } else {
                    format!("{token_text}:{extracted_whitespace}:{end_whitespace}")
                }
            }
            TokenData::InlineCodeSpan {
                span_text,
                backtick_count,
                leading_whitespace,
                trailing_whitespace,
            } => {
                format!("{span_text}:{backtick_count}:{leading_whitespace}:{trailing_whitespace}")
            }
            TokenData::HardBreak { line_end } => line_end.clone(),
            TokenData::UriAutolink { autolink_text } => autolink_text.clone(),
            TokenData::EmailAutolink { autolink_text } => autolink_text.clone(),
            TokenData::RawHtml { raw_tag } => raw_tag.clone(),
            TokenData::Emphasis {
                emphasis_length,
                emphasis_character,
            } => format!("{emphasis_length}:{emphasis_character}"),
            TokenData::Link {
                link_uri,
                link_title,
                label_debug,
            } => format!("{link_uri}:{link_title}:{label_debug}"),
            TokenData::Image {
                image_uri,
                image_title,
                image_alt_text,
            } => format!("{image_uri}:{image_title}:{image_alt_text}"),
            TokenData::End {
                extracted_whitespace,
                extra_end_data,
                ..
            } => match extra_end_data {
                Some(extra) => format!("{extracted_whitespace}:{extra}"),
                None => extracted_whitespace.clone(),
            },
        }
    }

    /// Returns true if the serialized form always carries a `:` separator,
    /// even when the extra data itself is empty.
    fn always_shows_extra(&self) -> bool {
        !self.is_end()
            && matches!(
                self.data,
                TokenData::Paragraph { .. }
                    | TokenData::BlankLine { .. }
                    | TokenData::BlockQuote { .. }
            )
    }
}

impl fmt::Display for MarkdownToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        if self.is_end() {
            f.write_str("end-")?;
        }
        f.write_str(self.name().as_str())?;
        if self.line_number != 0 || self.column_number != 0 {
            write!(f, "({},{})", self.line_number, self.column_number)?;
        }
        let extra = self.compose_extra_data();
        if !extra.is_empty() || self.always_shows_extra() {
            write!(f, ":{extra}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn serializes_positions_and_extra_data() {
        let token = MarkdownToken::new(
            1,
            1,
            TokenData::UnorderedListStart {
                list_start_sequence: '-',
                indent_level: 2,
                extracted_whitespace: String::new(),
                is_loose: false,
            },
        );
        assert_eq!(token.to_string(), "[ulist(1,1):-::2:]");
    }

    #[test]
    fn end_tokens_omit_empty_extra() {
        let token = MarkdownToken::end(TokenName::Paragraph, "", None);
        assert_eq!(token.to_string(), "[end-para]");

        let with_data = MarkdownToken::end(TokenName::FencedCodeBlock, "", Some("```"));
        assert_eq!(with_data.to_string(), "[end-fcode-block::```]");
    }

    #[test]
    fn paragraph_always_shows_separator() {
        let token = MarkdownToken::new(
            1,
            1,
            TokenData::Paragraph {
                extracted_whitespace: String::new(),
                final_whitespace: String::new(),
            },
        );
        assert_eq!(token.to_string(), "[para(1,1):]");
    }

    #[test]
    fn text_appends_end_whitespace_only_when_present() {
        let token = MarkdownToken::synthesized(TokenData::Text {
            token_text: "foo".into(),
            extracted_whitespace: String::new(),
            end_whitespace: String::new(),
        });
        assert_eq!(token.to_string(), "[text:foo:]");
    }
}
