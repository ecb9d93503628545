//! Code spans have the highest precedence of any inline construct: a run of
//! N backticks matches the next run of exactly N backticks, taking everything
//! between them verbatim.

use crate::text::collect_while_char;
use crate::token::{MarkdownToken, TokenData};

use super::InlineProcessor;

/// Prospectively scan ahead for a closing backtick run. If none exists the
/// opening run is just literal text and scanning continues after it.
pub(super) fn parse_code_span(p: &mut InlineProcessor) {
    let open_start = p.position;
    let (open_count, after_open) = collect_while_char(p.text, open_start, b'`');

    let bytes = p.text.as_bytes();
    let mut index = after_open;
    let mut close_start = None;
    while index < bytes.len() {
        if bytes[index] == b'`' {
            let (count, after) = collect_while_char(p.text, index, b'`');
            if count == open_count {
                close_start = Some(index);
                break;
            }
            index = after;
        } else {
            index += 1;
        }
    }

    let Some(close_start) = close_start else {
        p.keep_literal(open_start, after_open);
        return;
    };

    let content = &p.text[after_open..close_start];

    // "strip exactly one space from each end iff the content begins and
    // ends with a space and is not all spaces". Line endings count as
    // strippable space here.
    let starts_padded = content.starts_with(' ') || content.starts_with('\n');
    let ends_padded = content.ends_with(' ') || content.ends_with('\n');
    let all_space = content.chars().all(|c| c == ' ' || c == '\n');
    let (span_text, leading, trailing) = if starts_padded && ends_padded && !all_space {
        (
            content[1..content.len() - 1].to_string(),
            content[..1].to_string(),
            content[content.len() - 1..].to_string(),
        )
    } else {
        (content.to_string(), String::new(), String::new())
    };

    p.flush_text_run(open_start);
    let (line, column) = p.position_at(open_start);
    p.push_token(MarkdownToken::new(
        line,
        column,
        TokenData::InlineCodeSpan {
            span_text,
            backtick_count: open_count,
            leading_whitespace: leading,
            trailing_whitespace: trailing,
        },
    ));
    p.position = close_start + open_count;
}
