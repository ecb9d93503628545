//! Link and image resolution. A `]` searches the delimiter arena backward
//! for the nearest unspent `[` or `![` opener, then tries the four resource
//! forms in priority order: inline, collapsed reference, full reference, and
//! shortcut reference.

use log::debug;

use crate::block::link_reference::{scan_label, scan_title};
use crate::text::{
    normalize_link_destination, normalize_link_label, normalize_link_title,
    resolve_backslash_escapes, resolve_character_references,
};
use crate::token::{MarkdownToken, TokenData, TokenName};

use super::{emphasis, InlineItem, InlineProcessor};

struct ResolvedTarget {
    uri: String,
    title: String,
    /// The reference label for the debug field; empty for inline links.
    label: String,
    /// Byte index just past the whole construct.
    end: usize,
}

pub(super) fn handle_close_bracket(p: &mut InlineProcessor) {
    let close_position = p.position;

    let Some(opener_index) = p
        .delimiters
        .iter()
        .rposition(|delimiter| delimiter.character == '[' && !delimiter.is_spent())
    else {
        // No opener: the bracket is literal text.
        p.keep_literal(close_position, close_position + 1);
        return;
    };

    if !p.delimiters[opener_index].is_active() {
        // The opener was deactivated (links cannot nest); it pairs with
        // this bracket but both stay literal.
        p.delimiters[opener_index].mark_spent();
        p.keep_literal(close_position, close_position + 1);
        return;
    }

    let enclosed =
        p.text[p.delimiters[opener_index].source_offset..close_position].to_string();
    let after_bracket = close_position + 1;

    let Some(target) = resolve_target(p, &enclosed, after_bracket) else {
        // A matched but unresolvable pair: the opener can never match a
        // later bracket either.
        p.delimiters[opener_index].mark_spent();
        p.keep_literal(close_position, close_position + 1);
        return;
    };

    p.flush_text_run(close_position);
    debug!("resolved link target '{}'", target.uri);

    // Emphasis inside the label resolves before the link token is built so
    // image alt text sees the final shape of the content.
    emphasis::process_emphasis(p, opener_index + 1, usize::MAX);

    let is_image = p.delimiters[opener_index].is_image;
    let opener_item_index = p.delimiters[opener_index].item_index;
    let data = if is_image {
        TokenData::Image {
            image_uri: target.uri,
            image_title: target.title,
            image_alt_text: collect_alt_text(p, opener_item_index + 1),
        }
    } else {
        TokenData::Link {
            link_uri: target.uri,
            link_title: target.title,
            label_debug: target.label,
        }
    };

    {
        let opener = &mut p.delimiters[opener_index];
        opener.mark_spent();
        opener.deactivate();
        opener.resolved = Some(MarkdownToken::new(
            opener.line_number,
            opener.column_number,
            data,
        ));
    }

    // "mark all earlier `[` openers inactive (links cannot nest)".
    if !is_image {
        for delimiter in &mut p.delimiters[..opener_index] {
            if delimiter.character == '[' && !delimiter.is_image {
                delimiter.deactivate();
            }
        }
    }
    // Delimiters inside the label are finished either way.
    for delimiter in &mut p.delimiters[opener_index + 1..] {
        delimiter.deactivate();
    }

    let (line, column) = p.position_at(close_position);
    let name = if is_image {
        TokenName::Image
    } else {
        TokenName::Link
    };
    p.push_token(MarkdownToken::end_at(line, column, name, "", None));
    p.position = target.end;
}

fn resolve_target(
    p: &InlineProcessor,
    enclosed: &str,
    after_bracket: usize,
) -> Option<ResolvedTarget> {
    let bytes = p.text.as_bytes();

    if bytes.get(after_bracket) == Some(&b'(') {
        if let Some(target) = scan_inline_resource(p, after_bracket) {
            return Some(target);
        }
    }

    if bytes.get(after_bracket) == Some(&b'[') {
        // Full reference: `][label]`.
        if let Some((label, after_label)) = scan_label(p.text, after_bracket) {
            let reference = p.registry.get(&normalize_link_label(&label))?;
            return Some(ResolvedTarget {
                uri: reference.destination.clone(),
                title: reference.title.clone(),
                label,
                end: after_label,
            });
        }
        // Collapsed reference: `][]`.
        if p.text[after_bracket..].starts_with("[]") {
            let reference = p.registry.get(&normalize_link_label(enclosed))?;
            return Some(ResolvedTarget {
                uri: reference.destination.clone(),
                title: reference.title.clone(),
                label: enclosed.to_string(),
                end: after_bracket + 2,
            });
        }
        return None;
    }

    // Shortcut reference: bare `]`.
    let reference = p.registry.get(&normalize_link_label(enclosed))?;
    Some(ResolvedTarget {
        uri: reference.destination.clone(),
        title: reference.title.clone(),
        label: enclosed.to_string(),
        end: after_bracket,
    })
}

/// Scan an inline resource `(destination "title")` starting at the `(`.
fn scan_inline_resource(p: &InlineProcessor, start: usize) -> Option<ResolvedTarget> {
    let text = p.text;
    let bytes = text.as_bytes();
    let mut index = skip_resource_whitespace(bytes, start + 1);

    if bytes.get(index) == Some(&b')') {
        return Some(ResolvedTarget {
            uri: String::new(),
            title: String::new(),
            label: String::new(),
            end: index + 1,
        });
    }

    let (destination, after_destination) = scan_inline_destination(text, index)?;
    index = skip_resource_whitespace(bytes, after_destination);
    let had_whitespace = index > after_destination;

    let mut title = String::new();
    if had_whitespace && matches!(bytes.get(index), Some(b'"' | b'\'' | b'(')) {
        let (_, inner, after_title) = scan_title(text, index)?;
        title = normalize_link_title(&inner, p.entities);
        index = skip_resource_whitespace(bytes, after_title);
    }

    if bytes.get(index) != Some(&b')') {
        return None;
    }

    Some(ResolvedTarget {
        uri: normalize_link_destination(&destination, p.entities),
        title,
        label: String::new(),
        end: index + 1,
    })
}

/// An inline destination: `<...>`, or a bare run where an unbalanced `)`
/// ends the destination rather than poisoning it.
fn scan_inline_destination(text: &str, start: usize) -> Option<(String, usize)> {
    let bytes = text.as_bytes();

    if bytes.get(start) == Some(&b'<') {
        let mut index = start + 1;
        while index < bytes.len() {
            match bytes[index] {
                b'>' => return Some((text[start + 1..index].to_string(), index + 1)),
                b'<' | b'\n' => return None,
                b'\\' => index += escape_width(bytes, index),
                _ => index += 1,
            }
        }
        return None;
    }

    let mut index = start;
    let mut depth = 0usize;
    while index < bytes.len() {
        match bytes[index] {
            b' ' | b'\t' | b'\n' => break,
            b'\\' => index += escape_width(bytes, index),
            b'(' => {
                depth += 1;
                index += 1;
            }
            b')' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                index += 1;
            }
            c if c.is_ascii_control() => break,
            _ => index += 1,
        }
    }
    if index == start || depth != 0 {
        return None;
    }
    let index = index.min(text.len());
    Some((text[start..index].to_string(), index))
}

/// Gather the plain-text rendering of the working items from `from` onward
/// for an image's alt text: literal text with escapes and references
/// resolved, code span and autolink bodies, leftover delimiter characters.
fn collect_alt_text(p: &InlineProcessor, from: usize) -> String {
    let mut alt = String::new();
    for item in &p.items[from..] {
        match item {
            InlineItem::Token(token) => match &token.data {
                TokenData::Text { token_text, .. } => {
                    alt.push_str(&resolve_character_references(
                        &resolve_backslash_escapes(token_text),
                        p.entities,
                    ));
                }
                TokenData::InlineCodeSpan { span_text, .. } => alt.push_str(span_text),
                TokenData::UriAutolink { autolink_text }
                | TokenData::EmailAutolink { autolink_text } => alt.push_str(autolink_text),
                TokenData::HardBreak { .. } => alt.push('\n'),
                _ => {}
            },
            InlineItem::Delimiter(index) => {
                let node = &p.delimiters[*index];
                if node.resolved.is_some() {
                    continue;
                }
                if node.is_emphasis() {
                    for _ in 0..node.remaining() {
                        alt.push(node.character);
                    }
                } else if node.is_spent() {
                    alt.push_str(if node.is_image { "![" } else { "[" });
                }
            }
        }
    }
    alt
}

fn skip_resource_whitespace(bytes: &[u8], mut index: usize) -> usize {
    while index < bytes.len() && matches!(bytes[index], b' ' | b'\t' | b'\n') {
        index += 1;
    }
    index
}

fn escape_width(bytes: &[u8], index: usize) -> usize {
    if bytes.get(index + 1).is_some_and(u8::is_ascii_punctuation) {
        2
    } else {
        1
    }
}
