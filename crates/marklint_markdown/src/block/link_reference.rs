//! The write-once link reference registry and the parser that extracts
//! `[label]: destination "title"` definitions from a closed paragraph's
//! buffered text.

use log::debug;
use rustc_hash::FxHashMap;

use crate::entities::EntityTable;
use crate::text::{
    extract_spaces, is_blank, normalize_link_destination, normalize_link_label,
    normalize_link_title, whitespace_width,
};

/// A registered reference target. `original_label` keeps the label as it
/// appeared in the source for debugging output.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LinkReference {
    pub destination: String,
    pub title: String,
    pub original_label: String,
}

/// Mapping from normalized label to reference target. Entries are inserted
/// on first definition only; later definitions of the same normalized label
/// are ignored.
#[derive(Default)]
pub(crate) struct LinkReferenceRegistry {
    map: FxHashMap<String, LinkReference>,
}

impl LinkReferenceRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a definition, returning false when the normalized label was
    /// already present and the new definition was discarded.
    pub(crate) fn add(&mut self, normalized_label: &str, reference: LinkReference) -> bool {
        if self.map.contains_key(normalized_label) {
            debug!("ignoring redefinition of link label '{normalized_label}'");
            return false;
        }
        self.map.insert(normalized_label.to_string(), reference);
        true
    }

    pub(crate) fn get(&self, normalized_label: &str) -> Option<&LinkReference> {
        self.map.get(normalized_label)
    }
}

/// A successfully parsed definition, including every piece of surrounding
/// text needed to reconstruct the consumed lines.
pub(crate) struct ParsedDefinition {
    pub consumed_lines: usize,
    pub extracted_whitespace: String,
    pub raw_label: String,
    pub normalized_label: String,
    pub destination_whitespace: String,
    pub raw_destination: String,
    pub destination: String,
    pub title_whitespace: String,
    pub raw_title: String,
    pub title: String,
    pub end_whitespace: String,
}

/// Attempt to parse one link reference definition from the front of `raw`,
/// which holds one or more paragraph lines joined with `\n` (leading
/// whitespace included). Definitions always consume whole lines.
pub(crate) fn parse_reference_definition(
    raw: &str,
    entities: &EntityTable,
) -> Option<ParsedDefinition> {
    let (label_start, leading) = extract_spaces(raw, 0);
    if whitespace_width(leading, 0) > 3 || leading.contains('\n') {
        return None;
    }

    let (raw_label, after_label) = scan_label(raw, label_start)?;
    if raw.as_bytes().get(after_label) != Some(&b':') {
        return None;
    }
    let normalized_label = normalize_link_label(&raw_label);
    if normalized_label.is_empty() {
        return None;
    }

    let (destination_start, destination_whitespace) =
        skip_definition_whitespace(raw, after_label + 1)?;
    let (raw_destination, inner_destination, after_destination) =
        scan_destination(raw, destination_start)?;

    // If the destination is followed only by whitespace on its line, the
    // definition is already complete; a title may still extend it.
    let fallback = end_of_line_whitespace(raw, after_destination);

    let with_title = (|| {
        let (title_start, title_whitespace) = skip_definition_whitespace(raw, after_destination)?;
        if title_whitespace.is_empty() {
            return None;
        }
        let (raw_title, inner_title, after_title) = scan_title(raw, title_start)?;
        let (line_end, end_whitespace) = end_of_line_whitespace(raw, after_title)?;
        Some((
            title_whitespace,
            raw_title,
            inner_title,
            end_whitespace,
            line_end,
        ))
    })();

    let (title_whitespace, raw_title, inner_title, end_whitespace, end_index) = match with_title {
        Some((title_ws, raw_title, inner_title, end_ws, line_end)) => {
            (title_ws, raw_title, inner_title, end_ws, line_end)
        }
        None => {
            let (line_end, end_ws) = fallback?;
            (String::new(), String::new(), String::new(), end_ws, line_end)
        }
    };

    Some(ParsedDefinition {
        consumed_lines: raw[..end_index].matches('\n').count() + 1,
        extracted_whitespace: leading.to_string(),
        normalized_label,
        raw_label,
        destination_whitespace,
        destination: normalize_link_destination(&inner_destination, entities),
        raw_destination,
        title_whitespace,
        title: normalize_link_title(&inner_title, entities),
        raw_title,
        end_whitespace,
    })
}

/// Scan a bracketed label starting at `[`. Returns the label text (between
/// the brackets) and the index just past the closing `]`. Shared with the
/// inline resolver for full reference links.
pub(crate) fn scan_label(raw: &str, start: usize) -> Option<(String, usize)> {
    let bytes = raw.as_bytes();
    if bytes.get(start) != Some(&b'[') {
        return None;
    }
    let mut index = start + 1;
    let mut has_content = false;
    while index < bytes.len() {
        match bytes[index] {
            b']' => {
                if !has_content || index - start - 1 > 999 {
                    return None;
                }
                return Some((raw[start + 1..index].to_string(), index + 1));
            }
            b'[' => return None,
            b'\\' => {
                index += escape_width(bytes, index);
                has_content = true;
            }
            b' ' | b'\t' | b'\n' => index += 1,
            _ => {
                has_content = true;
                index += 1;
            }
        }
    }
    None
}

/// Skip whitespace between definition parts, allowing at most one newline.
/// Returns the index of the next significant character and the skipped text.
fn skip_definition_whitespace(raw: &str, start: usize) -> Option<(usize, String)> {
    let bytes = raw.as_bytes();
    let mut index = start;
    let mut newlines = 0;
    while index < bytes.len() {
        match bytes[index] {
            b' ' | b'\t' => index += 1,
            b'\n' => {
                newlines += 1;
                if newlines > 1 {
                    return None;
                }
                index += 1;
            }
            _ => break,
        }
    }
    if index >= bytes.len() {
        return None;
    }
    Some((index, raw[start..index].to_string()))
}

/// Scan a link destination: either `<...>` or a bare run of non-whitespace
/// characters with balanced parentheses. Returns the raw source slice, the
/// inner text to normalize, and the index past the destination.
fn scan_destination(raw: &str, start: usize) -> Option<(String, String, usize)> {
    let bytes = raw.as_bytes();
    if bytes.get(start) == Some(&b'<') {
        let mut index = start + 1;
        while index < bytes.len() {
            match bytes[index] {
                b'>' => {
                    return Some((
                        raw[start..index + 1].to_string(),
                        raw[start + 1..index].to_string(),
                        index + 1,
                    ));
                }
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
                    return None;
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
    let text = raw[start..index.min(raw.len())].to_string();
    Some((text.clone(), text, index.min(raw.len())))
}

/// Scan a quoted title starting at `"`, `'`, or `(`. Returns the raw source
/// slice, the inner text, and the index past the closing quote. Shared with
/// the inline resolver.
pub(crate) fn scan_title(raw: &str, start: usize) -> Option<(String, String, usize)> {
    let bytes = raw.as_bytes();
    let closer = match bytes.get(start)? {
        b'"' => b'"',
        b'\'' => b'\'',
        b'(' => b')',
        _ => return None,
    };
    let mut index = start + 1;
    while index < bytes.len() {
        match bytes[index] {
            b'\\' => index += escape_width(bytes, index),
            b'(' if closer == b')' => return None,
            c if c == closer => {
                return Some((
                    raw[start..index + 1].to_string(),
                    raw[start + 1..index].to_string(),
                    index + 1,
                ));
            }
            _ => index += 1,
        }
    }
    None
}

/// How far to advance past a backslash: two bytes when it escapes ASCII
/// punctuation, otherwise one. Keeps the cursor on UTF-8 boundaries.
fn escape_width(bytes: &[u8], index: usize) -> usize {
    if bytes.get(index + 1).is_some_and(u8::is_ascii_punctuation) {
        2
    } else {
        1
    }
}

/// If only whitespace remains between `start` and the end of its line,
/// return the index of that line's end (just past it, at the `\n` or the end
/// of input) and the whitespace itself.
fn end_of_line_whitespace(raw: &str, start: usize) -> Option<(usize, String)> {
    let line_end = raw[start..]
        .find('\n')
        .map_or(raw.len(), |offset| start + offset);
    let segment = &raw[start..line_end];
    if is_blank(segment) {
        Some((line_end, segment.to_string()))
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn entities() -> EntityTable {
        EntityTable::default()
    }

    #[test]
    fn simple_definition() {
        let parsed = parse_reference_definition("[foo]: /url \"title\"", &entities()).unwrap();
        assert_eq!(parsed.normalized_label, "foo");
        assert_eq!(parsed.destination, "/url");
        assert_eq!(parsed.title, "title");
        assert_eq!(parsed.consumed_lines, 1);
    }

    #[test]
    fn definition_across_lines() {
        let parsed =
            parse_reference_definition("[foo]:\n   /url\n   'the title'", &entities()).unwrap();
        assert_eq!(parsed.destination, "/url");
        assert_eq!(parsed.title, "the title");
        assert_eq!(parsed.consumed_lines, 3);
    }

    #[test]
    fn rejected_title_falls_back_to_destination_line() {
        let parsed = parse_reference_definition("[foo]: /url\n\"title\" junk", &entities()).unwrap();
        assert_eq!(parsed.title, "");
        assert_eq!(parsed.consumed_lines, 1);
    }

    #[test]
    fn trailing_junk_rejects_the_definition() {
        assert!(parse_reference_definition("[foo]: /url junk", &entities()).is_none());
        assert!(parse_reference_definition("not a def", &entities()).is_none());
    }

    #[test]
    fn registry_keeps_first_definition() {
        let mut registry = LinkReferenceRegistry::new();
        let first = LinkReference {
            destination: "/one".into(),
            title: String::new(),
            original_label: "Foo".into(),
        };
        let second = LinkReference {
            destination: "/two".into(),
            title: String::new(),
            original_label: "foo".into(),
        };
        assert!(registry.add("foo", first));
        assert!(!registry.add("foo", second));
        assert_eq!(registry.get("foo").unwrap().destination, "/one");
    }
}
