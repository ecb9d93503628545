//! Per-line classification checks for leaf blocks. Each function examines
//! the content of a line *after* container prefixes and leading whitespace
//! have been measured by the caller.

use crate::text::{collect_while_char, extract_spaces, is_blank, whitespace_width};

/// The parsed shape of an ATX heading opener.
pub(crate) struct AtxPrefix {
    pub hash_count: usize,
    /// Byte index of the first content character after the hashes and the
    /// separating whitespace.
    pub content_index: usize,
    /// The whitespace between the hash run and the content.
    pub separator_whitespace: String,
}

/// Check for an ATX heading: one to six `#` characters followed by
/// whitespace or the end of the line.
pub(crate) fn parse_atx_prefix(content: &str) -> Option<AtxPrefix> {
    let (hash_count, after_hashes) = collect_while_char(content, 0, b'#');
    if hash_count == 0 || hash_count > 6 {
        return None;
    }
    if after_hashes < content.len() && !matches!(content.as_bytes()[after_hashes], b' ' | b'\t') {
        return None;
    }
    let (content_index, separator) = extract_spaces(content, after_hashes);
    Some(AtxPrefix {
        hash_count,
        content_index,
        separator_whitespace: separator.to_string(),
    })
}

/// Check for a thematic break: three or more of the same `-`, `_`, or `*`
/// character with nothing but whitespace between and after them.
pub(crate) fn is_thematic_break(content: &str) -> bool {
    let mut count = 0;
    let mut expected = b' ';
    for byte in content.bytes() {
        match byte {
            b' ' | b'\t' => continue,
            b'-' | b'_' | b'*' => {
                if expected == b' ' {
                    expected = byte;
                }
                if byte == expected {
                    count += 1;
                } else {
                    return false;
                }
            }
            _ => return false,
        }
    }
    count >= 3
}

/// Check for a setext heading underline: a run of `=` or `-` characters
/// followed only by whitespace. The caller decides whether a paragraph is
/// open to be promoted.
pub(crate) fn parse_setext_underline(content: &str) -> Option<(char, usize)> {
    let first = *content.as_bytes().first()?;
    if !matches!(first, b'=' | b'-') {
        return None;
    }
    let (count, after) = collect_while_char(content, 0, first);
    if is_blank(&content[after..]) {
        Some((first as char, count))
    } else {
        None
    }
}

/// The parsed shape of a fenced code block opener.
pub(crate) struct FenceOpen {
    pub fence_character: char,
    pub fence_count: usize,
    pub info_string: String,
    pub text_after_info: String,
    pub pre_info_whitespace: String,
}

/// Check for a fenced code block opening: at least three backticks or tildes
/// of the same character. The info string of a backtick fence cannot itself
/// contain a backtick.
pub(crate) fn parse_fence_open(content: &str) -> Option<FenceOpen> {
    let first = *content.as_bytes().first()?;
    if !matches!(first, b'`' | b'~') {
        return None;
    }
    let (fence_count, after_fence) = collect_while_char(content, 0, first);
    if fence_count < 3 {
        return None;
    }

    let (info_start, pre_info_whitespace) = extract_spaces(content, after_fence);
    let trailing = &content[info_start..];
    if first == b'`' && trailing.contains('`') {
        return None;
    }

    let (info_string, text_after_info) = match trailing.find(|c: char| c == ' ' || c == '\t') {
        Some(split) => (&trailing[..split], &trailing[split..]),
        None => (trailing, ""),
    };

    Some(FenceOpen {
        fence_character: first as char,
        fence_count,
        info_string: info_string.to_string(),
        text_after_info: text_after_info.to_string(),
        pre_info_whitespace: pre_info_whitespace.to_string(),
    })
}

/// Check whether a line closes an open fence: a run of the same character at
/// least as long as the opener, with only whitespace after it.
pub(crate) fn is_fence_close(content: &str, fence_character: char, opening_count: usize) -> bool {
    let (count, after) = collect_while_char(content, 0, fence_character as u8);
    count >= opening_count && is_blank(&content[after..])
}

/// The parsed shape of a list item marker, before the indent tie-break has
/// been applied.
pub(crate) struct ListMarker {
    pub ordered: bool,
    pub sequence_character: char,
    /// The digit run of an ordered marker, empty for bullets.
    pub start_content: String,
    /// Byte length of the marker itself (digits plus delimiter, or one
    /// bullet character).
    pub marker_width: usize,
    /// Byte index where item content begins, after the post-marker spaces
    /// that fold into the item indent.
    pub content_index: usize,
    /// The indent contribution of the marker and its following whitespace,
    /// measured in columns from the marker's own column.
    pub indent_width: usize,
    /// True when there is nothing but whitespace after the marker.
    pub is_empty_item: bool,
}

/// Check for a bullet or ordered list marker at the start of `content`.
/// Ordered markers allow at most nine digits. A marker must be followed by
/// whitespace (or the end of the line for an empty item).
pub(crate) fn parse_list_marker(content: &str) -> Option<ListMarker> {
    let bytes = content.as_bytes();
    let first = *bytes.first()?;

    let (ordered, sequence_character, start_content, marker_width) = match first {
        b'-' | b'+' | b'*' => (false, first as char, String::new(), 1),
        b'0'..=b'9' => {
            let (digit_count, after_digits) = {
                let mut index = 0;
                while index < bytes.len() && bytes[index].is_ascii_digit() {
                    index += 1;
                }
                (index, index)
            };
            if digit_count > 9 || after_digits >= bytes.len() {
                return None;
            }
            let delimiter = bytes[after_digits];
            if !matches!(delimiter, b'.' | b')') {
                return None;
            }
            (
                true,
                delimiter as char,
                content[..digit_count].to_string(),
                digit_count + 1,
            )
        }
        _ => return None,
    };

    let after_marker = &content[marker_width..];
    let (spaces_end, spaces) = extract_spaces(after_marker, 0);
    let is_empty_item = is_blank(after_marker);
    if !is_empty_item && spaces.is_empty() {
        return None;
    }

    // The item indent is the marker width plus the spaces after it, clamped
    // to the 1..=4 range. An empty item, or one whose content is pushed five
    // or more columns out, indents exactly one column past the marker.
    let spaces_width = whitespace_width(spaces, 0);
    let (indent_width, consumed_spaces) = if is_empty_item || spaces_width >= 5 {
        (marker_width + 1, if is_empty_item { 0 } else { 1 })
    } else {
        (marker_width + spaces_width, spaces_end)
    };

    Some(ListMarker {
        ordered,
        sequence_character,
        start_content,
        marker_width,
        content_index: marker_width + consumed_spaces,
        indent_width,
        is_empty_item,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    #[test_case("# foo", Some((1, 2)); "single hash")]
    #[test_case("###### foo", Some((6, 7)); "six hashes")]
    #[test_case("####### foo", None; "seven hashes")]
    #[test_case("#foo", None; "no separator")]
    #[test_case("#", Some((1, 1)); "hash alone")]
    fn atx_prefixes(content: &str, expected: Option<(usize, usize)>) {
        let parsed = parse_atx_prefix(content).map(|p| (p.hash_count, p.content_index));
        assert_eq!(parsed, expected);
    }

    #[test_case("***", true; "asterisks no spaces")]
    #[test_case("- - -", true; "hyphens with spaces")]
    #[test_case("__ __ __", true; "underscores with spaces")]
    #[test_case("**", false; "too few asterisks")]
    #[test_case("*-*", false; "mixed markers")]
    #[test_case("---x", false; "trailing non marker char")]
    fn thematic_breaks(content: &str, expected: bool) {
        assert_eq!(is_thematic_break(content), expected);
    }

    #[test_case("```", Some(('`', 3)); "plain backticks")]
    #[test_case("~~~~rust", Some(('~', 4)); "tildes with info")]
    #[test_case("``", None; "too short")]
    #[test_case("```a`b", None; "backtick in info")]
    fn fence_opens(content: &str, expected: Option<(char, usize)>) {
        let parsed = parse_fence_open(content).map(|f| (f.fence_character, f.fence_count));
        assert_eq!(parsed, expected);
    }

    #[test_case("- foo", Some(('-', 2)); "bullet")]
    #[test_case("1. foo", Some(('.', 3)); "ordered dot")]
    #[test_case("3) foo", Some((')', 3)); "ordered paren")]
    #[test_case("1234567890. x", None; "too many digits")]
    #[test_case("-foo", None; "no space after bullet")]
    #[test_case("-", Some(('-', 2)); "empty item")]
    fn list_markers(content: &str, expected: Option<(char, usize)>) {
        let parsed =
            parse_list_marker(content).map(|m| (m.sequence_character, m.indent_width));
        assert_eq!(parsed, expected);
    }

    #[test]
    fn setext_underlines() {
        assert_eq!(parse_setext_underline("==="), Some(('=', 3)));
        assert_eq!(parse_setext_underline("--  "), Some(('-', 2)));
        assert_eq!(parse_setext_underline("==x"), None);
        assert_eq!(parse_setext_underline("x"), None);
    }
}
