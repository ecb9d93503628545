//! Raw HTML scanning per the CommonMark productions: open tags, closing
//! tags, comments, processing instructions, declarations, and CDATA
//! sections. The scanners return the index just past the closing `>` without
//! interpreting any of the content.

/// Scan any of the six raw-HTML constructs starting at the `<` at `start`.
pub(crate) fn scan_html_construct(text: &str, start: usize) -> Option<usize> {
    let rest = &text[start..];
    if rest.starts_with("<!--") {
        return scan_comment(text, start);
    }
    if rest.starts_with("<![CDATA[") {
        return find_terminator(text, start + 9, "]]>");
    }
    if rest.starts_with("<?") {
        return find_terminator(text, start + 2, "?>");
    }
    if rest.starts_with("<!") {
        return scan_declaration(text, start);
    }
    scan_html_tag(text, start)
}

/// Scan an open or closing tag. Attribute whitespace may include line
/// endings, since inline spans carry their newlines.
pub(crate) fn scan_html_tag(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'<') {
        return None;
    }
    let mut index = start + 1;
    let closing = bytes.get(index) == Some(&b'/');
    if closing {
        index += 1;
    }

    // Tag name: an ASCII letter followed by letters, digits, or hyphens.
    if !bytes.get(index)?.is_ascii_alphabetic() {
        return None;
    }
    index += 1;
    while index < bytes.len() && (bytes[index].is_ascii_alphanumeric() || bytes[index] == b'-') {
        index += 1;
    }

    if closing {
        index = skip_whitespace(bytes, index);
        return match bytes.get(index) {
            Some(b'>') => Some(index + 1),
            _ => None,
        };
    }

    loop {
        let after_whitespace = skip_whitespace(bytes, index);
        match bytes.get(after_whitespace) {
            Some(b'>') => return Some(after_whitespace + 1),
            Some(b'/') => {
                return match bytes.get(after_whitespace + 1) {
                    Some(b'>') => Some(after_whitespace + 2),
                    _ => None,
                };
            }
            Some(_) if after_whitespace > index => {
                index = scan_attribute(bytes, after_whitespace)?;
            }
            _ => return None,
        }
    }
}

/// An attribute: a name, optionally `=` and a quoted or unquoted value.
fn scan_attribute(bytes: &[u8], start: usize) -> Option<usize> {
    let mut index = start;
    match bytes.get(index) {
        Some(c) if c.is_ascii_alphabetic() || matches!(c, b'_' | b':') => index += 1,
        _ => return None,
    }
    while index < bytes.len()
        && (bytes[index].is_ascii_alphanumeric() || matches!(bytes[index], b'_' | b'.' | b':' | b'-'))
    {
        index += 1;
    }

    let after_name = skip_whitespace(bytes, index);
    if bytes.get(after_name) != Some(&b'=') {
        return Some(index);
    }
    let value_start = skip_whitespace(bytes, after_name + 1);

    match bytes.get(value_start)? {
        quote @ (b'"' | b'\'') => {
            let mut cursor = value_start + 1;
            while cursor < bytes.len() && bytes[cursor] != *quote {
                cursor += 1;
            }
            if cursor >= bytes.len() {
                return None;
            }
            Some(cursor + 1)
        }
        _ => {
            let mut cursor = value_start;
            while cursor < bytes.len()
                && !matches!(
                    bytes[cursor],
                    b' ' | b'\t' | b'\n' | b'"' | b'\'' | b'=' | b'<' | b'>' | b'`'
                )
            {
                cursor += 1;
            }
            if cursor == value_start {
                return None;
            }
            Some(cursor)
        }
    }
}

/// A comment: `<!-->`, `<!--->`, or `<!--` + text + `-->` where the text
/// does not contain `--`.
fn scan_comment(text: &str, start: usize) -> Option<usize> {
    let rest = &text[start..];
    if rest.starts_with("<!-->") {
        return Some(start + 5);
    }
    if rest.starts_with("<!--->") {
        return Some(start + 6);
    }
    let body_start = start + 4;
    let end = find_terminator(text, body_start, "-->")?;
    let body = &text[body_start..end - 3];
    if body.contains("--") || body.ends_with('-') {
        return None;
    }
    Some(end)
}

/// A declaration: `<!`, an ASCII letter, then anything up to a `>`.
fn scan_declaration(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if !bytes.get(start + 2)?.is_ascii_alphabetic() {
        return None;
    }
    find_terminator(text, start + 3, ">")
}

/// Find `terminator` at or after `from`, returning the index just past it.
fn find_terminator(text: &str, from: usize, terminator: &str) -> Option<usize> {
    if from > text.len() {
        return None;
    }
    text[from..]
        .find(terminator)
        .map(|offset| from + offset + terminator.len())
}

fn skip_whitespace(bytes: &[u8], mut index: usize) -> usize {
    while index < bytes.len() && matches!(bytes[index], b' ' | b'\t' | b'\n') {
        index += 1;
    }
    index
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    #[test_case("<a>", Some(3))]
    #[test_case("<a/>", Some(4))]
    #[test_case("<a  />", Some(6))]
    #[test_case("<a href=\"x\">", Some(12))]
    #[test_case("<a href=x y='z'>", Some(16))]
    #[test_case("</div>", Some(6))]
    #[test_case("<3>", None; "not a tag name")]
    #[test_case("<a href>", Some(8); "bare attribute")]
    #[test_case("<a =x>", None; "value with no name")]
    fn tags(source: &str, expected: Option<usize>) {
        assert_eq!(scan_html_tag(source, 0), expected);
    }

    #[test_case("<!-- comment -->", Some(16))]
    #[test_case("<!-- a -- b -->", None; "double dash inside")]
    #[test_case("<?pi content?>", Some(14))]
    #[test_case("<!DOCTYPE html>", Some(15))]
    #[test_case("<![CDATA[raw]]>", Some(15))]
    fn other_constructs(source: &str, expected: Option<usize>) {
        assert_eq!(scan_html_construct(source, 0), expected);
    }
}
