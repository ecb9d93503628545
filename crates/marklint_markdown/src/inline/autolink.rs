//! URI and email autolinks: `<` + a strict production + `>`. Anything that
//! fails the production falls through to the raw-HTML scanner or to literal
//! text.

use crate::token::TokenData;

/// Try to parse an autolink starting at the `<` at `start`. Returns the
/// token payload and the index just past the closing `>`.
pub(crate) fn parse_autolink(text: &str, start: usize) -> Option<(TokenData, usize)> {
    debug_assert_eq!(text.as_bytes().get(start), Some(&b'<'));
    scan_absolute_uri(text, start + 1)
        .map(|end| {
            (
                TokenData::UriAutolink {
                    autolink_text: text[start + 1..end].to_string(),
                },
                end + 1,
            )
        })
        .or_else(|| {
            scan_email_address(text, start + 1).map(|end| {
                (
                    TokenData::EmailAutolink {
                        autolink_text: text[start + 1..end].to_string(),
                    },
                    end + 1,
                )
            })
        })
}

/// "...any sequence of 2–32 characters beginning with an ASCII letter and
/// followed by any combination of ASCII letters, digits, or the symbols
/// plus, period, or hyphen", then `:`, then anything other than whitespace,
/// control characters, `<`, or `>`. Returns the index of the closing `>`.
fn scan_absolute_uri(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if !bytes.get(start)?.is_ascii_alphabetic() {
        return None;
    }

    let mut index = start;
    let mut scheme_length = 0;
    while scheme_length < 32 && index < bytes.len() {
        match bytes[index] {
            b'+' | b'.' | b'-' => scheme_length += 1,
            c if c.is_ascii_alphanumeric() => scheme_length += 1,
            _ => break,
        }
        index += 1;
    }
    if scheme_length < 2 {
        return None;
    }
    if bytes.get(index) != Some(&b':') {
        return None;
    }
    index += 1;

    while index < bytes.len() {
        match bytes[index] {
            b'>' => return Some(index),
            b'<' | b' ' | b'\t' | b'\n' => return None,
            c if c.is_ascii_control() => return None,
            _ => index += 1,
        }
    }
    None
}

/// An unrolling of the non-normative HTML5 email regex:
/// `[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*`
/// Returns the index of the closing `>`.
fn scan_email_address(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut index = start;

    let local_start = index;
    while index < bytes.len() {
        match bytes[index] {
            c if c.is_ascii_alphanumeric() => index += 1,
            b'.' | b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'/' | b'=' | b'?'
            | b'^' | b'_' | b'`' | b'{' | b'|' | b'}' | b'~' | b'-' => index += 1,
            b'@' => break,
            _ => return None,
        }
    }
    if index == local_start || bytes.get(index) != Some(&b'@') {
        return None;
    }
    index += 1;

    // Any number of domain parts chained with `.`s; each part is up to 62
    // alphanumeric-or-dash characters that cannot start or end with a dash.
    loop {
        if !bytes.get(index)?.is_ascii_alphanumeric() {
            return None;
        }
        index += 1;

        let mut last_was_dash = false;
        for _ in 0..61 {
            match bytes.get(index) {
                Some(c) if c.is_ascii_alphanumeric() => {
                    index += 1;
                    last_was_dash = false;
                }
                Some(b'-') => {
                    index += 1;
                    last_was_dash = true;
                }
                _ => break,
            }
        }
        if last_was_dash {
            return None;
        }

        match bytes.get(index) {
            Some(b'.') => index += 1,
            Some(b'>') => return Some(index),
            _ => return None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    fn autolink_text(source: &str) -> Option<String> {
        parse_autolink(source, 0).map(|(data, _)| match data {
            TokenData::UriAutolink { autolink_text } => format!("uri:{autolink_text}"),
            TokenData::EmailAutolink { autolink_text } => format!("email:{autolink_text}"),
            _ => unreachable!(),
        })
    }

    #[test_case("<http://example.com>", Some("uri:http://example.com"))]
    #[test_case("<irc://foo.bar:2233/baz>", Some("uri:irc://foo.bar:2233/baz"))]
    #[test_case("<MAILTO:FOO@BAR.BAZ>", Some("uri:MAILTO:FOO@BAR.BAZ"))]
    #[test_case("<foo@bar.example.com>", Some("email:foo@bar.example.com"))]
    #[test_case("<http://spaced out>", None)]
    #[test_case("<m:abc>", None; "scheme too short")]
    #[test_case("<foo@bar->", None; "domain ends with dash")]
    fn autolinks(source: &str, expected: Option<&str>) {
        assert_eq!(autolink_text(source).as_deref(), expected);
    }
}
