use unicode_properties::{GeneralCategoryGroup, UnicodeGeneralCategory};

/// Build a 256-entry lookup table marking each of the given bytes.
const fn build_byte_lookup(bytes: &[u8]) -> [bool; 256] {
    let mut table = [false; 256];
    let mut index = 0;
    while index < bytes.len() {
        table[bytes[index] as usize] = true;
        index += 1;
    }
    table
}

/// Bytes that can interrupt a run of plain inline text and become a new kind
/// of token. Inline whitespace is _not_ significant here, but vertical
/// whitespace is, since hard breaks and line transitions are decided at the
/// end of each line.
static INLINE_SIGNIFICANT_BYTES: [bool; 256] = build_byte_lookup(b"\n\\`<[]!*_");

#[inline(always)]
pub(crate) fn byte_is_inline_significant(byte: u8) -> bool {
    INLINE_SIGNIFICANT_BYTES[byte as usize]
}

// Learned from: https://nullprogram.com/blog/2017/10/06/
#[rustfmt::skip]
static UTF8_LENGTH_LOOKUP: [usize; 32] = [
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    0, 0, 0, 0, 0, 0, 0, 0, 2, 2, 2, 2, 3, 3, 4, 0,
];

/// Return the byte length of the complete UTF-8 code point that starts with
/// `byte`. This can be done branchlessly and without computing the entire
/// `char`.
#[inline(always)]
pub(crate) fn char_length_from_byte(byte: u8) -> usize {
    UTF8_LENGTH_LOOKUP[byte as usize >> 3]
}

/// ASCII whitespace per the grammar: space, tab, line feed, form feed, and
/// carriage return.
#[inline(always)]
pub(crate) fn is_ascii_whitespace_char(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0C' | '\r')
}

/// "A Unicode whitespace character is any code point in the Unicode `Zs`
/// general category, or a tab, line feed, form feed, or carriage return."
#[inline]
pub(crate) fn is_unicode_whitespace(c: char) -> bool {
    if c.is_ascii() {
        is_ascii_whitespace_char(c)
    } else {
        c.general_category_group() == GeneralCategoryGroup::Separator
    }
}

/// Punctuation for the purposes of delimiter flanking. ASCII punctuation is
/// checked directly; everything else falls into the Unicode general category
/// groups for punctuation and symbols.
#[inline]
pub(crate) fn is_unicode_punctuation(c: char) -> bool {
    if c.is_ascii() {
        c.is_ascii_punctuation()
    } else {
        matches!(
            c.general_category_group(),
            GeneralCategoryGroup::Punctuation | GeneralCategoryGroup::Symbol
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn significant_bytes() {
        assert!(byte_is_inline_significant(b'*'));
        assert!(byte_is_inline_significant(b'\n'));
        assert!(!byte_is_inline_significant(b' '));
        assert!(!byte_is_inline_significant(b'a'));
    }

    #[test]
    fn punctuation_classes() {
        assert!(is_unicode_punctuation('*'));
        assert!(is_unicode_punctuation('“'));
        assert!(!is_unicode_punctuation('a'));
        assert!(is_unicode_whitespace('\u{00A0}'));
        assert!(!is_unicode_whitespace('x'));
    }
}
