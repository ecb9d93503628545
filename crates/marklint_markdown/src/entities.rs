use std::collections::BTreeMap;
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::error::InitializationError;

/// The commonly-used subset of the HTML5 named character references,
/// generated from the WHATWG entity list. Names are stored without the
/// leading `&` or trailing `;`. Documents that need the full list can point
/// the tokenizer at a complete resource file instead.
#[rustfmt::skip]
static DEFAULT_ENTITIES: &[(&str, &str)] = &[
    ("AElig", "\u{C6}"), ("AMP", "&"), ("Aacute", "\u{C1}"), ("Agrave", "\u{C0}"),
    ("Aring", "\u{C5}"), ("Auml", "\u{C4}"), ("COPY", "\u{A9}"), ("Ccedil", "\u{C7}"),
    ("Dagger", "\u{2021}"), ("Delta", "\u{394}"), ("Eacute", "\u{C9}"), ("Egrave", "\u{C8}"),
    ("GT", ">"), ("Gamma", "\u{393}"), ("LT", "<"), ("Lambda", "\u{39B}"),
    ("Ntilde", "\u{D1}"), ("Oslash", "\u{D8}"), ("Ouml", "\u{D6}"), ("Phi", "\u{3A6}"),
    ("Pi", "\u{3A0}"), ("Prime", "\u{2033}"), ("QUOT", "\""), ("REG", "\u{AE}"),
    ("Sigma", "\u{3A3}"), ("TRADE", "\u{2122}"), ("Uuml", "\u{DC}"), ("aacute", "\u{E1}"),
    ("acute", "\u{B4}"), ("aelig", "\u{E6}"), ("agrave", "\u{E0}"), ("alpha", "\u{3B1}"),
    ("amp", "&"), ("and", "\u{2227}"), ("ang", "\u{2220}"), ("apos", "'"),
    ("aring", "\u{E5}"), ("ast", "*"), ("asymp", "\u{2248}"), ("auml", "\u{E4}"),
    ("beta", "\u{3B2}"), ("brvbar", "\u{A6}"), ("bull", "\u{2022}"), ("cap", "\u{2229}"),
    ("ccedil", "\u{E7}"), ("cedil", "\u{B8}"), ("cent", "\u{A2}"), ("circ", "\u{2C6}"),
    ("colon", ":"), ("comma", ","), ("commat", "@"), ("cong", "\u{2245}"),
    ("copy", "\u{A9}"), ("cup", "\u{222A}"), ("curren", "\u{A4}"), ("dagger", "\u{2020}"),
    ("darr", "\u{2193}"), ("deg", "\u{B0}"), ("delta", "\u{3B4}"), ("divide", "\u{F7}"),
    ("dollar", "$"), ("eacute", "\u{E9}"), ("egrave", "\u{E8}"), ("empty", "\u{2205}"),
    ("emsp", "\u{2003}"), ("ensp", "\u{2002}"), ("epsilon", "\u{3B5}"), ("equals", "="),
    ("equiv", "\u{2261}"), ("euro", "\u{20AC}"), ("excl", "!"), ("exist", "\u{2203}"),
    ("forall", "\u{2200}"), ("frac12", "\u{BD}"), ("frac14", "\u{BC}"), ("frac34", "\u{BE}"),
    ("frasl", "\u{2044}"), ("ge", "\u{2265}"), ("grave", "`"), ("gt", ">"),
    ("hArr", "\u{21D4}"), ("harr", "\u{2194}"), ("hellip", "\u{2026}"), ("iexcl", "\u{A1}"),
    ("infin", "\u{221E}"), ("int", "\u{222B}"), ("iquest", "\u{BF}"), ("isin", "\u{2208}"),
    ("lArr", "\u{21D0}"), ("lambda", "\u{3BB}"), ("laquo", "\u{AB}"), ("larr", "\u{2190}"),
    ("lbrace", "{"), ("lbrack", "["), ("ldquo", "\u{201C}"), ("le", "\u{2264}"),
    ("lowast", "\u{2217}"), ("lowbar", "_"), ("lsquo", "\u{2018}"), ("lt", "<"),
    ("macr", "\u{AF}"), ("mdash", "\u{2014}"), ("micro", "\u{B5}"), ("middot", "\u{B7}"),
    ("minus", "\u{2212}"), ("mu", "\u{3BC}"), ("nabla", "\u{2207}"), ("nbsp", "\u{A0}"),
    ("ndash", "\u{2013}"), ("ne", "\u{2260}"), ("not", "\u{AC}"), ("notin", "\u{2209}"),
    ("ntilde", "\u{F1}"), ("num", "#"), ("omega", "\u{3C9}"), ("oplus", "\u{2295}"),
    ("or", "\u{2228}"), ("ordf", "\u{AA}"), ("ordm", "\u{BA}"), ("oslash", "\u{F8}"),
    ("otimes", "\u{2297}"), ("ouml", "\u{F6}"), ("para", "\u{B6}"), ("part", "\u{2202}"),
    ("percnt", "%"), ("period", "."), ("permil", "\u{2030}"), ("perp", "\u{22A5}"),
    ("phi", "\u{3C6}"), ("pi", "\u{3C0}"), ("plus", "+"), ("plusmn", "\u{B1}"),
    ("pound", "\u{A3}"), ("prime", "\u{2032}"), ("prod", "\u{220F}"), ("quest", "?"),
    ("quot", "\""), ("rArr", "\u{21D2}"), ("radic", "\u{221A}"), ("raquo", "\u{BB}"),
    ("rarr", "\u{2192}"), ("rbrace", "}"), ("rbrack", "]"), ("rdquo", "\u{201D}"),
    ("reg", "\u{AE}"), ("rsquo", "\u{2019}"), ("sect", "\u{A7}"), ("semi", ";"),
    ("shy", "\u{AD}"), ("sigma", "\u{3C3}"), ("sim", "\u{223C}"), ("sub", "\u{2282}"),
    ("sube", "\u{2286}"), ("sum", "\u{2211}"), ("sup", "\u{2283}"), ("sup1", "\u{B9}"),
    ("sup2", "\u{B2}"), ("sup3", "\u{B3}"), ("supe", "\u{2287}"), ("szlig", "\u{DF}"),
    ("there4", "\u{2234}"), ("thinsp", "\u{2009}"), ("tilde", "\u{2DC}"), ("times", "\u{D7}"),
    ("trade", "\u{2122}"), ("uarr", "\u{2191}"), ("uml", "\u{A8}"), ("uuml", "\u{FC}"),
    ("vert", "|"), ("yen", "\u{A5}"), ("zwj", "\u{200D}"), ("zwnj", "\u{200C}"),
];

/// The named-entity table consulted while normalizing link destinations,
/// titles, and labels. The table is immutable once constructed and may be
/// shared freely across threads.
#[derive(Clone, Debug)]
pub struct EntityTable {
    map: FxHashMap<String, String>,
}

impl Default for EntityTable {
    fn default() -> Self {
        let mut map = FxHashMap::default();
        for (name, value) in DEFAULT_ENTITIES {
            map.insert((*name).to_string(), (*value).to_string());
        }
        Self { map }
    }
}

impl EntityTable {
    /// Load an entity table from a JSON resource file mapping entity names
    /// (without `&` or `;`) to their replacement strings. A missing or
    /// malformed file is a fatal initialization error.
    pub fn from_resource_path(path: &Path) -> Result<Self, InitializationError> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| InitializationError::ResourceRead {
                path: path.to_path_buf(),
                source,
            })?;
        let entries: BTreeMap<String, String> = serde_json::from_str(&contents).map_err(
            |source| InitializationError::ResourceFormat {
                path: path.to_path_buf(),
                source,
            },
        )?;

        let mut map = FxHashMap::default();
        map.extend(entries);
        Ok(Self { map })
    }

    /// Look up a named reference. `name` excludes the surrounding `&` and
    /// `;`, and lookups are case-sensitive: `AMP` and `amp` are distinct
    /// entries.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Decode a decimal or hexadecimal numeric character reference body (the
/// digits between `&#`/`&#x` and `;`). Out-of-range or zero code points
/// decode to U+FFFD.
pub(crate) fn decode_numeric_reference(digits: &str, hexadecimal: bool) -> Option<char> {
    let radix = if hexadecimal { 16 } else { 10 };
    let value = u32::from_str_radix(digits, radix).ok()?;
    if value == 0 {
        return Some('\u{FFFD}');
    }
    Some(char::from_u32(value).unwrap_or('\u{FFFD}'))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_table_resolves_common_names() {
        let table = EntityTable::default();
        assert_eq!(table.get("amp"), Some("&"));
        assert_eq!(table.get("AMP"), Some("&"));
        assert_eq!(table.get("auml"), Some("ä"));
        assert_eq!(table.get("nosuchentity"), None);
    }

    #[test]
    fn numeric_references_decode() {
        assert_eq!(decode_numeric_reference("35", false), Some('#'));
        assert_eq!(decode_numeric_reference("22", true), Some('"'));
        assert_eq!(decode_numeric_reference("0", false), Some('\u{FFFD}'));
        assert_eq!(decode_numeric_reference("110000", true), Some('\u{FFFD}'));
        assert_eq!(decode_numeric_reference("x", false), None);
    }
}
