//! Detection of the seven HTML block start patterns and their per-kind end
//! conditions.

/// Tag names that open a "basic" (type 6) HTML block when they appear after
/// `<` or `</` at the start of a line.
#[rustfmt::skip]
static BLOCK_TAG_NAMES: &[&str] = &[
    "address", "article", "aside", "base", "basefont", "blockquote", "body",
    "caption", "center", "col", "colgroup", "dd", "details", "dialog", "dir",
    "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form",
    "frame", "frameset", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header",
    "hr", "html", "iframe", "legend", "li", "link", "main", "menu", "menuitem",
    "nav", "noframes", "ol", "optgroup", "option", "p", "param", "section",
    "source", "summary", "table", "tbody", "td", "tfoot", "th", "thead",
    "title", "tr", "track", "ul",
];

/// Tag names whose content is taken verbatim until an explicit closing tag
/// (type 1 blocks).
static RAW_TEXT_TAG_NAMES: &[&str] = &["pre", "script", "style"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HtmlBlockKind {
    /// `<script>`, `<pre>`, or `<style>`; ends when the closing tag appears.
    RawText,
    /// `<!--` comment; ends at `-->`.
    Comment,
    /// `<?` processing instruction; ends at `?>`.
    ProcessingInstruction,
    /// `<!` followed by an ASCII letter; ends at `>`.
    Declaration,
    /// `<![CDATA[`; ends at `]]>`.
    CData,
    /// `<` or `</` plus a known block-level tag name; ends at a blank line.
    BlockTag,
    /// Any other complete tag alone on its line; ends at a blank line and
    /// cannot interrupt a paragraph.
    Standalone,
}

impl HtmlBlockKind {
    /// Whether this kind of block ends when a blank line is encountered
    /// rather than at an in-line closing pattern.
    pub(crate) fn ends_at_blank_line(&self) -> bool {
        matches!(self, HtmlBlockKind::BlockTag | HtmlBlockKind::Standalone)
    }
}

/// Classify the start of an HTML block per the seven CommonMark patterns.
/// `in_paragraph` suppresses the standalone (type 7) pattern, which is not
/// allowed to interrupt paragraphs.
pub(crate) fn detect_html_block_start(content: &str, in_paragraph: bool) -> Option<HtmlBlockKind> {
    let rest = content.strip_prefix('<')?;

    if rest.starts_with("!--") {
        return Some(HtmlBlockKind::Comment);
    }
    if rest.starts_with('?') {
        return Some(HtmlBlockKind::ProcessingInstruction);
    }
    if rest.starts_with("![CDATA[") {
        return Some(HtmlBlockKind::CData);
    }
    if let Some(after_bang) = rest.strip_prefix('!') {
        if after_bang.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Some(HtmlBlockKind::Declaration);
        }
        return None;
    }

    let after_slash = rest.strip_prefix('/').unwrap_or(rest);
    let name_length = after_slash
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '-')
        .unwrap_or(after_slash.len());
    if name_length == 0 {
        return None;
    }
    let name = after_slash[..name_length].to_ascii_lowercase();
    let boundary = after_slash[name_length..]
        .chars()
        .next()
        .map_or(true, |c| matches!(c, ' ' | '\t' | '>' | '/'));

    if RAW_TEXT_TAG_NAMES.contains(&name.as_str()) && boundary {
        return Some(HtmlBlockKind::RawText);
    }
    if BLOCK_TAG_NAMES.contains(&name.as_str()) && boundary {
        return Some(HtmlBlockKind::BlockTag);
    }

    // Type 7: a single complete open or close tag with nothing else on the
    // line. The full attribute grammar lives with the inline raw-HTML
    // scanner; reuse it here.
    if !in_paragraph {
        let trimmed = content.trim_end_matches([' ', '\t']);
        if let Some(consumed) = crate::inline::raw_html::scan_html_tag(trimmed, 0) {
            if consumed == trimmed.len() {
                return Some(HtmlBlockKind::Standalone);
            }
        }
    }

    None
}

/// For kinds with an in-line end pattern (types 1 through 5), returns true
/// if this line completes the block. The line that matches is still part of
/// the block.
pub(crate) fn line_ends_html_block(kind: HtmlBlockKind, line: &str) -> bool {
    match kind {
        HtmlBlockKind::RawText => {
            let lowered = line.to_ascii_lowercase();
            RAW_TEXT_TAG_NAMES
                .iter()
                .any(|tag| lowered.contains(&format!("</{tag}>")))
        }
        HtmlBlockKind::Comment => line.contains("-->"),
        HtmlBlockKind::ProcessingInstruction => line.contains("?>"),
        HtmlBlockKind::Declaration => line.contains('>'),
        HtmlBlockKind::CData => line.contains("]]>"),
        HtmlBlockKind::BlockTag | HtmlBlockKind::Standalone => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    #[test_case("<div>", Some(HtmlBlockKind::BlockTag))]
    #[test_case("</table>", Some(HtmlBlockKind::BlockTag))]
    #[test_case("<script src=\"x\">", Some(HtmlBlockKind::RawText))]
    #[test_case("<!-- comment", Some(HtmlBlockKind::Comment))]
    #[test_case("<?php", Some(HtmlBlockKind::ProcessingInstruction))]
    #[test_case("<!DOCTYPE html>", Some(HtmlBlockKind::Declaration))]
    #[test_case("<![CDATA[data", Some(HtmlBlockKind::CData))]
    #[test_case("<span>", None; "inline tag with trailing content rules")]
    #[test_case("plain text", None)]
    fn start_detection_in_paragraph(content: &str, expected: Option<HtmlBlockKind>) {
        assert_eq!(detect_html_block_start(content, true), expected);
    }

    #[test]
    fn standalone_tag_detected_outside_paragraphs() {
        assert_eq!(
            detect_html_block_start("<span>", false),
            Some(HtmlBlockKind::Standalone)
        );
        assert_eq!(detect_html_block_start("<span>x", false), None);
    }

    #[test]
    fn end_conditions() {
        assert!(line_ends_html_block(
            HtmlBlockKind::RawText,
            "foo</script>bar"
        ));
        assert!(line_ends_html_block(HtmlBlockKind::Comment, "done -->"));
        assert!(!line_ends_html_block(HtmlBlockKind::BlockTag, "anything"));
    }
}
