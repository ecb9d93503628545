mod harness;

use harness::{assert_balanced, assert_monotone_block_lines, tokenize};
use marklint_markdown::{serialize_tokens, MarkdownToken, TokenData};
use proptest::prelude::*;

/// Rebuild a document that contains only paragraphs and blank lines from its
/// reconstruction fields. Paragraph text tokens carry their interior
/// newlines, and every token boundary in such a stream is a line boundary.
fn reconstruct_plain(tokens: &[MarkdownToken]) -> String {
    let mut segments = Vec::new();
    for token in tokens {
        match &token.data {
            TokenData::Text { token_text, .. } => segments.push(token_text.clone()),
            TokenData::BlankLine {
                extracted_whitespace,
            } => segments.push(extracted_whitespace.clone()),
            _ => {}
        }
    }
    segments.join("\n")
}

fn plain_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()).boxed(),
        "[a-z]{1,6}( [a-z]{1,6}){0,2}".boxed(),
    ]
}

proptest! {
    /// Lossless reconstruction over documents with no construct markers:
    /// the concatenated reconstruction fields reproduce the source exactly.
    #[test]
    fn plain_documents_reconstruct(lines in proptest::collection::vec(plain_line(), 1..6)) {
        let source = lines.join("\n");
        let tokens = tokenize(&source);
        assert_balanced(&tokens);
        assert_monotone_block_lines(&tokens);
        prop_assert_eq!(reconstruct_plain(&tokens), source);
    }

    /// Arbitrary delimiter soup never produces an unbalanced stream, never
    /// emits an emphasis length other than 1 or 2, and tokenizes the same
    /// way every time.
    #[test]
    fn delimiter_soup_is_balanced_and_deterministic(source in "[ab*_ ]{0,16}") {
        let first = tokenize(&source);
        assert_balanced(&first);
        let second = tokenize(&source);
        prop_assert_eq!(serialize_tokens(&first), serialize_tokens(&second));
        for token in &first {
            if let TokenData::Emphasis { emphasis_length, .. } = &token.data {
                prop_assert!(*emphasis_length == 1 || *emphasis_length == 2);
            }
        }
    }

    /// Loose determination is a function of block structure alone: repeated
    /// runs over list-shaped input always agree.
    #[test]
    fn loose_lists_are_deterministic(blanks in proptest::collection::vec(any::<bool>(), 1..4)) {
        let mut source = String::from("* first");
        for (index, blank) in blanks.iter().enumerate() {
            if *blank {
                source.push('\n');
            }
            source.push_str(&format!("\n* item{index}"));
        }
        let first = tokenize(&source);
        let second = tokenize(&source);
        let first_loose: Vec<bool> = first.iter().filter(|t| t.is_list_start()).map(|t| t.is_loose()).collect();
        let second_loose: Vec<bool> = second.iter().filter(|t| t.is_list_start()).map(|t| t.is_loose()).collect();
        prop_assert_eq!(first_loose.clone(), second_loose);
        // Any interior blank line must have made the single list loose.
        if blanks.iter().any(|blank| *blank) {
            prop_assert!(first_loose.iter().all(|loose| *loose));
        }
    }
}
