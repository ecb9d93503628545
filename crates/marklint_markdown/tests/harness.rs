use marklint_markdown::{serialize_tokens, tokenize_markdown, MarkdownToken, TokenClass, TokenName};

#[allow(unused)]
pub fn tokenize(source: &str) -> Vec<MarkdownToken> {
    tokenize_markdown(source).expect("in-memory sources always produce lines")
}

/// Tokenize the source and compare the canonical textual form of the stream
/// against the expected list, then check the scope-balance invariant.
#[allow(unused)]
pub fn assert_token_stream(source: &str, expected: &[&str]) {
    let tokens = tokenize(source);
    let actual = serialize_tokens(&tokens);
    assert_eq!(actual, expected, "token stream mismatch for {source:?}");
    assert_balanced(&tokens);
    assert_monotone_block_lines(&tokens);
}

/// Every start token has exactly one matching end token, in reverse-opening
/// order.
#[allow(unused)]
pub fn assert_balanced(tokens: &[MarkdownToken]) {
    let mut stack: Vec<TokenName> = Vec::new();
    for token in tokens {
        if token.is_end() {
            let opened = stack.pop();
            assert_eq!(
                opened,
                Some(token.name()),
                "end marker out of order in {tokens:#?}"
            );
        } else if opens_scope(token) {
            stack.push(token.name());
        }
    }
    assert!(stack.is_empty(), "unclosed scopes: {stack:?}");
}

/// Line numbers never decrease across block-level tokens.
#[allow(unused)]
pub fn assert_monotone_block_lines(tokens: &[MarkdownToken]) {
    let mut last_line = 0;
    for token in tokens {
        if token.is_end() || token.class() == TokenClass::Inline || token.line_number == 0 {
            continue;
        }
        assert!(
            token.line_number >= last_line,
            "line numbers went backwards at {token}"
        );
        last_line = token.line_number;
    }
}

#[allow(unused)]
fn opens_scope(token: &MarkdownToken) -> bool {
    matches!(
        token.name(),
        TokenName::Paragraph
            | TokenName::AtxHeading
            | TokenName::SetextHeading
            | TokenName::IndentedCodeBlock
            | TokenName::FencedCodeBlock
            | TokenName::HtmlBlock
            | TokenName::BlockQuote
            | TokenName::UnorderedListStart
            | TokenName::OrderedListStart
            | TokenName::Emphasis
            | TokenName::Link
            | TokenName::Image
    )
}
