mod harness;

use harness::assert_token_stream;

#[test]
fn non_flanking_delimiters_stay_literal() {
    assert_token_stream(
        "foo ***",
        &[
            "[para(1,1):]",
            "[text(1,1):foo :]",
            "[text(1,5):***:]",
            "[end-para]",
        ],
    );
}

#[test]
fn escaped_star_inside_emphasis() {
    assert_token_stream(
        "foo *\\**",
        &[
            "[para(1,1):]",
            "[text(1,1):foo :]",
            "[emphasis(1,5):1:*]",
            "[text(1,6):\\*:]",
            "[end-emphasis(1,8)]",
            "[end-para]",
        ],
    );
}

#[test]
fn double_star_opener_keeps_one_literal() {
    assert_token_stream(
        "**foo*",
        &[
            "[para(1,1):]",
            "[text(1,1):*:]",
            "[emphasis(1,2):1:*]",
            "[text(1,3):foo:]",
            "[end-emphasis(1,6)]",
            "[end-para]",
        ],
    );
}

#[test]
fn strong_emphasis() {
    assert_token_stream(
        "**bold**",
        &[
            "[para(1,1):]",
            "[emphasis(1,1):2:*]",
            "[text(1,3):bold:]",
            "[end-emphasis(1,7)]",
            "[end-para]",
        ],
    );
}

#[test]
fn triple_stars_nest_strong_inside_emphasis() {
    assert_token_stream(
        "***a***",
        &[
            "[para(1,1):]",
            "[emphasis(1,1):1:*]",
            "[emphasis(1,2):2:*]",
            "[text(1,4):a:]",
            "[end-emphasis(1,5)]",
            "[end-emphasis(1,7)]",
            "[end-para]",
        ],
    );
}

#[test]
fn rule_of_three_blocks_the_inner_double() {
    assert_token_stream(
        "*abc**def*",
        &[
            "[para(1,1):]",
            "[emphasis(1,1):1:*]",
            "[text(1,2):abc:]",
            "[text(1,5):**:]",
            "[text(1,7):def:]",
            "[end-emphasis(1,10)]",
            "[end-para]",
        ],
    );
}

#[test]
fn underscores_do_not_match_intraword() {
    assert_token_stream(
        "foo_bar_baz",
        &[
            "[para(1,1):]",
            "[text(1,1):foo:]",
            "[text(1,4):_:]",
            "[text(1,5):bar:]",
            "[text(1,8):_:]",
            "[text(1,9):baz:]",
            "[end-para]",
        ],
    );
}

#[test]
fn code_span() {
    assert_token_stream(
        "a `code` b",
        &[
            "[para(1,1):]",
            "[text(1,1):a :]",
            "[icode-span(1,3):code:1::]",
            "[text(1,9): b:]",
            "[end-para]",
        ],
    );
}

#[test]
fn code_span_strips_one_padding_space() {
    assert_token_stream(
        "`` `a` ``",
        &[
            "[para(1,1):]",
            "[icode-span(1,1):`a`:2: : ]",
            "[end-para]",
        ],
    );
}

#[test]
fn unmatched_backtick_is_literal() {
    assert_token_stream(
        "`a",
        &["[para(1,1):]", "[text(1,1):`a:]", "[end-para]"],
    );
}

#[test]
fn uri_and_email_autolinks() {
    assert_token_stream(
        "<http://example.com> and <foo@bar.example>",
        &[
            "[para(1,1):]",
            "[uri-autolink(1,1):http://example.com]",
            "[text(1,21): and :]",
            "[email-autolink(1,26):foo@bar.example]",
            "[end-para]",
        ],
    );
}

#[test]
fn inline_raw_html_tags() {
    assert_token_stream(
        "a <b>text</b>",
        &[
            "[para(1,1):]",
            "[text(1,1):a :]",
            "[raw-html(1,3):b]",
            "[text(1,6):text:]",
            "[raw-html(1,10):/b]",
            "[end-para]",
        ],
    );
}

#[test]
fn hard_break_from_trailing_spaces() {
    assert_token_stream(
        "line one  \nline two",
        &[
            "[para(1,1):\n]",
            "[text(1,1):line one:]",
            "[hard-break(1,9):  ]",
            "[text(2,1):line two:]",
            "[end-para]",
        ],
    );
}

#[test]
fn hard_break_from_backslash() {
    assert_token_stream(
        "one\\\ntwo",
        &[
            "[para(1,1):\n]",
            "[text(1,1):one:]",
            "[hard-break(1,4):\\]",
            "[text(2,1):two:]",
            "[end-para]",
        ],
    );
}

#[test]
fn trailing_spaces_in_headings_do_not_break() {
    assert_token_stream(
        "# head  \nnext",
        &[
            "[atx(1,1):1:0:]",
            "[text(1,3):head: ]",
            "[end-atx:  ]",
            "[para(2,1):]",
            "[text(2,1):next:]",
            "[end-para]",
        ],
    );
}
