mod harness;

use harness::assert_token_stream;

#[test]
fn single_paragraph() {
    assert_token_stream(
        "this is a paragraph",
        &[
            "[para(1,1):]",
            "[text(1,1):this is a paragraph:]",
            "[end-para]",
        ],
    );
}

#[test]
fn paragraphs_split_by_blank_line() {
    assert_token_stream(
        "para one\n\npara two",
        &[
            "[para(1,1):]",
            "[text(1,1):para one:]",
            "[end-para]",
            "[BLANK(2,1):]",
            "[para(3,1):]",
            "[text(3,1):para two:]",
            "[end-para]",
        ],
    );
}

#[test]
fn continuation_lines_keep_their_leading_whitespace() {
    assert_token_stream(
        "first\n  second",
        &[
            "[para(1,1):\n  ]",
            "[text(1,1):first\nsecond:]",
            "[end-para]",
        ],
    );
}

#[test]
fn paragraph_trailing_whitespace_moves_to_final_whitespace() {
    assert_token_stream(
        "ends  ",
        &["[para(1,1)::  ]", "[text(1,1):ends:]", "[end-para]"],
    );
}

#[test]
fn atx_heading() {
    assert_token_stream(
        "# Heading",
        &["[atx(1,1):1:0:]", "[text(1,3):Heading: ]", "[end-atx]"],
    );
}

#[test]
fn atx_heading_with_closing_hashes() {
    assert_token_stream(
        "## Sub ##",
        &["[atx(1,1):2:2:]", "[text(1,4):Sub: ]", "[end-atx: ]"],
    );
}

#[test]
fn setext_heading_level_one() {
    assert_token_stream(
        "Heading\n=======",
        &[
            "[setext(2,1):=:=======:(1,1)]",
            "[text(1,1):Heading:]",
            "[end-setext]",
        ],
    );
}

#[test]
fn setext_heading_level_two_beats_thematic_break() {
    assert_token_stream(
        "Foo\n---",
        &["[setext(2,1):-:---:(1,1)]", "[text(1,1):Foo:]", "[end-setext]"],
    );
}

#[test]
fn thematic_break_with_stars() {
    assert_token_stream("***", &["[tbreak(1,1):*::***]"]);
}

#[test]
fn thematic_break_with_spaced_dashes() {
    assert_token_stream("- - -", &["[tbreak(1,1):-::- - -]"]);
}

#[test]
fn indented_code_block() {
    assert_token_stream(
        "    code line",
        &[
            "[icode-block(1,5):    ]",
            "[text(1,5):code line:]",
            "[end-icode-block]",
        ],
    );
}

#[test]
fn indented_code_interior_and_trailing_blanks() {
    assert_token_stream(
        "    one\n\n    two\n",
        &[
            "[icode-block(1,5):    ]",
            "[text(1,5):one:]",
            "[BLANK(2,1):]",
            "[text(3,5):two:    ]",
            "[end-icode-block]",
            "[BLANK(4,1):]",
        ],
    );
}

#[test]
fn fenced_code_block_with_info_string() {
    assert_token_stream(
        "```rust\nfn main() {}\n```",
        &[
            "[fcode-block(1,1):`:3:rust:::]",
            "[text(2,1):fn main() {}:]",
            "[end-fcode-block::```]",
        ],
    );
}

#[test]
fn unterminated_fence_closes_at_end_of_input() {
    assert_token_stream(
        "```\ncode",
        &[
            "[fcode-block(1,1):`:3::::]",
            "[text(2,1):code:]",
            "[end-fcode-block]",
        ],
    );
}

#[test]
fn html_block_ends_at_blank_line() {
    assert_token_stream(
        "<div>\nfoo\n</div>\n\nbar",
        &[
            "[html-block(1,1)]",
            "[text(1,1):<div>\nfoo\n</div>:\n\n]",
            "[end-html-block]",
            "[BLANK(4,1):]",
            "[para(5,1):]",
            "[text(5,1):bar:]",
            "[end-para]",
        ],
    );
}

#[test]
fn html_comment_block_ends_on_its_own_line() {
    assert_token_stream(
        "<!-- note -->\nafter",
        &[
            "[html-block(1,1)]",
            "[text(1,1):<!-- note -->:]",
            "[end-html-block]",
            "[para(2,1):]",
            "[text(2,1):after:]",
            "[end-para]",
        ],
    );
}

#[test]
fn block_quote_single_paragraph() {
    assert_token_stream(
        "> quoted",
        &[
            "[block-quote(1,1):]",
            "[para(1,3):]",
            "[text(1,3):quoted:]",
            "[end-para]",
            "[end-block-quote]",
        ],
    );
}

#[test]
fn block_quote_with_interior_blank_marker_line() {
    assert_token_stream(
        "> a\n>\n> b",
        &[
            "[block-quote(1,1):]",
            "[para(1,3):]",
            "[text(1,3):a:]",
            "[end-para]",
            "[BLANK(2,2):]",
            "[para(3,3):]",
            "[text(3,3):b:]",
            "[end-para]",
            "[end-block-quote]",
        ],
    );
}

#[test]
fn lazy_continuation_keeps_block_quote_open() {
    assert_token_stream(
        "> a\nb",
        &[
            "[block-quote(1,1):]",
            "[para(1,3):\n]",
            "[text(1,3):a\nb:]",
            "[end-para]",
            "[end-block-quote]",
        ],
    );
}

#[test]
fn blank_line_splits_block_quotes() {
    assert_token_stream(
        "> a\n\n> b",
        &[
            "[block-quote(1,1):]",
            "[para(1,3):]",
            "[text(1,3):a:]",
            "[end-para]",
            "[end-block-quote]",
            "[BLANK(2,1):]",
            "[block-quote(3,1):]",
            "[para(3,3):]",
            "[text(3,3):b:]",
            "[end-para]",
            "[end-block-quote]",
        ],
    );
}
