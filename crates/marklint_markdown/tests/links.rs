mod harness;

use harness::assert_token_stream;

#[test]
fn inline_link() {
    assert_token_stream(
        "[text](/url)",
        &[
            "[para(1,1):]",
            "[link(1,1):/url::]",
            "[text(1,2):text:]",
            "[end-link(1,6)]",
            "[end-para]",
        ],
    );
}

#[test]
fn inline_link_with_title() {
    assert_token_stream(
        "[a](/b \"t\")",
        &[
            "[para(1,1):]",
            "[link(1,1):/b:t:]",
            "[text(1,2):a:]",
            "[end-link(1,3)]",
            "[end-para]",
        ],
    );
}

#[test]
fn destination_is_percent_encoded() {
    assert_token_stream(
        "[a](/url with space)",
        &[
            "[para(1,1):]",
            "[text(1,1):[:]",
            "[text(1,2):a](/url with space):]",
            "[end-para]",
        ],
    );
    assert_token_stream(
        "[a](</url with space>)",
        &[
            "[para(1,1):]",
            "[link(1,1):/url%20with%20space::]",
            "[text(1,2):a:]",
            "[end-link(1,3)]",
            "[end-para]",
        ],
    );
}

#[test]
fn shortcut_reference_after_definition() {
    assert_token_stream(
        "[foo]: /url \"title\"\n\n[foo]",
        &[
            "[link-ref-def(1,1):true::foo:: :/url:: :title::]",
            "[BLANK(2,1):]",
            "[para(3,1):]",
            "[link(3,1):/url:title:foo]",
            "[text(3,2):foo:]",
            "[end-link(3,5)]",
            "[end-para]",
        ],
    );
}

#[test]
fn redefinition_keeps_the_first_target() {
    assert_token_stream(
        "[a]: /1\n[a]: /2\n\n[x][a]",
        &[
            "[link-ref-def(1,1):true::a:: :/1:::::]",
            "[link-ref-def(2,1):false::a:: :/2:::::]",
            "[BLANK(3,1):]",
            "[para(4,1):]",
            "[link(4,1):/1::a]",
            "[text(4,2):x:]",
            "[end-link(4,3)]",
            "[end-para]",
        ],
    );
}

#[test]
fn collapsed_reference() {
    assert_token_stream(
        "[foo]: /url\n\n[foo][]",
        &[
            "[link-ref-def(1,1):true::foo:: :/url:::::]",
            "[BLANK(2,1):]",
            "[para(3,1):]",
            "[link(3,1):/url::foo]",
            "[text(3,2):foo:]",
            "[end-link(3,5)]",
            "[end-para]",
        ],
    );
}

#[test]
fn undefined_reference_stays_literal() {
    assert_token_stream(
        "[nope]",
        &[
            "[para(1,1):]",
            "[text(1,1):[:]",
            "[text(1,2):nope]:]",
            "[end-para]",
        ],
    );
}

#[test]
fn image_with_alt_text() {
    assert_token_stream(
        "![alt](/img.png)",
        &[
            "[para(1,1):]",
            "[image(1,1):/img.png::alt]",
            "[text(1,3):alt:]",
            "[end-image(1,6)]",
            "[end-para]",
        ],
    );
}

#[test]
fn emphasis_resolves_inside_link_labels() {
    assert_token_stream(
        "[*em*](/u)",
        &[
            "[para(1,1):]",
            "[link(1,1):/u::]",
            "[emphasis(1,2):1:*]",
            "[text(1,3):em:]",
            "[end-emphasis(1,5)]",
            "[end-link(1,6)]",
            "[end-para]",
        ],
    );
}

#[test]
fn links_do_not_nest() {
    assert_token_stream(
        "[a [b](/u)](/v)",
        &[
            "[para(1,1):]",
            "[text(1,1):[:]",
            "[text(1,2):a :]",
            "[link(1,4):/u::]",
            "[text(1,5):b:]",
            "[end-link(1,6)]",
            "[text(1,11):](/v):]",
            "[end-para]",
        ],
    );
}
