use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use marklint_markdown::TokenizedMarkdown;

fn build_document(sections: usize) -> String {
    let section = concat!(
        "# Section heading\n",
        "\n",
        "A paragraph with *emphasis*, `code spans`, and a [link](/somewhere).\n",
        "\n",
        "- list item one\n",
        "- list item two with **strong** text\n",
        "\n",
        "> a quoted line\n",
        "> and its continuation\n",
        "\n",
        "```rust\n",
        "fn main() { println!(\"hi\"); }\n",
        "```\n",
        "\n",
    );
    section.repeat(sections)
}

fn bench_long_documents(c: &mut Criterion) {
    let tokenizer = TokenizedMarkdown::new();
    for sections in [10, 100, 500] {
        let document = build_document(sections);
        c.bench_function(&format!("tokenize_{sections}_sections"), |b| {
            b.iter(|| tokenizer.transform(black_box(&document)))
        });
    }
}

criterion_group!(benches, bench_long_documents);
criterion_main!(benches);
