//! A CommonMark/GFM tokenizer that converts source text into a flat,
//! position-annotated token stream carrying enough whitespace and delimiter
//! metadata to reconstruct the original document. Lint rules and renderers
//! consume the stream; this crate owns only its production.

pub use entities::EntityTable;
pub use error::{InitializationError, TokenizationError};
pub use position::PositionMarker;
pub use source::{InMemorySourceProvider, SourceProvider};
pub use token::{MarkdownToken, TokenClass, TokenData, TokenName};
pub use tokenizer::TokenizedMarkdown;

mod block;
mod byte_lookup;
mod entities;
mod error;
mod inline;
mod position;
mod source;
mod text;
mod token;
mod tokenizer;

/// Tokenize a document with the built-in resources.
pub fn tokenize_markdown(content: &str) -> Result<Vec<MarkdownToken>, TokenizationError> {
    TokenizedMarkdown::new().transform(content)
}

/// Render a token stream in its canonical textual form, one entry per
/// token. This form is the stable contract consumed by rule plugins and the
/// test suites.
pub fn serialize_tokens(tokens: &[MarkdownToken]) -> Vec<String> {
    tokens.iter().map(MarkdownToken::to_string).collect()
}
