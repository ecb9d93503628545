use std::path::Path;

use lazy_static::lazy_static;
use log::debug;

use crate::block::{BlockProcessingResult, BlockProcessor};
use crate::entities::EntityTable;
use crate::error::{InitializationError, TokenizationError};
use crate::inline::process_inline_span;
use crate::source::{InMemorySourceProvider, SourceProvider};
use crate::token::{MarkdownToken, TokenData};

lazy_static! {
    /// The process-wide default entity table, built once and cloned into
    /// each tokenizer that does not load its own resource file.
    static ref DEFAULT_ENTITY_TABLE: EntityTable = EntityTable::default();
}

/// The tokenizer façade. Construction resolves the resources the parser
/// needs (the named-entity table); after that the instance is immutable and
/// may be shared across threads, with all per-call state living inside each
/// `transform` invocation.
pub struct TokenizedMarkdown {
    entities: EntityTable,
}

impl Default for TokenizedMarkdown {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenizedMarkdown {
    /// Create a tokenizer backed by the built-in entity table.
    pub fn new() -> Self {
        Self {
            entities: DEFAULT_ENTITY_TABLE.clone(),
        }
    }

    /// Create a tokenizer that loads its entity table from the given JSON
    /// resource file. A missing or malformed file is fatal: no tokenizer is
    /// constructed and no `transform` can be issued.
    pub fn with_resource_path(path: impl AsRef<Path>) -> Result<Self, InitializationError> {
        Ok(Self {
            entities: EntityTable::from_resource_path(path.as_ref())?,
        })
    }

    /// Tokenize an in-memory document.
    pub fn transform(&self, source: &str) -> Result<Vec<MarkdownToken>, TokenizationError> {
        let mut provider = InMemorySourceProvider::new(source);
        self.transform_from_provider(Some(&mut provider))
    }

    /// Tokenize the lines produced by a source provider. Passing no
    /// provider is a recoverable error: the caller reports the failure for
    /// this input and moves on.
    ///
    /// Block processing runs first over every line, accumulating link
    /// reference definitions; deferred paragraph and heading text is then
    /// resolved by the inline processor, which can see definitions from
    /// anywhere in the document.
    pub fn transform_from_provider(
        &self,
        provider: Option<&mut dyn SourceProvider>,
    ) -> Result<Vec<MarkdownToken>, TokenizationError> {
        let provider = provider.ok_or(TokenizationError::MissingSourceProvider)?;

        let mut block = BlockProcessor::new(&self.entities);
        while let Some(line) = provider.next_line() {
            block.process_line(&line);
        }
        let BlockProcessingResult {
            mut tokens,
            deferred,
            registry,
        } = block.finish();
        debug!(
            "block pass produced {} tokens, {} deferred inline spans",
            tokens.len(),
            deferred.len()
        );

        // Splicing runs back-to-front so earlier placeholder indices stay
        // valid while later ones are replaced.
        for span in deferred.iter().rev() {
            let placeholder_whitespace = match &tokens[span.token_index].data {
                TokenData::Text {
                    extracted_whitespace,
                    ..
                } => extracted_whitespace.clone(),
                _ => String::new(),
            };
            let mut inline_tokens = process_inline_span(
                &span.text,
                &span.origins,
                span.allow_hard_breaks,
                &self.entities,
                &registry,
            );
            // The placeholder's whitespace (an ATX separator, a heading's
            // per-line indents) carries over onto the first resolved text
            // token.
            if !placeholder_whitespace.is_empty() {
                if let Some(MarkdownToken {
                    data:
                        TokenData::Text {
                            extracted_whitespace,
                            ..
                        },
                    ..
                }) = inline_tokens.first_mut()
                {
                    *extracted_whitespace = placeholder_whitespace;
                }
            }
            tokens.splice(span.token_index..span.token_index + 1, inline_tokens);
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_provider_is_a_tokenization_error() {
        let tokenizer = TokenizedMarkdown::new();
        let result = tokenizer.transform_from_provider(None);
        assert!(matches!(
            result,
            Err(TokenizationError::MissingSourceProvider)
        ));
    }

    #[test]
    fn missing_resource_file_is_an_initialization_error() {
        let result = TokenizedMarkdown::with_resource_path("does/not/exist.json");
        assert!(matches!(
            result,
            Err(InitializationError::ResourceRead { .. })
        ));
    }

    #[test]
    fn resource_file_round_trips() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/resources/entities.json");
        let tokenizer = TokenizedMarkdown::with_resource_path(path).unwrap();
        let tokens = tokenizer.transform("plain text").unwrap();
        assert_eq!(tokens.len(), 3);
    }
}
