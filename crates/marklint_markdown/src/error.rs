use std::path::PathBuf;

use thiserror::Error;

/// Fatal construction-time failures. A tokenizer that fails to initialize
/// cannot service any `transform` call; callers must surface the error and
/// stop.
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("unable to read tokenizer resource file '{}'", path.display())]
    ResourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("tokenizer resource file '{}' is not a valid entity table", path.display())]
    ResourceFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Recoverable per-input failures raised from `transform`. Malformed Markdown
/// is never an error; every byte sequence tokenizes. Only a missing or
/// misbehaving source can fail a transform.
#[derive(Debug, Error)]
pub enum TokenizationError {
    #[error("a source provider is required to tokenize input")]
    MissingSourceProvider,
}
