use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors surfaced by the dataset build. Every variant names the
/// offending input so a rerun is actionable.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("failed to parse {}: {source}", path.display())]
    MalformedInput {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{} does not contain textual fields", path.display())]
    EmptyText { path: PathBuf },
    #[error("no JSON files found under {}", root.display())]
    NoDocumentsFound { root: PathBuf },
    #[error("corpus has no passages to sample from")]
    EmptyCorpus,
    #[error("chunking produced no output: {0}")]
    MissingOutput(String),
    #[error("generation failed for row {row}: {message}")]
    Generation { row: usize, message: String },
    #[error("passage {passage_id} references unknown document {doc_id}")]
    OrphanPassage { passage_id: String, doc_id: String },
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parquet error at {}: {source}", path.display())]
    Parquet {
        path: PathBuf,
        source: parquet::errors::ParquetError,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parquet(path: impl Into<PathBuf>, source: parquet::errors::ParquetError) -> Self {
        Self::Parquet {
            path: path.into(),
            source,
        }
    }
}
