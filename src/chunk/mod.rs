mod config;

pub use config::{ChunkModule, ChunkSettings};

use text_splitter::{ChunkCapacity, ChunkConfig, TextSplitter};
use tracing::{debug, info};

use crate::error::BuildError;
use crate::schema::{CorpusStore, Document, Passage, RawStore};

/// Pluggable passage-splitting strategy. The adapter is not responsible
/// for split boundaries, only for provenance bookkeeping.
pub trait SplitStrategy {
    fn split(&self, doc: &Document) -> Result<Vec<String>, BuildError>;
}

/// Default strategy: character-window splitting on semantic boundaries.
pub struct CharacterWindowSplitter {
    min_chars: usize,
    max_chars: usize,
    overlap_chars: usize,
}

impl CharacterWindowSplitter {
    pub fn new(
        min_chars: usize,
        max_chars: usize,
        overlap_chars: usize,
    ) -> Result<Self, BuildError> {
        if min_chars == 0 || min_chars > max_chars {
            return Err(BuildError::Configuration(format!(
                "invalid chunk bounds; ensure 0 < min <= max (got {min_chars}..{max_chars})"
            )));
        }
        if overlap_chars >= min_chars {
            return Err(BuildError::Configuration(format!(
                "chunk overlap of {overlap_chars} must be less than min_chars {min_chars}"
            )));
        }
        Ok(Self {
            min_chars,
            max_chars,
            overlap_chars,
        })
    }
}

impl SplitStrategy for CharacterWindowSplitter {
    fn split(&self, doc: &Document) -> Result<Vec<String>, BuildError> {
        let capacity = ChunkCapacity::new(self.min_chars)
            .with_max(self.max_chars)
            .map_err(|err| BuildError::Configuration(format!("invalid chunk bounds: {err}")))?;
        let chunk_config = ChunkConfig::new(capacity)
            .with_overlap(self.overlap_chars)
            .map_err(|err| BuildError::Configuration(format!("invalid chunk overlap: {err}")))?;
        let splitter = TextSplitter::new(chunk_config);

        Ok(splitter.chunks(&doc.text).map(str::to_owned).collect())
    }
}

fn build_strategy(module: &ChunkModule) -> Result<Box<dyn SplitStrategy>, BuildError> {
    match module {
        ChunkModule::CharacterWindow {
            min_chars,
            max_chars,
            overlap_chars,
        } => Ok(Box::new(CharacterWindowSplitter::new(
            *min_chars,
            *max_chars,
            *overlap_chars,
        )?)),
    }
}

/// Runs the configured strategy over every document and materializes the
/// corpus. The store is assembled only after all documents have been
/// processed, so a failing document never leaves a partial corpus behind.
pub fn run_chunking(raw: &RawStore, settings: &ChunkSettings) -> Result<CorpusStore, BuildError> {
    let module = settings
        .modules
        .first()
        .ok_or_else(|| BuildError::Configuration("chunk config defines no modules".to_string()))?;
    let strategy = build_strategy(module)?;
    split_corpus(raw, strategy.as_ref())
}

pub fn split_corpus(raw: &RawStore, strategy: &dyn SplitStrategy) -> Result<CorpusStore, BuildError> {
    let mut collected: Vec<Passage> = Vec::new();
    for doc in raw.iter() {
        let chunks = strategy.split(doc)?;
        debug!(doc_id = %doc.id, passages = chunks.len(), "split document");
        for (page, contents) in chunks.into_iter().enumerate() {
            let page = page as i64;
            collected.push(Passage {
                id: Passage::stable_id(&doc.id, page),
                doc_id: doc.id.clone(),
                contents,
                page,
                metadata: doc.metadata.clone(),
            });
        }
    }

    if collected.is_empty() {
        return Err(BuildError::MissingOutput(format!(
            "splitting strategy produced no passages for {} documents",
            raw.len()
        )));
    }

    let mut corpus = CorpusStore::new();
    for passage in collected {
        corpus.push(passage);
    }
    info!(
        documents = raw.len(),
        passages = corpus.len(),
        "materialized corpus"
    );
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::schema::Metadata;

    fn doc(id: &str, text: &str) -> Document {
        Document {
            id: id.to_string(),
            source: "data/topic/file.json".to_string(),
            text: text.to_string(),
            metadata: Metadata::new(),
            page: 0,
            last_modified: Utc::now(),
        }
    }

    struct FixedSplitter(Vec<String>);

    impl SplitStrategy for FixedSplitter {
        fn split(&self, _doc: &Document) -> Result<Vec<String>, BuildError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn passages_reference_their_parent_document() {
        let mut raw = RawStore::new();
        raw.push(doc("d1", "first"));
        raw.push(doc("d2", "second"));

        let strategy = FixedSplitter(vec!["a".to_string(), "b".to_string()]);
        let corpus = split_corpus(&raw, &strategy).unwrap();

        assert_eq!(corpus.len(), 4);
        assert!(corpus.validate_against(&raw).is_ok());
        let pages: Vec<_> = corpus
            .iter()
            .filter(|p| p.doc_id == "d1")
            .map(|p| p.page)
            .collect();
        assert_eq!(pages, vec![0, 1]);
    }

    #[test]
    fn empty_strategy_output_is_missing_output() {
        let mut raw = RawStore::new();
        raw.push(doc("d1", "text"));

        let err = split_corpus(&raw, &FixedSplitter(Vec::new())).unwrap_err();
        assert!(matches!(err, BuildError::MissingOutput(_)));
    }

    #[test]
    fn character_window_splits_long_text() {
        let mut raw = RawStore::new();
        let sentence = "The quick brown fox jumps over the lazy dog. ";
        raw.push(doc("d1", &sentence.repeat(20)));

        let strategy = CharacterWindowSplitter::new(100, 200, 0).unwrap();
        let corpus = split_corpus(&raw, &strategy).unwrap();

        assert!(corpus.len() > 1);
        for passage in corpus.iter() {
            assert!(passage.contents.chars().count() <= 200);
            assert_eq!(passage.doc_id, "d1");
        }
    }

    #[test]
    fn short_text_yields_single_passage() {
        let mut raw = RawStore::new();
        raw.push(doc("d1", "short text"));

        let strategy = CharacterWindowSplitter::new(100, 200, 0).unwrap();
        let corpus = split_corpus(&raw, &strategy).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.iter().next().unwrap().contents, "short text");
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        assert!(CharacterWindowSplitter::new(0, 10, 0).is_err());
        assert!(CharacterWindowSplitter::new(20, 10, 0).is_err());
        assert!(CharacterWindowSplitter::new(10, 20, 10).is_err());
    }
}
