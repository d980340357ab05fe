use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BuildError;

pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A whole source text unit with provenance, before splitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub source: String,
    pub text: String,
    pub metadata: Metadata,
    /// Index of this payload within its source file.
    pub page: i64,
    pub last_modified: DateTime<Utc>,
}

impl Document {
    /// Ids are derived from the source path and payload index, so repeated
    /// runs over the same file ordering assign identical ids.
    pub fn stable_id(source: &str, page: i64) -> String {
        let name = format!("{source}#{page}");
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }
}

/// A retrievable unit derived from splitting a [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub doc_id: String,
    pub contents: String,
    /// Zero-based position of this passage within its parent document.
    pub page: i64,
    pub metadata: Metadata,
}

impl Passage {
    pub fn stable_id(doc_id: &str, page: i64) -> String {
        let name = format!("{doc_id}/{page}");
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }
}

/// Immutable table of source documents. Referential parent of all passages.
#[derive(Debug, Clone, Default)]
pub struct RawStore {
    docs: Vec<Document>,
    by_id: HashMap<String, usize>,
}

impl RawStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, doc: Document) {
        self.by_id.insert(doc.id.clone(), self.docs.len());
        self.docs.push(doc);
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.by_id.get(id).map(|idx| &self.docs[*idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.docs.iter()
    }
}

/// Table of passages, each back-referencing exactly one document.
#[derive(Debug, Clone, Default)]
pub struct CorpusStore {
    passages: Vec<Passage>,
    by_id: HashMap<String, usize>,
}

impl CorpusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, passage: Passage) {
        self.by_id.insert(passage.id.clone(), self.passages.len());
        self.passages.push(passage);
    }

    pub fn get(&self, id: &str) -> Option<&Passage> {
        self.by_id.get(id).map(|idx| &self.passages[*idx])
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Passage> {
        self.passages.iter()
    }

    /// Checks that no passage is orphaned: every `doc_id` must resolve in
    /// the raw store.
    pub fn validate_against(&self, raw: &RawStore) -> Result<(), BuildError> {
        for passage in &self.passages {
            if !raw.contains(&passage.doc_id) {
                return Err(BuildError::OrphanPassage {
                    passage_id: passage.id.clone(),
                    doc_id: passage.doc_id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A passage selected for QA synthesis, annotated with its retrieval
/// ground truth. Single-hop sampling yields one singleton id group whose
/// contents are the passage's own text.
#[derive(Debug, Clone)]
pub struct SampledPassage {
    pub passage_id: String,
    /// Ordered groups of passage ids that should be retrieved to answer a
    /// question generated from this passage.
    pub retrieval_gt: Vec<Vec<String>>,
    pub retrieval_gt_contents: Vec<String>,
}

/// One synthesized question with its generation and retrieval ground truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaRecord {
    pub qid: String,
    pub query: String,
    /// Candidate correct-answer strings, in generation order.
    pub generation_gt: Vec<String>,
    pub retrieval_gt: Vec<Vec<String>>,
    pub language: String,
}

/// Final dataset: QA records plus the corpus snapshot they were derived
/// from, so retrieval ground truth ids stay resolvable downstream.
#[derive(Debug, Clone)]
pub struct QaDataset {
    pub qa: Vec<QaRecord>,
    pub corpus: CorpusStore,
}

impl QaDataset {
    /// Checks that every retrieval ground truth id resolves in the corpus
    /// snapshot.
    pub fn validate(&self) -> Result<(), BuildError> {
        for record in &self.qa {
            for group in &record.retrieval_gt {
                for id in group {
                    if self.corpus.get(id).is_none() {
                        return Err(BuildError::OrphanPassage {
                            passage_id: id.clone(),
                            doc_id: format!("qa record {}", record.qid),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str) -> Document {
        Document {
            id: id.to_string(),
            source: "data/topic/file.json".to_string(),
            text: "Paris is the capital of France.".to_string(),
            metadata: Metadata::new(),
            page: 0,
            last_modified: Utc::now(),
        }
    }

    fn passage(id: &str, doc_id: &str) -> Passage {
        Passage {
            id: id.to_string(),
            doc_id: doc_id.to_string(),
            contents: "Paris is the capital of France.".to_string(),
            page: 0,
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn stable_ids_are_deterministic() {
        assert_eq!(
            Document::stable_id("data/a.json", 0),
            Document::stable_id("data/a.json", 0)
        );
        assert_ne!(
            Document::stable_id("data/a.json", 0),
            Document::stable_id("data/a.json", 1)
        );
        assert_eq!(Passage::stable_id("doc", 2), Passage::stable_id("doc", 2));
    }

    #[test]
    fn corpus_validation_accepts_resolvable_parents() {
        let mut raw = RawStore::new();
        raw.push(doc("d1"));
        let mut corpus = CorpusStore::new();
        corpus.push(passage("p1", "d1"));
        corpus.push(passage("p2", "d1"));

        assert!(corpus.validate_against(&raw).is_ok());
    }

    #[test]
    fn corpus_validation_rejects_orphans() {
        let raw = RawStore::new();
        let mut corpus = CorpusStore::new();
        corpus.push(passage("p1", "missing"));

        let err = corpus.validate_against(&raw).unwrap_err();
        assert!(matches!(err, BuildError::OrphanPassage { .. }));
    }

    #[test]
    fn dataset_validation_resolves_retrieval_gt() {
        let mut corpus = CorpusStore::new();
        corpus.push(passage("p1", "d1"));

        let dataset = QaDataset {
            qa: vec![QaRecord {
                qid: "q0".to_string(),
                query: "What is the capital of France?".to_string(),
                generation_gt: vec!["Paris".to_string()],
                retrieval_gt: vec![vec!["p1".to_string()]],
                language: "en".to_string(),
            }],
            corpus,
        };
        assert!(dataset.validate().is_ok());

        let mut bad = dataset.clone();
        bad.qa[0].retrieval_gt = vec![vec!["p9".to_string()]];
        assert!(bad.validate().is_err());
    }
}
