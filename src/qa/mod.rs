pub mod dontknow;
mod prompts;

use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::BuildError;
use crate::generate::{Prompt, QueryAnswerGenerator};
use crate::schema::{CorpusStore, QaDataset, QaRecord, SampledPassage};

/// One in-flight row of the QA table. Generation stages augment fields;
/// only filter stages remove rows.
#[derive(Debug, Clone)]
pub struct QaRow {
    pub index: usize,
    pub qid: String,
    pub passage_id: String,
    pub retrieval_gt: Vec<Vec<String>>,
    pub retrieval_gt_contents: Vec<String>,
    pub query: String,
    pub generation_gt: Vec<String>,
    pub language: String,
}

/// The table threaded through the stage chain. Every stage consumes the
/// whole table and returns a new one; a failed stage never corrupts the
/// snapshot it was given.
#[derive(Debug, Clone, Default)]
pub struct QaTable {
    pub rows: Vec<QaRow>,
}

impl QaTable {
    pub fn from_samples(samples: &[SampledPassage], language: &str) -> Self {
        let rows = samples
            .iter()
            .enumerate()
            .map(|(index, sample)| QaRow {
                index,
                qid: Uuid::new_v5(&Uuid::NAMESPACE_OID, sample.passage_id.as_bytes()).to_string(),
                passage_id: sample.passage_id.clone(),
                retrieval_gt: sample.retrieval_gt.clone(),
                retrieval_gt_contents: sample.retrieval_gt_contents.clone(),
                query: String::new(),
                generation_gt: Vec::new(),
                language: language.to_string(),
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_dataset(self, corpus: CorpusStore) -> QaDataset {
        let qa = self
            .rows
            .into_iter()
            .map(|row| QaRecord {
                qid: row.qid,
                query: row.query,
                generation_gt: row.generation_gt,
                retrieval_gt: row.retrieval_gt,
                language: row.language,
            })
            .collect();
        QaDataset { qa, corpus }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapOp {
    /// Reset row indices to a dense zero-based sequence so later stages
    /// can assume contiguous positions.
    Reindex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenTask {
    /// Generate a factoid-style query from the passage text.
    FactoidQuery,
    /// Generate a complete-sentence ground-truth answer.
    BasicAnswer,
    /// Generate a minimal-phrase ground-truth answer variant.
    ConciseAnswer,
}

impl GenTask {
    fn label(self) -> &'static str {
        match self {
            Self::FactoidQuery => "factoid_query",
            Self::BasicAnswer => "basic_answer",
            Self::ConciseAnswer => "concise_answer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterRule {
    /// Drop rows whose generated answers indicate the model could not
    /// ground an answer in the passage.
    DontKnow,
}

/// Ordered, composable table transformations. Stage ordering is the
/// caller's contract: ground truth derivation must precede generation
/// stages that read it, and filters must follow the generations they
/// inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Map(MapOp),
    DeriveRetrievalGt,
    BatchGenerate(GenTask),
    Filter(FilterRule),
}

impl Stage {
    fn label(&self) -> String {
        match self {
            Self::Map(MapOp::Reindex) => "map(reindex)".to_string(),
            Self::DeriveRetrievalGt => "derive_retrieval_gt".to_string(),
            Self::BatchGenerate(task) => format!("batch_generate({})", task.label()),
            Self::Filter(FilterRule::DontKnow) => "filter(dont_know)".to_string(),
        }
    }
}

/// The default synthesis chain: reindex, attach ground truth contents,
/// generate query and both answer variants, then drop don't-know rows.
pub fn default_stages() -> Vec<Stage> {
    vec![
        Stage::Map(MapOp::Reindex),
        Stage::DeriveRetrievalGt,
        Stage::BatchGenerate(GenTask::FactoidQuery),
        Stage::BatchGenerate(GenTask::BasicAnswer),
        Stage::BatchGenerate(GenTask::ConciseAnswer),
        Stage::Filter(FilterRule::DontKnow),
    ]
}

/// Executes the stage list strictly in order. Each stage fully
/// materializes its output table before the next begins.
pub async fn run_stages(
    table: QaTable,
    stages: &[Stage],
    corpus: &CorpusStore,
    generator: &dyn QueryAnswerGenerator,
    concurrency: usize,
) -> Result<QaTable, BuildError> {
    let mut table = table;
    for stage in stages {
        let before = table.len();
        let next = match stage {
            Stage::Map(MapOp::Reindex) => reindex(&table),
            Stage::DeriveRetrievalGt => derive_retrieval_gt(&table, corpus)?,
            Stage::BatchGenerate(task) => {
                batch_generate(&table, *task, generator, concurrency).await?
            }
            Stage::Filter(FilterRule::DontKnow) => filter_dont_know(&table),
        };
        info!(
            stage = %stage.label(),
            rows_in = before,
            rows_out = next.len(),
            "completed QA stage"
        );
        table = next;
    }
    Ok(table)
}

fn reindex(table: &QaTable) -> QaTable {
    let rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let mut row = row.clone();
            row.index = index;
            row
        })
        .collect();
    QaTable { rows }
}

/// Recomputes retrieval ground truth contents from the corpus snapshot.
/// Pure function of the referenced passage texts, so rerunning it yields
/// an identical table.
fn derive_retrieval_gt(table: &QaTable, corpus: &CorpusStore) -> Result<QaTable, BuildError> {
    let mut rows = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let mut contents = Vec::new();
        for group in &row.retrieval_gt {
            for id in group {
                let passage = corpus.get(id).ok_or_else(|| BuildError::OrphanPassage {
                    passage_id: id.clone(),
                    doc_id: format!("qa row {}", row.index),
                })?;
                contents.push(passage.contents.clone());
            }
        }
        let mut row = row.clone();
        row.retrieval_gt_contents = contents;
        rows.push(row);
    }
    Ok(QaTable { rows })
}

fn prompt_for(task: GenTask, row: &QaRow) -> Prompt {
    let passage = row.retrieval_gt_contents.join("\n\n");
    match task {
        GenTask::FactoidQuery => prompts::factoid_query(&passage, &row.language),
        GenTask::BasicAnswer => prompts::basic_answer(&passage, &row.query, &row.language),
        GenTask::ConciseAnswer => prompts::concise_answer(&passage, &row.query, &row.language),
    }
}

fn apply_generation(row: &QaRow, task: GenTask, text: String) -> QaRow {
    let mut row = row.clone();
    match task {
        GenTask::FactoidQuery => row.query = text,
        GenTask::BasicAnswer | GenTask::ConciseAnswer => row.generation_gt.push(text),
    }
    row
}

/// One generation call per row, issued concurrently but materialized in
/// order: output row `i` corresponds to input row `i`. A row that fails
/// beyond the capability's own retry budget fails the whole stage.
async fn batch_generate(
    table: &QaTable,
    task: GenTask,
    generator: &dyn QueryAnswerGenerator,
    concurrency: usize,
) -> Result<QaTable, BuildError> {
    let calls = table.rows.iter().enumerate().map(|(idx, row)| async move {
        let prompt = prompt_for(task, row);
        let text = generator
            .generate(&prompt, &row.language)
            .await
            .map_err(|err| BuildError::Generation {
                row: idx,
                message: err.to_string(),
            })?;
        debug!(row = idx, task = task.label(), "row generation finished");
        Ok::<QaRow, BuildError>(apply_generation(row, task, text))
    });

    let rows = stream::iter(calls)
        .buffered(concurrency.max(1))
        .try_collect::<Vec<_>>()
        .await?;
    Ok(QaTable { rows })
}

fn filter_dont_know(table: &QaTable) -> QaTable {
    let rows = table
        .rows
        .iter()
        .filter(|row| {
            !row.generation_gt
                .iter()
                .any(|answer| dontknow::is_dont_know(answer, &row.language))
        })
        .cloned()
        .collect();
    QaTable { rows }
}
