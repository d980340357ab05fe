use std::time::Instant;

use anyhow::Context;
use tracing::info;

use crate::export;

use super::super::{
    context::BuildContext,
    state::{BuildMachine, Exported, Synthesized},
};
use super::{map_guard_error, StageResult};

pub(crate) async fn finalize(
    machine: BuildMachine<(), Synthesized>,
    ctx: &mut BuildContext<'_>,
) -> StageResult<Exported> {
    let started = Instant::now();

    // Exports happen only here, after every prior stage has succeeded, so
    // a present QA file is never half-built.
    if !ctx.config().from_raw {
        let raw_path = ctx.config().raw_output.as_path();
        export::write_raw(ctx.raw()?, raw_path)
            .with_context(|| format!("writing raw table to {}", raw_path.display()))?;
    }

    let corpus = ctx.corpus()?.clone();
    let table = ctx.table()?.clone();
    let dataset = table.into_dataset(corpus);

    let qa_path = ctx.config().qa_output.as_path();
    let corpus_path = ctx.config().corpus_output.as_path();
    dataset.to_parquet(qa_path, corpus_path).with_context(|| {
        format!(
            "writing QA dataset to {} and corpus to {}",
            qa_path.display(),
            corpus_path.display()
        )
    })?;

    info!(
        qa_rows = dataset.qa.len(),
        corpus_rows = dataset.corpus.len(),
        duration_ms = started.elapsed().as_millis(),
        "dataset exported"
    );
    ctx.dataset = Some(dataset);

    machine
        .finalize()
        .map_err(|(_, guard)| map_guard_error("finalize", guard))
}
