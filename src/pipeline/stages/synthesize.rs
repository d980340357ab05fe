use std::time::Instant;

use anyhow::Context;
use tracing::info;

use crate::qa::{self, QaTable};

use super::super::{
    context::BuildContext,
    state::{BuildMachine, Sampled, Synthesized},
};
use super::{map_guard_error, StageResult};

pub(crate) async fn synthesize(
    machine: BuildMachine<(), Sampled>,
    ctx: &mut BuildContext<'_>,
) -> StageResult<Synthesized> {
    let started = Instant::now();

    let table = QaTable::from_samples(ctx.samples()?, &ctx.config().lang);
    let rows_in = table.len();
    let corpus = ctx.corpus()?;
    let table = qa::run_stages(
        table,
        &qa::default_stages(),
        corpus,
        ctx.generator.as_ref(),
        ctx.config().concurrency,
    )
    .await
    .context("running QA synthesis stages")?;

    info!(
        rows_in,
        rows_out = table.len(),
        duration_ms = started.elapsed().as_millis(),
        "QA synthesis finished"
    );
    ctx.table = Some(table);

    machine
        .synthesize()
        .map_err(|(_, guard)| map_guard_error("synthesize", guard))
}
