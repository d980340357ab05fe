use std::time::Instant;

use anyhow::Context;
use tracing::info;

use crate::sample;

use super::super::{
    context::BuildContext,
    state::{BuildMachine, CorpusReady, Sampled},
};
use super::{map_guard_error, StageResult};

pub(crate) async fn draw_sample(
    machine: BuildMachine<(), CorpusReady>,
    ctx: &mut BuildContext<'_>,
) -> StageResult<Sampled> {
    let started = Instant::now();

    let corpus = ctx.corpus()?;
    let samples = sample::random_single_hop(corpus, ctx.config().samples, ctx.config().seed)
        .context("sampling passages for QA synthesis")?;

    info!(
        sampled = samples.len(),
        requested = ctx.config().samples,
        duration_ms = started.elapsed().as_millis(),
        "sample drawn"
    );
    ctx.samples = Some(samples);

    machine
        .draw_sample()
        .map_err(|(_, guard)| map_guard_error("draw_sample", guard))
}
