use std::time::Instant;

use anyhow::Context;
use tracing::info;

use crate::chunk::{self, ChunkSettings};

use super::super::{
    context::BuildContext,
    state::{BuildMachine, CorpusReady, RawReady},
};
use super::{map_guard_error, StageResult};

pub(crate) async fn prepare_corpus(
    machine: BuildMachine<(), RawReady>,
    ctx: &mut BuildContext<'_>,
) -> StageResult<CorpusReady> {
    let started = Instant::now();

    let config_path = ctx.config().chunk_config.as_path();
    let settings = ChunkSettings::load(config_path)
        .with_context(|| format!("loading chunk config from {}", config_path.display()))?;

    let raw = ctx.raw()?;
    let corpus = chunk::run_chunking(raw, &settings).context("splitting documents into passages")?;
    corpus
        .validate_against(raw)
        .context("validating corpus back-references")?;

    info!(
        documents = raw.len(),
        passages = corpus.len(),
        duration_ms = started.elapsed().as_millis(),
        "corpus ready"
    );
    ctx.corpus = Some(corpus);

    machine
        .prepare_corpus()
        .map_err(|(_, guard)| map_guard_error("prepare_corpus", guard))
}
