use std::time::Instant;

use anyhow::Context;
use tracing::info;

use crate::{export, normalize};

use super::super::{
    context::BuildContext,
    state::{BuildMachine, RawReady, Ready},
};
use super::{map_guard_error, StageResult};

pub(crate) async fn prepare_raw(
    machine: BuildMachine<(), Ready>,
    ctx: &mut BuildContext<'_>,
) -> StageResult<RawReady> {
    let started = Instant::now();

    let raw = if ctx.config().from_raw {
        let path = ctx.config().raw_output.as_path();
        export::read_raw(path)
            .with_context(|| format!("reading raw table from {}", path.display()))?
    } else {
        let root = ctx.config().data_root.as_path();
        normalize::build_raw(root)
            .with_context(|| format!("normalizing documents under {}", root.display()))?
    };

    info!(
        documents = raw.len(),
        from_raw = ctx.config().from_raw,
        duration_ms = started.elapsed().as_millis(),
        "raw document table ready"
    );
    ctx.raw = Some(raw);

    machine
        .prepare_raw()
        .map_err(|(_, guard)| map_guard_error("prepare_raw", guard))
}
