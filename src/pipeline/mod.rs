mod context;
mod stages;
mod state;

use std::sync::Arc;

use anyhow::Result;

use crate::args::Config;
use crate::generate::QueryAnswerGenerator;
use crate::schema::QaDataset;

use context::BuildContext;

/// Drives the full build: normalize, chunk, sample, synthesize, export.
/// Stages run strictly in order; any failure aborts the run before the
/// export stage writes a single byte of QA output.
pub async fn run_build(
    config: &Config,
    generator: Arc<dyn QueryAnswerGenerator>,
) -> Result<QaDataset> {
    let mut ctx = BuildContext::new(config, generator);
    let machine = state::ready();

    let machine = stages::prepare_raw(machine, &mut ctx).await?;
    let machine = stages::prepare_corpus(machine, &mut ctx).await?;
    let machine = stages::draw_sample(machine, &mut ctx).await?;
    let machine = stages::synthesize(machine, &mut ctx).await?;
    let machine = stages::finalize(machine, &mut ctx).await?;

    drop(machine);

    ctx.into_dataset()
}
