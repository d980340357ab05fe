mod draw_sample;
mod finalize;
mod prepare_corpus;
mod prepare_raw;
mod synthesize;

pub(crate) use draw_sample::draw_sample;
pub(crate) use finalize::finalize;
pub(crate) use prepare_corpus::prepare_corpus;
pub(crate) use prepare_raw::prepare_raw;
pub(crate) use synthesize::synthesize;

use anyhow::Result;
use state_machines::core::GuardError;

use super::state::BuildMachine;

fn map_guard_error(event: &str, guard: GuardError) -> anyhow::Error {
    anyhow::anyhow!("invalid build pipeline transition during {event}: {guard:?}")
}

type StageResult<S> = Result<BuildMachine<(), S>>;
