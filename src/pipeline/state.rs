use state_machines::state_machine;

state_machine! {
    name: BuildMachine,
    state: BuildState,
    initial: Ready,
    states: [Ready, RawReady, CorpusReady, Sampled, Synthesized, Exported, Failed],
    events {
        prepare_raw { transition: { from: Ready, to: RawReady } }
        prepare_corpus { transition: { from: RawReady, to: CorpusReady } }
        draw_sample { transition: { from: CorpusReady, to: Sampled } }
        synthesize { transition: { from: Sampled, to: Synthesized } }
        finalize { transition: { from: Synthesized, to: Exported } }
        abort {
            transition: { from: Ready, to: Failed }
            transition: { from: RawReady, to: Failed }
            transition: { from: CorpusReady, to: Failed }
            transition: { from: Sampled, to: Failed }
            transition: { from: Synthesized, to: Failed }
            transition: { from: Exported, to: Failed }
        }
    }
}

pub fn ready() -> BuildMachine<(), Ready> {
    BuildMachine::new(())
}
