#![no_main]

use libfuzzer_sys::fuzz_target;
use synapse_core::{
    disassemble, evaluate_selector, resolve_data_address, run, CoreConfig, CoreState, Decoder,
    MemoryAccessPolicy, RunBoundary,
};

fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }

    let words: Vec<u32> = data
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    let _ = Decoder::decode(words[0]);
    let _ = disassemble(words[0]);
    let _ = evaluate_selector(words[0], words[1], words[1] >> 16);
    let _ = resolve_data_address(words[1], 64, MemoryAccessPolicy::Truncate);

    let policy = if data[0] & 1 == 0 {
        MemoryAccessPolicy::Strict
    } else {
        MemoryAccessPolicy::Truncate
    };
    let config = CoreConfig {
        instruction_memory_words: 64,
        data_memory_bytes: 256,
        memory_policy: policy,
        ..CoreConfig::default()
    };
    let mut state = CoreState::with_config(&config);
    let program = &words[..words.len().min(64)];
    if state.load_program(program).is_err() {
        return;
    }
    let _ = run(&mut state, &config, RunBoundary::SelfLoop, 256);
    assert_eq!(state.register(synapse_core::Gpr::ZERO), 0);
});
