#![no_main]

use huella::engine::EmissionsEngine;
use huella::input;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Neither decoding nor computing may panic, whatever the input
        let Ok(engine) = EmissionsEngine::with_builtin_factors() else {
            return;
        };
        if let Ok(records) = input::parse_csv(text) {
            let _ = engine.compute(&records);
        }
        let _ = engine.compute_json(text);
    }
});
