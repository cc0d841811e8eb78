//! Fuzz target for solution snapshot loading.
//!
//! Snapshots are read back from disk and may have been edited by hand, so
//! parsing, validation and rebuilding the value function must never panic.

#![no_main]

use cg_core::Snapshot;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(snapshot) = Snapshot::from_json(text) else {
        return;
    };
    if let Ok(vf) = snapshot.value_function() {
        for alpha in [0.01, 0.5, 1.0] {
            let _ = vf.cvar_map(alpha);
        }
    }
});
