#![no_main]

use cardgrid_layout::LayoutSnapshot;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Anything that parses and validates must build a consistent store.
    if let Ok(snapshot) = LayoutSnapshot::from_json(text) {
        let store = snapshot.to_store().expect("validated snapshot builds");
        store.check_invariants().expect("loaded layout is consistent");
    }
});
