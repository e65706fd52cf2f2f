#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        // Pass splitting, scanning and lowering should never panic.
        let _ = skfx_parser::parse("fuzz", source);
    }
});
