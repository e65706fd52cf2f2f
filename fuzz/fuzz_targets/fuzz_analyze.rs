#![no_main]

use libfuzzer_sys::fuzz_target;
use skfx_ir::EffectKind;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(document) = skfx_parser::parse("fuzz", source) else {
        return;
    };
    // Analysis and stage generation should reject bad input with an
    // error, never a panic or endless recursion.
    for pass in &document.passes {
        if let Ok(analysis) = skfx_analysis::analyze(pass) {
            for kind in [EffectKind::Graphics, EffectKind::Compute] {
                let _ = skfx_transpile::transpile_pass(pass, &analysis, kind);
            }
        }
    }
});
