use skfx_effect::{
    CompileOptions, DeviceBackend, Effect, EffectCompiler, EffectError, EffectPass,
    HeadlessDevice,
};
use skfx_ir::{EffectAnalysisResult, EffectKind};

/// Compile `source` for `backend` with the given kind, panicking on failure.
#[allow(dead_code)]
pub fn compile(source: &str, kind: EffectKind, backend: DeviceBackend) -> Effect<HeadlessDevice> {
    try_compile(source, kind, backend).expect("effect compilation failed")
}

/// Like `compile` but returns the error.
#[allow(dead_code)]
pub fn try_compile(
    source: &str,
    kind: EffectKind,
    backend: DeviceBackend,
) -> Result<Effect<HeadlessDevice>, EffectError> {
    let device = HeadlessDevice::new(backend);
    let options = CompileOptions {
        kind,
        ..Default::default()
    };
    EffectCompiler::new(&device)
        .with_options(options)
        .compile("test", source)
}

/// Compile with an explicit cross-compile target on a Vulkan device.
#[allow(dead_code)]
pub fn compile_for_target(source: &str, kind: EffectKind, target: &str) -> Effect<HeadlessDevice> {
    let device = HeadlessDevice::new(DeviceBackend::Vulkan);
    let options = CompileOptions {
        kind,
        cross_target: Some(target.to_string()),
        ..Default::default()
    };
    EffectCompiler::new(&device)
        .with_options(options)
        .compile("test", source)
        .expect("effect compilation failed")
}

/// Parse and analyze the first pass of `source`.
#[allow(dead_code)]
pub fn analyze(source: &str) -> EffectAnalysisResult {
    let doc = skfx_parser::parse("test", source).expect("parse failed");
    skfx_analysis::analyze(&doc.passes[0]).expect("analysis failed")
}

/// The only pass of an effect.
#[allow(dead_code)]
pub fn single_pass(effect: &Effect<HeadlessDevice>) -> &EffectPass<HeadlessDevice> {
    assert_eq!(effect.passes.len(), 1, "expected a single pass");
    &effect.passes[0]
}
