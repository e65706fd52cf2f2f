//! Effect assembly for skfx.
//!
//! [`EffectCompiler`] runs the whole pipeline for every pass of an effect
//! document: parse, analyze, generate GLSL per stage, compile it to
//! SPIR-V, cross-compile it when the device needs another language, and
//! create the device shaders and resource layout. Any failure aborts the
//! effect; no partially compiled [`Effect`] is returned.

pub mod compiler;
pub mod device;
pub mod layout;

pub use compiler::{
    CompileOptions, Effect, EffectCompiler, EffectPass, TranslatedStage, default_registry,
    infer_kind,
};
pub use device::{
    DeviceBackend, GraphicsDevice, HeadlessDevice, HeadlessLayout, HeadlessShader,
    ShaderDescription,
};
pub use layout::{ResourceKind, ResourceLayoutElement, StageMask, layout_elements};

use skfx_analysis::AnalysisError;
use skfx_backend_core::CrossCompileError;
use skfx_native::NativeCompilationError;
use skfx_parser::ParseError;
use skfx_transpile::TranspileError;

/// Any failure while compiling an effect.
#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("{0}")]
    Transpile(#[from] TranspileError),
    #[error("native compilation failed: {0}")]
    Native(#[from] NativeCompilationError),
    #[error("cross-compilation failed: {0}")]
    CrossCompile(#[from] CrossCompileError),
    #[error("device failed to create {what}: {message}")]
    Device { what: &'static str, message: String },
}
