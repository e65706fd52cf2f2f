//! GLSL generation for skfx effect passes.
//!
//! Turns one analyzed [`EffectDocumentPass`] into a complete GLSL 4.50
//! source per stage. Resource bindings are allocated once per pass by
//! [`BindingMap::allocate`] and shared by every stage.

pub mod bindings;
pub mod header;
pub mod resources;
pub mod stage;

use skfx_ir::{EffectAnalysisResult, EffectDocumentPass, EffectKind, StageKind};

pub use bindings::{BindingMap, BindingSlot, RESOURCE_SET, USER_PROPERTIES_BLOCK};
pub use stage::{
    ComputeTranspiler, FragmentTranspiler, StageContext, StageTranspiler, VertexTranspiler,
    transpiler_for,
};

/// Errors during stage generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranspileError {
    #[error("pass '{pass}' has no {stage} entry method '{}()'", stage.entry_name())]
    MissingEntryPoint { pass: String, stage: StageKind },
}

/// Generated source of one stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageSource {
    pub stage: StageKind,
    pub source: String,
}

/// Every stage of one pass, plus the bindings they were generated with.
#[derive(Clone, Debug)]
pub struct TranspiledPass {
    pub bindings: BindingMap,
    /// In pipeline order.
    pub stages: Vec<StageSource>,
}

impl TranspiledPass {
    pub fn source(&self, stage: StageKind) -> Option<&str> {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.source.as_str())
    }
}

/// Generates the stages `kind` requires for `pass`.
///
/// Entry methods of stages outside `kind` are dropped from every
/// generated stage.
pub fn transpile_pass(
    pass: &EffectDocumentPass,
    analysis: &EffectAnalysisResult,
    kind: EffectKind,
) -> Result<TranspiledPass, TranspileError> {
    let required = kind.required_stages();
    for &stage in required {
        if pass.entry(stage).is_none() {
            return Err(TranspileError::MissingEntryPoint {
                pass: pass.name.clone(),
                stage,
            });
        }
    }
    for stage in pass.stages() {
        if !kind.accepts(stage) {
            log::warn!(
                "pass '{}': ignoring {stage} entry '{}()' in a {kind} effect",
                pass.name,
                stage.entry_name()
            );
        }
    }

    let bindings = BindingMap::allocate(analysis);
    let ctx = StageContext {
        pass,
        bindings: &bindings,
    };
    let stages = required
        .iter()
        .map(|&stage| {
            let source = transpiler_for(stage).transpile(&ctx)?;
            log::debug!(
                "pass '{}': generated {stage} stage ({} bytes)",
                pass.name,
                source.len()
            );
            Ok(StageSource { stage, source })
        })
        .collect::<Result<Vec<_>, TranspileError>>()?;

    Ok(TranspiledPass { bindings, stages })
}
