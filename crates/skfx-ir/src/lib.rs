//! Effect document model for skfx.
//!
//! Holds the declarations scanned out of an effect document (structs,
//! attributes, qualified members, methods) and the per-pass analysis result
//! that the rest of the pipeline consumes.

mod display;
mod document;
mod error;
mod param;
mod types;

pub use display::{dump_analysis, dump_document};
pub use document::{
    EffectAttrib, EffectDocument, EffectDocumentPass, EffectMember, EffectMethod,
    EffectStructInfo, MethodParam, StructMember,
};
pub use error::IrError;
pub use param::{EffectAnalysisResult, EffectParameterFlags, EffectParameterInfo, EffectStageInfo};
pub use types::{ArraySize, EffectKind, Span, StageKind};
