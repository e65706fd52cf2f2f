//! Error types for the effect document model.

/// Errors produced when converting names into model enums.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IrError {
    /// The name does not denote a shader stage.
    #[error("unknown stage '{0}' (expected vert, frag or comp)")]
    UnknownStage(String),

    /// The name does not denote an effect kind.
    #[error("unknown effect kind '{0}' (expected graphics or compute)")]
    UnknownEffectKind(String),
}
