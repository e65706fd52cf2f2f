pub mod analyze;
pub mod layout;
pub mod tables;

pub use analyze::{AnalysisError, analyze, parameter_flags};
pub use layout::{LayoutCalculator, round_struct_alignment};
pub use tables::{
    OpaqueKind, QUALIFIERS, builtin_alignment, is_integer_type, is_scalar, opaque_kind,
};
