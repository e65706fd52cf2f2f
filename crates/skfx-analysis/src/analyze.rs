//! Semantic analysis of one effect pass.
//!
//! Checks every declared type against the known-type set of the pass,
//! validates member qualifiers and entry method signatures, then computes
//! the ordered parameter list (size and flags) and the stage varyings.

use skfx_ir::{
    EffectAnalysisResult, EffectDocumentPass, EffectMember, EffectParameterFlags,
    EffectParameterInfo, EffectStageInfo,
};

use crate::layout::LayoutCalculator;
use crate::tables::{QUALIFIERS, is_builtin, opaque_kind};

/// Return type every stage entry method must declare.
const ENTRY_RETURN_TYPE: &str = "void";

/// Errors during semantic analysis.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("unknown type '{ty}' in {context}")]
    UnknownType { ty: String, context: String },
    #[error("unknown qualifier '{qualifier}' on '{name}' (expected stage, buffer or uniform)")]
    UnknownQualifier { qualifier: String, name: String },
    #[error("member '{member}' of struct '{structure}' has opaque type '{ty}'")]
    OpaqueStructMember {
        structure: String,
        member: String,
        ty: String,
    },
    #[error("'{name}' declares an array of opaque type '{ty}'; declare one member per resource")]
    OpaqueArray { name: String, ty: String },
    #[error("struct '{0}' contains itself")]
    RecursiveStruct(String),
    #[error("entry method '{method}' must return {expected}, found {found}")]
    ReturnTypeMismatch {
        method: String,
        expected: &'static str,
        found: String,
    },
}

/// Analyze a pass: validate it and compute its parameters and varyings.
pub fn analyze(pass: &EffectDocumentPass) -> Result<EffectAnalysisResult, AnalysisError> {
    let types = KnownTypes { pass };
    validate_structs(pass, &types)?;

    for attrib in &pass.attribs {
        types.check(&attrib.ty, || format!("attribute '{}'", attrib.name))?;
    }

    for member in &pass.members {
        if !QUALIFIERS.contains(&member.qualifier.as_str()) {
            return Err(AnalysisError::UnknownQualifier {
                qualifier: member.qualifier.clone(),
                name: member.name.clone(),
            });
        }
        types.check(&member.ty, || format!("member '{}'", member.name))?;
    }

    for method in &pass.methods {
        if method.return_type != ENTRY_RETURN_TYPE {
            types.check(&method.return_type, || {
                format!("return type of '{}'", method.name)
            })?;
        }
        if method.stage.is_some() && method.return_type != ENTRY_RETURN_TYPE {
            return Err(AnalysisError::ReturnTypeMismatch {
                method: method.name.clone(),
                expected: ENTRY_RETURN_TYPE,
                found: method.return_type.clone(),
            });
        }
    }

    let mut layout = LayoutCalculator::new(pass);
    // Resolve every struct, used or not, so cycles never go unnoticed.
    for st in &pass.structs {
        layout.alignment(&st.name)?;
    }

    let mut result = EffectAnalysisResult::default();
    for member in &pass.members {
        if member.qualifier == "stage" {
            result.stages.push(EffectStageInfo {
                name: member.name.clone(),
                ty: member.ty.clone(),
            });
            continue;
        }
        let flags = parameter_flags(member);
        if flags.is_opaque() && member.array.is_some() {
            return Err(AnalysisError::OpaqueArray {
                name: member.name.clone(),
                ty: member.ty.clone(),
            });
        }
        let size = if flags.is_opaque() {
            0
        } else {
            layout.array_size(&member.ty, member.array)?
        };
        log::trace!("parameter {}: {} bytes, {flags}", member.name, size);
        result.parameters.push(EffectParameterInfo {
            name: member.name.clone(),
            ty: member.ty.clone(),
            size,
            flags,
        });
    }

    log::debug!(
        "pass '{}': {} parameter(s), {} varying(s)",
        pass.name,
        result.parameters.len(),
        result.stages.len()
    );
    Ok(result)
}

/// Classification flags of a top-level member.
///
/// The dimension flags are plain substring tests on the type name, so
/// `sampler2DArray` and `image2D` both get `Texture2D`.
pub fn parameter_flags(member: &EffectMember) -> EffectParameterFlags {
    let mut flags = EffectParameterFlags::EMPTY;
    match member.qualifier.as_str() {
        "buffer" => flags |= EffectParameterFlags::BUFFER,
        "uniform" => flags |= EffectParameterFlags::UNIFORM,
        _ => {}
    }
    if member.read_only {
        flags |= EffectParameterFlags::READ_ONLY;
    }
    if let Some(kind) = opaque_kind(&member.ty) {
        flags |= kind.flag();
    }
    for (marker, flag) in [
        ("1D", EffectParameterFlags::TEXTURE_1D),
        ("2D", EffectParameterFlags::TEXTURE_2D),
        ("3D", EffectParameterFlags::TEXTURE_3D),
    ] {
        if member.ty.contains(marker) {
            flags |= flag;
        }
    }
    flags
}

/// Built-in types plus the structs declared in one pass.
struct KnownTypes<'p> {
    pass: &'p EffectDocumentPass,
}

impl KnownTypes<'_> {
    fn contains(&self, ty: &str) -> bool {
        is_builtin(ty) || self.pass.find_struct(ty).is_some()
    }

    fn check(&self, ty: &str, context: impl FnOnce() -> String) -> Result<(), AnalysisError> {
        if self.contains(ty) {
            Ok(())
        } else {
            Err(AnalysisError::UnknownType {
                ty: ty.to_string(),
                context: context(),
            })
        }
    }
}

fn validate_structs(pass: &EffectDocumentPass, types: &KnownTypes<'_>) -> Result<(), AnalysisError> {
    for st in &pass.structs {
        for member in &st.members {
            types.check(&member.ty, || {
                format!("member '{}' of struct '{}'", member.name, st.name)
            })?;
            if opaque_kind(&member.ty).is_some() {
                return Err(AnalysisError::OpaqueStructMember {
                    structure: st.name.clone(),
                    member: member.name.clone(),
                    ty: member.ty.clone(),
                });
            }
        }
    }
    Ok(())
}
