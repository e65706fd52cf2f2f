//! Constant type tables.
//!
//! Everything the analyzer knows about built-in types lives here as
//! immutable tables; struct names declared in a pass are added on top of
//! these per analysis run.

use skfx_ir::EffectParameterFlags;

/// Qualifiers a top-level member may carry (`extern` is folded into
/// `uniform` by the parser).
pub const QUALIFIERS: &[&str] = &["stage", "buffer", "uniform"];

/// Built-in scalar types. Every scalar aligns to 4 bytes.
const SCALARS: &[&str] = &["int", "bool", "uint", "float", "double"];

const SCALAR_ALIGNMENT: u32 = 4;

/// Built-in vector and matrix types with their base alignment in bytes.
const VECTORS: &[(&str, u32)] = &[
    ("vec2", 8),
    ("vec3", 16),
    ("vec4", 16),
    ("ivec2", 8),
    ("ivec3", 16),
    ("ivec4", 16),
    ("uvec2", 8),
    ("uvec3", 16),
    ("uvec4", 16),
    ("mat2", 32),
    ("mat3", 48),
    ("mat4", 64),
    ("mat3x2", 48),
    ("mat4x4", 64),
];

const IMAGES: &[&str] = &["image1D", "image2D", "image3D", "image2DArray"];

const TEXTURES: &[&str] = &[
    "sampler1D",
    "sampler2D",
    "sampler3D",
    "sampler2DShadow",
    "sampler2DArray",
    "texture1D",
    "texture2D",
    "texture3D",
    "texture2DArray",
];

const SAMPLERS: &[&str] = &["sampler", "samplerShadow"];

const CUBEMAPS: &[&str] = &["samplerCube", "samplerCubeShadow", "textureCube"];

/// Types whose varyings must be declared `flat`.
const INTEGER_TYPES: &[&str] = &[
    "int", "uint", "bool", "ivec2", "ivec3", "ivec4", "uvec2", "uvec3", "uvec4",
];

/// Class of an opaque type: one without an in-buffer byte representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpaqueKind {
    Image,
    Texture,
    Sampler,
    Cubemap,
}

impl OpaqueKind {
    /// The parameter flag for this class.
    pub fn flag(self) -> EffectParameterFlags {
        match self {
            Self::Image => EffectParameterFlags::IMAGE,
            Self::Texture => EffectParameterFlags::TEXTURE,
            Self::Sampler => EffectParameterFlags::SAMPLER,
            Self::Cubemap => EffectParameterFlags::CUBEMAP,
        }
    }
}

/// Looks `ty` up in the opaque-type tables.
pub fn opaque_kind(ty: &str) -> Option<OpaqueKind> {
    if IMAGES.contains(&ty) {
        Some(OpaqueKind::Image)
    } else if TEXTURES.contains(&ty) {
        Some(OpaqueKind::Texture)
    } else if SAMPLERS.contains(&ty) {
        Some(OpaqueKind::Sampler)
    } else if CUBEMAPS.contains(&ty) {
        Some(OpaqueKind::Cubemap)
    } else {
        None
    }
}

pub fn is_scalar(ty: &str) -> bool {
    SCALARS.contains(&ty)
}

pub fn is_integer_type(ty: &str) -> bool {
    INTEGER_TYPES.contains(&ty)
}

/// Base alignment of a built-in scalar, vector or matrix type.
pub fn builtin_alignment(ty: &str) -> Option<u32> {
    if is_scalar(ty) {
        return Some(SCALAR_ALIGNMENT);
    }
    VECTORS
        .iter()
        .find(|(name, _)| *name == ty)
        .map(|&(_, alignment)| alignment)
}

/// Returns `true` for every built-in type, opaque types included.
pub fn is_builtin(ty: &str) -> bool {
    builtin_alignment(ty).is_some() || opaque_kind(ty).is_some()
}
