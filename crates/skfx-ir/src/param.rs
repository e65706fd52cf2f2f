//! Parameters, stage varyings and the per-pass analysis result.

use serde::{Serialize, Serializer};

/// Classification bits for an effect parameter.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub struct EffectParameterFlags(u32);

impl EffectParameterFlags {
    /// No flags.
    pub const EMPTY: Self = Self(0);
    /// Declared with the `buffer` qualifier.
    pub const BUFFER: Self = Self(1);
    /// Declared with the `uniform` (or `extern`) qualifier.
    pub const UNIFORM: Self = Self(1 << 1);
    /// Storage image.
    pub const IMAGE: Self = Self(1 << 2);
    /// Sampled texture.
    pub const TEXTURE: Self = Self(1 << 3);
    /// Standalone sampler.
    pub const SAMPLER: Self = Self(1 << 4);
    /// Cube map texture.
    pub const CUBEMAP: Self = Self(1 << 5);
    /// Type name contains `1D`.
    pub const TEXTURE_1D: Self = Self(1 << 6);
    /// Type name contains `2D`.
    pub const TEXTURE_2D: Self = Self(1 << 7);
    /// Type name contains `3D`.
    pub const TEXTURE_3D: Self = Self(1 << 8);
    /// `readonly buffer`.
    pub const READ_ONLY: Self = Self(1 << 9);

    const NAMES: [(Self, &'static str); 10] = [
        (Self::BUFFER, "Buffer"),
        (Self::UNIFORM, "Uniform"),
        (Self::IMAGE, "Image"),
        (Self::TEXTURE, "Texture"),
        (Self::SAMPLER, "Sampler"),
        (Self::CUBEMAP, "Cubemap"),
        (Self::TEXTURE_1D, "Texture1D"),
        (Self::TEXTURE_2D, "Texture2D"),
        (Self::TEXTURE_3D, "Texture3D"),
        (Self::READ_ONLY, "ReadOnly"),
    ];

    /// Returns `true` if `self` contains all flags in `other`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if `self` shares any flag with `other`.
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `true` if no flags are set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw bit representation.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` for types with no in-buffer representation.
    pub fn is_opaque(self) -> bool {
        self.intersects(Self::IMAGE | Self::TEXTURE | Self::SAMPLER | Self::CUBEMAP)
    }

    /// Names of the set flags, in bit order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }
}

impl std::ops::BitOr for EffectParameterFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for EffectParameterFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl Serialize for EffectParameterFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

/// A bindable parameter of a pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EffectParameterInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// Byte size in the parameter's buffer; `0` for opaque types.
    pub size: u32,
    pub flags: EffectParameterFlags,
}

/// A `stage` member: a value written by the vertex stage and read by the
/// fragment stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EffectStageInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// Everything the analyzer learned about one pass.
///
/// `parameters` is in declaration order; the resource layout built from it
/// keeps that order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EffectAnalysisResult {
    pub stages: Vec<EffectStageInfo>,
    pub parameters: Vec<EffectParameterInfo>,
}

impl EffectAnalysisResult {
    /// Index of the parameter called `name`.
    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name == name)
    }
}
