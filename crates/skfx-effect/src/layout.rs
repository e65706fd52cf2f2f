//! Resource layout descriptors handed to the graphics device.

use std::fmt;

use serde::{Serialize, Serializer};
use skfx_ir::{EffectAnalysisResult, EffectDocumentPass, EffectParameterFlags, StageKind};
use skfx_parser::contains_identifier;
use skfx_transpile::TranspiledPass;
use skfx_transpile::stage::user_code;

/// How the device binds a resource.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize)]
pub enum ResourceKind {
    UniformBuffer,
    StructuredBufferReadOnly,
    StructuredBufferReadWrite,
    TextureReadOnly,
    TextureReadWrite,
    Sampler,
}

impl ResourceKind {
    /// Classifies a parameter by its flags.
    pub fn classify(flags: EffectParameterFlags) -> Self {
        if flags.contains(EffectParameterFlags::BUFFER) {
            if flags.contains(EffectParameterFlags::READ_ONLY) {
                Self::StructuredBufferReadOnly
            } else {
                Self::StructuredBufferReadWrite
            }
        } else if flags.contains(EffectParameterFlags::IMAGE) {
            Self::TextureReadWrite
        } else if flags.intersects(EffectParameterFlags::TEXTURE | EffectParameterFlags::CUBEMAP) {
            Self::TextureReadOnly
        } else if flags.contains(EffectParameterFlags::SAMPLER) {
            Self::Sampler
        } else {
            Self::UniformBuffer
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Set of stages a resource is visible to.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub struct StageMask(u8);

impl StageMask {
    pub const NONE: Self = Self(0);
    pub const VERTEX: Self = Self(1);
    pub const FRAGMENT: Self = Self(1 << 1);
    pub const COMPUTE: Self = Self(1 << 2);

    pub fn of(stage: StageKind) -> Self {
        match stage {
            StageKind::Vertex => Self::VERTEX,
            StageKind::Fragment => Self::FRAGMENT,
            StageKind::Compute => Self::COMPUTE,
        }
    }

    pub fn insert(&mut self, stage: StageKind) {
        self.0 |= Self::of(stage).0;
    }

    pub fn contains(self, stage: StageKind) -> bool {
        self.0 & Self::of(stage).0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Stages in the mask, in pipeline order.
    pub fn stages(self) -> impl Iterator<Item = StageKind> {
        StageKind::ALL.into_iter().filter(move |&s| self.contains(s))
    }
}

impl FromIterator<StageKind> for StageMask {
    fn from_iter<I: IntoIterator<Item = StageKind>>(iter: I) -> Self {
        let mut mask = Self::NONE;
        for stage in iter {
            mask.insert(stage);
        }
        mask
    }
}

impl fmt::Display for StageMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<String> = self.stages().map(|s| s.to_string()).collect();
        f.write_str(&names.join("|"))
    }
}

impl Serialize for StageMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.stages())
    }
}

/// One binding descriptor of a pass layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResourceLayoutElement {
    pub name: String,
    pub kind: ResourceKind,
    pub stage_mask: StageMask,
    pub flags: EffectParameterFlags,
    /// Binding in the resource set. Uniform members share the binding of
    /// the user properties block.
    pub binding: u32,
    /// Binding of the sampler paired with a texture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampler_binding: Option<u32>,
    /// Byte size, 0 for opaque resources.
    pub size: u32,
}

/// Builds one element per parameter, in parameter order.
pub fn layout_elements(
    pass: &EffectDocumentPass,
    analysis: &EffectAnalysisResult,
    transpiled: &TranspiledPass,
) -> Vec<ResourceLayoutElement> {
    let stage_code: Vec<(StageKind, String)> = transpiled
        .stages
        .iter()
        .map(|s| (s.stage, user_code(pass, s.stage)))
        .collect();

    analysis
        .parameters
        .iter()
        .zip(&transpiled.bindings.slots)
        .map(|(param, (_, slot))| {
            let mut stage_mask: StageMask = stage_code
                .iter()
                .filter(|(_, code)| contains_identifier(code, &param.name))
                .map(|&(stage, _)| stage)
                .collect();
            if stage_mask.is_empty() {
                stage_mask = stage_code.iter().map(|&(stage, _)| stage).collect();
            }
            ResourceLayoutElement {
                name: param.name.clone(),
                kind: ResourceKind::classify(param.flags),
                stage_mask,
                flags: param.flags,
                binding: slot.binding(),
                sampler_binding: slot.sampler_binding(),
                size: param.size,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use skfx_ir::EffectKind;

    fn elements(source: &str, kind: EffectKind) -> Vec<ResourceLayoutElement> {
        let doc = skfx_parser::parse("test", source).unwrap();
        let pass = &doc.passes[0];
        let analysis = skfx_analysis::analyze(pass).unwrap();
        let transpiled = skfx_transpile::transpile_pass(pass, &analysis, kind).unwrap();
        layout_elements(pass, &analysis, &transpiled)
    }

    #[test]
    fn classify_kinds() {
        use EffectParameterFlags as F;
        assert_eq!(ResourceKind::classify(F::UNIFORM), ResourceKind::UniformBuffer);
        assert_eq!(
            ResourceKind::classify(F::BUFFER),
            ResourceKind::StructuredBufferReadWrite
        );
        assert_eq!(
            ResourceKind::classify(F::BUFFER | F::READ_ONLY),
            ResourceKind::StructuredBufferReadOnly
        );
        assert_eq!(
            ResourceKind::classify(F::UNIFORM | F::IMAGE | F::TEXTURE_2D),
            ResourceKind::TextureReadWrite
        );
        assert_eq!(
            ResourceKind::classify(F::UNIFORM | F::TEXTURE | F::TEXTURE_2D),
            ResourceKind::TextureReadOnly
        );
        assert_eq!(
            ResourceKind::classify(F::UNIFORM | F::CUBEMAP),
            ResourceKind::TextureReadOnly
        );
        assert_eq!(
            ResourceKind::classify(F::UNIFORM | F::SAMPLER),
            ResourceKind::Sampler
        );
    }

    #[test]
    fn one_element_per_parameter_in_order() {
        let els = elements(
            "uniform float a; uniform sampler2D t; uniform vec4 b; \
             void vert() { } void frag() { SK_COLOR0 = texture(t, vec2(a)) * b; }",
            EffectKind::Graphics,
        );
        let names: Vec<&str> = els.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "t", "b"]);
        assert_eq!(els[0].binding, 0);
        assert_eq!(els[1].binding, 1);
        assert_eq!(els[1].sampler_binding, Some(2));
        assert_eq!(els[2].binding, 0);
        assert_eq!(els[2].size, 16);
    }

    #[test]
    fn stage_mask_follows_usage() {
        let els = elements(
            "uniform mat4 g_World; uniform vec4 g_Tint; uniform float g_Unused; \
             void vert() { SK_POSITION = g_World * vec4(0); } \
             void frag() { SK_COLOR0 = g_Tint; }",
            EffectKind::Graphics,
        );
        assert_eq!(els[0].stage_mask, StageMask::VERTEX);
        assert_eq!(els[1].stage_mask, StageMask::FRAGMENT);
        assert_eq!(els[2].stage_mask.to_string(), "vertex|fragment");
    }

    #[test]
    fn helper_usage_counts_for_every_stage() {
        let els = elements(
            "uniform float g_Scale; float scaled(float x) { return x * g_Scale; } \
             void vert() { } void frag() { SK_COLOR0 = vec4(scaled(1.0)); }",
            EffectKind::Graphics,
        );
        assert!(els[0].stage_mask.contains(StageKind::Vertex));
        assert!(els[0].stage_mask.contains(StageKind::Fragment));
    }

    #[test]
    fn buffers_are_structured() {
        let els = elements(
            "readonly buffer float src[]; buffer float dst[]; \
             void comp() { dst[0] = src[0]; }",
            EffectKind::Compute,
        );
        assert_eq!(els[0].kind, ResourceKind::StructuredBufferReadOnly);
        assert_eq!(els[1].kind, ResourceKind::StructuredBufferReadWrite);
        assert_eq!(els[0].stage_mask, StageMask::COMPUTE);
        assert_eq!((els[0].binding, els[1].binding), (0, 1));
    }

    #[test]
    fn serializes_stage_names() {
        let mask: StageMask = [StageKind::Fragment, StageKind::Vertex].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&mask).unwrap(),
            r#"["Vertex","Fragment"]"#
        );
    }
}
