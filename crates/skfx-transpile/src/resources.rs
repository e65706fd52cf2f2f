//! Resource declarations for `uniform` and `buffer` members.
//!
//! Plain uniforms are gathered into the user properties block. Combined
//! texture types are split into a texture and a sampler binding, with a
//! macro that rebuilds the combined sampler under the declared name so
//! `texture(m_Tex, uv)` keeps working.

use skfx_ir::{EffectDocumentPass, EffectMember};

use crate::bindings::{BindingMap, BindingSlot, RESOURCE_SET, USER_PROPERTIES_BLOCK};

/// Storage format given to every image.
pub const IMAGE_FORMAT: &str = "rgba32f";

/// Suffix of the texture half of a split combined sampler.
pub const TEXTURE_SUFFIX: &str = "_texture";
/// Suffix of the sampler paired with a texture.
pub const SAMPLER_SUFFIX: &str = "_sampler";

/// Separate texture type for a texture or cube map type name:
/// `sampler2DShadow` -> `texture2D`, `textureCube` -> `textureCube`.
pub fn separate_texture_type(ty: &str) -> String {
    match ty.strip_prefix("sampler") {
        Some(rest) => format!("texture{}", rest.replace("Shadow", "")),
        None => ty.to_string(),
    }
}

/// Sampler type paired with a texture type.
pub fn paired_sampler_type(ty: &str) -> &'static str {
    if ty.to_ascii_lowercase().contains("shadow") {
        "samplerShadow"
    } else {
        "sampler"
    }
}

/// Returns `true` for combined image-sampler types (`sampler2D`, ...).
fn is_combined(ty: &str) -> bool {
    ty.starts_with("sampler") && ty != "sampler" && ty != "samplerShadow"
}

fn layout(qualifiers: &str, binding: u32) -> String {
    if qualifiers.is_empty() {
        format!("layout(set={RESOURCE_SET}, binding={binding})")
    } else {
        format!("layout({qualifiers}, set={RESOURCE_SET}, binding={binding})")
    }
}

/// Writes the declaration of every `uniform` and `buffer` member.
pub fn write_resources(pass: &EffectDocumentPass, bindings: &BindingMap, out: &mut String) {
    let resources: Vec<(&EffectMember, BindingSlot)> = pass
        .members
        .iter()
        .filter_map(|m| bindings.get(&m.name).map(|slot| (m, slot)))
        .collect();

    if let Some(block) = bindings.user_properties {
        out.push_str(&format!(
            "{} uniform {USER_PROPERTIES_BLOCK} {{\n",
            layout("std140", block)
        ));
        for (member, _) in resources
            .iter()
            .filter(|(_, slot)| matches!(slot, BindingSlot::UserProperty { .. }))
        {
            out.push_str(&format!("    {} {};\n", member.ty, member.identifier()));
        }
        out.push_str("};\n\n");
    }

    for (member, slot) in &resources {
        match *slot {
            BindingSlot::UserProperty { .. } => {}
            BindingSlot::Buffer { binding } => {
                let access = if member.read_only { "readonly " } else { "" };
                out.push_str(&format!(
                    "{} {access}buffer g_internal_{} {{\n    {} {};\n}};\n",
                    layout("std430", binding),
                    member.name,
                    member.ty,
                    member.identifier()
                ));
            }
            BindingSlot::Image { binding } => {
                out.push_str(&format!(
                    "{} uniform {} {};\n",
                    layout(IMAGE_FORMAT, binding),
                    member.ty,
                    member.identifier()
                ));
            }
            BindingSlot::Sampler { binding } => {
                out.push_str(&format!(
                    "{} uniform {} {};\n",
                    layout("", binding),
                    member.ty,
                    member.identifier()
                ));
            }
            BindingSlot::Texture { texture, sampler } => {
                write_texture(member, texture, sampler, out);
            }
        }
    }
    out.push('\n');
}

fn write_texture(member: &EffectMember, texture: u32, sampler: u32, out: &mut String) {
    let name = &member.name;
    let texture_ty = separate_texture_type(&member.ty);
    let sampler_ty = paired_sampler_type(&member.ty);
    let texture_name = if is_combined(&member.ty) {
        format!("{name}{TEXTURE_SUFFIX}")
    } else {
        name.clone()
    };
    out.push_str(&format!(
        "{} uniform {texture_ty} {texture_name};\n",
        layout("", texture)
    ));
    out.push_str(&format!(
        "{} uniform {sampler_ty} {name}{SAMPLER_SUFFIX};\n",
        layout("", sampler)
    ));
    if is_combined(&member.ty) {
        out.push_str(&format!(
            "#define {name} {}({texture_name}, {name}{SAMPLER_SUFFIX})\n",
            member.ty
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources(source: &str) -> String {
        let doc = skfx_parser::parse("test", source).unwrap();
        let pass = &doc.passes[0];
        let analysis = skfx_analysis::analyze(pass).unwrap();
        let bindings = BindingMap::allocate(&analysis);
        let mut out = String::new();
        write_resources(pass, &bindings, &mut out);
        out
    }

    #[test]
    fn texture_type_mapping() {
        assert_eq!(separate_texture_type("sampler2D"), "texture2D");
        assert_eq!(separate_texture_type("sampler2DShadow"), "texture2D");
        assert_eq!(separate_texture_type("samplerCubeShadow"), "textureCube");
        assert_eq!(separate_texture_type("sampler2DArray"), "texture2DArray");
        assert_eq!(separate_texture_type("texture3D"), "texture3D");
        assert_eq!(paired_sampler_type("sampler2DShadow"), "samplerShadow");
        assert_eq!(paired_sampler_type("sampler2D"), "sampler");
    }

    #[test]
    fn plain_uniforms_share_one_block() {
        let out = resources("uniform mat4 g_Matrix;\nuniform float w[4];");
        assert_eq!(
            out,
            "layout(std140, set=1, binding=0) uniform g_internal_USER_PROPERTIES {\n    mat4 g_Matrix;\n    float w[4];\n};\n\n\n"
        );
    }

    #[test]
    fn combined_sampler_is_split() {
        let out = resources("uniform sampler2DShadow m_Shadow;");
        assert!(out.contains("layout(set=1, binding=0) uniform texture2D m_Shadow_texture;\n"));
        assert!(out.contains("layout(set=1, binding=1) uniform samplerShadow m_Shadow_sampler;\n"));
        assert!(out.contains(
            "#define m_Shadow sampler2DShadow(m_Shadow_texture, m_Shadow_sampler)\n"
        ));
        assert!(!out.contains(USER_PROPERTIES_BLOCK));
    }

    #[test]
    fn separate_texture_keeps_its_name() {
        let out = resources("uniform texture2D albedo;");
        assert!(out.contains("uniform texture2D albedo;\n"));
        assert!(out.contains("uniform sampler albedo_sampler;\n"));
        assert!(!out.contains("#define"));
    }

    #[test]
    fn buffers_and_images() {
        let out = resources(
            "struct P { vec4 pos; };\nreadonly buffer P src[];\nbuffer P dst[];\nuniform image2D target;",
        );
        assert!(out.contains(
            "layout(std430, set=1, binding=0) readonly buffer g_internal_src {\n    P src[];\n};\n"
        ));
        assert!(out.contains("layout(std430, set=1, binding=1) buffer g_internal_dst {"));
        assert!(out.contains("layout(rgba32f, set=1, binding=2) uniform image2D target;\n"));
    }
}
