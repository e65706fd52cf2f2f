//! Built-in prelude shared by every generated stage.

use crate::bindings::{TRANSFORM_BINDING, TRANSFORM_SET};

pub const GLSL_VERSION: &str = "#version 450";

/// Name of the built-in transform block.
pub const TRANSFORM_BLOCK: &str = "g_internal_TRANSFORMS";

const TRANSFORM_MEMBERS: &[(&str, &str)] = &[
    ("P_MATRIX", "g_internal_Projection"),
    ("V_MATRIX", "g_internal_View"),
    ("M_MATRIX", "g_internal_Model"),
];

/// Macro aliases for GLSL built-ins and derived transforms.
const MACROS: &[(&str, &str)] = &[
    ("SK_POSITION", "gl_Position"),
    ("SK_POINT_SIZE", "gl_PointSize"),
    ("SK_CLIP_DISTANCE", "gl_ClipDistance"),
    ("SK_DRAW_ID", "gl_DrawID"),
    ("SK_VERTEX_ID", "gl_VertexIndex"),
    ("SK_VERTEX_BASE", "gl_BaseVertex"),
    ("SK_INSTANCE_ID", "gl_InstanceIndex"),
    ("SK_INSTANCE_BASE", "gl_BaseInstance"),
    ("OBJECT_TO_VIEW", "(V_MATRIX * M_MATRIX)"),
    ("OBJECT_TO_CLIP", "(P_MATRIX * V_MATRIX * M_MATRIX)"),
];

/// Writes the version line, the transform block and the macro aliases.
pub fn write_header(out: &mut String) {
    out.push_str(GLSL_VERSION);
    out.push_str("\n\n");
    out.push_str(&format!(
        "layout(std140, set={TRANSFORM_SET}, binding={TRANSFORM_BINDING}) uniform {TRANSFORM_BLOCK} {{\n"
    ));
    for (_, member) in TRANSFORM_MEMBERS {
        out.push_str(&format!("    mat4 {member};\n"));
    }
    out.push_str("};\n\n");
    for (alias, member) in TRANSFORM_MEMBERS.iter().chain(MACROS) {
        out.push_str(&format!("#define {alias} {member}\n"));
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let mut out = String::new();
        write_header(&mut out);
        assert!(out.starts_with("#version 450\n"));
        assert!(out.contains(
            "layout(std140, set=0, binding=0) uniform g_internal_TRANSFORMS {\n    mat4 g_internal_Projection;"
        ));
        assert!(out.contains("#define SK_POSITION gl_Position\n"));
        assert!(out.contains("#define OBJECT_TO_CLIP (P_MATRIX * V_MATRIX * M_MATRIX)\n"));
    }
}
