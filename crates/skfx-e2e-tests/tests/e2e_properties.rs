mod common;

use skfx_effect::DeviceBackend;
use skfx_ir::{EffectKind, StageKind};

const MIXED: &str = "struct Light { vec3 dir; float power; };\n\
    attrib vec3 a_Normal;\n\
    uniform Light g_Light;\n\
    uniform sampler2D m_Albedo;\n\
    uniform float g_Weights[4];\n\
    uniform samplerCube m_Env;\n\
    uniform vec4 g_Tint;\n\
    void vert() { SK_POSITION = vec4(a_Normal, 1.0); }\n\
    void frag() {\n\
        float w = g_Weights[0] + g_Weights[3];\n\
        vec4 env = texture(m_Env, a_Normal);\n\
        SK_COLOR0 = texture(m_Albedo, vec2(0.5)) * g_Tint * w * g_Light.power + env;\n\
    }\n";

#[test]
fn layout_order_matches_parameter_order() {
    let effect = common::compile(MIXED, EffectKind::Graphics, DeviceBackend::Vulkan);
    let pass = common::single_pass(&effect);
    let params: Vec<&str> = pass
        .analysis
        .parameters
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    let elements: Vec<&str> = pass
        .layout_elements
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(params, ["g_Light", "m_Albedo", "g_Weights", "m_Env", "g_Tint"]);
    assert_eq!(elements, params);
    assert_eq!(pass.layout.elements, pass.layout_elements);
}

#[test]
fn bindings_increase_in_declaration_order() {
    let effect = common::compile(MIXED, EffectKind::Graphics, DeviceBackend::Vulkan);
    let pass = common::single_pass(&effect);
    let bindings: Vec<(u32, Option<u32>)> = pass
        .layout_elements
        .iter()
        .map(|e| (e.binding, e.sampler_binding))
        .collect();
    assert_eq!(
        bindings,
        [(0, None), (1, Some(2)), (0, None), (3, Some(4)), (0, None)]
    );
}

#[test]
fn size_law_for_scalar_arrays() {
    let analysis = common::analyze(
        "uniform float a[3]; uniform int b[5]; uniform uint c[1]; void vert() { } void frag() { }",
    );
    for param in &analysis.parameters {
        let n = match param.name.as_str() {
            "a" => 3,
            "b" => 5,
            _ => 1,
        };
        assert_eq!(param.size, n * 16, "{}", param.name);
    }
}

#[test]
fn non_scalar_array_size_uses_alignment() {
    let analysis = common::analyze(
        "struct S { vec4 a; vec4 b; }; uniform S s[2]; uniform vec2 v[3]; \
         void vert() { } void frag() { }",
    );
    assert_eq!(analysis.parameters[0].size, 64);
    assert_eq!(analysis.parameters[1].size, 24);
}

#[test]
fn compilation_is_deterministic() {
    let a = common::compile(MIXED, EffectKind::Graphics, DeviceBackend::OpenGl);
    let b = common::compile(MIXED, EffectKind::Graphics, DeviceBackend::OpenGl);
    for (x, y) in a.passes[0].stages.iter().zip(&b.passes[0].stages) {
        assert_eq!(x.bytecode, y.bytecode);
    }
    for (x, y) in a.passes[0].translated.iter().zip(&b.passes[0].translated) {
        assert_eq!(x.text, y.text);
    }
}

#[test]
fn stage_isolation() {
    let source = "void vert() { float vertex_marker = 1.0; SK_POSITION = vec4(vertex_marker); }\n\
                  void frag() { float fragment_marker = 2.0; SK_COLOR0 = vec4(fragment_marker); }\n\
                  void comp() { float compute_marker = 3.0; }\n";
    let effect = common::compile(source, EffectKind::Graphics, DeviceBackend::Vulkan);
    let pass = common::single_pass(&effect);
    let vertex = pass.source(StageKind::Vertex).unwrap();
    let fragment = pass.source(StageKind::Fragment).unwrap();
    assert!(vertex.contains("vertex_marker"));
    assert!(!vertex.contains("fragment_marker") && !vertex.contains("compute_marker"));
    assert!(fragment.contains("fragment_marker"));
    assert!(!fragment.contains("vertex_marker") && !fragment.contains("compute_marker"));
}

#[test]
fn stage_masks_follow_usage() {
    let effect = common::compile(MIXED, EffectKind::Graphics, DeviceBackend::Vulkan);
    let pass = common::single_pass(&effect);
    for element in &pass.layout_elements {
        assert!(element.stage_mask.contains(StageKind::Fragment), "{}", element.name);
        assert!(!element.stage_mask.contains(StageKind::Vertex), "{}", element.name);
    }
}

#[test]
fn layout_serializes_to_json() {
    let effect = common::compile(MIXED, EffectKind::Graphics, DeviceBackend::Vulkan);
    let pass = common::single_pass(&effect);
    let json = serde_json::to_value(&pass.layout_elements).unwrap();
    assert_eq!(json[1]["name"], "m_Albedo");
    assert_eq!(json[1]["kind"], "TextureReadOnly");
    assert_eq!(json[1]["sampler_binding"], 2);
    assert_eq!(json[3]["kind"], "TextureReadOnly");
    assert!(json[0].get("sampler_binding").is_none());
}
