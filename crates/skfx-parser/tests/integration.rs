//! Integration tests for the effect parser.

use skfx_ir::{ArraySize, StageKind, dump_document};
use skfx_parser::{ParseError, parse, tokenize};

const SPRITE: &str = r#"
// Textured sprite with a tint.
struct Tint {
    vec3 color;
    float strength;
};

attrib vec2 a_Position;
attrib vec2 a_UV;

extern mat4 g_Matrix;
uniform Tint m_Tint;
uniform sampler2D m_Tex;
stage vec2 v_uv;

vec3 apply_tint(vec3 c) {
    return mix(c, m_Tint.color, m_Tint.strength);
}

void vert() {
    v_uv = a_UV;
    SK_POSITION = g_Matrix * vec4(a_Position, 0, 1);
}

void frag() {
    vec4 c = texture(m_Tex, v_uv);
    SK_COLOR0 = vec4(apply_tint(c.rgb), c.a);
}
"#;

#[test]
fn parse_sprite() {
    let doc = parse("Sprite", SPRITE).expect("sprite should parse");
    assert_eq!(doc.passes.len(), 1);
    let pass = &doc.passes[0];

    assert_eq!(pass.structs.len(), 1);
    assert_eq!(pass.structs[0].name, "Tint");
    assert_eq!(pass.structs[0].members.len(), 2);

    let attribs: Vec<&str> = pass.attribs.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(attribs, ["a_Position", "a_UV"]);

    let members: Vec<(&str, &str)> = pass
        .members
        .iter()
        .map(|m| (m.qualifier.as_str(), m.name.as_str()))
        .collect();
    assert_eq!(
        members,
        [
            ("uniform", "g_Matrix"),
            ("uniform", "m_Tint"),
            ("uniform", "m_Tex"),
            ("stage", "v_uv"),
        ]
    );

    assert_eq!(pass.stages(), vec![StageKind::Vertex, StageKind::Fragment]);
    let helper = pass.methods.iter().find(|m| m.name == "apply_tint").unwrap();
    assert_eq!(helper.stage, None);
    assert_eq!(helper.return_type, "vec3");
    assert_eq!(helper.params[0].name, "c");

    let frag = pass.entry(StageKind::Fragment).unwrap();
    assert!(pass.text(frag.span).starts_with("void frag()"));
    assert!(pass.text(frag.span).ends_with('}'));

    let dump = dump_document(&doc);
    assert!(dump.contains("uniform sampler2D m_Tex"));
    assert!(dump.contains("void frag() [fragment]"));
}

#[test]
fn parse_compute_with_buffers() {
    let source = r#"
layout(local_size_x = 64) in;
struct Particle { vec4 position; vec4 velocity; };
readonly buffer Particle source_particles[];
buffer Particle particles[];
uniform float dt;

void comp() {
    uint i = gl_GlobalInvocationID.x;
    particles[i].position = source_particles[i].position + source_particles[i].velocity * dt;
}
"#;
    let doc = parse("Particles", source).expect("compute effect should parse");
    let pass = &doc.passes[0];
    assert_eq!(pass.stages(), vec![StageKind::Compute]);
    assert_eq!(pass.members.len(), 3);
    assert!(pass.members[0].read_only);
    assert!(!pass.members[1].read_only);
    assert_eq!(pass.members[1].array, Some(ArraySize::Runtime));
}

#[test]
fn multiple_passes_keep_their_own_declarations() {
    let source = r#"
pass Depth {
    attrib vec3 a_Position;
    void vert() { SK_POSITION = OBJECT_TO_CLIP * vec4(a_Position, 1); }
    void frag() { }
}

pass Color {
    attrib vec3 a_Position;
    uniform vec4 m_Color;
    void vert() { SK_POSITION = OBJECT_TO_CLIP * vec4(a_Position, 1); }
    void frag() { SK_COLOR0 = m_Color; }
}
"#;
    let doc = parse("Lit", source).unwrap();
    assert_eq!(doc.passes.len(), 2);
    assert!(doc.pass("Depth").unwrap().members.is_empty());
    assert_eq!(doc.pass("Color").unwrap().members[0].name, "m_Color");
}

#[test]
fn nested_braces_in_method_body() {
    let source = "void vert() { for (int i = 0; i < 2; i++) { if (i == 1) { } } }";
    let tokens = tokenize(source).unwrap();
    assert_eq!(tokens.methods[0].span.end(), source.len());
}

#[test]
fn unmatched_opening_brace_is_invalid_method_syntax() {
    let err = parse("x", "void vert() { if (true) { }").unwrap_err();
    assert!(matches!(err, ParseError::InvalidMethodSyntax { .. }));
    assert!(err.to_string().contains("'vert'"));
}

#[test]
fn unknown_qualifier_still_parses() {
    // Qualifier validation belongs to the analyzer.
    let doc = parse("x", "varying vec2 uv;").unwrap();
    assert_eq!(doc.passes[0].members[0].qualifier, "varying");
}
