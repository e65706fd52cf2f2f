//! Lowering pass: [`TokenStream`] → [`EffectDocumentPass`].

use skfx_ir::{
    EffectAttrib, EffectDocumentPass, EffectMember, EffectMethod, EffectStructInfo, MethodParam,
    StructMember,
};

use crate::token::{ExternToken, MethodToken, TokenStream};

pub fn lower_pass(name: &str, source: &str, tokens: &TokenStream<'_>) -> EffectDocumentPass {
    EffectDocumentPass {
        name: name.to_string(),
        source: source.to_string(),
        structs: tokens
            .structs
            .iter()
            .map(|st| EffectStructInfo {
                name: st.name.to_string(),
                members: st
                    .members
                    .iter()
                    .map(|m| StructMember {
                        ty: m.ty.to_string(),
                        name: m.name.to_string(),
                        array: m.array,
                    })
                    .collect(),
                span: st.span,
            })
            .collect(),
        attribs: tokens
            .attribs
            .iter()
            .map(|a| EffectAttrib {
                ty: a.ty.to_string(),
                name: a.name.to_string(),
                span: a.span,
            })
            .collect(),
        members: tokens.externs.iter().map(lower_member).collect(),
        methods: tokens.methods.iter().map(lower_method).collect(),
    }
}

fn lower_member(ext: &ExternToken<'_>) -> EffectMember {
    // `extern` is another spelling of `uniform`.
    let qualifier = match ext.qualifier {
        "extern" => "uniform",
        other => other,
    };
    EffectMember {
        qualifier: qualifier.to_string(),
        read_only: ext.read_only,
        ty: ext.ty.to_string(),
        name: ext.name.to_string(),
        array: ext.array,
        span: ext.span,
    }
}

fn lower_method(method: &MethodToken<'_>) -> EffectMethod {
    EffectMethod {
        name: method.name.to_string(),
        return_type: method.return_type.to_string(),
        params: lower_params(method.params),
        stage: method.stage,
        span: method.span,
        body: method.body,
    }
}

/// Splits `in vec2 uv, inout float x` into `(type, name)` pairs. Leading
/// qualifiers are dropped; `()` and `(void)` yield no parameters.
fn lower_params(params: &str) -> Vec<MethodParam> {
    params
        .split(',')
        .filter_map(|param| {
            let param = param.split('[').next().unwrap_or(param);
            let words: Vec<&str> = param.split_whitespace().collect();
            match words.as_slice() {
                [] | ["void"] => None,
                [.., ty, name] => Some(MethodParam {
                    ty: ty.to_string(),
                    name: name.to_string(),
                }),
                [ty] => Some(MethodParam {
                    ty: ty.to_string(),
                    name: String::new(),
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;
    use skfx_ir::{ArraySize, StageKind};

    #[test]
    fn lower_extern_as_uniform() {
        let src = "extern mat4 g_Matrix;\nbuffer float data[];";
        let tokens = tokenize(src).unwrap();
        let pass = lower_pass("Main", src, &tokens);
        assert_eq!(pass.members[0].qualifier, "uniform");
        assert_eq!(pass.members[1].qualifier, "buffer");
        assert_eq!(pass.members[1].array, Some(ArraySize::Runtime));
        assert_eq!(pass.text(pass.members[0].span), "extern mat4 g_Matrix;");
    }

    #[test]
    fn lower_method_params() {
        assert!(lower_params("").is_empty());
        assert!(lower_params(" void ").is_empty());
        let params = lower_params("in vec2 uv, inout float x, float w[4]");
        let pairs: Vec<(&str, &str)> = params
            .iter()
            .map(|p| (p.ty.as_str(), p.name.as_str()))
            .collect();
        assert_eq!(pairs, [("vec2", "uv"), ("float", "x"), ("float", "w")]);
    }

    #[test]
    fn lower_keeps_method_stage_and_body() {
        let src = "void comp() { }";
        let tokens = tokenize(src).unwrap();
        let pass = lower_pass("Main", src, &tokens);
        let method = &pass.methods[0];
        assert_eq!(method.stage, Some(StageKind::Compute));
        assert_eq!(pass.text(method.body), "{ }");
    }
}
