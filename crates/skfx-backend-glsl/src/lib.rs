//! GLSL backend for skfx.
//!
//! Emits desktop GLSL (4.30 by default) or GLSL ES through naga's GLSL
//! writer. GLSL has no separate samplers, so the writer fuses every
//! texture with the sampler it is used with. With
//! [`BackendOptions::remap_combined_samplers`] set, bindings are flattened
//! in `(set, binding)` order and each fused sampler takes its texture's
//! slot, keeping the numbering of the separate texture/sampler layout.

use std::collections::BTreeMap;

use naga::back::glsl;
use naga::proc::BoundsCheckPolicies;
use skfx_backend_core::{
    Backend, BackendError, BackendOptions, BackendOutput, Diagnostic, DiagnosticLevel,
    ParseContext, error_chain,
};

/// GLSL ES version used when [`BackendOptions::glsl_es`] is set.
const ES_VERSION: u16 = 310;

/// GLSL backend.
#[derive(Debug)]
pub struct GlslBackend;

impl Backend for GlslBackend {
    fn name(&self) -> &str {
        "GLSL"
    }

    fn targets(&self) -> &[&str] {
        &["glsl"]
    }

    fn extension(&self) -> &str {
        "glsl"
    }

    fn compile(
        &self,
        shader: &ParseContext,
        opts: &BackendOptions,
    ) -> Result<BackendOutput, BackendError> {
        let mut diagnostics = Vec::new();
        let binding_map = if opts.remap_combined_samplers {
            let map = flattened_bindings(shader.module())?;
            diagnostics.push(Diagnostic {
                level: DiagnosticLevel::Info,
                message: format!("flattened {} resource binding(s)", map.len()),
            });
            map
        } else {
            BTreeMap::new()
        };

        let version = if opts.glsl_es {
            glsl::Version::Embedded {
                version: ES_VERSION,
                is_webgl: false,
            }
        } else {
            glsl::Version::Desktop(opts.glsl_version)
        };
        let options = glsl::Options {
            version,
            writer_flags: glsl::WriterFlags::empty(),
            binding_map,
            ..Default::default()
        };
        let entry = shader.entry_point();
        let pipeline = glsl::PipelineOptions {
            shader_stage: entry.stage,
            entry_point: entry.name.clone(),
            multiview: None,
        };

        let mut text = String::new();
        let mut writer = glsl::Writer::new(
            &mut text,
            shader.module(),
            shader.info(),
            &options,
            &pipeline,
            BoundsCheckPolicies::default(),
        )
        .map_err(|e| BackendError::Other(error_chain(&e)))?;
        writer
            .write()
            .map_err(|e| BackendError::Other(error_chain(&e)))?;

        Ok(BackendOutput { text, diagnostics })
    }
}

/// Assigns every bound global a GLSL binding, in `(set, binding)` order.
///
/// naga looks the binding of a fused sampler up under its texture's
/// resource binding, so the fused sampler lands on the texture's slot.
fn flattened_bindings(module: &naga::Module) -> Result<glsl::BindingMap, BackendError> {
    let mut bound: Vec<naga::ResourceBinding> = module
        .global_variables
        .iter()
        .filter_map(|(_, var)| var.binding.clone())
        .collect();
    bound.sort_by_key(|rb| (rb.group, rb.binding));
    bound.dedup();

    bound
        .into_iter()
        .enumerate()
        .map(|(slot, rb)| {
            let slot = u8::try_from(slot).map_err(|_| {
                BackendError::Unsupported(format!(
                    "binding (set={}, binding={}) exceeds 255 flattened GLSL bindings",
                    rb.group, rb.binding
                ))
            })?;
            log::trace!("set={} binding={} -> {slot}", rb.group, rb.binding);
            Ok((rb, slot))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use skfx_backend_core::{BackendRegistry, transpile};
    use skfx_ir::StageKind;

    const FRAGMENT: &str = "#version 450\n\
        layout(std140, set=0, binding=0) uniform Globals { vec4 tint; };\n\
        layout(set=1, binding=0) uniform texture2D m_Tex_texture;\n\
        layout(set=1, binding=1) uniform sampler m_Tex_sampler;\n\
        layout(location=0) out vec4 SK_COLOR0;\n\
        void main() { SK_COLOR0 = texture(sampler2D(m_Tex_texture, m_Tex_sampler), vec2(0.5)) * tint; }\n";

    fn cross(opts: &BackendOptions) -> BackendOutput {
        let words = skfx_native::compile(FRAGMENT, StageKind::Fragment)
            .unwrap()
            .bytecode;
        let mut reg = BackendRegistry::new();
        reg.register(Box::new(GlslBackend));
        transpile(&reg, &words, "glsl", opts).unwrap()
    }

    #[test]
    fn emits_desktop_430() {
        let out = cross(&BackendOptions::default());
        assert!(out.text.starts_with("#version 430"));
        assert!(out.text.contains("sampler2D"));
    }

    #[test]
    fn remaps_fused_sampler_to_texture_slot() {
        let out = cross(&BackendOptions::default());
        // Globals -> 0, texture -> 1, sampler -> 2.
        assert!(out.text.contains("binding = 1)"));
        assert!(!out.text.contains("binding = 2)"));
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].message, "flattened 3 resource binding(s)");
    }

    #[test]
    fn es_output() {
        let opts = BackendOptions {
            glsl_es: true,
            ..Default::default()
        };
        let out = cross(&opts);
        assert!(out.text.starts_with("#version 310 es"));
    }

    #[test]
    fn remapping_can_be_disabled() {
        let opts = BackendOptions {
            remap_combined_samplers: false,
            ..Default::default()
        };
        let out = cross(&opts);
        assert!(out.diagnostics.is_empty());
    }
}
