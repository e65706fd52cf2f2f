//! HLSL backend for skfx.
//!
//! Emits HLSL through naga's HLSL writer. Textures stay separate from
//! samplers in HLSL, so resources keep their binding: the register index
//! is the binding and the register space is the set. Vertex inputs are
//! written one per location.

use naga::back::hlsl;
use skfx_backend_core::{
    Backend, BackendError, BackendOptions, BackendOutput, ParseContext, error_chain,
};

/// HLSL backend.
#[derive(Debug)]
pub struct HlslBackend;

impl Backend for HlslBackend {
    fn name(&self) -> &str {
        "HLSL"
    }

    fn targets(&self) -> &[&str] {
        &["hlsl"]
    }

    fn extension(&self) -> &str {
        "hlsl"
    }

    fn compile(
        &self,
        shader: &ParseContext,
        opts: &BackendOptions,
    ) -> Result<BackendOutput, BackendError> {
        let options = hlsl::Options {
            shader_model: shader_model(opts.shader_model)?,
            // Registers come straight from (set, binding).
            fake_missing_bindings: true,
            ..Default::default()
        };
        log::debug!("writing HLSL for {:?}", options.shader_model);

        let mut text = String::new();
        let pipeline = hlsl::PipelineOptions::default();
        let mut writer = hlsl::Writer::new(&mut text, &options, &pipeline);
        writer
            .write(shader.module(), shader.info(), None)
            .map_err(|e| BackendError::Other(error_chain(&e)))?;

        Ok(BackendOutput {
            text,
            diagnostics: vec![],
        })
    }
}

/// Maps `major * 10 + minor` to a naga shader model.
fn shader_model(model: u8) -> Result<hlsl::ShaderModel, BackendError> {
    Ok(match model {
        50 => hlsl::ShaderModel::V5_0,
        51 => hlsl::ShaderModel::V5_1,
        60 => hlsl::ShaderModel::V6_0,
        61 => hlsl::ShaderModel::V6_1,
        62 => hlsl::ShaderModel::V6_2,
        _ => {
            return Err(BackendError::Unsupported(format!(
                "shader model {}.{}",
                model / 10,
                model % 10
            )));
        }
    })
}
