//! GLSL to SPIR-V compilation of generated stages.
//!
//! Each call builds a fresh [`CompileSession`] (GLSL frontend plus
//! validator), runs it once and drops it before returning. Nothing is
//! cached between calls, so independent stages can be compiled from
//! different threads.

use naga::back::spv;
use naga::front::glsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};
use skfx_ir::StageKind;

/// Entry point of every generated stage.
pub const ENTRY_POINT: &str = "main";

/// File name validation diagnostics refer to.
pub const VIRTUAL_FILE_NAME: &str = "shader";

/// Errors from the native compiler. Each variant carries the compiler's
/// rendered diagnostic unmodified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NativeCompilationError {
    #[error("{stage} stage failed to compile:\n{diagnostic}")]
    Parse { stage: StageKind, diagnostic: String },
    #[error("{stage} stage failed validation:\n{diagnostic}")]
    Validation { stage: StageKind, diagnostic: String },
    #[error("{stage} stage failed SPIR-V generation: {diagnostic}")]
    Codegen { stage: StageKind, diagnostic: String },
}

impl NativeCompilationError {
    /// The compiler's diagnostic text.
    pub fn diagnostic(&self) -> &str {
        match self {
            Self::Parse { diagnostic, .. }
            | Self::Validation { diagnostic, .. }
            | Self::Codegen { diagnostic, .. } => diagnostic,
        }
    }

    pub fn stage(&self) -> StageKind {
        match *self {
            Self::Parse { stage, .. } | Self::Validation { stage, .. } | Self::Codegen { stage, .. } => {
                stage
            }
        }
    }
}

/// SPIR-V bytecode of one compiled stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledShaderStage {
    pub stage: StageKind,
    /// SPIR-V words.
    pub bytecode: Vec<u32>,
    pub entry_point: String,
}

impl CompiledShaderStage {
    /// The bytecode as little-endian bytes, the layout of a `.spv` file.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytecode.iter().flat_map(|w| w.to_le_bytes()).collect()
    }
}

fn shader_stage(stage: StageKind) -> naga::ShaderStage {
    match stage {
        StageKind::Vertex => naga::ShaderStage::Vertex,
        StageKind::Fragment => naga::ShaderStage::Fragment,
        StageKind::Compute => naga::ShaderStage::Compute,
    }
}

/// Compiler state for a single compile call.
pub struct CompileSession {
    stage: StageKind,
    frontend: glsl::Frontend,
    validator: Validator,
}

impl CompileSession {
    pub fn new(stage: StageKind) -> Self {
        Self {
            stage,
            frontend: glsl::Frontend::default(),
            validator: Validator::new(ValidationFlags::all(), Capabilities::all()),
        }
    }

    /// Parses, validates and writes `source` as SPIR-V. Consumes the
    /// session; its state is released on every return path.
    pub fn compile(mut self, source: &str) -> Result<CompiledShaderStage, NativeCompilationError> {
        let stage = self.stage;
        let options = glsl::Options::from(shader_stage(stage));
        let module = self.frontend.parse(&options, source).map_err(|errors| {
            NativeCompilationError::Parse {
                stage,
                diagnostic: errors.emit_to_string(source),
            }
        })?;

        let info = self.validator.validate(&module).map_err(|error| {
            NativeCompilationError::Validation {
                stage,
                diagnostic: error.emit_to_string_with_path(source, VIRTUAL_FILE_NAME),
            }
        })?;

        let mut spv_options = spv::Options::default();
        spv_options
            .flags
            .remove(spv::WriterFlags::ADJUST_COORDINATE_SPACE);
        // Debug names are needed for reflection of the cross-compiled output.
        spv_options.flags.insert(spv::WriterFlags::DEBUG);
        let pipeline = spv::PipelineOptions {
            shader_stage: shader_stage(stage),
            entry_point: ENTRY_POINT.to_string(),
        };
        let bytecode = spv::write_vec(&module, &info, &spv_options, Some(&pipeline)).map_err(
            |error| NativeCompilationError::Codegen {
                stage,
                diagnostic: error.to_string(),
            },
        )?;

        log::debug!("compiled {stage} stage to {} SPIR-V words", bytecode.len());
        Ok(CompiledShaderStage {
            stage,
            bytecode,
            entry_point: ENTRY_POINT.to_string(),
        })
    }
}

/// Compiles one generated GLSL stage to SPIR-V.
pub fn compile(source: &str, stage: StageKind) -> Result<CompiledShaderStage, NativeCompilationError> {
    CompileSession::new(stage).compile(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "#version 450\n\
        layout(location=0) in vec2 a_Position;\n\
        void vert() { gl_Position = vec4(a_Position, 0.0, 1.0); }\n\
        void main() { vert(); }\n";

    const FRAGMENT: &str = "#version 450\n\
        layout(location=0) out vec4 SK_COLOR0;\n\
        void main() { SK_COLOR0 = vec4(1.0); }\n";

    #[test]
    fn compiles_vertex_stage() {
        let compiled = compile(VERTEX, StageKind::Vertex).unwrap();
        assert_eq!(compiled.stage, StageKind::Vertex);
        assert_eq!(compiled.entry_point, "main");
        // SPIR-V magic number.
        assert_eq!(compiled.bytecode[0], 0x0723_0203);
        assert_eq!(compiled.to_bytes().len(), compiled.bytecode.len() * 4);
    }

    #[test]
    fn compiles_fragment_stage() {
        let compiled = compile(FRAGMENT, StageKind::Fragment).unwrap();
        assert!(!compiled.bytecode.is_empty());
    }

    #[test]
    fn compilation_is_deterministic() {
        let a = compile(VERTEX, StageKind::Vertex).unwrap();
        let b = compile(VERTEX, StageKind::Vertex).unwrap();
        assert_eq!(a.bytecode, b.bytecode);
    }

    #[test]
    fn syntax_error_keeps_diagnostic() {
        let err = compile("#version 450\nvoid main() { float x = ; }\n", StageKind::Fragment)
            .unwrap_err();
        assert!(matches!(err, NativeCompilationError::Parse { .. }));
        assert_eq!(err.stage(), StageKind::Fragment);
        assert!(!err.diagnostic().is_empty());
        assert!(err.to_string().contains(err.diagnostic()));
    }

    #[test]
    fn undeclared_identifier_is_an_error() {
        let err = compile(
            "#version 450\nvoid main() { gl_Position = missing; }\n",
            StageKind::Vertex,
        )
        .unwrap_err();
        assert!(err.diagnostic().contains("missing"));
    }
}
