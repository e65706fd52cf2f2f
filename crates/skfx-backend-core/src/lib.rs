#![warn(missing_docs)]
//! Cross-compile backends for skfx.
//!
//! Defines the [`Backend`] trait that every target language emitter
//! implements, the [`ParseContext`] that turns SPIR-V back into a validated
//! module, and a [`BackendRegistry`] used to dispatch on target names.
//! [`transpile`] ties the three together for a single stage.

use std::error::Error as StdError;
use std::fmt::{self, Debug};

use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};
use skfx_ir::StageKind;

/// A backend that turns a parsed SPIR-V stage into target source text.
pub trait Backend: Debug + Send + Sync {
    /// Human-readable name (e.g. "GLSL").
    fn name(&self) -> &str;

    /// Target identifiers this backend handles (for `--target` dispatch).
    fn targets(&self) -> &[&str];

    /// File extension of the generated text, without the dot.
    fn extension(&self) -> &str;

    /// Emit the stage held by `shader`.
    fn compile(
        &self,
        shader: &ParseContext,
        opts: &BackendOptions,
    ) -> Result<BackendOutput, BackendError>;
}

/// Options passed to every backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendOptions {
    /// GLSL language version.
    pub glsl_version: u16,
    /// Emit GLSL ES instead of desktop GLSL.
    pub glsl_es: bool,
    /// HLSL shader model, as `major * 10 + minor`.
    pub shader_model: u8,
    /// Give each combined GLSL sampler the binding of its texture.
    pub remap_combined_samplers: bool,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            glsl_version: 430,
            glsl_es: false,
            shader_model: 50,
            remap_combined_samplers: true,
        }
    }
}

impl fmt::Display for BackendOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BackendOptions {{ glsl: {}{}, shader_model: {}, remap_combined_samplers: {} }}",
            self.glsl_version,
            if self.glsl_es { " es" } else { "" },
            self.shader_model,
            self.remap_combined_samplers
        )
    }
}

/// The output produced by a backend.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackendOutput {
    /// Generated source text.
    pub text: String,
    /// Non-fatal diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

impl fmt::Display for BackendOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} byte(s), {} diagnostic(s)",
            self.text.len(),
            self.diagnostics.len()
        )
    }
}

/// A non-fatal diagnostic message from a backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity level.
    pub level: DiagnosticLevel,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Severity level for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticLevel {
    /// A warning that does not prevent compilation.
    Warning,
    /// An informational note.
    Info,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "Warning",
            Self::Info => "Info",
        })
    }
}

/// Errors raised by a backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The stage or an option is not supported by this backend.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// The target writer failed; carries its diagnostic verbatim.
    #[error("{0}")]
    Other(String),
}

/// Errors from [`transpile`].
#[derive(Debug, thiserror::Error)]
pub enum CrossCompileError {
    /// No registered backend handles the target.
    #[error("unknown cross-compile target '{0}'")]
    UnknownTarget(String),
    /// The bytecode could not be parsed.
    #[error("failed to parse SPIR-V: {0}")]
    Parse(String),
    /// The parsed module failed validation.
    #[error("parsed SPIR-V failed validation: {0}")]
    Validation(String),
    /// The bytecode holds no entry point.
    #[error("SPIR-V module has no entry point")]
    NoEntryPoint,
    /// The backend failed.
    #[error("{backend} backend: {error}")]
    Backend {
        /// Name of the failing backend.
        backend: String,
        /// The backend's error, already part of the message.
        error: BackendError,
    },
}

/// Joins an error and its sources into one message.
pub fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

/// A SPIR-V stage parsed back into a validated module.
///
/// Lives for exactly one [`transpile`] call and is dropped on every
/// return path.
#[derive(Debug)]
pub struct ParseContext {
    module: naga::Module,
    info: ModuleInfo,
}

impl ParseContext {
    /// Parses and validates SPIR-V words.
    pub fn parse(bytecode: &[u32]) -> Result<Self, CrossCompileError> {
        let bytes: Vec<u8> = bytecode.iter().flat_map(|w| w.to_le_bytes()).collect();
        let options = naga::front::spv::Options {
            adjust_coordinate_space: false,
            ..Default::default()
        };
        let module = naga::front::spv::parse_u8_slice(&bytes, &options)
            .map_err(|e| CrossCompileError::Parse(error_chain(&e)))?;
        let info = Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .map_err(|e| CrossCompileError::Validation(error_chain(&e)))?;
        if module.entry_points.is_empty() {
            return Err(CrossCompileError::NoEntryPoint);
        }
        Ok(Self { module, info })
    }

    /// The parsed module.
    pub fn module(&self) -> &naga::Module {
        &self.module
    }

    /// Validation info for [`ParseContext::module`].
    pub fn info(&self) -> &ModuleInfo {
        &self.info
    }

    /// The stage's entry point.
    pub fn entry_point(&self) -> &naga::EntryPoint {
        // `parse` rejects modules without entry points.
        &self.module.entry_points[0]
    }

    /// The pipeline stage of the entry point, if it is one skfx produces.
    pub fn stage(&self) -> Option<StageKind> {
        match self.entry_point().stage {
            naga::ShaderStage::Vertex => Some(StageKind::Vertex),
            naga::ShaderStage::Fragment => Some(StageKind::Fragment),
            naga::ShaderStage::Compute => Some(StageKind::Compute),
            _ => None,
        }
    }
}

/// Registry of available backends, used for `--target` dispatch.
pub struct BackendRegistry {
    backends: Vec<Box<dyn Backend>>,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    /// Creates a registry pre-populated with built-in backends.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register(Box::new(WgslBackend));
        reg
    }

    /// Registers a backend.
    pub fn register(&mut self, backend: Box<dyn Backend>) {
        self.backends.push(backend);
    }

    /// Finds a backend that handles the given target identifier.
    pub fn find(&self, target: &str) -> Option<&dyn Backend> {
        self.backends
            .iter()
            .find(|b| b.targets().contains(&target))
            .map(|b| &**b)
    }

    /// Lists all supported target identifiers.
    pub fn list_targets(&self) -> Vec<&str> {
        self.backends
            .iter()
            .flat_map(|b| b.targets().iter().copied())
            .collect()
    }
}

/// Cross-compiles SPIR-V `bytecode` to `target`.
pub fn transpile(
    registry: &BackendRegistry,
    bytecode: &[u32],
    target: &str,
    opts: &BackendOptions,
) -> Result<BackendOutput, CrossCompileError> {
    let backend = registry
        .find(target)
        .ok_or_else(|| CrossCompileError::UnknownTarget(target.to_string()))?;
    let context = ParseContext::parse(bytecode)?;
    let output = backend
        .compile(&context, opts)
        .map_err(|error| CrossCompileError::Backend {
            backend: backend.name().to_string(),
            error,
        })?;
    for diagnostic in &output.diagnostics {
        log::debug!("{}: {diagnostic}", backend.name());
    }
    Ok(output)
}

/// Built-in backend emitting WGSL through naga's WGSL writer.
#[derive(Debug)]
pub struct WgslBackend;

impl Backend for WgslBackend {
    fn name(&self) -> &str {
        "WGSL"
    }

    fn targets(&self) -> &[&str] {
        &["wgsl"]
    }

    fn extension(&self) -> &str {
        "wgsl"
    }

    fn compile(
        &self,
        shader: &ParseContext,
        _opts: &BackendOptions,
    ) -> Result<BackendOutput, BackendError> {
        let text = naga::back::wgsl::write_string(
            shader.module(),
            shader.info(),
            naga::back::wgsl::WriterFlags::empty(),
        )
        .map_err(|e| BackendError::Other(error_chain(&e)))?;
        Ok(BackendOutput {
            text,
            diagnostics: vec![],
        })
    }
}
