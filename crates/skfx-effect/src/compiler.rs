//! Effect assembly: every pipeline stage, run per pass.

use std::fmt;

use skfx_backend_core::{BackendOptions, BackendRegistry, Diagnostic, transpile};
use skfx_ir::{EffectAnalysisResult, EffectDocument, EffectDocumentPass, EffectKind, StageKind};
use skfx_native::CompiledShaderStage;
use skfx_transpile::{StageSource, transpile_pass};

use crate::EffectError;
use crate::device::{GraphicsDevice, ShaderDescription};
use crate::layout::{ResourceLayoutElement, layout_elements};

/// Options of an [`EffectCompiler`].
#[derive(Clone, Debug, Default)]
pub struct CompileOptions {
    pub kind: EffectKind,
    /// Cross-compile target overriding the device's own.
    pub cross_target: Option<String>,
    pub backend_options: BackendOptions,
}

/// A stage cross-compiled for the device.
#[derive(Clone, Debug)]
pub struct TranslatedStage {
    pub stage: StageKind,
    pub target: String,
    /// File extension of the target.
    pub extension: String,
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// One compiled pass.
pub struct EffectPass<D: GraphicsDevice> {
    pub name: String,
    /// In pipeline order.
    pub stages: Vec<CompiledShaderStage>,
    /// Generated GLSL the stages were compiled from.
    pub sources: Vec<StageSource>,
    /// Cross-compiled stages, empty when the device takes SPIR-V.
    pub translated: Vec<TranslatedStage>,
    pub analysis: EffectAnalysisResult,
    pub layout_elements: Vec<ResourceLayoutElement>,
    pub layout: D::ResourceLayout,
    pub shaders: Vec<D::Shader>,
}

impl<D: GraphicsDevice> EffectPass<D> {
    pub fn stage(&self, stage: StageKind) -> Option<&CompiledShaderStage> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn source(&self, stage: StageKind) -> Option<&str> {
        self.sources
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.source.as_str())
    }

    pub fn translated(&self, stage: StageKind) -> Option<&TranslatedStage> {
        self.translated.iter().find(|s| s.stage == stage)
    }
}

impl<D: GraphicsDevice> fmt::Debug for EffectPass<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectPass")
            .field("name", &self.name)
            .field("stages", &self.stages)
            .field("translated", &self.translated)
            .field("analysis", &self.analysis)
            .field("layout_elements", &self.layout_elements)
            .field("layout", &self.layout)
            .field("shaders", &self.shaders)
            .finish_non_exhaustive()
    }
}

/// A compiled effect.
pub struct Effect<D: GraphicsDevice> {
    pub name: String,
    pub kind: EffectKind,
    pub passes: Vec<EffectPass<D>>,
}

impl<D: GraphicsDevice> Effect<D> {
    pub fn pass(&self, name: &str) -> Option<&EffectPass<D>> {
        self.passes.iter().find(|p| p.name == name)
    }
}

impl<D: GraphicsDevice> fmt::Debug for Effect<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("passes", &self.passes)
            .finish()
    }
}

/// Picks compute when some pass has a `comp()` entry and none has `vert()`.
pub fn infer_kind(document: &EffectDocument) -> EffectKind {
    let has = |stage| document.passes.iter().any(|p| p.entry(stage).is_some());
    if has(StageKind::Compute) && !has(StageKind::Vertex) {
        EffectKind::Compute
    } else {
        EffectKind::Graphics
    }
}

/// GLSL, HLSL, JSON reflection and WGSL backends.
pub fn default_registry() -> BackendRegistry {
    let mut registry = BackendRegistry::with_builtins();
    registry.register(Box::new(skfx_backend_glsl::GlslBackend));
    registry.register(Box::new(skfx_backend_hlsl::HlslBackend));
    registry.register(Box::new(skfx_backend_reflect::ReflectBackend));
    registry
}

/// Compiles effect documents for one device.
pub struct EffectCompiler<'d, D: GraphicsDevice> {
    device: &'d D,
    registry: BackendRegistry,
    options: CompileOptions,
}

impl<'d, D: GraphicsDevice> EffectCompiler<'d, D> {
    pub fn new(device: &'d D) -> Self {
        Self {
            device,
            registry: default_registry(),
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Parses and compiles `source`.
    pub fn compile(&self, name: &str, source: &str) -> Result<Effect<D>, EffectError> {
        let document = skfx_parser::parse(name, source)?;
        self.compile_document(&document)
    }

    /// Compiles every pass of `document`. The first failing pass aborts
    /// the whole effect.
    pub fn compile_document(&self, document: &EffectDocument) -> Result<Effect<D>, EffectError> {
        let passes = document
            .passes
            .iter()
            .map(|pass| self.compile_pass(pass))
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            "effect '{}': compiled {} pass(es) for {}",
            document.name,
            passes.len(),
            self.device.backend()
        );
        Ok(Effect {
            name: document.name.clone(),
            kind: self.options.kind,
            passes,
        })
    }

    fn cross_target(&self) -> Option<&str> {
        self.options
            .cross_target
            .as_deref()
            .or_else(|| self.device.backend().cross_target())
    }

    /// Runs analysis, generation, native compilation, cross-compilation
    /// and layout creation for one pass.
    pub fn compile_pass(&self, pass: &EffectDocumentPass) -> Result<EffectPass<D>, EffectError> {
        let analysis = skfx_analysis::analyze(pass)?;
        let transpiled = transpile_pass(pass, &analysis, self.options.kind)?;

        let stages = transpiled
            .stages
            .iter()
            .map(|s| skfx_native::compile(&s.source, s.stage))
            .collect::<Result<Vec<_>, _>>()?;

        let mut translated = Vec::new();
        if let Some(target) = self.cross_target() {
            let extension = self
                .registry
                .find(target)
                .map(|b| b.extension().to_string())
                .unwrap_or_default();
            for stage in &stages {
                let output = transpile(
                    &self.registry,
                    &stage.bytecode,
                    target,
                    &self.options.backend_options,
                )?;
                translated.push(TranslatedStage {
                    stage: stage.stage,
                    target: target.to_string(),
                    extension: extension.clone(),
                    text: output.text,
                    diagnostics: output.diagnostics,
                });
            }
        }

        let layout_elements = layout_elements(pass, &analysis, &transpiled);
        let layout = self
            .device
            .create_resource_layout(&layout_elements)
            .map_err(|e| EffectError::Device {
                what: "resource layout",
                message: e.to_string(),
            })?;

        let shaders = stages
            .iter()
            .map(|stage| {
                let desc = ShaderDescription {
                    stage: stage.stage,
                    entry_point: &stage.entry_point,
                    bytecode: &stage.bytecode,
                    translated: translated
                        .iter()
                        .find(|t| t.stage == stage.stage)
                        .map(|t| t.text.as_str()),
                };
                self.device
                    .create_shader(&desc)
                    .map_err(|e| EffectError::Device {
                        what: "shader",
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "pass '{}': {} stage(s), {} layout element(s)",
            pass.name,
            stages.len(),
            layout_elements.len()
        );
        Ok(EffectPass {
            name: pass.name.clone(),
            stages,
            sources: transpiled.stages,
            translated,
            analysis,
            layout_elements,
            layout,
            shaders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceBackend, HeadlessDevice};

    const SPRITE: &str = "attrib vec2 a_Position;\n\
        uniform vec4 g_Tint;\n\
        void vert() { SK_POSITION = vec4(a_Position, 0.0, 1.0); }\n\
        void frag() { SK_COLOR0 = g_Tint; }\n";

    #[test]
    fn vulkan_skips_cross_compile() {
        let device = HeadlessDevice::new(DeviceBackend::Vulkan);
        let effect = EffectCompiler::new(&device).compile("sprite", SPRITE).unwrap();
        let pass = &effect.passes[0];
        assert_eq!(pass.name, "Main");
        assert_eq!(pass.stages.len(), 2);
        assert!(pass.translated.is_empty());
        assert_eq!(pass.shaders[0].translated, None);
        assert_eq!(device.created(), (2, 1));
    }

    #[test]
    fn opengl_gets_glsl() {
        let device = HeadlessDevice::new(DeviceBackend::OpenGl);
        let effect = EffectCompiler::new(&device).compile("sprite", SPRITE).unwrap();
        let pass = &effect.passes[0];
        let fragment = pass.translated(StageKind::Fragment).unwrap();
        assert_eq!(fragment.extension, "glsl");
        assert!(fragment.text.starts_with("#version 430"));
        assert_eq!(
            pass.shaders[1].translated.as_deref(),
            Some(fragment.text.as_str())
        );
    }

    #[test]
    fn override_target() {
        let device = HeadlessDevice::new(DeviceBackend::Vulkan);
        let options = CompileOptions {
            cross_target: Some("json".into()),
            ..Default::default()
        };
        let effect = EffectCompiler::new(&device)
            .with_options(options)
            .compile("sprite", SPRITE)
            .unwrap();
        let vertex = effect.passes[0].translated(StageKind::Vertex).unwrap();
        assert_eq!(vertex.extension, "json");
        assert!(vertex.text.contains("\"vertex\""));
    }

    #[test]
    fn unknown_target_fails() {
        let device = HeadlessDevice::new(DeviceBackend::Vulkan);
        let options = CompileOptions {
            cross_target: Some("metal".into()),
            ..Default::default()
        };
        let err = EffectCompiler::new(&device)
            .with_options(options)
            .compile("sprite", SPRITE)
            .unwrap_err();
        assert!(matches!(err, EffectError::CrossCompile(_)));
        assert!(err.to_string().contains("metal"));
    }

    #[test]
    fn infers_compute() {
        let doc = skfx_parser::parse("c", "buffer float data[]; void comp() { data[0] = 1.0; }")
            .unwrap();
        assert_eq!(infer_kind(&doc), EffectKind::Compute);
        let doc = skfx_parser::parse("g", SPRITE).unwrap();
        assert_eq!(infer_kind(&doc), EffectKind::Graphics);
    }

    #[test]
    fn failing_pass_returns_no_effect() {
        let device = HeadlessDevice::new(DeviceBackend::Vulkan);
        let source = "pass Good { void vert() { } void frag() { } }\n\
                      pass Bad { uniform nosuch x; void vert() { } void frag() { } }";
        let err = EffectCompiler::new(&device).compile("fx", source).unwrap_err();
        assert!(matches!(err, EffectError::Analysis(_)));
    }
}
