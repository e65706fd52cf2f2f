//! The two device operations effect assembly needs.

use std::convert::Infallible;
use std::fmt;
use std::sync::Mutex;

use skfx_ir::StageKind;

use crate::layout::ResourceLayoutElement;

/// Graphics API family of a device. Decides whether stages are
/// cross-compiled and to which target.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub enum DeviceBackend {
    /// Consumes SPIR-V directly.
    #[default]
    Vulkan,
    OpenGl,
    Direct3D11,
    WebGpu,
}

impl DeviceBackend {
    /// Cross-compile target the device needs, `None` for SPIR-V.
    pub fn cross_target(self) -> Option<&'static str> {
        match self {
            Self::Vulkan => None,
            Self::OpenGl => Some("glsl"),
            Self::Direct3D11 => Some("hlsl"),
            Self::WebGpu => Some("wgsl"),
        }
    }
}

impl fmt::Display for DeviceBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vulkan => "Vulkan",
            Self::OpenGl => "OpenGL",
            Self::Direct3D11 => "Direct3D 11",
            Self::WebGpu => "WebGPU",
        })
    }
}

/// Input of [`GraphicsDevice::create_shader`].
#[derive(Clone, Copy, Debug)]
pub struct ShaderDescription<'a> {
    pub stage: StageKind,
    pub entry_point: &'a str,
    /// SPIR-V words.
    pub bytecode: &'a [u32],
    /// Cross-compiled source, when the device needs one.
    pub translated: Option<&'a str>,
}

/// A graphics device as seen by effect assembly.
pub trait GraphicsDevice {
    type Shader: fmt::Debug;
    type ResourceLayout: fmt::Debug;
    type Error: std::error::Error + Send + Sync + 'static;

    fn backend(&self) -> DeviceBackend;

    /// Creates a device shader object from one compiled stage.
    fn create_shader(&self, desc: &ShaderDescription<'_>) -> Result<Self::Shader, Self::Error>;

    /// Creates a resource layout object. `elements[i]` describes binding
    /// slot `i` of the pass.
    fn create_resource_layout(
        &self,
        elements: &[ResourceLayoutElement],
    ) -> Result<Self::ResourceLayout, Self::Error>;
}

/// Shader object of a [`HeadlessDevice`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadlessShader {
    pub stage: StageKind,
    pub entry_point: String,
    pub word_count: usize,
    pub translated: Option<String>,
}

/// Resource layout object of a [`HeadlessDevice`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadlessLayout {
    pub elements: Vec<ResourceLayoutElement>,
}

/// A device without a GPU. Accepts every shader and layout and keeps a
/// count of what it created.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    backend: DeviceBackend,
    created: Mutex<(usize, usize)>,
}

impl HeadlessDevice {
    pub fn new(backend: DeviceBackend) -> Self {
        Self {
            backend,
            created: Mutex::new((0, 0)),
        }
    }

    /// Number of shaders and layouts created so far.
    pub fn created(&self) -> (usize, usize) {
        match self.created.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn record(&self, shaders: usize, layouts: usize) {
        let mut guard = match self.created.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.0 += shaders;
        guard.1 += layouts;
    }
}

impl GraphicsDevice for HeadlessDevice {
    type Shader = HeadlessShader;
    type ResourceLayout = HeadlessLayout;
    type Error = Infallible;

    fn backend(&self) -> DeviceBackend {
        self.backend
    }

    fn create_shader(&self, desc: &ShaderDescription<'_>) -> Result<HeadlessShader, Infallible> {
        self.record(1, 0);
        log::trace!(
            "headless: {} shader, {} words",
            desc.stage,
            desc.bytecode.len()
        );
        Ok(HeadlessShader {
            stage: desc.stage,
            entry_point: desc.entry_point.to_string(),
            word_count: desc.bytecode.len(),
            translated: desc.translated.map(str::to_string),
        })
    }

    fn create_resource_layout(
        &self,
        elements: &[ResourceLayoutElement],
    ) -> Result<HeadlessLayout, Infallible> {
        self.record(0, 1);
        Ok(HeadlessLayout {
            elements: elements.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_targets() {
        assert_eq!(DeviceBackend::Vulkan.cross_target(), None);
        assert_eq!(DeviceBackend::OpenGl.cross_target(), Some("glsl"));
        assert_eq!(DeviceBackend::Direct3D11.cross_target(), Some("hlsl"));
        assert_eq!(DeviceBackend::WebGpu.cross_target(), Some("wgsl"));
    }

    #[test]
    fn headless_counts_objects() {
        let device = HeadlessDevice::new(DeviceBackend::OpenGl);
        let desc = ShaderDescription {
            stage: StageKind::Vertex,
            entry_point: "main",
            bytecode: &[0x0723_0203],
            translated: Some("#version 430"),
        };
        let shader = device.create_shader(&desc).unwrap();
        assert_eq!(shader.word_count, 1);
        assert_eq!(shader.translated.as_deref(), Some("#version 430"));
        device.create_resource_layout(&[]).unwrap();
        assert_eq!(device.created(), (1, 1));
        assert_eq!(device.backend().to_string(), "OpenGL");
    }
}
