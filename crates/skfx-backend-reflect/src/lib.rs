//! JSON reflection backend for skfx.
//!
//! Instead of shader text this backend describes a compiled stage: its
//! entry point, the resources it binds and its stage inputs and outputs.
//! Tools use it to check the layout a generated stage actually ended up
//! with.

use naga::{AddressSpace, Binding, Handle, ImageClass, ImageDimension, ScalarKind, TypeInner};
use serde::Serialize;
use skfx_backend_core::{Backend, BackendError, BackendOptions, BackendOutput, ParseContext};

/// JSON reflection backend.
#[derive(Debug)]
pub struct ReflectBackend;

impl Backend for ReflectBackend {
    fn name(&self) -> &str {
        "Reflection"
    }

    fn targets(&self) -> &[&str] {
        &["json", "reflect"]
    }

    fn extension(&self) -> &str {
        "json"
    }

    fn compile(
        &self,
        shader: &ParseContext,
        _opts: &BackendOptions,
    ) -> Result<BackendOutput, BackendError> {
        let reflection = Reflection::of(shader);
        let text = serde_json::to_string_pretty(&reflection)
            .map_err(|e| BackendError::Other(format!("serialization failed: {e}")))?;
        Ok(BackendOutput {
            text,
            diagnostics: vec![],
        })
    }
}

/// Reflected description of one stage.
#[derive(Debug, Serialize)]
pub struct Reflection {
    pub entry_point: EntryPointInfo,
    pub resources: Vec<ResourceInfo>,
    pub inputs: Vec<VaryingInfo>,
    pub outputs: Vec<VaryingInfo>,
}

#[derive(Debug, Serialize)]
pub struct EntryPointInfo {
    pub name: String,
    pub stage: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workgroup_size: Option<[u32; 3]>,
}

/// A bound global.
#[derive(Debug, Serialize)]
pub struct ResourceInfo {
    pub name: String,
    pub ty: String,
    pub kind: &'static str,
    pub set: u32,
    pub binding: u32,
}

/// A stage input or output.
#[derive(Debug, Serialize)]
pub struct VaryingInfo {
    pub name: String,
    pub ty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builtin: Option<String>,
}

impl Reflection {
    /// Reflects the entry point of a parsed stage.
    pub fn of(shader: &ParseContext) -> Self {
        let module = shader.module();
        let entry = shader.entry_point();

        let stage = match entry.stage {
            naga::ShaderStage::Vertex => "vertex",
            naga::ShaderStage::Fragment => "fragment",
            naga::ShaderStage::Compute => "compute",
            _ => "other",
        };
        let workgroup_size = (entry.stage == naga::ShaderStage::Compute).then_some(entry.workgroup_size);

        let mut resources: Vec<ResourceInfo> = module
            .global_variables
            .iter()
            .filter_map(|(_, var)| {
                let rb = var.binding.as_ref()?;
                let name = var
                    .name
                    .clone()
                    .or_else(|| module.types[var.ty].name.clone())
                    .unwrap_or_default();
                Some(ResourceInfo {
                    name,
                    ty: type_name(module, var.ty),
                    kind: resource_kind(module, var.space, var.ty),
                    set: rb.group,
                    binding: rb.binding,
                })
            })
            .collect();
        resources.sort_by_key(|r| (r.set, r.binding));

        let mut inputs = Vec::new();
        for arg in &entry.function.arguments {
            let name = arg.name.clone().unwrap_or_default();
            collect_varyings(module, &name, arg.ty, arg.binding.as_ref(), &mut inputs);
        }
        let mut outputs = Vec::new();
        if let Some(result) = &entry.function.result {
            collect_varyings(module, "", result.ty, result.binding.as_ref(), &mut outputs);
        }

        Self {
            entry_point: EntryPointInfo {
                name: entry.name.clone(),
                stage,
                workgroup_size,
            },
            resources,
            inputs,
            outputs,
        }
    }
}

/// Pushes a bound varying, or the bound members of a struct varying.
fn collect_varyings(
    module: &naga::Module,
    name: &str,
    ty: Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Vec<VaryingInfo>,
) {
    match binding {
        Some(binding) => {
            let (location, builtin) = match binding {
                Binding::Location { location, .. } => (Some(*location), None),
                Binding::BuiltIn(b) => (None, Some(format!("{b:?}"))),
            };
            out.push(VaryingInfo {
                name: name.to_string(),
                ty: type_name(module, ty),
                location,
                builtin,
            });
        }
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    let member_name = member.name.clone().unwrap_or_default();
                    collect_varyings(module, &member_name, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn resource_kind(module: &naga::Module, space: AddressSpace, ty: Handle<naga::Type>) -> &'static str {
    match space {
        AddressSpace::Uniform => "uniform_buffer",
        AddressSpace::Storage { access } => {
            if access.contains(naga::StorageAccess::STORE) {
                "storage_buffer"
            } else {
                "readonly_storage_buffer"
            }
        }
        AddressSpace::Handle => match module.types[ty].inner {
            TypeInner::Image {
                class: ImageClass::Storage { .. },
                ..
            } => "storage_image",
            TypeInner::Image { .. } => "texture",
            TypeInner::Sampler { .. } => "sampler",
            _ => "handle",
        },
        _ => "other",
    }
}

fn scalar_name(scalar: naga::Scalar) -> String {
    let bits = u32::from(scalar.width) * 8;
    match scalar.kind {
        ScalarKind::Float => format!("f{bits}"),
        ScalarKind::Sint => format!("i{bits}"),
        ScalarKind::Uint => format!("u{bits}"),
        ScalarKind::Bool => "bool".to_string(),
        _ => "abstract".to_string(),
    }
}

/// A WGSL-like spelling of a type.
pub fn type_name(module: &naga::Module, ty: Handle<naga::Type>) -> String {
    let ty = &module.types[ty];
    match ty.inner {
        TypeInner::Scalar(scalar) => scalar_name(scalar),
        TypeInner::Vector { size, scalar } => format!("vec{}<{}>", size as u8, scalar_name(scalar)),
        TypeInner::Matrix {
            columns,
            rows,
            scalar,
        } => format!("mat{}x{}<{}>", columns as u8, rows as u8, scalar_name(scalar)),
        TypeInner::Array { base, size, .. } => match size {
            naga::ArraySize::Constant(n) => format!("array<{}, {n}>", type_name(module, base)),
            _ => format!("array<{}>", type_name(module, base)),
        },
        TypeInner::Struct { .. } => ty.name.clone().unwrap_or_else(|| "struct".to_string()),
        TypeInner::Image { dim, arrayed, class } => {
            let dim = match dim {
                ImageDimension::D1 => "1d",
                ImageDimension::D2 => "2d",
                ImageDimension::D3 => "3d",
                ImageDimension::Cube => "cube",
            };
            let prefix = match class {
                ImageClass::Storage { .. } => "texture_storage",
                ImageClass::Depth { .. } => "texture_depth",
                _ => "texture",
            };
            let array = if arrayed { "_array" } else { "" };
            format!("{prefix}_{dim}{array}")
        }
        TypeInner::Sampler { comparison } => {
            if comparison {
                "sampler_comparison".to_string()
            } else {
                "sampler".to_string()
            }
        }
        _ => ty.name.clone().unwrap_or_else(|| "unknown".to_string()),
    }
}
