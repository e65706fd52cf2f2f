//! Descriptor binding allocation.
//!
//! One allocation per pass is shared by every generated stage and by the
//! resource layout, so the numbers in the GLSL and the numbers the device
//! sees always agree.

use skfx_ir::{EffectAnalysisResult, EffectParameterFlags, EffectParameterInfo};

/// Descriptor set of the built-in transform block.
pub const TRANSFORM_SET: u32 = 0;
/// Binding of the built-in transform block.
pub const TRANSFORM_BINDING: u32 = 0;
/// Descriptor set of every user resource.
pub const RESOURCE_SET: u32 = 1;
/// Block holding every non-opaque `uniform` parameter of a pass.
pub const USER_PROPERTIES_BLOCK: &str = "g_internal_USER_PROPERTIES";

/// How a parameter is bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingSlot {
    /// A member of the user properties block.
    UserProperty { block: u32 },
    /// A storage buffer block of its own.
    Buffer { binding: u32 },
    /// A storage image.
    Image { binding: u32 },
    /// A standalone sampler.
    Sampler { binding: u32 },
    /// A texture and the sampler paired with it.
    Texture { texture: u32, sampler: u32 },
}

impl BindingSlot {
    /// The primary binding: the block, buffer, image, sampler or texture.
    pub fn binding(self) -> u32 {
        match self {
            Self::UserProperty { block: binding }
            | Self::Buffer { binding }
            | Self::Image { binding }
            | Self::Sampler { binding }
            | Self::Texture {
                texture: binding, ..
            } => binding,
        }
    }

    /// The paired sampler binding of a texture.
    pub fn sampler_binding(self) -> Option<u32> {
        match self {
            Self::Texture { sampler, .. } => Some(sampler),
            _ => None,
        }
    }

    /// Slot of `param` when its first binding is `next`.
    fn classify(param: &EffectParameterInfo, next: u32) -> Self {
        let flags = param.flags;
        if flags.contains(EffectParameterFlags::BUFFER) {
            Self::Buffer { binding: next }
        } else if flags.contains(EffectParameterFlags::IMAGE) {
            Self::Image { binding: next }
        } else if flags.intersects(EffectParameterFlags::TEXTURE | EffectParameterFlags::CUBEMAP) {
            Self::Texture {
                texture: next,
                sampler: next + 1,
            }
        } else if flags.contains(EffectParameterFlags::SAMPLER) {
            Self::Sampler { binding: next }
        } else {
            Self::UserProperty { block: 0 }
        }
    }

    /// Bindings this slot consumes when it is not a block member.
    fn width(self) -> u32 {
        match self {
            Self::UserProperty { .. } => 0,
            Self::Texture { .. } => 2,
            _ => 1,
        }
    }
}

/// The binding of every parameter of a pass, in parameter order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingMap {
    /// Binding of the user properties block, if the pass has one.
    pub user_properties: Option<u32>,
    pub slots: Vec<(String, BindingSlot)>,
}

impl BindingMap {
    /// Allocates bindings in set [`RESOURCE_SET`]: the user properties
    /// block first, then one binding per buffer, image and sampler and two
    /// per texture, in parameter order.
    pub fn allocate(analysis: &EffectAnalysisResult) -> Self {
        let has_block = analysis
            .parameters
            .iter()
            .any(|p| matches!(BindingSlot::classify(p, 0), BindingSlot::UserProperty { .. }));
        let user_properties = has_block.then_some(0);
        let mut next = u32::from(has_block);

        let slots = analysis
            .parameters
            .iter()
            .map(|param| {
                let slot = BindingSlot::classify(param, next);
                next += slot.width();
                (param.name.clone(), slot)
            })
            .collect();

        Self {
            user_properties,
            slots,
        }
    }

    pub fn get(&self, name: &str) -> Option<BindingSlot> {
        self.slots
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, slot)| slot)
    }

    /// Total number of bindings used in [`RESOURCE_SET`].
    pub fn binding_count(&self) -> u32 {
        u32::from(self.user_properties.is_some())
            + self.slots.iter().map(|(_, slot)| slot.width()).sum::<u32>()
    }
}
