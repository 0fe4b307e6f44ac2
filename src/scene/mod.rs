//! Minimal 3D object model the controller manipulates
//!
//! The real rendering pipeline lives in the injected engine; this module
//! only models what the session needs to own and mutate: an object tree
//! with transforms, mesh resources that can be cloned and disposed, and
//! the renderer settings applied during scene setup.

mod object;

pub use object::{Geometry, Material, Object3d, ObjectId, ObjectKind, Transform};

/// Output color space applied to the renderer during scene setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Srgb,
    Linear,
}

/// Tone mapping applied to the renderer during scene setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneMapping {
    AcesFilmic,
    None,
}

/// Standard renderer configuration applied once per initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererSettings {
    pub color_space: ColorSpace,
    pub tone_mapping: ToneMapping,
    pub shadows_enabled: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            color_space: ColorSpace::Srgb,
            tone_mapping: ToneMapping::AcesFilmic,
            shadows_enabled: true,
        }
    }
}
