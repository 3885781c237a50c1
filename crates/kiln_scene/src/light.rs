//! Lights
//!
//! Directional lights drive the cascaded shadow map; point lights are copied
//! into the scene pass as-is. The `*Data` structs are the plain copies handed
//! to render passes each frame.

use glam::{Vec3, Vec4};

use crate::object::{ResourceState, impl_scene_object};

/// Default distance (world units) covered by directional shadows.
pub const DEFAULT_SHADOW_DISTANCE: f32 = 100.0;
/// Default fade band past the shadow distance.
pub const DEFAULT_SHADOW_FADE_DISTANCE: f32 = 5.0;
/// Default blend between logarithmic and uniform cascade splits.
pub const DEFAULT_SHADOW_SPLIT_MULT: f32 = 0.95;

/// Per-frame copy of a directional light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLightData {
    pub colour: Vec4,
    /// Direction the light travels (from the light into the scene).
    pub direction: Vec3,
    pub shadow_distance: f32,
    pub shadow_fade_distance: f32,
    /// 1.0 = fully logarithmic splits, 0.0 = fully uniform.
    pub shadow_split_mult: f32,
}

impl Default for DirectionalLightData {
    fn default() -> Self {
        Self {
            colour: Vec4::ONE,
            direction: Vec3::new(-0.577, -0.577, -0.577),
            shadow_distance: DEFAULT_SHADOW_DISTANCE,
            shadow_fade_distance: DEFAULT_SHADOW_FADE_DISTANCE,
            shadow_split_mult: DEFAULT_SHADOW_SPLIT_MULT,
        }
    }
}

impl DirectionalLightData {
    /// Far edge of the shadowed range.
    #[inline]
    #[must_use]
    pub fn shadow_far(&self) -> f32 {
        self.shadow_distance + self.shadow_fade_distance
    }
}

#[derive(Debug, Clone)]
pub struct DirectionalLight {
    pub name: String,
    pub state: ResourceState,
    pub generation: Option<u32>,
    pub data: DirectionalLightData,
}

impl_scene_object!(DirectionalLight);

impl DirectionalLight {
    #[must_use]
    pub fn new(name: impl Into<String>, data: DirectionalLightData) -> Self {
        Self {
            name: name.into(),
            state: ResourceState::Created,
            generation: None,
            data,
        }
    }
}

/// Per-frame copy of a point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLightData {
    pub colour: Vec4,
    pub position: Vec3,
    pub constant_f: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for PointLightData {
    fn default() -> Self {
        Self {
            colour: Vec4::ONE,
            position: Vec3::ZERO,
            constant_f: 1.0,
            linear: 0.35,
            quadratic: 0.44,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PointLight {
    pub name: String,
    pub state: ResourceState,
    pub generation: Option<u32>,
    pub data: PointLightData,
}

impl_scene_object!(PointLight);

impl PointLight {
    #[must_use]
    pub fn new(name: impl Into<String>, data: PointLightData) -> Self {
        Self {
            name: name.into(),
            state: ResourceState::Created,
            generation: None,
            data,
        }
    }
}
