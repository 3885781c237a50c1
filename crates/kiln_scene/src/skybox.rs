//! Skybox

use kiln_core::TextureHandle;

use crate::object::{ResourceState, impl_scene_object};

/// A cubemap drawn behind the scene and reused as irradiance source.
#[derive(Debug, Clone)]
pub struct Skybox {
    pub name: String,
    pub state: ResourceState,
    pub generation: Option<u32>,
    pub cubemap: TextureHandle,
}

impl_scene_object!(Skybox);

impl Skybox {
    #[must_use]
    pub fn new(name: impl Into<String>, cubemap: TextureHandle) -> Self {
        Self {
            name: name.into(),
            state: ResourceState::Created,
            generation: None,
            cubemap,
        }
    }
}
