//! Scene Object Lifecycle
//!
//! Every object held by a [`Scene`](crate::scene::Scene) walks the same
//! state machine:
//!
//! ```text
//! Undefined -> Created -> Initialized -> Loading -> Loaded
//! ```
//!
//! The generation starts as `None` and is bumped on every successful load.
//! Only objects that are `Loaded` with `Some` generation are drawable.

/// Lifecycle state of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ResourceState {
    #[default]
    Undefined,
    Created,
    Initialized,
    Loading,
    Loaded,
}

impl ResourceState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "Undefined",
            Self::Created => "Created",
            Self::Initialized => "Initialized",
            Self::Loading => "Loading",
            Self::Loaded => "Loaded",
        }
    }
}

/// Shared lifecycle plumbing for meshes, terrains, lights and skyboxes.
pub trait SceneObject {
    fn state(&self) -> ResourceState;
    fn set_state(&mut self, state: ResourceState);
    fn generation(&self) -> Option<u32>;
    fn set_generation(&mut self, generation: Option<u32>);

    /// Loaded with a valid generation.
    fn is_drawable(&self) -> bool {
        self.state() == ResourceState::Loaded && self.generation().is_some()
    }

    /// Created -> Initialized. Objects past that point are left alone.
    fn initialize(&mut self) {
        if self.state() <= ResourceState::Created {
            self.set_state(ResourceState::Initialized);
        }
    }

    /// Initialized -> Loading -> Loaded, bumping the generation.
    fn load(&mut self) {
        if self.state() < ResourceState::Initialized {
            self.initialize();
        }
        if self.state() == ResourceState::Loaded {
            return;
        }
        self.set_state(ResourceState::Loading);
        let next = self.generation().map_or(0, |g| g.wrapping_add(1));
        self.set_generation(Some(next));
        self.set_state(ResourceState::Loaded);
    }

    /// Back to Undefined with an invalid generation.
    fn unload(&mut self) {
        self.set_state(ResourceState::Undefined);
        self.set_generation(None);
    }
}

/// Implements [`SceneObject`] for a struct with `state` and `generation`
/// fields.
macro_rules! impl_scene_object {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::object::SceneObject for $ty {
                fn state(&self) -> $crate::object::ResourceState {
                    self.state
                }
                fn set_state(&mut self, state: $crate::object::ResourceState) {
                    self.state = state;
                }
                fn generation(&self) -> Option<u32> {
                    self.generation
                }
                fn set_generation(&mut self, generation: Option<u32>) {
                    self.generation = generation;
                }
            }
        )+
    };
}

pub(crate) use impl_scene_object;
