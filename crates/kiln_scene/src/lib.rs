//! Kiln Scene
//!
//! Everything the renderer draws: meshes, terrains, lights, skyboxes and
//! debug shapes, plus the camera and viewport they are seen through.
//!
//! The renderer never walks scene containers directly. It asks the
//! [`Scene`] for arena-allocated, sorted draw records through the queries in
//! [`query`].

pub mod camera;
pub mod config;
pub mod debug;
pub mod geometry;
pub mod light;
pub mod mesh;
pub mod object;
pub mod query;
pub mod scene;
pub mod skybox;
pub mod terrain;
pub mod transform;
pub mod viewport;

use slotmap::new_key_type;

new_key_type! {
    pub struct MeshKey;
    pub struct TerrainKey;
    pub struct DirectionalLightKey;
    pub struct PointLightKey;
    pub struct SkyboxKey;
}

pub use camera::Camera;
pub use config::SceneConfig;
pub use debug::{DebugShape, DebugShapeKind};
pub use geometry::{Geometry, GeometryRenderData};
pub use light::{DirectionalLight, DirectionalLightData, PointLight, PointLightData};
pub use mesh::Mesh;
pub use object::{ResourceState, SceneObject};
pub use scene::{Scene, SceneState};
pub use skybox::Skybox;
pub use terrain::{ChunkLod, Terrain, TerrainChunk};
pub use transform::Transform;
pub use viewport::{ProjectionType, Viewport};
