use std::f32::consts::TAU;

use glam::{Quat, Vec3, Vec4};
use kiln::core::{Extents3D, MaterialRef, TextureHandle};
use kiln::scene::debug::GRID_COLOUR;
use kiln::scene::{
    ChunkLod, DebugShape, DebugShapeKind, DirectionalLight, DirectionalLightData, Geometry, Mesh,
    PointLight, PointLightData, Skybox, Terrain, TerrainChunk, Transform,
};
use kiln::{
    Camera, Engine, ForwardRenderGraphConfig, HeadlessBackend, RenderMode, Scene, SceneConfig,
    Viewport,
};

const FRAME_COUNT: u32 = 8;

fn unit_cube(id: u32, material: MaterialRef) -> Geometry {
    Geometry::new(id, Extents3D::from_half_size(Vec3::splat(0.5)), material)
        .with_vertices(24, 0)
        .with_indices(36, 0)
}

fn build_scene() -> anyhow::Result<Scene> {
    let config = SceneConfig::from_json_str(
        r#"{
            "name": "courtyard",
            "description": "Crates around a lamp",
            "terrain_lod_distances": [40.0, 90.0]
        }"#,
    )?;
    let mut scene = Scene::new(config);

    // Crates
    for i in 0..12 {
        let angle = i as f32 / 12.0 * TAU;
        let position = Vec3::new(angle.cos() * 6.0, 0.5, angle.sin() * 6.0);
        let material = if i % 4 == 0 {
            MaterialRef::transparent(2)
        } else {
            MaterialRef::opaque(1)
        };
        scene.add_mesh(
            Mesh::new(
                format!("crate_{i}"),
                Transform::from_position(position).with_rotation(Quat::from_rotation_y(angle)),
            )
            .with_geometry(unit_cube(1, material)),
        );
    }

    // Ground
    let mut ground = Terrain::new("ground", Transform::IDENTITY);
    for z in -2..2 {
        for x in -2..2 {
            let min = Vec3::new(x as f32 * 32.0, 0.0, z as f32 * 32.0);
            let extents = Extents3D::new(min, min + Vec3::new(32.0, 0.0, 32.0));
            ground = ground.with_chunk(
                TerrainChunk::new(
                    Geometry::new(10, extents, MaterialRef::opaque(3)).with_vertices(1089, 0),
                )
                    .with_lod(ChunkLod { index_count: 6144, index_buffer_offset: 0 })
                    .with_lod(ChunkLod { index_count: 1536, index_buffer_offset: 24576 })
                    .with_lod(ChunkLod { index_count: 384, index_buffer_offset: 30720 }),
            );
        }
    }
    scene.add_terrain(ground);

    scene.add_directional_light(
        DirectionalLight::new(
            "sun",
            DirectionalLightData {
                colour: Vec4::new(1.0, 0.95, 0.85, 1.0),
                direction: Vec3::new(-0.4, -1.0, -0.3).normalize(),
                ..Default::default()
            },
        ),
        Some(DebugShape::new(DebugShapeKind::Line, unit_cube(20, MaterialRef::default()))),
    );
    scene.add_point_light(
        PointLight::new(
            "lamp",
            PointLightData {
                colour: Vec4::new(1.0, 0.6, 0.3, 1.0),
                position: Vec3::new(0.0, 2.0, 0.0),
                ..Default::default()
            },
        ),
        Some(DebugShape::new(DebugShapeKind::Box, unit_cube(20, MaterialRef::default()))),
    );
    scene.add_skybox(Skybox::new("sky", TextureHandle(1)));
    scene.set_debug_grid(Some(
        DebugShape::new(DebugShapeKind::Grid, unit_cube(21, MaterialRef::default()))
            .with_colour(GRID_COLOUR),
    ));
    let selection = unit_cube(20, MaterialRef::default());
    scene.set_selection_box(DebugShape::new(DebugShapeKind::Box, selection));
    let first = scene.meshes().next().map(|(key, _)| key);
    scene.set_selected(first)?;

    scene.initialize()?;
    scene.load()?;
    Ok(scene)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let backend = HeadlessBackend::new(1280, 720);
    let mut engine = Engine::new(backend, ForwardRenderGraphConfig::default())?;
    log::info!("Using {}", engine.backend().name());

    let mut scene = build_scene()?;
    let mut viewport = Viewport::perspective(1280.0, 720.0, 45f32.to_radians(), 0.1, 1000.0);

    for frame in 0..FRAME_COUNT {
        let angle = frame as f32 / FRAME_COUNT as f32 * TAU;
        let camera = Camera::looking_at(
            Vec3::new(angle.cos() * 20.0, 8.0, angle.sin() * 20.0),
            Vec3::ZERO,
            Vec3::Y,
        );

        if frame == FRAME_COUNT / 2 {
            engine.backend_mut().resize_window(1920, 1080);
            engine.resize(1920, 1080)?;
            viewport.resize(Vec4::new(0.0, 0.0, 1920.0, 1080.0));
            engine.set_render_mode(RenderMode::Cascades);
        }

        let stats = engine.render_frame(&mut scene, &camera, &viewport, 1.0 / 60.0)?;
        log::info!(
            "frame {}: {} scene draws, {} shadow draws, {} arena bytes, {} backend draws",
            stats.frame_number,
            stats.drawn_mesh_count,
            stats.drawn_shadow_mesh_count,
            stats.arena_bytes,
            engine.backend().draw_count()
        );
        engine.backend_mut().clear_calls();
    }

    engine.shutdown();
    scene.unload()?;
    Ok(())
}
