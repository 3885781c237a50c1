use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use glam::Vec3;

use kiln::core::{Extents3D, FrameArena, FrameData, MaterialRef};
use kiln::render::shadow::{
    CascadeParams, compute_cascade_split_fractions, compute_cascades,
};
use kiln::scene::{Camera, DirectionalLight, DirectionalLightData, Geometry, Mesh, Transform};
use kiln::{
    ForwardRenderGraph, ForwardRenderGraphConfig, HeadlessBackend, RenderMode, Scene, SceneConfig,
    Viewport,
};

fn populated_scene(mesh_count: u32, transparent_every: u32) -> Scene {
    let mut scene = Scene::new(SceneConfig::default());
    for i in 0..mesh_count {
        let material = if i % transparent_every == 0 {
            MaterialRef::transparent(i % 16)
        } else {
            MaterialRef::opaque(i % 16)
        };
        let position = Vec3::new((i % 32) as f32 * 2.0 - 32.0, 0.5, -((i / 32) as f32) * 2.0);
        scene.add_mesh(
            Mesh::new("bench", Transform::from_position(position)).with_geometry(
                Geometry::new(i, Extents3D::from_half_size(Vec3::splat(0.5)), material)
                    .with_vertices(24, 0)
                    .with_indices(36, 0),
            ),
        );
    }
    scene.add_directional_light(
        DirectionalLight::new(
            "sun",
            DirectionalLightData {
                direction: Vec3::new(-0.3, -1.0, -0.2).normalize(),
                ..Default::default()
            },
        ),
        None,
    );
    scene.initialize().expect("initialize");
    scene.load().expect("load");
    scene
}

fn view() -> (Camera, Viewport) {
    (
        Camera::looking_at(Vec3::new(0.0, 10.0, 30.0), Vec3::new(0.0, 0.0, -20.0), Vec3::Y),
        Viewport::perspective(1920.0, 1080.0, 60f32.to_radians(), 0.1, 1000.0),
    )
}

// ---------------------------------------------------------------------------
// Graph construction
// ---------------------------------------------------------------------------

fn bench_forward_create(c: &mut Criterion) {
    c.bench_function("forward_graph_create_and_load", |b| {
        b.iter(|| {
            let mut backend = HeadlessBackend::new(1920, 1080);
            let mut graph =
                ForwardRenderGraph::create(ForwardRenderGraphConfig::default()).expect("create");
            graph.initialize(&mut backend).expect("initialize");
            black_box(&graph);
        });
    });
}

// ---------------------------------------------------------------------------
// Shadow cascades
// ---------------------------------------------------------------------------

fn bench_cascades(c: &mut Criterion) {
    let (camera, viewport) = view();
    let params = CascadeParams {
        camera_view: camera.view_matrix(),
        fov: viewport.fov(),
        aspect: viewport.aspect(),
        near: viewport.near_clip(),
        far: 105.0,
        light_direction: Vec3::new(-0.3, -1.0, -0.2).normalize(),
        z_multiplier: 10.0,
    };
    c.bench_function("shadow_cascades_4", |b| {
        b.iter(|| {
            let fractions = compute_cascade_split_fractions(params.near, params.far, 0.95);
            black_box(compute_cascades(black_box(&params), &fractions));
        });
    });
}

// ---------------------------------------------------------------------------
// Scene queries
// ---------------------------------------------------------------------------

fn bench_mesh_query(c: &mut Criterion) {
    let scene = populated_scene(2048, 20);
    let (camera, viewport) = view();
    let frustum = camera.frustum(&viewport);
    let mut arena = FrameArena::new();

    c.bench_function("mesh_query_2048_frustum", |b| {
        b.iter(|| {
            arena.reset();
            let frame = FrameData::new(&arena, 0, 0.016, 0.0);
            let records = scene
                .mesh_render_data_query(Some(&frustum), camera.position(), &frame)
                .expect("query");
            black_box(records.len());
        });
    });
}

// ---------------------------------------------------------------------------
// Full frame
// ---------------------------------------------------------------------------

fn bench_frame(c: &mut Criterion) {
    let mut scene = populated_scene(1024, 16);
    let (camera, viewport) = view();
    let mut backend = HeadlessBackend::new(1920, 1080);
    let mut graph =
        ForwardRenderGraph::create(ForwardRenderGraphConfig::default()).expect("create");
    graph.initialize(&mut backend).expect("initialize");
    let mut arena = FrameArena::new();

    c.bench_function("forward_frame_1024_meshes", |b| {
        b.iter(|| {
            arena.reset();
            backend.clear_calls();
            let mut frame = FrameData::new(&arena, 0, 0.016, 0.0);
            let data = graph
                .frame_prepare(&mut frame, &camera, &viewport, &mut scene, RenderMode::Default)
                .expect("prepare");
            graph.execute_frame(&mut backend, &frame, &data).expect("execute");
            black_box(frame.drawn_mesh_count);
        });
    });
}

criterion_group!(
    benches,
    bench_forward_create,
    bench_cascades,
    bench_mesh_query,
    bench_frame,
);
criterion_main!(benches);
