//! Camera and Frustum Tests
//!
//! Tests for:
//! - Camera orientation (look-at, yaw/pitch, basis vectors)
//! - View matrix consistency with the camera transform
//! - Viewport projection and aspect handling
//! - Frustum built from camera + viewport (points, spheres, boxes)
//! - World-space extents and line distance helpers

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Quat, Vec3, Vec4};

use kiln::core::{Extents3D, distance_to_line};
use kiln::scene::{Camera, ProjectionType, Viewport};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPSILON
}

fn viewport() -> Viewport {
    Viewport::perspective(1280.0, 720.0, 60f32.to_radians(), 0.1, 500.0)
}

// ============================================================================
// Camera Orientation
// ============================================================================

#[test]
fn looking_at_points_forward_at_target() {
    let camera = Camera::looking_at(Vec3::new(0.0, 5.0, 10.0), Vec3::ZERO, Vec3::Y);
    let expected = (Vec3::ZERO - Vec3::new(0.0, 5.0, 10.0)).normalize();
    assert!(approx_vec(camera.forward(), expected), "forward {}", camera.forward());
    assert!(camera.up().y > 0.0);
}

#[test]
fn looking_straight_down_keeps_a_valid_basis() {
    let camera = Camera::looking_at(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, Vec3::Y);
    assert!(approx_vec(camera.forward(), Vec3::NEG_Y));
    assert!(approx(camera.right().length(), 1.0));
    assert!(approx(camera.right().dot(camera.forward()), 0.0));
}

#[test]
fn yaw_quarter_turn_faces_negative_x() {
    let mut camera = Camera::default();
    camera.set_yaw_pitch(FRAC_PI_2, 0.0);
    assert!(approx_vec(camera.forward(), Vec3::NEG_X), "forward {}", camera.forward());
}

#[test]
fn view_matrix_moves_camera_to_origin() {
    let camera = Camera::new(Vec3::new(3.0, -2.0, 7.0), Quat::from_rotation_y(0.4));
    let in_view = camera.view_matrix().transform_point3(camera.position());
    assert!(approx_vec(in_view, Vec3::ZERO));

    let ahead = camera.position() + camera.forward() * 5.0;
    let ahead_view = camera.view_matrix().transform_point3(ahead);
    assert!(approx_vec(ahead_view, Vec3::new(0.0, 0.0, -5.0)));
}

#[test]
fn translate_moves_position_only() {
    let mut camera = Camera::looking_at(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
    let forward = camera.forward();
    camera.translate(Vec3::new(1.0, 2.0, 3.0));
    assert!(approx_vec(camera.position(), Vec3::new(1.0, 2.0, 3.0)));
    assert!(approx_vec(camera.forward(), forward));
}

// ============================================================================
// Viewport
// ============================================================================

#[test]
fn viewport_aspect_and_projection() {
    let vp = viewport();
    assert!(approx(vp.aspect(), 1280.0 / 720.0));
    assert_eq!(vp.projection_type(), ProjectionType::Perspective);
    let expected = Mat4::perspective_rh(60f32.to_radians(), 1280.0 / 720.0, 0.1, 500.0);
    assert!(vp.projection().abs_diff_eq(expected, EPSILON));
}

#[test]
fn viewport_resize_rebuilds_projection() {
    let mut vp = viewport();
    let before = vp.projection();
    vp.resize(Vec4::new(0.0, 0.0, 800.0, 800.0));
    assert!(approx(vp.aspect(), 1.0));
    assert_ne!(before, vp.projection());
}

#[test]
fn zero_height_viewport_has_unit_aspect() {
    let vp = Viewport::perspective(640.0, 0.0, 1.0, 0.1, 10.0);
    assert!(approx(vp.aspect(), 1.0));
}

#[test]
fn clip_plane_change_updates_projection() {
    let mut vp = viewport();
    vp.set_clip_planes(1.0, 50.0);
    assert!(approx(vp.near_clip(), 1.0));
    assert!(approx(vp.far_clip(), 50.0));
    let expected = Mat4::perspective_rh(vp.fov(), vp.aspect(), 1.0, 50.0);
    assert!(vp.projection().abs_diff_eq(expected, EPSILON));
}

// ============================================================================
// Frustum From Camera
// ============================================================================

#[test]
fn camera_frustum_contains_target() {
    let camera = Camera::looking_at(Vec3::new(0.0, 5.0, 20.0), Vec3::ZERO, Vec3::Y);
    let frustum = camera.frustum(&viewport());
    assert!(frustum.contains_point(Vec3::ZERO));
    assert!(!frustum.contains_point(Vec3::new(0.0, 5.0, 40.0)), "point behind the camera");
}

#[test]
fn camera_frustum_respects_clip_planes() {
    let camera = Camera::default();
    let frustum = camera.frustum(&viewport());
    assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, -0.05)));
    assert!(frustum.contains_point(Vec3::new(0.0, 0.0, -499.0)));
    assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, -501.0)));
}

#[test]
fn camera_frustum_side_planes_follow_aspect() {
    let camera = Camera::default();
    let vp = viewport();
    let frustum = camera.frustum(&vp);
    let half_v = 100.0 * (vp.fov() * 0.5).tan();
    let half_h = half_v * vp.aspect();

    // Wider than tall: a point past the vertical limit but inside the
    // horizontal one only fits on the x axis.
    let x_point = Vec3::new(half_v * 1.2, 0.0, -100.0);
    let y_point = Vec3::new(0.0, half_v * 1.2, -100.0);
    assert!(frustum.contains_point(x_point));
    assert!(!frustum.contains_point(y_point));
    assert!(!frustum.contains_point(Vec3::new(half_h * 1.05, 0.0, -100.0)));
}

#[test]
fn rotated_camera_frustum_follows_orientation() {
    let mut camera = Camera::default();
    camera.set_yaw_pitch(FRAC_PI_2, 0.0);
    let frustum = camera.frustum(&viewport());
    assert!(frustum.contains_point(Vec3::new(-10.0, 0.0, 0.0)));
    assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, -10.0)));
}

#[test]
fn sphere_straddling_near_plane_intersects() {
    let frustum = Camera::default().frustum(&viewport());
    assert!(frustum.intersects_sphere(Vec3::new(0.0, 0.0, 0.5), 1.0));
    assert!(!frustum.intersects_sphere(Vec3::new(0.0, 0.0, 5.0), 1.0));
}

#[test]
fn aabb_behind_camera_is_culled() {
    let frustum = Camera::default().frustum(&viewport());
    assert!(frustum.intersects_aabb(Vec3::new(0.0, 0.0, -10.0), Vec3::splat(1.0)));
    assert!(!frustum.intersects_aabb(Vec3::new(0.0, 0.0, 10.0), Vec3::splat(1.0)));
}

// ============================================================================
// Extents & Lines
// ============================================================================

#[test]
fn rotated_extents_enclose_all_corners() {
    let e = Extents3D::from_half_size(Vec3::new(2.0, 1.0, 1.0));
    let rotated = e.transform(&Mat4::from_rotation_z(FRAC_PI_2));
    assert!(approx_vec(rotated.half_extents(), Vec3::new(1.0, 2.0, 1.0)));
}

#[test]
fn extents_union_grows_to_cover_both() {
    let a = Extents3D::new(Vec3::ZERO, Vec3::ONE);
    let b = Extents3D::new(Vec3::splat(-1.0), Vec3::splat(0.5));
    let u = a.union(&b);
    assert!(approx_vec(u.min, Vec3::splat(-1.0)));
    assert!(approx_vec(u.max, Vec3::ONE));
}

#[test]
fn distance_to_line_ignores_position_along_line() {
    let origin = Vec3::new(1.0, 0.0, 0.0);
    let dir = Vec3::new(0.0, -1.0, 0.0);
    let near = distance_to_line(Vec3::new(4.0, 10.0, 0.0), origin, dir);
    let far = distance_to_line(Vec3::new(4.0, -300.0, 0.0), origin, dir);
    assert!(approx(near, 3.0));
    assert!(approx(far, 3.0));
}

#[test]
fn distance_to_degenerate_line_is_point_distance() {
    let d = distance_to_line(Vec3::new(3.0, 4.0, 0.0), Vec3::ZERO, Vec3::ZERO);
    assert!(approx(d, 5.0));
}
