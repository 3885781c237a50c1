//! Shadow Cascades
//!
//! Pure math for cascaded directional shadows, kept separate from the passes
//! for reuse and testability.
//!
//! # Provided Functions
//!
//! - Cascade split fractions (practical split scheme)
//! - World-space frustum corners from an inverse view-projection
//! - Per-cascade light view / orthographic projection
//! - The culling volume used to gather shadow casters

use glam::{Mat4, Vec3};

/// Number of cascades every directional shadow uses.
pub const MAX_CASCADE_COUNT: usize = 4;

/// Validated cascade index in `0..MAX_CASCADE_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CascadeIndex(u8);

impl CascadeIndex {
    #[must_use]
    pub fn new(index: usize) -> Option<Self> {
        (index < MAX_CASCADE_COUNT).then(|| Self(index as u8))
    }

    #[inline]
    #[must_use]
    pub fn get(self) -> usize {
        self.0 as usize
    }

    /// Every cascade, nearest first.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..MAX_CASCADE_COUNT as u8).map(Self)
    }
}

// ============================================================================
// Cascade Split Computation
// ============================================================================

/// Computes where each cascade ends, as a fraction of `far - near`.
///
/// `split_mult` blends between uniform (`0.0`) and logarithmic (`1.0`)
/// distribution. The last fraction is always 1. Returns all zeros when the
/// range is empty (`far <= near`), which is the case without a shadow
/// casting light.
#[must_use]
pub fn compute_cascade_split_fractions(
    near: f32,
    far: f32,
    split_mult: f32,
) -> [f32; MAX_CASCADE_COUNT] {
    let mut fractions = [0.0f32; MAX_CASCADE_COUNT];
    if far <= near || near <= 0.0 {
        return fractions;
    }

    let clip_range = far - near;
    let ratio = far / near;
    for (c, fraction) in fractions.iter_mut().enumerate() {
        let p = (c + 1) as f32 / MAX_CASCADE_COUNT as f32;
        let log = near * ratio.powf(p);
        let uniform = near + clip_range * p;
        let d = split_mult * (log - uniform) + uniform;
        *fraction = (d - near) / clip_range;
    }
    fractions
}

/// View-space distance of each cascade's far plane.
#[must_use]
pub fn split_depths(
    near: f32,
    far: f32,
    fractions: &[f32; MAX_CASCADE_COUNT],
) -> [f32; MAX_CASCADE_COUNT] {
    fractions.map(|f| near + f * (far - near))
}

// ============================================================================
// Frustum Corners in World Space
// ============================================================================

/// Unprojects the NDC cube (z in 0..1) through `inv_view_proj`.
///
/// Order: near face (top-left, top-right, bottom-right, bottom-left), then
/// the far face in the same order.
#[must_use]
pub fn frustum_corners_world(inv_view_proj: Mat4) -> [Vec3; 8] {
    const NDC: [Vec3; 8] = [
        Vec3::new(-1.0, 1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(-1.0, -1.0, 1.0),
    ];
    NDC.map(|p| inv_view_proj.project_point3(p))
}

/// Cuts the slab `[prev_fraction, fraction]` out of a full frustum.
///
/// Each far corner moves to `fraction` along its edge, each near corner to
/// `prev_fraction`.
#[must_use]
pub fn carve_cascade_slab(corners: &[Vec3; 8], prev_fraction: f32, fraction: f32) -> [Vec3; 8] {
    let mut slab = *corners;
    for j in 0..4 {
        let edge = corners[j + 4] - corners[j];
        slab[j + 4] = corners[j] + edge * fraction;
        slab[j] = corners[j] + edge * prev_fraction;
    }
    slab
}

// ============================================================================
// Cascade Matrices
// ============================================================================

/// Result for one cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCascade {
    pub view: Mat4,
    pub projection: Mat4,
    /// Positive view-space distance of the cascade's far plane.
    pub split_depth: f32,
    /// Bounding sphere of the slab.
    pub center: Vec3,
    pub radius: f32,
}

impl Default for ShadowCascade {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            split_depth: 0.0,
            center: Vec3::ZERO,
            radius: 0.0,
        }
    }
}

/// All cascades of one directional light plus the caster culling volume.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CascadeSet {
    pub cascades: [ShadowCascade; MAX_CASCADE_COUNT],
    /// Sphere enclosing the last (largest) cascade. Every nearer cascade lies
    /// inside it, so one caster query serves them all.
    pub culling_center: Vec3,
    pub culling_radius: f32,
}

/// Inputs for [`compute_cascades`].
#[derive(Debug, Clone, Copy)]
pub struct CascadeParams {
    pub camera_view: Mat4,
    /// Vertical field of view, radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    /// Shadow distance plus fade distance.
    pub far: f32,
    pub light_direction: Vec3,
    /// Stretch applied to the light-space depth range so casters outside
    /// the view still land in the map.
    pub z_multiplier: f32,
}

/// Builds an orthographic light view for one slab.
fn cascade_from_slab(
    slab: &[Vec3; 8],
    light_direction: Vec3,
    z_multiplier: f32,
) -> (Mat4, Mat4, Vec3, f32) {
    let center = slab.iter().copied().sum::<Vec3>() / 8.0;
    let radius = slab
        .iter()
        .map(|c| c.distance(center))
        .fold(0.0f32, f32::max);

    let mut max_extents = Vec3::splat(radius);
    let mut min_extents = -max_extents;

    let zm = z_multiplier.max(1.0);
    if min_extents.z < 0.0 {
        min_extents.z *= zm;
    } else {
        min_extents.z /= zm;
    }
    if max_extents.z < 0.0 {
        max_extents.z /= zm;
    } else {
        max_extents.z *= zm;
    }

    let dir = if light_direction.length_squared() > 1e-6 {
        light_direction.normalize()
    } else {
        Vec3::NEG_Y
    };
    let up = if dir.y.abs() > 0.99 { Vec3::X } else { Vec3::Y };

    let eye = center - dir * min_extents.z.abs();
    let view = Mat4::look_at_rh(eye, center, up);
    let projection = Mat4::orthographic_rh(
        min_extents.x,
        max_extents.x,
        min_extents.y,
        max_extents.y,
        0.0,
        max_extents.z - min_extents.z,
    );
    (view, projection, center, radius)
}

/// Computes every cascade for a directional light seen from a camera.
#[must_use]
pub fn compute_cascades(
    params: &CascadeParams,
    fractions: &[f32; MAX_CASCADE_COUNT],
) -> CascadeSet {
    let mut set = CascadeSet::default();
    if params.far <= params.near {
        return set;
    }

    let projection = Mat4::perspective_rh(params.fov, params.aspect, params.near, params.far);
    let inv_view_proj = (projection * params.camera_view).inverse();
    let corners = frustum_corners_world(inv_view_proj);
    let depths = split_depths(params.near, params.far, fractions);

    let mut prev_fraction = 0.0;
    for index in CascadeIndex::all() {
        let c = index.get();
        let slab = carve_cascade_slab(&corners, prev_fraction, fractions[c]);
        let (view, projection, center, radius) =
            cascade_from_slab(&slab, params.light_direction, params.z_multiplier);

        set.cascades[c] = ShadowCascade {
            view,
            projection,
            split_depth: depths[c],
            center,
            radius,
        };
        prev_fraction = fractions[c];
    }

    let last = set.cascades[MAX_CASCADE_COUNT - 1];
    set.culling_center = last.center;
    set.culling_radius = last.radius;
    set
}
