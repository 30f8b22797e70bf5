//! Camera auto-framing
//!
//! Places the camera so a whole asset is in view. Runs once per asset, never
//! per frame: the camera stays put while the model moves.

use cgmath::{InnerSpace, Vector3, Zero};
use log::info;

use super::PerspectiveCamera;
use crate::gfx::picking::AABB;

/// Smallest radius used for framing, so empty or flat scenes still produce
/// a finite, positive distance.
pub const MIN_FRAME_RADIUS: f32 = 1e-3;

/// Extra room around the bounding sphere.
pub const FRAME_MARGIN: f32 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vector3<f32>,
    pub radius: f32,
}

impl BoundingSphere {
    /// Sphere through the corners of `aabb`.
    pub fn from_box(aabb: &AABB) -> Self {
        Self {
            center: aabb.center(),
            radius: aabb.half_diagonal(),
        }
    }

    /// Degenerate sphere at the origin, used when there is nothing to frame.
    pub fn empty() -> Self {
        Self {
            center: Vector3::zero(),
            radius: 0.0,
        }
    }
}

/// Distance from the sphere center at which the whole sphere fits the
/// vertical field of view.
pub fn framing_distance(radius: f32, fovy: cgmath::Rad<f32>) -> f32 {
    let radius = if radius.is_finite() {
        radius.max(MIN_FRAME_RADIUS)
    } else {
        MIN_FRAME_RADIUS
    };
    radius / (fovy.0 / 2.0).tan() * FRAME_MARGIN
}

/// Moves `camera` to look at `sphere` from along `view_axis` and returns the
/// distance used. Clip planes are widened when they would cut the sphere; the
/// near plane keeps half the gap to the sphere as headroom for moving models.
pub fn frame_sphere(
    camera: &mut PerspectiveCamera,
    sphere: &BoundingSphere,
    view_axis: Vector3<f32>,
) -> f32 {
    let axis = if view_axis.magnitude2() > f32::EPSILON {
        view_axis.normalize()
    } else {
        Vector3::unit_z()
    };

    let radius = sphere.radius.max(MIN_FRAME_RADIUS);
    let distance = framing_distance(radius, camera.fovy);

    let needed_far = distance + 2.0 * radius;
    if camera.zfar < needed_far {
        camera.zfar = needed_far;
    }
    let needed_near = ((distance - radius) * 0.5).max(distance * 1e-3);
    if camera.znear > needed_near {
        camera.znear = needed_near;
    }

    camera.look_at(sphere.center + axis * distance, sphere.center);
    info!(
        "framed sphere at ({:.3}, {:.3}, {:.3}) r={:.3} from distance {:.3}",
        sphere.center.x, sphere.center.y, sphere.center.z, radius, distance
    );
    distance
}
