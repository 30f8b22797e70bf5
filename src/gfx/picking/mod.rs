//! # Object Picking System
//!
//! Ray casting from a click position on the rendering surface into the scene.
//!
//! ## How it works
//!
//! 1. **Click to Ray**: Normalize the click against the surface rectangle and
//!    unproject it through the camera into a world space ray
//! 2. **Broad phase**: Reject clickable meshes whose world bounding box the ray misses
//! 3. **Narrow phase**: Intersect the remaining triangles and keep the nearest hit
//!
//! ## Usage
//!
//! ```no_run
//! use vitrine::gfx::picking::{screen_to_ray, SurfaceRect};
//! use vitrine::gfx::camera::PerspectiveCamera;
//!
//! let camera = PerspectiveCamera::default();
//! let rect = SurfaceRect::new(0.0, 0.0, 1200.0, 800.0);
//! let ray = screen_to_ray((600.0, 400.0), &rect, &camera);
//! ```

pub mod hit_test;

use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4};

use crate::gfx::camera::PerspectiveCamera;

pub use hit_test::{ClickFilter, ClickTarget, HitTestDispatcher, PickResult};

/// World-space ray with a unit direction, so hit parameters are distances.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vector3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Distance to triangle `abc` along the ray, from either side
    /// (Möller–Trumbore). Hits behind the origin are ignored.
    pub fn intersect_triangle(&self, a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>) -> Option<f32> {
        const EPSILON: f32 = 1e-7;

        let ab = b - a;
        let ac = c - a;
        let p = self.direction.cross(ac);
        let det = ab.dot(p);
        if det.abs() < EPSILON {
            return None;
        }

        let to_origin = self.origin - a;
        let u = to_origin.dot(p) / det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = to_origin.cross(ab);
        let v = self.direction.dot(q) / det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = ac.dot(q) / det;
        (t > EPSILON).then_some(t)
    }
}

/// Axis-aligned box. An empty point set yields the degenerate box at the
/// origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl AABB {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Vector3<f32>>,
    {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return Self::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0));
        };
        points.fold(Self::new(first, first), |bounds, point| Self {
            min: componentwise(bounds.min, point, f32::min),
            max: componentwise(bounds.max, point, f32::max),
        })
    }

    pub fn union(&self, other: &AABB) -> Self {
        Self {
            min: componentwise(self.min, other.min, f32::min),
            max: componentwise(self.max, other.max, f32::max),
        }
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn half_diagonal(&self) -> f32 {
        (self.max - self.min).magnitude() * 0.5
    }

    /// Distance along `ray` to where it enters the box, or 0 when the origin
    /// is inside. Slab test.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let mut near = f32::NEG_INFINITY;
        let mut far = f32::INFINITY;
        for axis in 0..3 {
            let inv = 1.0 / ray.direction[axis];
            let t0 = (self.min[axis] - ray.origin[axis]) * inv;
            let t1 = (self.max[axis] - ray.origin[axis]) * inv;
            near = near.max(t0.min(t1));
            far = far.min(t0.max(t1));
        }

        (near <= far && far >= 0.0).then_some(near.max(0.0))
    }

    /// Box around the eight corners after `matrix` is applied.
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Self {
        let (lo, hi) = (self.min, self.max);
        Self::from_points((0..8).map(|corner| {
            let pick = |bit: usize, axis: usize| if corner & bit == 0 { lo[axis] } else { hi[axis] };
            transform_point(matrix, Vector3::new(pick(1, 0), pick(2, 1), pick(4, 2)))
        }))
    }
}

fn componentwise(a: Vector3<f32>, b: Vector3<f32>, f: fn(f32, f32) -> f32) -> Vector3<f32> {
    Vector3::new(f(a.x, b.x), f(a.y, b.y), f(a.z, b.z))
}

pub(crate) fn transform_point(matrix: &Matrix4<f32>, point: Vector3<f32>) -> Vector3<f32> {
    let p = matrix * point.extend(1.0);
    p.truncate() / p.w
}

/// Rectangle of the rendering surface in window pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left
            && y >= self.top
            && x <= self.left + self.width
            && y <= self.top + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Normalized device coordinates of a window position, +y up.
    pub fn to_ndc(&self, x: f32, y: f32) -> (f32, f32) {
        let ndc_x = (2.0 * (x - self.left)) / self.width - 1.0;
        let ndc_y = 1.0 - (2.0 * (y - self.top)) / self.height; // Flip Y axis
        (ndc_x, ndc_y)
    }
}

/// Convert a window position on `rect` to a world-space ray
pub fn screen_to_ray(screen_pos: (f32, f32), rect: &SurfaceRect, camera: &PerspectiveCamera) -> Ray {
    let (ndc_x, ndc_y) = rect.to_ndc(screen_pos.0, screen_pos.1);

    let inverse = (camera.projection_matrix() * camera.view_matrix())
        .invert()
        .unwrap_or_else(Matrix4::identity);
    let unproject = |depth: f32| {
        let p = inverse * Vector4::new(ndc_x, ndc_y, depth, 1.0);
        p.truncate() / p.w
    };

    let near = unproject(-1.0);
    Ray::new(near, unproject(1.0) - near)
}
