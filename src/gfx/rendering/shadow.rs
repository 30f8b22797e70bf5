//! Shadows from the directional light
//!
//! Every frame the light's orthographic view is fitted around the drawn meshes
//! and a shadow-only ground plane is laid under them. Meshes flagged
//! `cast_shadow` are rendered into the shadow map, which the ground plane and
//! the lit meshes then sample.

use std::sync::Arc;

use cgmath::{ortho, EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3};

use super::draw::DrawItem;
use crate::gfx::{
    camera::{perspective_camera::OPENGL_TO_WGPU_MATRIX, MIN_FRAME_RADIUS},
    resources::global_bindings::LightConfig,
    scene::mesh::Mesh,
};

/// Alpha of the ground plane where it is fully shadowed.
pub const SHADOW_OPACITY: f32 = 0.3;

// Both in scene radii.
const GROUND_EXTENT: f32 = 4.0;
const LIGHT_DISTANCE: f32 = 3.0;

/// Light projection and shadow receiver for one frame.
#[derive(Clone, Debug)]
pub struct ShadowFrame {
    pub light_view_proj: Matrix4<f32>,
    pub receiver: DrawItem,
}

impl ShadowFrame {
    /// Fits the light around `items` and places the `ground` mesh (see
    /// [`Mesh::ground_plane`]) under their lowest point. `None` when there is
    /// nothing to draw.
    pub fn fit(items: &[DrawItem], light: &LightConfig, ground: &Arc<Mesh>) -> Option<Self> {
        let bounds = items
            .iter()
            .map(|item| item.mesh.bounds().transformed(&item.model))
            .reduce(|a, b| a.union(&b))?;
        let radius = bounds.half_diagonal();
        if !radius.is_finite() {
            return None;
        }
        let radius = radius.max(MIN_FRAME_RADIUS);
        let center = bounds.center();

        let towards_light = Vector3::from(light.position);
        let towards_light = if towards_light.magnitude2() > f32::EPSILON {
            towards_light.normalize()
        } else {
            Vector3::unit_y()
        };
        let up = if towards_light.y.abs() > 0.99 {
            Vector3::unit_z()
        } else {
            Vector3::unit_y()
        };

        let eye = center + towards_light * (LIGHT_DISTANCE * radius);
        let view = Matrix4::look_at_rh(Point3::from_vec(eye), Point3::from_vec(center), up);
        // Far enough to reach the corners of the ground plane.
        let projection = ortho(
            -radius,
            radius,
            -radius,
            radius,
            (LIGHT_DISTANCE - 1.0) * radius,
            (LIGHT_DISTANCE + 2.0 * GROUND_EXTENT) * radius,
        );

        let receiver = DrawItem {
            mesh: Arc::clone(ground),
            model: Matrix4::from_translation(Vector3::new(center.x, bounds.min.y, center.z))
                * Matrix4::from_scale(GROUND_EXTENT * radius),
            base_color: [0.0, 0.0, 0.0, SHADOW_OPACITY],
            transparent: true,
            cast_shadow: false,
        };

        Some(Self {
            light_view_proj: OPENGL_TO_WGPU_MATRIX * projection * view,
            receiver,
        })
    }

    /// `items` with the receiver placed after the opaque draws, ahead of the
    /// blended ones.
    pub fn with_receiver(&self, items: &[DrawItem]) -> Vec<DrawItem> {
        let split = items
            .iter()
            .position(|item| item.transparent)
            .unwrap_or(items.len());
        let mut frame = Vec::with_capacity(items.len() + 1);
        frame.extend_from_slice(&items[..split]);
        frame.push(self.receiver.clone());
        frame.extend_from_slice(&items[split..]);
        frame
    }
}

/// Indices of the items drawn into the shadow map.
pub fn shadow_casters(items: &[DrawItem]) -> impl Iterator<Item = usize> + '_ {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.cast_shadow)
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Vector4, Zero};

    fn cube(at: [f32; 3], transparent: bool) -> DrawItem {
        DrawItem {
            mesh: Arc::new(Mesh::cuboid([1.0, 1.0, 1.0])),
            model: Matrix4::from_translation(at.into()),
            base_color: [1.0, 1.0, 1.0, if transparent { 0.4 } else { 1.0 }],
            transparent,
            cast_shadow: !transparent,
        }
    }

    fn project(matrix: &Matrix4<f32>, point: Vector3<f32>) -> Vector3<f32> {
        let clip = *matrix * Vector4::new(point.x, point.y, point.z, 1.0);
        clip.truncate() / clip.w
    }

    fn ground() -> Arc<Mesh> {
        Arc::new(Mesh::ground_plane())
    }

    #[test]
    fn test_nothing_to_draw_means_no_shadow_frame() {
        assert!(ShadowFrame::fit(&[], &LightConfig::default(), &ground()).is_none());
    }

    #[test]
    fn test_receiver_lies_under_the_scene() {
        let items = [cube([0.0, 2.0, 0.0], false), cube([4.0, 0.0, 0.0], true)];
        let frame = ShadowFrame::fit(&items, &LightConfig::default(), &ground())
            .expect("scene has geometry");

        let origin = frame.receiver.model.w.truncate();
        assert_eq!(origin, Vector3::new(2.0, -1.0, 0.0));
        assert!(frame.receiver.transparent);
        assert!(!frame.receiver.cast_shadow);
        assert_eq!(frame.receiver.base_color, [0.0, 0.0, 0.0, SHADOW_OPACITY]);

        let bounds = frame.receiver.mesh.bounds().transformed(&frame.receiver.model);
        assert!(bounds.min.x < -1.0 && bounds.max.x > 5.0);
    }

    #[test]
    fn test_scene_and_its_shadow_land_inside_the_shadow_map() {
        let items = [cube([0.0, 0.0, 0.0], false), cube([3.0, 3.0, -2.0], false)];
        let frame = ShadowFrame::fit(&items, &LightConfig::default(), &ground())
            .expect("scene has geometry");

        let caster_corners = items.iter().flat_map(|item| {
            let b = item.mesh.bounds().transformed(&item.model);
            [b.min, b.max]
        });
        // On the ground plane, under the highest caster.
        let shadow_spot = Vector3::new(3.0, -1.0, -2.0);
        for point in caster_corners.chain([shadow_spot]) {
            let ndc = project(&frame.light_view_proj, point);
            assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0, "{:?} -> {:?}", point, ndc);
            assert!((0.0..=1.0).contains(&ndc.z), "{:?} -> {:?}", point, ndc);
        }
    }

    #[test]
    fn test_overhead_light_still_fits() {
        let light = LightConfig {
            position: [0.0, 10.0, 0.0],
            ..LightConfig::default()
        };
        let frame = ShadowFrame::fit(&[cube([0.0; 3], false)], &light, &ground())
            .expect("scene has geometry");
        let ndc = project(&frame.light_view_proj, Vector3::zero());
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_receiver_is_drawn_between_opaque_and_blended() {
        let items = [cube([0.0; 3], false), cube([0.0; 3], true)];
        let frame = ShadowFrame::fit(&items, &LightConfig::default(), &ground())
            .expect("scene has geometry");
        let drawn = frame.with_receiver(&items);

        assert_eq!(drawn.len(), 3);
        assert!(!drawn[0].transparent);
        assert!(Arc::ptr_eq(&drawn[1].mesh, &frame.receiver.mesh));
        assert_eq!(drawn[2].base_color[3], 0.4);
    }

    #[test]
    fn test_only_flagged_items_cast_shadows() {
        let items = [
            cube([0.0; 3], false),
            cube([0.0; 3], true),
            cube([1.0, 0.0, 0.0], false),
        ];
        let casters: Vec<usize> = shadow_casters(&items).collect();
        assert_eq!(casters, vec![0, 2]);
    }
}
