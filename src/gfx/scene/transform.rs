//! Local transform of a scene node
//!
//! Position, XYZ Euler rotation (radians) and scale. The controlled model root
//! is one of these and is mutated in place every tick.

use cgmath::{Matrix4, Rad, Vector3};

use crate::controls::{Axis, TransformKind, TransformTarget};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    /// Euler angles in radians. Points are rotated about Z first, then Y,
    /// then X, each about the parent frame's axes.
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vector3::new(x, y, z);
        self
    }

    pub fn with_rotation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vector3::new(x, y, z);
        self
    }

    pub fn with_scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.scale = Vector3::new(x, y, z);
        self
    }

    /// Reads the scalar addressed by `target`.
    pub fn get(&self, target: TransformTarget) -> f32 {
        let v = self.vector(target.kind);
        match target.axis {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    /// Mutable access to the scalar addressed by `target`.
    pub fn component_mut(&mut self, target: TransformTarget) -> &mut f32 {
        let v = match target.kind {
            TransformKind::Position => &mut self.position,
            TransformKind::Rotation => &mut self.rotation,
            TransformKind::Scale => &mut self.scale,
        };
        match target.axis {
            Axis::X => &mut v.x,
            Axis::Y => &mut v.y,
            Axis::Z => &mut v.z,
        }
    }

    pub fn set(&mut self, target: TransformTarget, value: f32) {
        *self.component_mut(target) = value;
    }

    fn vector(&self, kind: TransformKind) -> &Vector3<f32> {
        match kind {
            TransformKind::Position => &self.position,
            TransformKind::Rotation => &self.rotation,
            TransformKind::Scale => &self.scale,
        }
    }

    /// Local-to-parent matrix: translation * Rx * Ry * Rz * scale.
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, SquareMatrix, Vector4};

    #[test]
    fn test_identity_matrix() {
        assert_eq!(Transform::identity().matrix(), Matrix4::identity());
    }

    #[test]
    fn test_component_access() {
        let mut transform = Transform::identity();
        let target: TransformTarget = "position.z".parse().unwrap();
        transform.set(target, -1.125);
        assert_eq!(transform.position.z, -1.125);
        assert_eq!(transform.get(target), -1.125);
        assert_eq!(transform.get("scale.y".parse().unwrap()), 1.0);
    }

    #[test]
    fn test_rotation_turns_about_z_first() {
        use std::f32::consts::FRAC_PI_2;

        let mut transform = Transform::identity();
        transform.rotation = Vector3::new(FRAC_PI_2, 0.0, FRAC_PI_2);
        let turned = transform.matrix() * Vector4::unit_x();
        // Z takes +X to +Y, then X takes +Y to +Z.
        assert!((turned.truncate() - Vector3::unit_z()).magnitude() < 1e-6);
    }

    #[test]
    fn test_matrix_applies_scale_before_translation() {
        let transform = Transform::identity()
            .with_position(1.0, 0.0, 0.0)
            .with_scale(2.0, 2.0, 2.0);
        let p = transform.matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.x - 3.0).abs() < 1e-6);
    }
}
