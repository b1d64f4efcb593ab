//! Rigid-body transforms (rotation + translation).
//!
//! Poses handed out by the AR session are `T_world_object`: they map points
//! expressed in the object's local frame into the world frame.

use nalgebra::{Matrix4, Quaternion, UnitQuaternion, Vector3};

use super::frames::HEIGHT_AXIS;

/// Rigid transform with unit-quaternion rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SE3 {
    pub rotation: UnitQuaternion<f64>,
    pub translation: Vector3<f64>,
}

impl SE3 {
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn from_rt(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation,
        }
    }

    /// Build from a w-first quaternion. The quaternion is normalized.
    pub fn from_quaternion(qw: f64, qx: f64, qy: f64, qz: f64, translation: Vector3<f64>) -> Self {
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(qw, qx, qy, qz));
        Self {
            rotation,
            translation,
        }
    }

    /// Homogeneous 4x4 matrix of this transform.
    pub fn to_matrix(&self) -> Matrix4<f64> {
        let mut mat = self.rotation.to_homogeneous();
        mat[(0, 3)] = self.translation.x;
        mat[(1, 3)] = self.translation.y;
        mat[(2, 3)] = self.translation.z;
        mat
    }

    /// Model matrix for the renderer: this pose followed by a uniform scale,
    /// in single precision. nalgebra storage is column-major, matching GL.
    pub fn to_model_matrix(&self, scale: f32) -> Matrix4<f32> {
        let scaling = Matrix4::new_nonuniform_scaling(&Vector3::new(scale, scale, scale));
        self.to_matrix().cast::<f32>() * scaling
    }

    /// `self ∘ other`: apply `other` first, then `self`.
    pub fn compose(&self, other: &SE3) -> SE3 {
        SE3 {
            rotation: self.rotation * other.rotation,
            translation: self.rotation.transform_vector(&other.translation) + self.translation,
        }
    }

    pub fn inverse(&self) -> SE3 {
        let rotation = self.rotation.inverse();
        SE3 {
            rotation,
            translation: -rotation.transform_vector(&self.translation),
        }
    }

    pub fn transform_point(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.transform_vector(p) + self.translation
    }

    /// Vertical coordinate of the translation.
    #[inline]
    pub fn height(&self) -> f64 {
        self.translation[HEIGHT_AXIS]
    }

    /// Copy of this pose with the vertical coordinate replaced.
    /// Rotation and horizontal coordinates are untouched.
    pub fn with_height(&self, height: f64) -> SE3 {
        let mut translation = self.translation;
        translation[HEIGHT_AXIS] = height;
        SE3 {
            rotation: self.rotation,
            translation,
        }
    }
}

impl Default for SE3 {
    fn default() -> Self {
        Self::identity()
    }
}
