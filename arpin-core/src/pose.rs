//! Rigid poses in the tracked world frame

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position and orientation of something in world space.
///
/// Poses are snapshots: the tracking session hands out a fresh one every
/// tick and nothing in the pipeline mutates them in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Translation in meters
    pub translation: Vec3,
    /// Unit rotation quaternion
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// The pose at the world origin with no rotation
    pub const IDENTITY: Pose = Pose {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Create a pose, normalizing the rotation
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation: rotation.normalize(),
        }
    }

    /// A pure translation
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }

    /// Column-major homogeneous transform (local to world)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }

    /// The inverse transform (world to local)
    pub fn inverse(&self) -> Pose {
        let rotation = self.rotation.inverse();
        Pose {
            translation: rotation * -self.translation,
            rotation,
        }
    }

    /// Map a point from this pose's local frame into world space
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.translation + self.rotation * point
    }

    /// World-space direction of one of this pose's local axes, scaled
    pub fn transformed_axis(&self, axis: Axis, scale: f32) -> Vec3 {
        let local = match axis {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        };
        self.rotation * (local * scale)
    }

    /// Same pose with the height (y) replaced
    pub fn with_height(&self, y: f32) -> Pose {
        Pose {
            translation: Vec3::new(self.translation.x, y, self.translation.z),
            rotation: self.rotation,
        }
    }
}

/// Local coordinate axis of a pose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Right
    X,
    /// Up; the normal of a plane's center pose
    Y,
    /// Backward
    Z,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_places_translation_in_last_column() {
        let pose = Pose::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let cols = pose.to_matrix().to_cols_array();
        assert_eq!(&cols[12..15], &[1.0, 2.0, 3.0]);
        assert_eq!(cols[15], 1.0);
    }

    #[test]
    fn test_inverse_undoes_pose() {
        let pose = Pose::new(
            Vec3::new(0.5, -1.0, 2.0),
            Quat::from_rotation_y(0.7) * Quat::from_rotation_x(-0.3),
        );
        let round = pose.to_matrix() * pose.inverse().to_matrix();
        assert!(round.abs_diff_eq(Mat4::IDENTITY, 1e-5));
        let local = Vec3::new(0.2, 0.1, -0.4);
        assert!(pose.inverse().transform_point(pose.transform_point(local)).abs_diff_eq(local, 1e-5));
    }

    #[test]
    fn test_transformed_y_axis_follows_rotation() {
        let pose = Pose::new(Vec3::ZERO, Quat::from_rotation_x(std::f32::consts::FRAC_PI_2));
        let up = pose.transformed_axis(Axis::Y, 1.0);
        assert!(up.abs_diff_eq(Vec3::Z, 1e-6));
    }
}
