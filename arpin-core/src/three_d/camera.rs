//! Projection and view matrices for the tracked camera

use crate::session::Camera;
use glam::{Mat4, Vec4};

/// Perspective projection for the camera image.
///
/// Built from the pinhole intrinsics so virtual content lines up with the
/// camera feed. Intrinsics are taken as already rotated to the display, the
/// same frame as [`view_matrix`]. Column-major, right-handed, OpenGL clip space (depth in
/// -1..1). A centered principal point gives exactly
/// `Mat4::perspective_rh_gl` for the matching field of view.
pub fn projection_matrix(camera: &Camera, near: f32, far: f32) -> Mat4 {
    let intrinsics = &camera.intrinsics;
    let width = intrinsics.image_size.x.max(1) as f32;
    let height = intrinsics.image_size.y.max(1) as f32;
    let fx = intrinsics.focal_length.x;
    let fy = intrinsics.focal_length.y;
    let cx = intrinsics.principal_point.x;
    let cy = intrinsics.principal_point.y;
    let depth = far - near;

    Mat4::from_cols(
        Vec4::new(2.0 * fx / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * fy / height, 0.0, 0.0),
        Vec4::new(
            1.0 - 2.0 * cx / width,
            2.0 * cy / height - 1.0,
            -(far + near) / depth,
            -1.0,
        ),
        Vec4::new(0.0, 0.0, -2.0 * far * near / depth, 0.0),
    )
}

/// World-to-camera transform in the display-oriented frame.
///
/// Plane overlays are drawn from the same pose, so objects and planes agree
/// on where the camera is whatever the display rotation.
pub fn view_matrix(camera: &Camera) -> Mat4 {
    camera.display_oriented_pose.inverse().to_matrix()
}
