//! Interface to the external tracking engine
//!
//! The pipeline never implements tracking itself. It drives whatever
//! engine sits behind [`TrackingSession`] once per tick and reads the
//! resulting [`TrackingFrame`].

use crate::error::SessionError;
use crate::pose::Pose;
use crate::trackable::{HitResult, Plane, Trackable, TrackableId, TrackableKind, TrackingState};
use glam::{UVec2, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a session-owned anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorId(pub Uuid);

impl AnchorId {
    /// Fresh random id
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anchor-{}", self.0)
    }
}

/// Snapshot of an anchor as the session currently sees it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    /// Anchor id
    pub id: AnchorId,
    /// Current world pose
    pub pose: Pose,
    /// Current tracking state
    pub tracking_state: TrackingState,
}

/// Why the camera is not tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingFailureReason {
    /// Tracking is fine, or paused for no reported reason
    #[default]
    None,
    /// Internal engine error
    BadState,
    /// Scene too dark
    InsufficientLight,
    /// Device moving too fast
    ExcessiveMotion,
    /// Not enough texture to track
    InsufficientFeatures,
    /// Camera taken by another app
    CameraUnavailable,
}

/// Pinhole intrinsics of the camera image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Focal length in pixels (fx, fy)
    pub focal_length: Vec2,
    /// Principal point in pixels (cx, cy)
    pub principal_point: Vec2,
    /// Image size in pixels
    pub image_size: UVec2,
}

impl CameraIntrinsics {
    /// Intrinsics for a centered principal point and a vertical field of view
    pub fn from_fov(fov_y: f32, width: u32, height: u32) -> Self {
        let fy = height as f32 / (2.0 * (fov_y * 0.5).tan());
        Self {
            focal_length: Vec2::splat(fy),
            principal_point: Vec2::new(width as f32 * 0.5, height as f32 * 0.5),
            image_size: UVec2::new(width, height),
        }
    }
}

/// The device camera for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Sensor pose in world space
    pub pose: Pose,
    /// Pose rotated to match the current display orientation
    pub display_oriented_pose: Pose,
    /// Tracking state this frame
    pub tracking_state: TrackingState,
    /// Reason when not tracking
    #[serde(default)]
    pub tracking_failure_reason: TrackingFailureReason,
    /// Image intrinsics used for the projection matrix
    pub intrinsics: CameraIntrinsics,
}

/// Validity of a light estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightEstimateState {
    /// Values are meaningful
    Valid,
    /// Engine could not estimate this frame
    NotValid,
}

/// Ambient light estimate for a frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightEstimate {
    /// Validity
    pub state: LightEstimateState,
    /// Per-channel color correction, green normalized to 1
    pub color_correction: Vec3,
    /// Average pixel intensity of the camera image, 0..1
    pub pixel_intensity: f32,
}

impl Default for LightEstimate {
    fn default() -> Self {
        Self {
            state: LightEstimateState::NotValid,
            color_correction: Vec3::ONE,
            pixel_intensity: 1.0,
        }
    }
}

/// A sparse point cloud borrowed from the session.
///
/// The session's buffer stays reserved until this value is dropped, which
/// happens on every exit path of the draw that acquired it.
pub struct PointCloud {
    timestamp: i64,
    points: Vec<Vec4>,
    on_release: Option<Box<dyn FnOnce() + Send>>,
}

impl PointCloud {
    /// Wrap points (xyz + confidence) with a release hook
    pub fn new(timestamp: i64, points: Vec<Vec4>, on_release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            timestamp,
            points,
            on_release: Some(Box::new(on_release)),
        }
    }

    /// A cloud with nothing to release
    pub fn detached(timestamp: i64, points: Vec<Vec4>) -> Self {
        Self {
            timestamp,
            points,
            on_release: None,
        }
    }

    /// Frame timestamp the points belong to
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Points as (x, y, z, confidence)
    pub fn points(&self) -> &[Vec4] {
        &self.points
    }
}

impl fmt::Debug for PointCloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointCloud")
            .field("timestamp", &self.timestamp)
            .field("points", &self.points.len())
            .finish()
    }
}

impl Drop for PointCloud {
    fn drop(&mut self) {
        if let Some(release) = self.on_release.take() {
            release();
        }
    }
}

/// Rotation of the display relative to the device's natural orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayRotation {
    /// Natural orientation
    #[default]
    Rotation0,
    /// 90 degrees
    Rotation90,
    /// 180 degrees
    Rotation180,
    /// 270 degrees
    Rotation270,
}

/// Identifier of the GPU texture the camera image is streamed into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureId(pub u32);

/// One tick worth of tracking output
pub trait TrackingFrame {
    /// Frame timestamp in nanoseconds
    fn timestamp(&self) -> i64;

    /// Camera for this frame
    fn camera(&self) -> &Camera;

    /// Ray cast from a screen point; results ordered near to far
    fn hit_test(&self, screen_point: Vec2) -> Vec<HitResult>;

    /// Borrow the current point cloud; released when the value drops
    fn acquire_point_cloud(&self) -> Result<PointCloud, SessionError>;

    /// Ambient light estimate
    fn light_estimate(&self) -> LightEstimate;
}

/// A running tracking engine
pub trait TrackingSession {
    /// Frame type produced by [`TrackingSession::update`]
    type Frame: TrackingFrame;

    /// Start or restart camera and tracking
    fn resume(&mut self) -> Result<(), SessionError>;

    /// Stop camera and tracking, keeping state
    fn pause(&mut self);

    /// Release everything; the session is unusable afterwards
    fn close(&mut self);

    /// Inform the engine of the viewport size and rotation
    fn set_display_geometry(&mut self, rotation: DisplayRotation, width: u32, height: u32);

    /// Texture the camera image should be written into
    fn set_camera_texture(&mut self, texture: TextureId);

    /// Advance one tick
    fn update(&mut self) -> Result<Self::Frame, SessionError>;

    /// Create a world anchor at `pose`
    fn create_anchor(&mut self, pose: &Pose) -> Result<AnchorId, SessionError>;

    /// Stop tracking an anchor and release it.
    ///
    /// Fails with [`SessionError::UnknownAnchor`] when the session never
    /// created the anchor or has already released it.
    fn detach_anchor(&mut self, anchor: AnchorId) -> Result<(), SessionError>;

    /// Current state of an anchor, `None` once detached
    fn anchor(&self, anchor: AnchorId) -> Option<Anchor>;

    /// Current state of a trackable, `None` once the engine forgot it
    fn trackable(&self, id: TrackableId) -> Option<Trackable>;

    /// Every trackable of one kind
    fn all_trackables(&self, kind: TrackableKind) -> Vec<Trackable>;

    /// Every plane
    fn all_planes(&self) -> Vec<Plane> {
        self.all_trackables(TrackableKind::Plane)
            .into_iter()
            .filter_map(|trackable| match trackable {
                Trackable::Plane(plane) => Some(plane),
                Trackable::Point(_) => None,
            })
            .collect()
    }
}

/// Creates sessions; stands in for install and permission checks
pub trait SessionFactory {
    /// Session type produced
    type Session: TrackingSession;

    /// Try to create a session
    fn create(&mut self) -> Result<Self::Session, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_point_cloud_released_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        {
            let cloud = PointCloud::new(7, vec![Vec4::new(0.0, 0.0, -1.0, 0.9)], move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            assert_eq!(cloud.points().len(), 1);
            assert_eq!(released.load(Ordering::SeqCst), 0);
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_intrinsics_from_fov_center_principal_point() {
        let intrinsics = CameraIntrinsics::from_fov(std::f32::consts::FRAC_PI_2, 640, 480);
        assert_eq!(intrinsics.principal_point, Vec2::new(320.0, 240.0));
        assert_abs_diff_eq!(intrinsics.focal_length.y, 240.0, epsilon = 1e-3);
    }
}
