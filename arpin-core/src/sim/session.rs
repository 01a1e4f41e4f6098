//! Scripted tracking session

use crate::error::SessionError;
use crate::pose::{Axis, Pose};
use crate::primitives::Viewport;
use crate::session::{
    Anchor, AnchorId, Camera, CameraIntrinsics, DisplayRotation, LightEstimate, PointCloud, SessionFactory,
    TextureId, TrackingFailureReason, TrackingFrame, TrackingSession,
};
use crate::trackable::{
    HitResult, OrientationMode, Plane, PlaneType, Point, Trackable, TrackableId, TrackableKind, TrackingState,
};
use glam::{Quat, Vec2, Vec3, Vec4};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// Nanoseconds between simulated frames (30 Hz)
pub const FRAME_INTERVAL_NS: i64 = 33_333_333;

/// Feature points closer than this to a hit-test ray count as hit
const POINT_HIT_RADIUS: f32 = 0.05;

/// Everything a call into [`SimSession`] did, in call order
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// `resume()`
    Resumed,
    /// `pause()`
    Paused,
    /// `close()`
    Closed,
    /// `update()` produced a frame
    Update(i64),
    /// Anchor created
    CreateAnchor(AnchorId),
    /// Anchor detached
    DetachAnchor(AnchorId),
    /// Hit test at a screen point
    HitTest(Vec2),
    /// Point cloud handed out
    PointCloudAcquired(i64),
    /// Point cloud given back
    PointCloudReleased(i64),
    /// Display geometry forwarded
    DisplayGeometry {
        /// Rotation
        rotation: DisplayRotation,
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// Camera texture bound
    CameraTexture(TextureId),
}

/// Point cloud contents the session will hand out
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimPointCloud {
    /// Changes only when the points change
    pub timestamp: i64,
    /// (x, y, z, confidence)
    #[serde(default)]
    pub points: Vec<Vec4>,
}

/// The simulated world as the engine would perceive it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimWorld {
    /// Device camera
    pub camera: Camera,
    /// Detected planes
    #[serde(default)]
    pub planes: Vec<Plane>,
    /// Tracked feature points
    #[serde(default)]
    pub points: Vec<Point>,
    /// When non-empty, returned verbatim by every hit test instead of ray casting
    #[serde(default)]
    pub hits: Vec<HitResult>,
    /// Sparse point cloud
    #[serde(default)]
    pub point_cloud: SimPointCloud,
    /// Ambient light
    #[serde(default)]
    pub light: LightEstimate,
}

impl SimWorld {
    /// A tracking camera 1.5 m above a 2 m square floor, looking 45 degrees down.
    ///
    /// The center of a 480x960 screen hits the floor center at (0, 0, -1.5).
    pub fn floor_scene() -> Self {
        let pose = Pose::new(
            Vec3::new(0.0, 1.5, 0.0),
            Quat::from_rotation_x(-std::f32::consts::FRAC_PI_4),
        );
        Self {
            camera: Camera {
                pose,
                display_oriented_pose: pose,
                tracking_state: TrackingState::Tracking,
                tracking_failure_reason: TrackingFailureReason::None,
                intrinsics: CameraIntrinsics::from_fov(1.0, 480, 960),
            },
            planes: vec![Plane {
                id: TrackableId(1),
                center_pose: Pose::from_translation(Vec3::new(0.0, 0.0, -1.5)),
                polygon: vec![
                    Vec2::new(-1.0, -1.0),
                    Vec2::new(1.0, -1.0),
                    Vec2::new(1.0, 1.0),
                    Vec2::new(-1.0, 1.0),
                ],
                plane_type: PlaneType::HorizontalUpwardFacing,
                tracking_state: TrackingState::Tracking,
                subsumed_by: None,
            }],
            points: Vec::new(),
            hits: Vec::new(),
            point_cloud: SimPointCloud {
                timestamp: 1,
                points: vec![Vec4::new(0.1, 0.0, -1.4, 0.8), Vec4::new(-0.2, 0.0, -1.7, 0.6)],
            },
            light: LightEstimate::default(),
        }
    }

    /// Set camera tracking state and failure reason together
    pub fn set_tracking(&mut self, state: TrackingState, reason: TrackingFailureReason) {
        self.camera.tracking_state = state;
        self.camera.tracking_failure_reason = reason;
    }

    fn trackable(&self, id: TrackableId) -> Option<Trackable> {
        self.planes
            .iter()
            .find(|plane| plane.id == id)
            .cloned()
            .map(Trackable::Plane)
            .or_else(|| self.points.iter().find(|point| point.id == id).cloned().map(Trackable::Point))
    }

    /// Ray cast from a screen point, near to far.
    ///
    /// Screen pixels are scaled onto the camera image when a viewport is
    /// known. Plane hits are reported wherever the ray meets the infinite
    /// plane; filtering by polygon is left to the caller.
    pub fn cast(&self, screen_point: Vec2, viewport: Viewport) -> Vec<HitResult> {
        if !self.hits.is_empty() {
            return self.hits.clone();
        }
        if self.camera.tracking_state != TrackingState::Tracking {
            return Vec::new();
        }

        let intrinsics = &self.camera.intrinsics;
        let image = intrinsics.image_size.as_vec2();
        let pixel = if viewport.width > 0 && viewport.height > 0 {
            screen_point * image / Vec2::new(viewport.width as f32, viewport.height as f32)
        } else {
            screen_point
        };
        let local = Vec3::new(
            (pixel.x - intrinsics.principal_point.x) / intrinsics.focal_length.x,
            -(pixel.y - intrinsics.principal_point.y) / intrinsics.focal_length.y,
            -1.0,
        );
        let origin = self.camera.pose.translation;
        let direction = (self.camera.pose.rotation * local).normalize();

        let mut hits = Vec::new();
        for plane in self.planes.iter().filter(|p| p.tracking_state == TrackingState::Tracking) {
            let normal = plane.center_pose.transformed_axis(Axis::Y, 1.0);
            let denom = direction.dot(normal);
            if denom.abs() < 1e-6 {
                continue;
            }
            let t = (plane.center_pose.translation - origin).dot(normal) / denom;
            if t > 0.0 {
                hits.push(HitResult {
                    hit_pose: Pose::new(origin + direction * t, plane.center_pose.rotation),
                    distance: t,
                    trackable: Trackable::Plane(plane.clone()),
                });
            }
        }
        for point in self.points.iter().filter(|p| p.tracking_state == TrackingState::Tracking) {
            let to_point = point.pose.translation - origin;
            let t = to_point.dot(direction);
            if t > 0.0 && (to_point - direction * t).length() <= POINT_HIT_RADIUS {
                let hit_pose = match point.orientation_mode {
                    OrientationMode::EstimatedSurfaceNormal => point.pose,
                    OrientationMode::InitializedToIdentity => Pose::from_translation(point.pose.translation),
                };
                hits.push(HitResult {
                    hit_pose,
                    distance: t,
                    trackable: Trackable::Point(point.clone()),
                });
            }
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

#[derive(Debug, Clone, Copy)]
struct SimAnchor {
    pose: Pose,
}

type EventLog = Arc<Mutex<Vec<SessionEvent>>>;

/// Frame snapshot produced by [`SimSession::update`]
#[derive(Debug, Clone)]
pub struct SimFrame {
    timestamp: i64,
    world: SimWorld,
    viewport: Viewport,
    fail_point_cloud: bool,
    events: EventLog,
}

impl TrackingFrame for SimFrame {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn camera(&self) -> &Camera {
        &self.world.camera
    }

    fn hit_test(&self, screen_point: Vec2) -> Vec<HitResult> {
        self.events.lock().push(SessionEvent::HitTest(screen_point));
        self.world.cast(screen_point, self.viewport)
    }

    fn acquire_point_cloud(&self) -> Result<PointCloud, SessionError> {
        if self.fail_point_cloud {
            return Err(SessionError::Backend("point cloud unavailable".to_string()));
        }
        let timestamp = self.world.point_cloud.timestamp;
        self.events.lock().push(SessionEvent::PointCloudAcquired(timestamp));
        let events = Arc::clone(&self.events);
        Ok(PointCloud::new(timestamp, self.world.point_cloud.points.clone(), move || {
            events.lock().push(SessionEvent::PointCloudReleased(timestamp));
        }))
    }

    fn light_estimate(&self) -> LightEstimate {
        self.world.light
    }
}

/// Headless [`TrackingSession`] over a mutable [`SimWorld`].
///
/// Anchors track exactly while the camera does. Every call is appended to an
/// event log that tests and the replay tool inspect.
#[derive(Debug)]
pub struct SimSession {
    world: SimWorld,
    resumed: bool,
    closed: bool,
    clock: i64,
    viewport: Viewport,
    anchors: FxHashMap<AnchorId, SimAnchor>,
    anchor_rejection: Option<SessionError>,
    update_failures: VecDeque<SessionError>,
    fail_point_cloud: bool,
    events: EventLog,
}

impl SimSession {
    /// Session over `world`; not resumed yet
    pub fn new(world: SimWorld) -> Self {
        Self {
            world,
            resumed: false,
            closed: false,
            clock: 0,
            viewport: Viewport::default(),
            anchors: FxHashMap::default(),
            anchor_rejection: None,
            update_failures: VecDeque::new(),
            fail_point_cloud: false,
            events: Arc::default(),
        }
    }

    /// Session over [`SimWorld::floor_scene`]
    pub fn with_floor() -> Self {
        Self::new(SimWorld::floor_scene())
    }

    /// Current world
    pub fn world(&self) -> &SimWorld {
        &self.world
    }

    /// Edit the world; takes effect on the next `update()`
    pub fn world_mut(&mut self) -> &mut SimWorld {
        &mut self.world
    }

    /// Copy of the event log
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }

    /// Empty the event log, returning what was in it
    pub fn take_events(&self) -> Vec<SessionEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Refuse every anchor request with `err` until [`SimSession::accept_anchors`]
    pub fn reject_anchors(&mut self, err: SessionError) {
        self.anchor_rejection = Some(err);
    }

    /// Accept anchor requests again
    pub fn accept_anchors(&mut self) {
        self.anchor_rejection = None;
    }

    /// Make the next `update()` fail
    pub fn fail_next_update(&mut self, err: SessionError) {
        self.update_failures.push_back(err);
    }

    /// Make point cloud acquisition fail on frames produced from now on
    pub fn fail_point_cloud(&mut self, fail: bool) {
        self.fail_point_cloud = fail;
    }

    /// Anchors not yet detached
    pub fn live_anchor_count(&self) -> usize {
        self.anchors.len()
    }

    /// Point clouds handed out and not yet released
    pub fn outstanding_point_clouds(&self) -> usize {
        let events = self.events.lock();
        let acquired = events.iter().filter(|e| matches!(e, SessionEvent::PointCloudAcquired(_))).count();
        let released = events.iter().filter(|e| matches!(e, SessionEvent::PointCloudReleased(_))).count();
        acquired.saturating_sub(released)
    }

    /// Whether `resume()` succeeded more recently than `pause()`
    pub fn is_resumed(&self) -> bool {
        self.resumed
    }

    fn record(&self, event: SessionEvent) {
        self.events.lock().push(event);
    }
}

impl TrackingSession for SimSession {
    type Frame = SimFrame;

    fn resume(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::NotReady);
        }
        self.resumed = true;
        self.record(SessionEvent::Resumed);
        Ok(())
    }

    fn pause(&mut self) {
        self.resumed = false;
        self.record(SessionEvent::Paused);
    }

    fn close(&mut self) {
        self.resumed = false;
        self.closed = true;
        self.anchors.clear();
        self.record(SessionEvent::Closed);
    }

    fn set_display_geometry(&mut self, rotation: DisplayRotation, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
        self.record(SessionEvent::DisplayGeometry { rotation, width, height });
    }

    fn set_camera_texture(&mut self, texture: TextureId) {
        self.record(SessionEvent::CameraTexture(texture));
    }

    fn update(&mut self) -> Result<SimFrame, SessionError> {
        if let Some(err) = self.update_failures.pop_front() {
            return Err(err);
        }
        if !self.resumed {
            return Err(SessionError::NotReady);
        }
        self.clock += FRAME_INTERVAL_NS;
        self.record(SessionEvent::Update(self.clock));
        Ok(SimFrame {
            timestamp: self.clock,
            world: self.world.clone(),
            viewport: self.viewport,
            fail_point_cloud: self.fail_point_cloud,
            events: Arc::clone(&self.events),
        })
    }

    fn create_anchor(&mut self, pose: &Pose) -> Result<AnchorId, SessionError> {
        if let Some(err) = &self.anchor_rejection {
            return Err(err.clone());
        }
        let id = AnchorId::new_v4();
        self.anchors.insert(id, SimAnchor { pose: *pose });
        self.record(SessionEvent::CreateAnchor(id));
        Ok(id)
    }

    fn detach_anchor(&mut self, anchor: AnchorId) -> Result<(), SessionError> {
        if self.anchors.remove(&anchor).is_none() {
            return Err(SessionError::UnknownAnchor(anchor.to_string()));
        }
        self.record(SessionEvent::DetachAnchor(anchor));
        Ok(())
    }

    fn anchor(&self, anchor: AnchorId) -> Option<Anchor> {
        self.anchors.get(&anchor).map(|sim| Anchor {
            id: anchor,
            pose: sim.pose,
            tracking_state: self.world.camera.tracking_state,
        })
    }

    fn trackable(&self, id: TrackableId) -> Option<Trackable> {
        self.world.trackable(id)
    }

    fn all_trackables(&self, kind: TrackableKind) -> Vec<Trackable> {
        match kind {
            TrackableKind::Plane => self.world.planes.iter().cloned().map(Trackable::Plane).collect(),
            TrackableKind::Point => self.world.points.iter().cloned().map(Trackable::Point).collect(),
        }
    }
}

/// Hands out [`SimSession`]s, optionally failing first
#[derive(Debug)]
pub struct SimSessionFactory {
    world: SimWorld,
    failures: VecDeque<SessionError>,
    created: usize,
}

impl SimSessionFactory {
    /// Factory for sessions over `world`
    pub fn new(world: SimWorld) -> Self {
        Self {
            world,
            failures: VecDeque::new(),
            created: 0,
        }
    }

    /// Fail the next `create()` with `err`
    pub fn fail_next(&mut self, err: SessionError) {
        self.failures.push_back(err);
    }

    /// Sessions successfully created so far
    pub fn created(&self) -> usize {
        self.created
    }
}

impl SessionFactory for SimSessionFactory {
    type Session = SimSession;

    fn create(&mut self) -> Result<SimSession, SessionError> {
        if let Some(err) = self.failures.pop_front() {
            return Err(err);
        }
        self.created += 1;
        Ok(SimSession::new(self.world.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_center_tap_hits_floor_center() {
        let world = SimWorld::floor_scene();
        let hits = world.cast(Vec2::new(240.0, 480.0), Viewport::new(480, 960));
        assert_eq!(hits.len(), 1);
        let position = hits[0].position();
        assert!(position.abs_diff_eq(Vec3::new(0.0, 0.0, -1.5), 1e-4), "{position:?}");
        assert_abs_diff_eq!(hits[0].distance, 1.5 * std::f32::consts::SQRT_2, epsilon = 1e-4);
    }

    #[test]
    fn test_screen_scaled_to_image() {
        let world = SimWorld::floor_scene();
        let hits = world.cast(Vec2::new(540.0, 1080.0), Viewport::new(1080, 2160));
        assert!(hits[0].position().abs_diff_eq(Vec3::new(0.0, 0.0, -1.5), 1e-4));
    }

    #[test]
    fn test_no_hits_while_paused() {
        let mut world = SimWorld::floor_scene();
        world.set_tracking(TrackingState::Paused, TrackingFailureReason::InsufficientLight);
        assert!(world.cast(Vec2::new(240.0, 480.0), Viewport::default()).is_empty());
    }

    #[test]
    fn test_update_requires_resume() {
        let mut session = SimSession::with_floor();
        assert_eq!(session.update().err(), Some(SessionError::NotReady));
        session.resume().unwrap();
        let frame = session.update().unwrap();
        assert_eq!(frame.timestamp(), FRAME_INTERVAL_NS);
    }

    #[test]
    fn test_detach_unknown_anchor_fails() {
        let mut session = SimSession::with_floor();
        let anchor = session.create_anchor(&Pose::IDENTITY).unwrap();
        session.detach_anchor(anchor).unwrap();

        let err = session.detach_anchor(anchor).unwrap_err();
        assert_eq!(err, SessionError::UnknownAnchor(anchor.to_string()));
        assert_eq!(session.live_anchor_count(), 0);
    }

    #[test]
    fn test_point_cloud_release_recorded() {
        let mut session = SimSession::with_floor();
        session.resume().unwrap();
        let frame = session.update().unwrap();
        let cloud = frame.acquire_point_cloud().unwrap();
        assert_eq!(session.outstanding_point_clouds(), 1);
        drop(cloud);
        assert_eq!(session.outstanding_point_clouds(), 0);
    }

    #[test]
    fn test_world_json_defaults() {
        let world: SimWorld = serde_json::from_str(
            r#"{
                "camera": {
                    "pose": { "translation": [0.0, 1.5, 0.0], "rotation": [0.0, 0.0, 0.0, 1.0] },
                    "display_oriented_pose": { "translation": [0.0, 1.5, 0.0], "rotation": [0.0, 0.0, 0.0, 1.0] },
                    "tracking_state": "paused",
                    "intrinsics": {
                        "focal_length": [500.0, 500.0],
                        "principal_point": [240.0, 480.0],
                        "image_size": [480, 960]
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(world.camera.tracking_state, TrackingState::Paused);
        assert_eq!(world.camera.tracking_failure_reason, TrackingFailureReason::None);
        assert!(world.planes.is_empty());
        assert_eq!(world.light, LightEstimate::default());
    }
}
