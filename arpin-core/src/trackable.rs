//! Real-world features reported by the tracking session

use crate::pose::{Axis, Pose};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tracking confidence reported for the camera, trackables and anchors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    /// Actively tracked; pose is current
    Tracking,
    /// Tracking temporarily lost; may resume
    Paused,
    /// Will never be tracked again
    Stopped,
}

/// Identifier the session assigns to a trackable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackableId(pub u64);

impl fmt::Display for TrackableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trackable#{}", self.0)
    }
}

/// Orientation of a detected plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaneType {
    /// Floor, table top
    HorizontalUpwardFacing,
    /// Ceiling
    HorizontalDownwardFacing,
    /// Wall
    Vertical,
}

/// A detected planar surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Session identifier
    pub id: TrackableId,
    /// Center of the plane; its local Y axis is the plane normal
    pub center_pose: Pose,
    /// Boundary polygon as (x, z) pairs in the center pose's frame
    pub polygon: Vec<Vec2>,
    /// Surface orientation
    pub plane_type: PlaneType,
    /// Current tracking state
    pub tracking_state: TrackingState,
    /// Set once another plane has absorbed this one
    #[serde(default)]
    pub subsumed_by: Option<TrackableId>,
}

impl Plane {
    /// Whether a pose's position projects inside the boundary polygon
    pub fn is_pose_in_polygon(&self, pose: &Pose) -> bool {
        let local = self.center_pose.inverse().transform_point(pose.translation);
        point_in_polygon(Vec2::new(local.x, local.z), &self.polygon)
    }

    /// Signed distance from the plane to `reference` along the plane normal
    pub fn distance_to(&self, reference: &Pose) -> f32 {
        calculate_distance_to_plane(&self.center_pose, reference)
    }
}

/// Signed distance from `reference` to the plane through `plane_pose`.
///
/// The plane normal is the pose's local Y axis; positive values mean the
/// reference sits on the side the normal points to, i.e. it faces the plane.
pub fn calculate_distance_to_plane(plane_pose: &Pose, reference: &Pose) -> f32 {
    let normal = plane_pose.transformed_axis(Axis::Y, 1.0);
    (reference.translation - plane_pose.translation).dot(normal)
}

/// Even-odd rule; points on an edge count as whatever the crossing test says.
fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// How a feature point's orientation was derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationMode {
    /// Orientation is the identity; no surface information
    InitializedToIdentity,
    /// Orientation follows a surface normal estimated around the point
    EstimatedSurfaceNormal,
}

/// A tracked feature point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Session identifier
    pub id: TrackableId,
    /// Point pose
    pub pose: Pose,
    /// Orientation origin
    pub orientation_mode: OrientationMode,
    /// Current tracking state
    pub tracking_state: TrackingState,
}

/// Discriminant for trackable enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackableKind {
    /// Planes
    Plane,
    /// Feature points
    Point,
}

/// Anything the tracking engine follows over time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trackable {
    /// A planar surface
    Plane(Plane),
    /// A single feature point
    Point(Point),
}

impl Trackable {
    /// Session identifier
    pub fn id(&self) -> TrackableId {
        match self {
            Trackable::Plane(plane) => plane.id,
            Trackable::Point(point) => point.id,
        }
    }

    /// Current tracking state
    pub fn tracking_state(&self) -> TrackingState {
        match self {
            Trackable::Plane(plane) => plane.tracking_state,
            Trackable::Point(point) => point.tracking_state,
        }
    }

    /// Variant tag
    pub fn kind(&self) -> TrackableKind {
        match self {
            Trackable::Plane(_) => TrackableKind::Plane,
            Trackable::Point(_) => TrackableKind::Point,
        }
    }
}

/// One intersection of a hit-test ray with a trackable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitResult {
    /// Intersection pose; for plane hits its Y axis is the plane normal
    pub hit_pose: Pose,
    /// Distance from the camera along the ray
    pub distance: f32,
    /// What was hit
    pub trackable: Trackable,
}

impl HitResult {
    /// World position of the hit
    pub fn position(&self) -> Vec3 {
        self.hit_pose.translation
    }
}
