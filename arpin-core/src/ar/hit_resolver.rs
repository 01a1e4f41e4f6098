//! Turns a queued tap into at most one placement on a detected surface

use crate::ar::object_slot::ObjectSlot;
use crate::ar::tap_queue::TapEvent;
use crate::session::{Camera, TrackingFrame};
use crate::trackable::{calculate_distance_to_plane, HitResult, OrientationMode, Trackable, TrackingState};

/// An accepted hit and the slot it should be anchored to
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRequest {
    /// Slot to (re)attach
    pub slot: ObjectSlot,
    /// The winning hit
    pub hit: HitResult,
}

/// Picks the hit a tap lands on.
///
/// Every tap always targets the same slot. Routing taps to other slots
/// would need an object picker, which does not exist yet.
#[derive(Debug, Clone)]
pub struct HitResolver {
    target_slot: ObjectSlot,
}

impl HitResolver {
    /// Resolver that places `target_slot`
    pub fn new(target_slot: ObjectSlot) -> Self {
        Self { target_slot }
    }

    /// Slot accepted hits are routed to
    pub fn target_slot(&self) -> ObjectSlot {
        self.target_slot
    }

    /// Ray cast the tap and pick the first acceptable hit.
    ///
    /// The tap is consumed either way; when the camera is not tracking it
    /// is simply lost and no hit test runs.
    pub fn resolve<F: TrackingFrame>(&self, frame: &F, tap: Option<TapEvent>) -> Option<PlacementRequest> {
        let tap = tap?;
        let camera = frame.camera();
        if camera.tracking_state != TrackingState::Tracking {
            log::debug!("Tap at {:?} discarded, camera is {:?}", tap.position, camera.tracking_state);
            return None;
        }

        let hit = select_hit(frame.hit_test(tap.position), camera)?;
        log::debug!(
            "Tap at {:?} hit {} at {:?}",
            tap.position,
            hit.trackable.id(),
            hit.position()
        );
        Some(PlacementRequest {
            slot: self.target_slot,
            hit,
        })
    }
}

/// First hit, in ray order, that can carry an anchor
pub fn select_hit(hits: impl IntoIterator<Item = HitResult>, camera: &Camera) -> Option<HitResult> {
    hits.into_iter().find(|hit| is_acceptable(hit, camera))
}

/// Plane hits must land inside the polygon on the side facing the camera;
/// point hits need an estimated surface normal.
pub fn is_acceptable(hit: &HitResult, camera: &Camera) -> bool {
    match &hit.trackable {
        Trackable::Plane(plane) => {
            plane.is_pose_in_polygon(&hit.hit_pose)
                && calculate_distance_to_plane(&hit.hit_pose, &camera.pose) > 0.0
        }
        Trackable::Point(point) => point.orientation_mode == OrientationMode::EstimatedSurfaceNormal,
    }
}
