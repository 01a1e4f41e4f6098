//! One session anchor per object slot

use crate::ar::object_slot::ObjectSlot;
use crate::error::{PipelineError, Result};
use crate::pose::Pose;
use crate::session::{AnchorId, TrackingSession};
use crate::trackable::{HitResult, Trackable, TrackableId, TrackableKind, TrackingState};
use rustc_hash::FxHashMap;

/// Binds a session anchor to the surface it was placed on.
///
/// Pose and tracking status are refreshed from the session once per tick;
/// reads in between are plain field loads.
#[derive(Debug, PartialEq)]
pub struct PlaneAttachment {
    anchor: AnchorId,
    surface: TrackableId,
    surface_kind: TrackableKind,
    pose: Pose,
    tracking: bool,
}

impl PlaneAttachment {
    fn new(anchor: AnchorId, surface: &Trackable, pose: Pose) -> Self {
        Self {
            anchor,
            surface: surface.id(),
            surface_kind: surface.kind(),
            pose,
            tracking: false,
        }
    }

    /// Session anchor backing this attachment
    pub fn anchor_id(&self) -> AnchorId {
        self.anchor
    }

    /// Trackable the anchor was created on
    pub fn surface(&self) -> TrackableId {
        self.surface
    }

    /// Whether the surface is a plane or a feature point
    pub fn surface_kind(&self) -> TrackableKind {
        self.surface_kind
    }

    /// Pose as of the last refresh
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// True iff both the anchor and its surface were tracking at the last refresh
    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Re-read anchor and surface state from the session.
    ///
    /// Plane attachments sit at the plane's current height, so objects stay
    /// on the surface as the engine refines it.
    fn refresh<S: TrackingSession>(&mut self, session: &S) {
        let Some(anchor) = session.anchor(self.anchor) else {
            self.tracking = false;
            return;
        };
        let anchor_tracking = anchor.tracking_state == TrackingState::Tracking;

        match session.trackable(self.surface) {
            Some(Trackable::Plane(plane)) => {
                self.pose = anchor.pose.with_height(plane.center_pose.translation.y);
                self.tracking = anchor_tracking && plane.tracking_state == TrackingState::Tracking;
            }
            Some(Trackable::Point(point)) => {
                self.pose = anchor.pose;
                self.tracking = anchor_tracking && point.tracking_state == TrackingState::Tracking;
            }
            None => {
                self.pose = anchor.pose;
                self.tracking = false;
            }
        }
    }
}

/// Owns the per-slot attachments
#[derive(Debug, Default)]
pub struct AnchorManager {
    attachments: FxHashMap<ObjectSlot, PlaneAttachment>,
}

impl AnchorManager {
    /// No slot attached
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor `slot` at `hit`, replacing any previous attachment.
    ///
    /// The old anchor is detached before the new one is requested so the
    /// slot never holds two session anchors. If the session refuses the new
    /// anchor the slot ends up empty.
    pub fn attach<S: TrackingSession>(
        &mut self,
        session: &mut S,
        slot: ObjectSlot,
        hit: &HitResult,
    ) -> Result<&PlaneAttachment> {
        if let Some(previous) = self.attachments.remove(&slot) {
            log::debug!("Detaching {} from {}", previous.anchor, slot);
            if let Err(err) = session.detach_anchor(previous.anchor) {
                log::warn!("Previous anchor of {} already gone: {}", slot, err);
            }
        }

        let anchor = session.create_anchor(&hit.hit_pose).map_err(|source| {
            log::warn!("Could not anchor {} on {}: {}", slot, hit.trackable.id(), source);
            PipelineError::AnchorCreation { slot, source }
        })?;

        let mut attachment = PlaneAttachment::new(anchor, &hit.trackable, hit.hit_pose);
        attachment.refresh(session);
        log::info!("Placed {} on {} ({})", slot, hit.trackable.id(), anchor);

        Ok(self.attachments.entry(slot).or_insert(attachment))
    }

    /// Refresh every attachment from the session
    pub fn sync<S: TrackingSession>(&mut self, session: &S) {
        for attachment in self.attachments.values_mut() {
            attachment.refresh(session);
        }
    }

    /// The slot's attachment, if any
    pub fn attachment(&self, slot: ObjectSlot) -> Option<&PlaneAttachment> {
        self.attachments.get(&slot)
    }

    /// Pose of the slot's anchor, if attached
    pub fn current_pose(&self, slot: ObjectSlot) -> Option<Pose> {
        self.attachments.get(&slot).map(PlaneAttachment::pose)
    }

    /// Whether the slot is attached and currently tracking
    pub fn is_tracking(&self, slot: ObjectSlot) -> bool {
        self.attachments
            .get(&slot)
            .map_or(false, PlaneAttachment::is_tracking)
    }

    /// Number of attached slots
    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    /// Whether no slot is attached
    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    /// Forget every attachment; used when the session that owns the anchors goes away
    pub fn clear(&mut self) {
        self.attachments.clear();
    }
}
