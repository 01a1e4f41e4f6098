//! Per-tick tracking classification and the display reactions to it

use crate::session::{Camera, TrackingFailureReason};
use crate::trackable::TrackingState;

/// Shown while tracking but before any plane has been found
pub const SEARCHING_FOR_SURFACES: &str = "Searching for surfaces...";

/// What the pipeline does this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingStatus {
    /// Full draw pipeline
    Tracking,
    /// Background only
    Paused,
}

impl From<TrackingState> for TrackingStatus {
    fn from(state: TrackingState) -> Self {
        match state {
            TrackingState::Tracking => TrackingStatus::Tracking,
            TrackingState::Paused | TrackingState::Stopped => TrackingStatus::Paused,
        }
    }
}

/// Classify the camera's tracking state; no memory of earlier ticks
pub fn classify(camera: &Camera) -> TrackingStatus {
    camera.tracking_state.into()
}

/// User-facing explanation for a tracking failure
pub fn failure_reason_message(reason: TrackingFailureReason) -> Option<&'static str> {
    match reason {
        TrackingFailureReason::None => None,
        TrackingFailureReason::BadState => {
            Some("Tracking lost due to bad internal state. Please try restarting the AR experience.")
        }
        TrackingFailureReason::InsufficientLight => Some("Too dark. Try moving to a well-lit area."),
        TrackingFailureReason::ExcessiveMotion => Some("Moving too fast. Slow down."),
        TrackingFailureReason::InsufficientFeatures => {
            Some("Can't find anything. Aim device at a surface with more texture or color.")
        }
        TrackingFailureReason::CameraUnavailable => {
            Some("Another app is using the camera. Tap on this app or try closing the other one.")
        }
    }
}

/// The window system side of the app: screen lock and a single message line.
///
/// Calls are fire-and-forget; nothing reported here feeds back into the
/// pipeline.
pub trait DisplayHost {
    /// Keep the screen from locking while `true`
    fn set_keep_screen_on(&mut self, keep_on: bool);

    /// Replace the persistent status message
    fn show_message(&mut self, message: &str);

    /// Remove the persistent status message
    fn hide_message(&mut self);

    /// One-off notice, e.g. a session that failed to start
    fn notify(&mut self, message: &str);
}

/// Reacts to tracking changes without adding any state of its own to the
/// classification. The remembered values only avoid repeating host calls.
#[derive(Debug, Default)]
pub struct TrackingMonitor {
    last_state: Option<TrackingState>,
    message: Option<&'static str>,
}

impl TrackingMonitor {
    /// Fresh monitor; the first observation always reaches the host
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify this tick's camera and update screen lock and failure message
    pub fn observe<H: DisplayHost + ?Sized>(&mut self, camera: &Camera, host: &mut H) -> TrackingStatus {
        let state = camera.tracking_state;
        if self.last_state != Some(state) {
            log::info!("Camera tracking state {:?} -> {:?}", self.last_state, state);
            host.set_keep_screen_on(state == TrackingState::Tracking);
            self.last_state = Some(state);
        }

        let status = classify(camera);
        if status == TrackingStatus::Paused {
            self.set_message(failure_reason_message(camera.tracking_failure_reason), host);
        }
        status
    }

    /// While tracking, prompt the user until some plane is tracked
    pub fn observe_planes<H: DisplayHost + ?Sized>(&mut self, has_tracking_plane: bool, host: &mut H) {
        let wanted = if has_tracking_plane {
            None
        } else {
            Some(SEARCHING_FOR_SURFACES)
        };
        self.set_message(wanted, host);
    }

    /// Message currently on screen
    pub fn message(&self) -> Option<&'static str> {
        self.message
    }

    /// Forget everything; the next observation reaches the host again
    pub fn reset(&mut self) {
        self.last_state = None;
        self.message = None;
    }

    fn set_message<H: DisplayHost + ?Sized>(&mut self, wanted: Option<&'static str>, host: &mut H) {
        if self.message == wanted {
            return;
        }
        match wanted {
            Some(message) => host.show_message(message),
            None => host.hide_message(),
        }
        self.message = wanted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Pose;
    use crate::session::CameraIntrinsics;
    use crate::sim::{HostEvent, RecordingHost};

    fn camera(state: TrackingState, reason: TrackingFailureReason) -> Camera {
        Camera {
            pose: Pose::IDENTITY,
            display_oriented_pose: Pose::IDENTITY,
            tracking_state: state,
            tracking_failure_reason: reason,
            intrinsics: CameraIntrinsics::from_fov(1.0, 480, 640),
        }
    }

    #[test]
    fn test_stopped_counts_as_paused() {
        let camera = camera(TrackingState::Stopped, TrackingFailureReason::None);
        assert_eq!(classify(&camera), TrackingStatus::Paused);
    }

    #[test]
    fn test_keep_screen_on_only_on_change() {
        let mut monitor = TrackingMonitor::new();
        let mut host = RecordingHost::default();
        let tracking = camera(TrackingState::Tracking, TrackingFailureReason::None);
        let paused = camera(TrackingState::Paused, TrackingFailureReason::ExcessiveMotion);

        monitor.observe(&tracking, &mut host);
        monitor.observe(&tracking, &mut host);
        monitor.observe(&paused, &mut host);
        monitor.observe(&paused, &mut host);

        let screen: Vec<_> = host
            .events()
            .iter()
            .filter_map(|e| match e {
                HostEvent::KeepScreenOn(on) => Some(*on),
                _ => None,
            })
            .collect();
        assert_eq!(screen, vec![true, false]);
        assert_eq!(monitor.message(), Some("Moving too fast. Slow down."));
    }

    #[test]
    fn test_plane_prompt_shown_then_hidden() {
        let mut monitor = TrackingMonitor::new();
        let mut host = RecordingHost::default();

        monitor.observe_planes(false, &mut host);
        monitor.observe_planes(false, &mut host);
        monitor.observe_planes(true, &mut host);

        assert_eq!(
            host.events(),
            &[
                HostEvent::ShowMessage(SEARCHING_FOR_SURFACES.to_string()),
                HostEvent::HideMessage,
            ]
        );
    }
}
