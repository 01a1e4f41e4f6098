//! Single-tap recognition from raw touch events

use crate::ar::tap_queue::TapEvent;
use crate::config::GestureConfig;
use glam::Vec2;
use std::time::Duration;
use web_time::Instant;

/// Touch phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    /// Finger down
    Began,
    /// Finger moved
    Moved,
    /// Finger up
    Ended,
    /// System took the touch away
    Cancelled,
}

/// Touch point data
#[derive(Debug, Clone)]
struct TouchPoint {
    id: u32,
    start: Vec2,
    started_at: Instant,
    max_travel: f32,
}

/// Turns touch streams into single taps.
///
/// A tap is a lone finger that lifts within the long-press timeout and never
/// strays further than the touch slop from where it landed. Any gesture that
/// had a second finger down at some point is not a tap.
pub struct TapDetector {
    /// Active touch points
    touch_points: Vec<TouchPoint>,
    /// Set when a second finger joins the current gesture
    multi_touch: bool,
    touch_slop: f32,
    long_press: Duration,
}

impl TapDetector {
    /// Create a detector with the given thresholds
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            touch_points: Vec::new(),
            multi_touch: false,
            touch_slop: config.touch_slop_px,
            long_press: Duration::from_millis(config.long_press_ms),
        }
    }

    /// Feed one touch event; returns a tap when this event completes one
    pub fn handle_touch(&mut self, id: u32, phase: TouchPhase, position: Vec2, at: Instant) -> Option<TapEvent> {
        match phase {
            TouchPhase::Began => {
                self.touch_down(id, position, at);
                None
            }
            TouchPhase::Moved => {
                self.touch_move(id, position);
                None
            }
            TouchPhase::Ended => self.touch_up(id, position, at),
            TouchPhase::Cancelled => {
                self.touch_points.retain(|t| t.id != id);
                self.multi_touch = !self.touch_points.is_empty();
                None
            }
        }
    }

    fn touch_down(&mut self, id: u32, position: Vec2, at: Instant) {
        self.touch_points.retain(|t| t.id != id);
        if !self.touch_points.is_empty() {
            self.multi_touch = true;
        }
        self.touch_points.push(TouchPoint {
            id,
            start: position,
            started_at: at,
            max_travel: 0.0,
        });
    }

    fn touch_move(&mut self, id: u32, position: Vec2) {
        if let Some(touch) = self.touch_points.iter_mut().find(|t| t.id == id) {
            touch.max_travel = touch.max_travel.max(position.distance(touch.start));
        }
    }

    fn touch_up(&mut self, id: u32, position: Vec2, at: Instant) -> Option<TapEvent> {
        let index = self.touch_points.iter().position(|t| t.id == id)?;
        let mut touch = self.touch_points.remove(index);
        touch.max_travel = touch.max_travel.max(position.distance(touch.start));

        let was_multi_touch = self.multi_touch;
        if self.touch_points.is_empty() {
            self.multi_touch = false;
        }

        if was_multi_touch {
            return None;
        }
        if touch.max_travel > self.touch_slop {
            return None;
        }
        if at.duration_since(touch.started_at) >= self.long_press {
            return None;
        }

        Some(TapEvent {
            position,
            timestamp: at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> TapDetector {
        TapDetector::new(&GestureConfig {
            touch_slop_px: 16.0,
            long_press_ms: 500,
        })
    }

    #[test]
    fn test_quick_release_is_tap() {
        let mut detector = detector();
        let t0 = Instant::now();
        let p = Vec2::new(240.0, 480.0);

        assert!(detector.handle_touch(0, TouchPhase::Began, p, t0).is_none());
        let tap = detector
            .handle_touch(0, TouchPhase::Ended, p + Vec2::new(3.0, 0.0), t0 + Duration::from_millis(90))
            .expect("tap");
        assert_eq!(tap.position, Vec2::new(243.0, 480.0));
    }

    #[test]
    fn test_drag_beyond_slop_is_not_tap() {
        let mut detector = detector();
        let t0 = Instant::now();
        detector.handle_touch(0, TouchPhase::Began, Vec2::ZERO, t0);
        detector.handle_touch(0, TouchPhase::Moved, Vec2::new(40.0, 0.0), t0);
        // finger came back, but it already travelled too far
        let tap = detector.handle_touch(0, TouchPhase::Ended, Vec2::ZERO, t0 + Duration::from_millis(50));
        assert!(tap.is_none());
    }

    #[test]
    fn test_long_press_is_not_tap() {
        let mut detector = detector();
        let t0 = Instant::now();
        detector.handle_touch(0, TouchPhase::Began, Vec2::ZERO, t0);
        let tap = detector.handle_touch(0, TouchPhase::Ended, Vec2::ZERO, t0 + Duration::from_millis(600));
        assert!(tap.is_none());
    }

    #[test]
    fn test_two_finger_gesture_is_not_tap() {
        let mut detector = detector();
        let t0 = Instant::now();
        detector.handle_touch(0, TouchPhase::Began, Vec2::ZERO, t0);
        detector.handle_touch(1, TouchPhase::Began, Vec2::new(100.0, 0.0), t0);
        assert!(detector.handle_touch(1, TouchPhase::Ended, Vec2::new(100.0, 0.0), t0).is_none());
        assert!(detector.handle_touch(0, TouchPhase::Ended, Vec2::ZERO, t0).is_none());

        // the next single finger gesture taps again
        detector.handle_touch(2, TouchPhase::Began, Vec2::ZERO, t0);
        assert!(detector.handle_touch(2, TouchPhase::Ended, Vec2::ZERO, t0).is_some());
    }
}
