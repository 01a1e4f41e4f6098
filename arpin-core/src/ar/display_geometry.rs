//! Forwards viewport and rotation changes to the tracking session

use crate::primitives::Viewport;
use crate::session::{DisplayRotation, TrackingSession};

/// Remembers the surface geometry and pushes it to the session once per change
#[derive(Debug, Default)]
pub struct DisplayGeometry {
    viewport: Viewport,
    rotation: DisplayRotation,
    changed: bool,
}

impl DisplayGeometry {
    /// Nothing known yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface was resized
    pub fn on_surface_changed(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
        self.changed = true;
    }

    /// Display was rotated
    pub fn set_rotation(&mut self, rotation: DisplayRotation) {
        if rotation != self.rotation {
            self.rotation = rotation;
            self.changed = true;
        }
    }

    /// Mark dirty so the next tick re-sends the geometry, e.g. after a new session
    pub fn invalidate(&mut self) {
        self.changed = true;
    }

    /// Send the geometry if it changed since the last call
    pub fn update_session_if_needed<S: TrackingSession>(&mut self, session: &mut S) {
        if !self.changed {
            return;
        }
        session.set_display_geometry(self.rotation, self.viewport.width, self.viewport.height);
        log::debug!(
            "Display geometry {}x{} {:?} (aspect {:.3})",
            self.viewport.width,
            self.viewport.height,
            self.rotation,
            self.viewport.aspect_ratio()
        );
        self.changed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SessionEvent, SimSession};

    #[test]
    fn test_geometry_sent_once_per_change() {
        let mut session = SimSession::with_floor();
        let mut display = DisplayGeometry::new();

        display.on_surface_changed(1080, 1920);
        display.update_session_if_needed(&mut session);
        display.update_session_if_needed(&mut session);
        display.set_rotation(DisplayRotation::Rotation90);
        display.set_rotation(DisplayRotation::Rotation90);
        display.update_session_if_needed(&mut session);

        let sent: Vec<_> = session
            .events()
            .into_iter()
            .filter(|e| matches!(e, SessionEvent::DisplayGeometry { .. }))
            .collect();
        assert_eq!(
            sent,
            vec![
                SessionEvent::DisplayGeometry {
                    rotation: DisplayRotation::Rotation0,
                    width: 1080,
                    height: 1920,
                },
                SessionEvent::DisplayGeometry {
                    rotation: DisplayRotation::Rotation90,
                    width: 1080,
                    height: 1920,
                },
            ]
        );
    }
}
