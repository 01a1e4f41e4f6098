//! Per-tick matrices and lighting shared by every draw stage

use crate::config::RenderConfig;
use crate::session::TrackingFrame;
use crate::three_d::camera::{projection_matrix, view_matrix};
use crate::three_d::lighting::light_intensity;
use glam::{Mat4, Vec4};

/// Everything the draw stages read for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMatrices {
    /// Camera projection
    pub projection: Mat4,
    /// World to camera
    pub view: Mat4,
    /// RGB color correction + pixel intensity
    pub light_intensity: Vec4,
}

/// Derives [`FrameMatrices`] from a frame. Holds only the clip planes; the
/// camera moves every tick so nothing is cached.
#[derive(Debug, Clone, Copy)]
pub struct FrameCompositor {
    near: f32,
    far: f32,
}

impl FrameCompositor {
    /// Compositor with explicit clip planes
    pub fn new(near: f32, far: f32) -> Self {
        Self { near, far }
    }

    /// Compositor using the configured clip planes
    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.near_clip, config.far_clip)
    }

    /// Projection, then view, then lighting
    pub fn compose<F: TrackingFrame>(&self, frame: &F) -> FrameMatrices {
        let camera = frame.camera();
        let projection = projection_matrix(camera, self.near, self.far);
        let view = view_matrix(camera);
        let light_intensity = light_intensity(&frame.light_estimate());
        FrameMatrices {
            projection,
            view,
            light_intensity,
        }
    }
}

impl Default for FrameCompositor {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{LightEstimate, LightEstimateState, TrackingSession};
    use crate::sim::SimSession;
    use crate::three_d::NEUTRAL_LIGHT;
    use glam::Vec3;

    #[test]
    fn test_compose_uses_clip_planes_and_light() {
        let mut session = SimSession::with_floor();
        session.world_mut().light = LightEstimate {
            state: LightEstimateState::Valid,
            color_correction: Vec3::new(1.2, 1.0, 0.8),
            pixel_intensity: 0.3,
        };
        session.resume().unwrap();
        let frame = session.update().unwrap();

        let matrices = FrameCompositor::new(0.5, 20.0).compose(&frame);
        let camera = frame.camera();
        assert_eq!(matrices.projection, projection_matrix(camera, 0.5, 20.0));
        assert_eq!(matrices.view, view_matrix(camera));
        assert_eq!(matrices.light_intensity, Vec4::new(1.2, 1.0, 0.8, 0.3));
    }

    #[test]
    fn test_default_uses_configured_clip_planes() {
        let mut session = SimSession::with_floor();
        session.resume().unwrap();
        let frame = session.update().unwrap();

        let matrices = FrameCompositor::default().compose(&frame);
        assert_eq!(matrices.projection, projection_matrix(frame.camera(), 0.1, 100.0));
        assert_eq!(matrices.light_intensity, NEUTRAL_LIGHT);
    }
}
