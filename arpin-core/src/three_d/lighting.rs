//! Ambient lighting derived from the camera image

use crate::session::{LightEstimate, LightEstimateState};
use glam::Vec4;

/// Color correction used when the engine has no estimate: leave colors as-is
pub const NEUTRAL_LIGHT: Vec4 = Vec4::ONE;

/// RGB color correction plus average pixel intensity, as one vector.
///
/// The object shader multiplies lit color by `xyz` and scales by `w`.
pub fn light_intensity(estimate: &LightEstimate) -> Vec4 {
    match estimate.state {
        LightEstimateState::Valid => estimate.color_correction.extend(estimate.pixel_intensity),
        LightEstimateState::NotValid => NEUTRAL_LIGHT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_valid_estimate_packs_intensity_last() {
        let estimate = LightEstimate {
            state: LightEstimateState::Valid,
            color_correction: Vec3::new(0.9, 1.0, 1.1),
            pixel_intensity: 0.45,
        };
        assert_eq!(light_intensity(&estimate), Vec4::new(0.9, 1.0, 1.1, 0.45));
    }

    #[test]
    fn test_invalid_estimate_is_neutral() {
        let estimate = LightEstimate {
            state: LightEstimateState::NotValid,
            color_correction: Vec3::ZERO,
            pixel_intensity: 0.0,
        };
        assert_eq!(light_intensity(&estimate), NEUTRAL_LIGHT);
    }
}
