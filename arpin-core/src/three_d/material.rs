//! Lighting response of placed objects

use serde::{Deserialize, Serialize};

/// Phong-style coefficients for an object shader
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperties {
    /// Ambient term
    pub ambient: f32,
    /// Diffuse term
    pub diffuse: f32,
    /// Specular term
    pub specular: f32,
    /// Specular exponent
    pub specular_power: f32,
}

impl Default for MaterialProperties {
    fn default() -> Self {
        Self {
            ambient: 0.0,
            diffuse: 3.5,
            specular: 1.0,
            specular_power: 6.0,
        }
    }
}

impl MaterialProperties {
    /// Packed as (ambient, diffuse, specular, specular power)
    pub fn to_array(&self) -> [f32; 4] {
        [self.ambient, self.diffuse, self.specular, self.specular_power]
    }
}
