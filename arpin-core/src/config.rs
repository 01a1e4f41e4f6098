//! Configuration for the placement pipeline

use crate::ar::ObjectSlot;
use crate::error::ConfigError;
use crate::primitives::Color;
use crate::three_d::MaterialProperties;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArConfig {
    /// Clip planes and clear color
    #[serde(default)]
    pub render: RenderConfig,

    /// Per-slot model settings
    #[serde(default)]
    pub objects: ObjectsConfig,

    /// Tap routing
    #[serde(default)]
    pub placement: PlacementConfig,

    /// Tap recognition thresholds
    #[serde(default)]
    pub gestures: GestureConfig,
}

/// Frame-level render settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Near clip plane in meters
    #[serde(default = "default_near_clip")]
    pub near_clip: f32,

    /// Far clip plane in meters
    #[serde(default = "default_far_clip")]
    pub far_clip: f32,

    /// Color the frame is cleared to before the camera image
    #[serde(default = "default_clear_color")]
    pub clear_color: Color,
}

/// One entry per slot; the slot set itself is not configurable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectsConfig {
    #[serde(default = "default_viking")]
    #[allow(missing_docs)]
    pub viking: ObjectConfig,

    #[serde(default = "default_cannon")]
    #[allow(missing_docs)]
    pub cannon: ObjectConfig,

    #[serde(default = "default_target")]
    #[allow(missing_docs)]
    pub target: ObjectConfig,
}

/// How one slot is drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectConfig {
    /// Mesh and texture
    pub model: ModelAsset,

    /// Uniform scale applied on top of the anchor pose
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f32,

    /// Shader coefficients
    #[serde(default)]
    pub material: MaterialProperties,
}

/// Mesh and texture paths handed to the render backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAsset {
    /// Wavefront OBJ mesh
    pub obj: PathBuf,
    /// Diffuse texture
    pub texture: PathBuf,
}

/// Which slot taps place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Slot every accepted tap is attached to
    #[serde(default)]
    pub default_slot: ObjectSlot,
}

/// Tap recognition thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Movement in pixels beyond which a touch is a drag
    #[serde(default = "default_touch_slop")]
    pub touch_slop_px: f32,

    /// Touches held longer than this are not taps
    #[serde(default = "default_long_press_ms")]
    pub long_press_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            near_clip: default_near_clip(),
            far_clip: default_far_clip(),
            clear_color: default_clear_color(),
        }
    }
}

impl Default for ObjectsConfig {
    fn default() -> Self {
        Self {
            viking: default_viking(),
            cannon: default_cannon(),
            target: default_target(),
        }
    }
}

impl ObjectsConfig {
    /// Settings for one slot
    pub fn get(&self, slot: ObjectSlot) -> &ObjectConfig {
        match slot {
            ObjectSlot::Viking => &self.viking,
            ObjectSlot::Cannon => &self.cannon,
            ObjectSlot::Target => &self.target,
        }
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            default_slot: ObjectSlot::Viking,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            touch_slop_px: default_touch_slop(),
            long_press_ms: default_long_press_ms(),
        }
    }
}

impl ObjectConfig {
    fn for_model(name: &str) -> Self {
        Self {
            model: ModelAsset {
                obj: PathBuf::from(format!("models/{name}.obj")),
                texture: PathBuf::from(format!("models/{name}.png")),
            },
            scale_factor: default_scale_factor(),
            material: MaterialProperties::default(),
        }
    }
}

fn default_near_clip() -> f32 { 0.1 }
fn default_far_clip() -> f32 { 100.0 }
fn default_clear_color() -> Color { Color::CLEAR }
fn default_scale_factor() -> f32 { 1.0 }
fn default_viking() -> ObjectConfig { ObjectConfig::for_model("viking") }
fn default_cannon() -> ObjectConfig { ObjectConfig::for_model("cannon") }
fn default_target() -> ObjectConfig { ObjectConfig::for_model("target") }
fn default_touch_slop() -> f32 { 16.0 }
fn default_long_press_ms() -> u64 { 500 }

impl ArConfig {
    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let render = &self.render;
        if !(render.near_clip > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "near_clip must be positive, got {}",
                render.near_clip
            )));
        }
        if !(render.far_clip > render.near_clip) {
            return Err(ConfigError::Invalid(format!(
                "far_clip ({}) must exceed near_clip ({})",
                render.far_clip, render.near_clip
            )));
        }
        for slot in ObjectSlot::ALL {
            let scale = self.objects.get(slot).scale_factor;
            if !(scale > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "scale_factor for {slot} must be positive, got {scale}"
                )));
            }
        }
        if self.gestures.touch_slop_px < 0.0 {
            return Err(ConfigError::Invalid("touch_slop_px must not be negative".to_string()));
        }
        Ok(())
    }
}

/// Location of the per-user config file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".arpin").join("config.toml"))
}

/// Load configuration from file or use defaults
pub fn load_config(path: Option<&Path>) -> Result<ArConfig, ConfigError> {
    let config = if let Some(path) = path {
        read_config(path)?
    } else if let Some(default_path) = default_config_path().filter(|p| p.exists()) {
        read_config(&default_path)?
    } else {
        ArConfig::default()
    };
    config.validate()?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<ArConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: ArConfig = toml::from_str(&content)?;
    log::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &ArConfig, path: &Path) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_scene() {
        let config = ArConfig::default();
        assert_eq!(config.render.near_clip, 0.1);
        assert_eq!(config.render.far_clip, 100.0);
        assert_eq!(config.placement.default_slot, ObjectSlot::Viking);
        assert_eq!(config.objects.get(ObjectSlot::Cannon).material.diffuse, 3.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ArConfig = toml::from_str(
            r#"
            [render]
            far_clip = 30.0

            [objects.target]
            model = { obj = "assets/target.obj", texture = "assets/target.png" }
            scale_factor = 2.5

            [placement]
            default_slot = "cannon"
            "#,
        )
        .unwrap();

        assert_eq!(config.render.near_clip, 0.1);
        assert_eq!(config.render.far_clip, 30.0);
        assert_eq!(config.objects.target.scale_factor, 2.5);
        assert_eq!(config.objects.viking, ObjectConfig::for_model("viking"));
        assert_eq!(config.placement.default_slot, ObjectSlot::Cannon);
    }

    #[test]
    fn test_validate_rejects_inverted_clip_planes() {
        let mut config = ArConfig::default();
        config.render.far_clip = 0.05;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_scale() {
        let mut config = ArConfig::default();
        config.objects.cannon.scale_factor = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cannon"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ArConfig::default();
        config.gestures.long_press_ms = 750;
        config.objects.viking.scale_factor = 0.5;
        save_config(&config, &path).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }
}
