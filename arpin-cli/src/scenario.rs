//! Scripted replay scenarios

use anyhow::{Context, Result};
use arpin_core::pose::Pose;
use arpin_core::session::{DisplayRotation, TrackingFailureReason};
use arpin_core::sim::SimWorld;
use arpin_core::trackable::{HitResult, Plane, Point, TrackingState};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A starting world and the changes applied before each tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Surface size in pixels
    #[serde(default = "default_screen")]
    pub screen: [u32; 2],

    /// World at the first tick
    #[serde(default = "SimWorld::floor_scene")]
    pub world: SimWorld,

    /// One entry per tick
    pub ticks: Vec<ScenarioTick>,
}

/// Changes applied right before one tick runs. Unset fields keep their
/// previous value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioTick {
    /// Camera tracking state
    #[serde(default)]
    pub tracking: Option<TrackingState>,

    /// Why tracking is lost
    #[serde(default)]
    pub failure_reason: Option<TrackingFailureReason>,

    /// New camera pose; also used as the display-oriented pose
    #[serde(default)]
    pub camera_pose: Option<Pose>,

    /// Replace the detected planes
    #[serde(default)]
    pub planes: Option<Vec<Plane>>,

    /// Replace the feature points
    #[serde(default)]
    pub points: Option<Vec<Point>>,

    /// Replace the scripted hit results; an empty list re-enables ray casting
    #[serde(default)]
    pub hits: Option<Vec<HitResult>>,

    /// Bump the point cloud timestamp so it is uploaded again
    #[serde(default)]
    pub new_point_cloud: bool,

    /// Rotate the display
    #[serde(default)]
    pub rotation: Option<DisplayRotation>,

    /// Tap offered before the tick
    #[serde(default)]
    pub tap: Option<Vec2>,
}

fn default_screen() -> [u32; 2] {
    [480, 960]
}

impl Scenario {
    /// Read a scenario from JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid scenario {}", path.display()))
    }

    /// Parse a scenario from a JSON string
    pub fn parse(content: &str) -> Result<Self> {
        let scenario: Scenario = serde_json::from_str(content)?;
        Ok(scenario)
    }
}

impl ScenarioTick {
    /// Apply the world edits of this tick
    pub fn apply(&self, world: &mut SimWorld) {
        if let Some(state) = self.tracking {
            world.camera.tracking_state = state;
            if state == TrackingState::Tracking {
                world.camera.tracking_failure_reason = TrackingFailureReason::None;
            }
        }
        if let Some(reason) = self.failure_reason {
            world.camera.tracking_failure_reason = reason;
        }
        if let Some(pose) = self.camera_pose {
            world.camera.pose = pose;
            world.camera.display_oriented_pose = pose;
        }
        if let Some(planes) = &self.planes {
            world.planes = planes.clone();
        }
        if let Some(points) = &self.points {
            world.points = points.clone();
        }
        if let Some(hits) = &self.hits {
            world.hits = hits.clone();
        }
        if self.new_point_cloud {
            world.point_cloud.timestamp += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAP_ON_PLANE: &str = include_str!("../scenarios/tap_on_plane.json");

    #[test]
    fn test_bundled_scenario_parses() {
        let scenario = Scenario::parse(TAP_ON_PLANE).unwrap();
        assert_eq!(scenario.screen, [480, 960]);
        assert_eq!(scenario.world, SimWorld::floor_scene());
        assert_eq!(scenario.ticks[1].tap, Some(Vec2::new(240.0, 480.0)));
    }

    #[test]
    fn test_tick_edits_world() {
        let mut world = SimWorld::floor_scene();
        let tick = ScenarioTick {
            tracking: Some(TrackingState::Paused),
            failure_reason: Some(TrackingFailureReason::InsufficientLight),
            new_point_cloud: true,
            ..ScenarioTick::default()
        };
        tick.apply(&mut world);
        assert_eq!(world.camera.tracking_state, TrackingState::Paused);
        assert_eq!(world.camera.tracking_failure_reason, TrackingFailureReason::InsufficientLight);
        assert_eq!(world.point_cloud.timestamp, 2);

        ScenarioTick {
            tracking: Some(TrackingState::Tracking),
            ..ScenarioTick::default()
        }
        .apply(&mut world);
        assert_eq!(world.camera.tracking_failure_reason, TrackingFailureReason::None);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let err = Scenario::load(&path).unwrap_err();
        assert!(err.to_string().contains("nope.json"));
    }
}
