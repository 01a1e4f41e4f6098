//! Arpin - frame pipeline for tap-to-place augmented reality
//!
//! Each rendered frame drives an external tracking session, turns at most
//! one screen tap into an anchor on a detected surface, and draws the camera
//! image, point cloud, planes and anchored objects in a fixed order through
//! a pluggable [`three_d::RenderBackend`].

#![warn(missing_docs)]

pub mod ar;
pub mod config;
pub mod error;
pub mod pose;
pub mod primitives;
pub mod session;
pub mod sim;
pub mod three_d;
pub mod trackable;

pub use ar::{ObjectSlot, PlacementPipeline, TapEvent, TapQueue, TickOutcome};
pub use config::{load_config, save_config, ArConfig};
pub use error::{ConfigError, PipelineError, RenderError, Result, SessionError};
pub use pose::Pose;
pub use primitives::{Color, Viewport};
pub use session::{SessionFactory, TrackingFrame, TrackingSession};
pub use trackable::{HitResult, Plane, Point, Trackable, TrackingState};
