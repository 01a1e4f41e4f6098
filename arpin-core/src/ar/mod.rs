//! Tap-to-place AR: input, hit selection, anchors and the per-tick pipeline
//!
//! Taps arrive on the input thread through [`TapQueue`]; everything else
//! runs on the render thread inside [`PlacementPipeline::on_draw_frame`].

pub mod anchor_manager;
pub mod display_geometry;
pub mod gesture_recognition;
pub mod hit_resolver;
pub mod object_slot;
pub mod pipeline;
pub mod tap_queue;
pub mod tracking_monitor;

pub use anchor_manager::{AnchorManager, PlaneAttachment};
pub use display_geometry::DisplayGeometry;
pub use gesture_recognition::{TapDetector, TouchPhase};
pub use hit_resolver::{HitResolver, PlacementRequest};
pub use object_slot::ObjectSlot;
pub use pipeline::{FrameReport, PlacementPipeline, TickOutcome};
pub use tap_queue::{TapEvent, TapQueue, TapSender};
pub use tracking_monitor::{DisplayHost, TrackingMonitor, TrackingStatus, SEARCHING_FOR_SURFACES};
