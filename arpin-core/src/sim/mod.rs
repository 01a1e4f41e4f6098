//! Headless stand-ins for the tracking engine, GPU and window system
//!
//! [`SimSession`] replays a scripted [`SimWorld`], [`RecordingBackend`] and
//! [`RecordingHost`] log every call. Together they drive the pipeline in
//! tests, benchmarks and the replay tool without a device.

mod backend;
mod session;

pub use backend::{DrawCall, HostEvent, RecordingBackend, RecordingHost};
pub use session::{SessionEvent, SimFrame, SimPointCloud, SimSession, SimSessionFactory, SimWorld, FRAME_INTERVAL_NS};
