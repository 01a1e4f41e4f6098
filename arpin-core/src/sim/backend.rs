//! Recording render backend and display host

use crate::ar::{DisplayHost, ObjectSlot};
use crate::config::ModelAsset;
use crate::error::RenderError;
use crate::pose::Pose;
use crate::primitives::Color;
use crate::session::{PointCloud, TextureId};
use crate::three_d::{ModelHandle, ObjectDraw, ObjectUniforms, RenderBackend};
use crate::trackable::{Plane, TrackableId};
use glam::Mat4;
use rustc_hash::FxHashSet;

/// One call into [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    /// Camera texture created
    CreateCameraTexture(TextureId),
    /// Model loaded for a slot
    LoadModel(ObjectSlot),
    /// Color and depth cleared
    Clear(Color),
    /// Camera image drawn
    Background {
        /// Texture drawn
        texture: TextureId,
        /// Frame timestamp
        timestamp: i64,
    },
    /// Point buffer replaced
    UploadPointCloud {
        /// Cloud timestamp
        timestamp: i64,
        /// Number of points
        points: usize,
    },
    /// Points drawn
    PointCloud,
    /// Planes drawn, in the order given
    Planes(Vec<TrackableId>),
    /// Object drawn
    Object {
        /// Slot
        slot: ObjectSlot,
        /// Model matrix used
        model_matrix: Mat4,
        /// Shader inputs handed over with the draw
        uniforms: ObjectUniforms,
    },
}

impl DrawCall {
    /// Whether this call draws tracked 3-D content rather than the camera feed
    pub fn is_scene_content(&self) -> bool {
        matches!(
            self,
            DrawCall::UploadPointCloud { .. } | DrawCall::PointCloud | DrawCall::Planes(_) | DrawCall::Object { .. }
        )
    }
}

/// [`RenderBackend`] that records every call instead of drawing.
///
/// Model loads, point cloud draws and plane draws can be made to fail for
/// error path tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<DrawCall>,
    next_id: u32,
    failing_models: FxHashSet<ObjectSlot>,
    fail_next_point_cloud: bool,
    fail_next_planes: bool,
}

impl RecordingBackend {
    /// Calls so far
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Drain the recorded calls
    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    /// Number of recorded calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&DrawCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    /// Uniform blocks of the object draws so far, in order
    pub fn object_uniforms(&self) -> Vec<(ObjectSlot, ObjectUniforms)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Object { slot, uniforms, .. } => Some((*slot, *uniforms)),
                _ => None,
            })
            .collect()
    }

    /// Slots drawn so far, in order
    pub fn objects(&self) -> Vec<ObjectSlot> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Object { slot, .. } => Some(*slot),
                _ => None,
            })
            .collect()
    }

    /// Make loading `slot`'s model fail
    pub fn fail_model(&mut self, slot: ObjectSlot) {
        self.failing_models.insert(slot);
    }

    /// Make the next point cloud draw fail
    pub fn fail_next_point_cloud(&mut self) {
        self.fail_next_point_cloud = true;
    }

    /// Make the next plane draw fail
    pub fn fail_next_planes(&mut self) {
        self.fail_next_planes = true;
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl RenderBackend for RecordingBackend {
    fn create_camera_texture(&mut self) -> Result<TextureId, RenderError> {
        let texture = TextureId(self.next_id());
        self.calls.push(DrawCall::CreateCameraTexture(texture));
        Ok(texture)
    }

    fn load_model(&mut self, slot: ObjectSlot, asset: &ModelAsset) -> Result<ModelHandle, RenderError> {
        if self.failing_models.contains(&slot) {
            return Err(RenderError::AssetLoad {
                path: asset.obj.clone(),
                reason: "file not found".to_string(),
            });
        }
        self.calls.push(DrawCall::LoadModel(slot));
        Ok(ModelHandle(self.next_id()))
    }

    fn clear(&mut self, color: Color) {
        self.calls.push(DrawCall::Clear(color));
    }

    fn draw_background(&mut self, texture: TextureId, timestamp: i64) -> Result<(), RenderError> {
        self.calls.push(DrawCall::Background { texture, timestamp });
        Ok(())
    }

    fn upload_point_cloud(&mut self, cloud: &PointCloud) -> Result<(), RenderError> {
        self.calls.push(DrawCall::UploadPointCloud {
            timestamp: cloud.timestamp(),
            points: cloud.points().len(),
        });
        Ok(())
    }

    fn draw_point_cloud(&mut self, _view: &Mat4, _projection: &Mat4) -> Result<(), RenderError> {
        if std::mem::take(&mut self.fail_next_point_cloud) {
            return Err(RenderError::Backend("point shader failed".to_string()));
        }
        self.calls.push(DrawCall::PointCloud);
        Ok(())
    }

    fn draw_planes(&mut self, planes: &[Plane], _camera_pose: &Pose, _projection: &Mat4) -> Result<(), RenderError> {
        if std::mem::take(&mut self.fail_next_planes) {
            return Err(RenderError::Backend("plane shader failed".to_string()));
        }
        self.calls.push(DrawCall::Planes(planes.iter().map(|plane| plane.id).collect()));
        Ok(())
    }

    fn draw_object(&mut self, draw: &ObjectDraw) -> Result<(), RenderError> {
        self.calls.push(DrawCall::Object {
            slot: draw.slot,
            model_matrix: draw.model_matrix,
            uniforms: draw.uniforms,
        });
        Ok(())
    }
}

/// One call into [`RecordingHost`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Screen lock toggled
    KeepScreenOn(bool),
    /// Status message shown
    ShowMessage(String),
    /// Status message removed
    HideMessage,
    /// One-off notice
    Notify(String),
}

/// [`DisplayHost`] that records every call
#[derive(Debug, Default)]
pub struct RecordingHost {
    events: Vec<HostEvent>,
}

impl RecordingHost {
    /// Calls so far
    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    /// Drain the recorded calls
    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }
}

impl DisplayHost for RecordingHost {
    fn set_keep_screen_on(&mut self, keep_on: bool) {
        self.events.push(HostEvent::KeepScreenOn(keep_on));
    }

    fn show_message(&mut self, message: &str) {
        self.events.push(HostEvent::ShowMessage(message.to_string()));
    }

    fn hide_message(&mut self) {
        self.events.push(HostEvent::HideMessage);
    }

    fn notify(&mut self, message: &str) {
        self.events.push(HostEvent::Notify(message.to_string()));
    }
}
