//! Fixed-order scene drawing on top of a pluggable render backend

use crate::ar::ObjectSlot;
use crate::config::{ArConfig, ModelAsset, ObjectsConfig};
use crate::error::RenderError;
use crate::pose::Pose;
use crate::primitives::Color;
use crate::session::{PointCloud, TextureId};
use crate::three_d::compositor::FrameMatrices;
use crate::three_d::MaterialProperties;
use crate::trackable::{Plane, TrackingState};
use glam::{Mat4, Vec3};
use rustc_hash::FxHashMap;

/// Backend-assigned handle of a loaded model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelHandle(pub u32);

/// Uniform block for one object draw
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniforms {
    /// Model matrix (column-major)
    pub model: [[f32; 4]; 4],
    /// View × model
    pub model_view: [[f32; 4]; 4],
    /// Projection × view × model
    pub model_view_projection: [[f32; 4]; 4],
    /// RGB color correction and pixel intensity
    pub light_intensity: [f32; 4],
    /// Ambient, diffuse, specular, specular power
    pub material: [f32; 4],
}

impl ObjectUniforms {
    /// Pack the matrices for `model` under this tick's camera
    pub fn new(model: Mat4, frame: &FrameMatrices, material: &MaterialProperties) -> Self {
        let model_view = frame.view * model;
        let model_view_projection = frame.projection * model_view;
        Self {
            model: model.to_cols_array_2d(),
            model_view: model_view.to_cols_array_2d(),
            model_view_projection: model_view_projection.to_cols_array_2d(),
            light_intensity: frame.light_intensity.to_array(),
            material: material.to_array(),
        }
    }

    /// Raw bytes for a uniform buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Everything the backend needs to draw one placed object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectDraw {
    /// Slot being drawn
    pub slot: ObjectSlot,
    /// Model loaded for the slot
    pub handle: ModelHandle,
    /// Anchor pose × scale
    pub model_matrix: Mat4,
    /// Shader inputs
    pub uniforms: ObjectUniforms,
}

/// GPU side of the app. Implementations own shaders, buffers and textures;
/// the scene renderer only decides what is drawn and in which order.
pub trait RenderBackend {
    /// Create the external texture the camera image is streamed into
    fn create_camera_texture(&mut self) -> Result<TextureId, RenderError>;

    /// Load a slot's mesh and texture
    fn load_model(&mut self, slot: ObjectSlot, asset: &ModelAsset) -> Result<ModelHandle, RenderError>;

    /// Clear color and depth
    fn clear(&mut self, color: Color);

    /// Draw the camera image as a full-screen quad
    fn draw_background(&mut self, texture: TextureId, timestamp: i64) -> Result<(), RenderError>;

    /// Replace the point buffer contents
    fn upload_point_cloud(&mut self, cloud: &PointCloud) -> Result<(), RenderError>;

    /// Draw the last uploaded points
    fn draw_point_cloud(&mut self, view: &Mat4, projection: &Mat4) -> Result<(), RenderError>;

    /// Draw plane overlays; `planes` are already filtered and sorted far to near
    fn draw_planes(&mut self, planes: &[Plane], camera_pose: &Pose, projection: &Mat4) -> Result<(), RenderError>;

    /// Draw one placed object
    fn draw_object(&mut self, draw: &ObjectDraw) -> Result<(), RenderError>;
}

/// Anchor pose with a uniform scale applied in model space
pub fn model_matrix(pose: &Pose, scale: f32) -> Mat4 {
    pose.to_matrix() * Mat4::from_scale(Vec3::splat(scale))
}

/// Planes worth drawing, far to near.
///
/// Drops planes that are not tracking, that another plane has absorbed, or
/// whose back faces the camera.
pub fn visible_planes(planes: impl IntoIterator<Item = Plane>, camera_pose: &Pose) -> Vec<Plane> {
    let mut visible: Vec<(f32, Plane)> = planes
        .into_iter()
        .filter(|plane| plane.tracking_state == TrackingState::Tracking && plane.subsumed_by.is_none())
        .map(|plane| (plane.distance_to(camera_pose), plane))
        .filter(|(distance, _)| *distance > 0.0)
        .collect();
    visible.sort_by(|a, b| b.0.total_cmp(&a.0));
    visible.into_iter().map(|(_, plane)| plane).collect()
}

/// Draws background, point cloud, planes and objects in that order
#[derive(Debug)]
pub struct SceneRenderer {
    clear_color: Color,
    objects: ObjectsConfig,
    camera_texture: Option<TextureId>,
    models: FxHashMap<ObjectSlot, ModelHandle>,
    last_point_cloud: Option<i64>,
}

impl SceneRenderer {
    /// Renderer for the configured objects; nothing is loaded until
    /// [`SceneRenderer::on_surface_created`]
    pub fn new(config: &ArConfig) -> Self {
        Self {
            clear_color: config.render.clear_color,
            objects: config.objects.clone(),
            camera_texture: None,
            models: FxHashMap::default(),
            last_point_cloud: None,
        }
    }

    /// Create GPU resources for a fresh surface.
    ///
    /// A model that fails to load is logged and its slot is skipped at draw
    /// time; only a missing camera texture is an error.
    pub fn on_surface_created<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<TextureId, RenderError> {
        let texture = backend.create_camera_texture()?;
        self.camera_texture = Some(texture);
        self.models.clear();
        self.last_point_cloud = None;

        for slot in ObjectSlot::ALL {
            match backend.load_model(slot, &self.objects.get(slot).model) {
                Ok(handle) => {
                    self.models.insert(slot, handle);
                }
                Err(err) => log::error!("Failed to read {} asset: {}", slot, err),
            }
        }
        log::info!(
            "Surface created: camera texture {:?}, {} of {} models loaded",
            texture,
            self.models.len(),
            ObjectSlot::ALL.len()
        );
        Ok(texture)
    }

    /// Texture handed to the session each tick
    pub fn camera_texture(&self) -> Option<TextureId> {
        self.camera_texture
    }

    /// Whether the slot's model is ready to draw
    pub fn is_model_loaded(&self, slot: ObjectSlot) -> bool {
        self.models.contains_key(&slot)
    }

    /// Step 1
    pub fn clear<B: RenderBackend + ?Sized>(&self, backend: &mut B) {
        backend.clear(self.clear_color);
    }

    /// Step 2, drawn every tick regardless of tracking
    pub fn draw_background<B: RenderBackend + ?Sized>(&self, backend: &mut B, timestamp: i64) -> Result<(), RenderError> {
        let texture = self
            .camera_texture
            .ok_or_else(|| RenderError::Backend("camera texture has not been created".to_string()))?;
        backend.draw_background(texture, timestamp)
    }

    /// Step 3. Uploads only when the cloud is newer than the last upload.
    pub fn draw_point_cloud<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        cloud: &PointCloud,
        frame: &FrameMatrices,
    ) -> Result<(), RenderError> {
        if self.last_point_cloud != Some(cloud.timestamp()) {
            backend.upload_point_cloud(cloud)?;
            self.last_point_cloud = Some(cloud.timestamp());
        }
        backend.draw_point_cloud(&frame.view, &frame.projection)
    }

    /// Step 4. Returns how many planes were drawn.
    pub fn draw_planes<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        planes: Vec<Plane>,
        camera_pose: &Pose,
        frame: &FrameMatrices,
    ) -> Result<usize, RenderError> {
        let visible = visible_planes(planes, camera_pose);
        if !visible.is_empty() {
            backend.draw_planes(&visible, camera_pose, &frame.projection)?;
        }
        Ok(visible.len())
    }

    /// Step 5, for one tracking slot
    pub fn draw_object<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        slot: ObjectSlot,
        pose: &Pose,
        frame: &FrameMatrices,
    ) -> Result<(), RenderError> {
        let handle = *self.models.get(&slot).ok_or(RenderError::ModelNotLoaded(slot))?;
        let object = self.objects.get(slot);
        let model = model_matrix(pose, object.scale_factor);
        backend.draw_object(&ObjectDraw {
            slot,
            handle,
            model_matrix: model,
            uniforms: ObjectUniforms::new(model, frame, &object.material),
        })
    }
}
