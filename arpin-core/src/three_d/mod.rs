//! Camera matrices, lighting and scene drawing
//!
//! Everything here is recomputed per tick from the current frame and handed
//! read-only to a [`RenderBackend`].

pub mod camera;
pub mod compositor;
pub mod lighting;
pub mod material;
pub mod scene_renderer;

pub use camera::{projection_matrix, view_matrix};
pub use compositor::{FrameCompositor, FrameMatrices};
pub use lighting::{light_intensity, NEUTRAL_LIGHT};
pub use material::MaterialProperties;
pub use scene_renderer::{
    model_matrix, visible_planes, ModelHandle, ObjectDraw, ObjectUniforms, RenderBackend, SceneRenderer,
};
