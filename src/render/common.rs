use glam::{Mat4, Vec3};

/// Camera state handed to presenters.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraParams {
    pub view_proj: Mat4,
    pub position: Vec3,
}

impl CameraParams {
    /// Projects a world-space point into normalized device coordinates.
    pub fn project(&self, point: Vec3) -> Vec3 {
        self.view_proj.project_point3(point)
    }
}

/// Everything a presenter needs to draw one frame, main view and minimap alike.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameView {
    pub background: Vec3,
    pub ambient: Vec3,
    pub camera: CameraParams,
    pub minimap_camera: CameraParams,
    pub ground_half_extent: f32,
    pub player_position: Vec3,
    pub player_radius: f32,
    pub player_color: Vec3,
    pub marker_position: Vec3,
    pub marker_radius: f32,
    pub marker_color: Vec3,
    pub minimap_size: u32,
    /// Main canvas size in device pixels.
    pub render_size: (u32, u32),
    pub alpha: f32,
}
