use glam::Vec3;

use crate::camera::OrthographicCamera;
use crate::render::CameraParams;
use crate::scene::MinimapConfig;

const MARKER_LIFT: f32 = 0.1;

/// Top-down minimap. Clicking it switches between following the player
/// (zoomed in) and showing the whole ground, and between the small and large size.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimap {
    config: MinimapConfig,
    camera: OrthographicCamera,
    follow_player: bool,
    expanded: bool,
    marker: Vec3,
}

impl Minimap {
    pub fn new(config: MinimapConfig) -> Self {
        let extent = config.extent;
        let mut camera = OrthographicCamera::new(-extent, extent, extent, -extent, 0.1, 1000.0);
        camera.position = Vec3::new(0.0, config.height, 0.0);
        camera.look_at(Vec3::ZERO);
        Self {
            config,
            camera,
            follow_player: true,
            expanded: false,
            marker: Vec3::new(0.0, MARKER_LIFT, 0.0),
        }
    }

    /// Tracks the player: the marker always, the camera only in follow mode.
    pub fn sync(&mut self, player: Vec3) {
        self.marker = Vec3::new(player.x, MARKER_LIFT, player.z);
        if self.follow_player {
            self.camera.position = Vec3::new(player.x, self.config.height, player.z);
            self.camera.look_at(Vec3::new(player.x, 0.0, player.z));
        }
    }

    /// Handles a click on the minimap.
    pub fn toggle(&mut self) {
        self.follow_player = !self.follow_player;
        self.apply_zoom();
        self.expanded = !self.expanded;
    }

    fn apply_zoom(&mut self) {
        if self.follow_player {
            self.camera.zoom = self.config.follow_zoom;
            return;
        }
        let extent = self.config.extent;
        self.camera.left = -extent;
        self.camera.right = extent;
        self.camera.top = extent;
        self.camera.bottom = -extent;
        self.camera.position = Vec3::new(0.0, self.config.height, 0.0);
        self.camera.look_at(Vec3::ZERO);
        self.camera.zoom = 1.0;
    }

    pub fn is_following(&self) -> bool {
        self.follow_player
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Side length of the minimap canvas in pixels.
    pub fn size(&self) -> u32 {
        if self.expanded {
            self.config.expanded_size
        } else {
            self.config.collapsed_size
        }
    }

    pub fn marker(&self) -> Vec3 {
        self.marker
    }

    pub fn marker_radius(&self) -> f32 {
        self.config.marker_radius
    }

    pub fn marker_color(&self) -> Vec3 {
        self.config.marker_color
    }

    pub fn camera(&self) -> &OrthographicCamera {
        &self.camera
    }

    pub fn camera_params(&self) -> CameraParams {
        self.camera.params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_player_by_default() {
        let mut minimap = Minimap::new(MinimapConfig::default());
        minimap.sync(Vec3::new(3.0, 1.0, -4.0));
        assert!(minimap.is_following());
        assert_eq!(minimap.marker(), Vec3::new(3.0, 0.1, -4.0));
        assert_eq!(minimap.camera().position, Vec3::new(3.0, 100.0, -4.0));
        assert_eq!(minimap.camera().target, Vec3::new(3.0, 0.0, -4.0));
        assert_eq!(minimap.size(), 200);
    }

    #[test]
    fn toggle_switches_to_whole_ground_and_back() {
        let mut minimap = Minimap::new(MinimapConfig::default());
        minimap.sync(Vec3::new(10.0, 0.0, 10.0));

        minimap.toggle();
        assert!(!minimap.is_following());
        assert!(minimap.is_expanded());
        assert_eq!(minimap.size(), 400);
        assert_eq!(minimap.camera().zoom, 1.0);
        assert_eq!(minimap.camera().position, Vec3::new(0.0, 100.0, 0.0));

        minimap.sync(Vec3::new(20.0, 0.0, 20.0));
        assert_eq!(minimap.camera().position, Vec3::new(0.0, 100.0, 0.0));
        assert_eq!(minimap.marker(), Vec3::new(20.0, 0.1, 20.0));

        minimap.toggle();
        assert!(minimap.is_following());
        assert!(!minimap.is_expanded());
        assert_eq!(minimap.camera().zoom, 2.0);
        assert_eq!(minimap.size(), 200);
    }
}
