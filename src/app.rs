use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use glam::Vec2;

use crate::camera::{OrbitControls, PerspectiveCamera};
use crate::debug::DebugPanel;
use crate::input::InputState;
use crate::minimap::Minimap;
use crate::player::Player;
use crate::render::{FrameView, Presenter};
use crate::scene::{format_hex_color, SceneConfig};
use crate::scheduler::StepHandler;

const DEFAULT_SIZE: (u32, u32) = (1280, 720);
const MAX_PIXEL_RATIO: f64 = 2.0;

/// All state of the running demo, owned by whichever host drives the loop.
pub struct DemoApp<P> {
    config: SceneConfig,
    input: Arc<InputState>,
    player: Player,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    minimap: Minimap,
    debug: DebugPanel,
    presenter: P,
    /// Logical viewport size in CSS pixels.
    viewport: (u32, u32),
    pixel_ratio: f64,
    steps: u64,
    simulated: Duration,
}

impl<P: Presenter> DemoApp<P> {
    pub fn new(config: SceneConfig, input: Arc<InputState>, presenter: P) -> Self {
        let camera = PerspectiveCamera::new(
            &config.camera,
            DEFAULT_SIZE.0 as f32 / DEFAULT_SIZE.1 as f32,
        );
        let damping = Some(config.camera.damping);
        let controls = OrbitControls::new(&camera, damping);
        let mut minimap = Minimap::new(config.minimap);
        let player = Player::new(&config.player);
        minimap.sync(player.position);
        let debug = DebugPanel::new(&config.debug);

        Self {
            config,
            input,
            player,
            camera,
            controls,
            minimap,
            debug,
            presenter,
            viewport: DEFAULT_SIZE,
            pixel_ratio: 1.0,
            steps: 0,
            simulated: Duration::ZERO,
        }
    }

    /// Handles a viewport resize. The device pixel ratio is capped at 2.
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f64) {
        self.viewport = (width.max(1), height.max(1));
        self.pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio.min(MAX_PIXEL_RATIO)
        } else {
            1.0
        };
        self.camera.set_aspect(self.viewport.0, self.viewport.1);
    }

    /// Size of the main drawing buffer in device pixels.
    pub fn render_size(&self) -> (u32, u32) {
        let scale = |v: u32| (f64::from(v) * self.pixel_ratio).round() as u32;
        (scale(self.viewport.0), scale(self.viewport.1))
    }

    pub fn toggle_minimap(&mut self) {
        self.minimap.toggle();
        self.minimap.sync(self.player.position);
        log::info!(
            "minimap {} ({}px)",
            if self.minimap.is_following() {
                "following player"
            } else {
                "showing whole ground"
            },
            self.minimap.size()
        );
    }

    pub fn set_background(&mut self, hex: &str) -> Result<()> {
        self.debug
            .set_background_hex(hex)
            .with_context(|| format!("invalid background color '{hex}'"))
    }

    pub fn set_debug_value(&mut self, value: f32) -> f32 {
        self.debug.set_value(value)
    }

    /// Feeds the FPS meter with the real time between presented frames.
    pub fn record_frame_time(&mut self, frame_time: Duration) {
        self.debug.fps_mut().record(frame_time);
    }

    pub fn frame_view(&self, alpha: f32) -> FrameView {
        FrameView {
            background: self
                .debug
                .scene_background(self.config.background.clear_color),
            ambient: self.config.lighting.ambient,
            camera: self.camera.params(),
            minimap_camera: self.minimap.camera_params(),
            ground_half_extent: self.config.ground.half_extent(),
            player_position: self.player.position,
            player_radius: self.player.radius,
            player_color: self.config.player.color,
            marker_position: self.minimap.marker(),
            marker_radius: self.minimap.marker_radius(),
            marker_color: self.minimap.marker_color(),
            minimap_size: self.minimap.size(),
            render_size: self.render_size(),
            alpha,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn input(&self) -> &Arc<InputState> {
        &self.input
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn minimap(&self) -> &Minimap {
        &self.minimap
    }

    pub fn debug(&self) -> &DebugPanel {
        &self.debug
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Simulated time reported by the most recent step.
    pub fn simulated_time(&self) -> Duration {
        self.simulated
    }

    /// Human readable final state, printed by the headless runner.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let p = self.player.position;
        let _ = writeln!(out, "Player pos=({:.2}, {:.2}, {:.2})", p.x, p.y, p.z);
        let m = self.minimap.marker();
        let c = self.minimap.camera().position;
        let _ = writeln!(
            out,
            "Minimap {} size={} zoom={:.2} marker=({:.2}, {:.2}, {:.2}) camera=({:.2}, {:.2}, {:.2})",
            if self.minimap.is_following() { "follow" } else { "overview" },
            self.minimap.size(),
            self.minimap.camera().zoom,
            m.x,
            m.y,
            m.z,
            c.x,
            c.y,
            c.z
        );
        let background = self
            .debug
            .scene_background(self.config.background.clear_color);
        let _ = writeln!(
            out,
            "Debug background={} value={:.3} fps={:.1}",
            format_hex_color(background),
            self.debug.value(),
            self.debug.fps().fps()
        );
        out
    }
}

impl<P: Presenter> StepHandler for DemoApp<P> {
    fn step(&mut self, step: Duration, elapsed: Duration) -> Result<()> {
        let drag = self.input.take_drag();
        if drag != Vec2::ZERO {
            self.controls.drag(drag, self.viewport.1);
        }
        let wheel = self.input.take_wheel();
        if wheel != 0.0 {
            self.controls.wheel(wheel);
        }

        self.player.advance(&self.input, step);
        self.minimap.sync(self.player.position);
        self.controls.update(&mut self.camera);

        self.steps += 1;
        self.simulated = elapsed;
        Ok(())
    }

    fn render(&mut self, alpha: f32) -> Result<()> {
        let view = self.frame_view(alpha);
        self.presenter.present(&view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyCode;
    use crate::render::SummaryPresenter;

    const TICK: Duration = Duration::from_nanos(16_666_667);

    fn app() -> DemoApp<SummaryPresenter> {
        DemoApp::new(
            SceneConfig::default(),
            Arc::new(InputState::new()),
            SummaryPresenter::new(),
        )
    }

    #[test]
    fn steps_move_player_and_minimap_together() {
        let mut app = app();
        app.input().press_key(KeyCode::D);
        for i in 1..=30 {
            app.step(TICK, TICK * i).unwrap();
        }
        let x = app.player().position.x;
        assert!((x - 3.0).abs() < 1e-3, "x = {x}");
        assert_eq!(app.minimap().marker().x, x);
        assert_eq!(app.minimap().camera().position.x, x);
        assert_eq!(app.steps(), 30);
        assert_eq!(app.simulated_time(), TICK * 30);
    }

    #[test]
    fn render_presents_current_view() {
        let mut app = app();
        app.render(0.5).unwrap();
        let view = app.presenter().last_view().unwrap();
        assert_eq!(app.presenter().frames(), 1);
        assert_eq!(view.minimap_size, 200);
        assert_eq!(view.alpha, 0.5);
        assert_eq!(format_hex_color(view.background), "#18142c");
        assert_eq!(format_hex_color(view.ambient), "#404040");
    }

    #[test]
    fn resize_caps_pixel_ratio() {
        let mut app = app();
        app.resize(800, 400, 3.0);
        assert_eq!(app.render_size(), (1600, 800));
        assert_eq!(app.camera().aspect, 2.0);
        app.resize(800, 400, f64::NAN);
        assert_eq!(app.render_size(), (800, 400));
    }

    #[test]
    fn dragging_orbits_the_main_camera() {
        let mut app = app();
        let before = app.camera().position;
        app.input().press_button(crate::input::MouseButton::LEFT);
        app.input().move_pointer(Vec2::new(100.0, 100.0));
        app.input().move_pointer(Vec2::new(160.0, 100.0));
        app.step(TICK, TICK).unwrap();
        assert_ne!(app.camera().position, before);
    }

    #[test]
    fn summary_reports_debug_changes() {
        let mut app = app();
        app.set_background("#ffffff").unwrap();
        app.set_debug_value(0.25);
        assert!(app.set_background("nope").is_err());
        let summary = app.summary();
        assert!(summary.contains("Debug background=#ffffff value=0.250"));
        assert!(summary.contains("Minimap follow size=200"));
    }
}
