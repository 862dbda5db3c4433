use std::f64::consts::TAU;

use anyhow::{anyhow, Result};
use glam::{Vec2, Vec3, Vec4Swizzles};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::common::{CameraParams, FrameView};
use super::Presenter;
use crate::scene::format_hex_color;

const GRID_SPACING: f32 = 10.0;

/// Schematic 2D-canvas presenter: a perspective grid with the player for the
/// main view and a flat top-down map for the minimap.
pub struct CanvasPresenter {
    main: Surface,
    minimap: Surface,
}

struct Surface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl Surface {
    fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let context = canvas
            .get_context("2d")
            .map_err(|err| anyhow!("failed to query canvas context: {err:?}"))?
            .ok_or_else(|| anyhow!("canvas does not support 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| anyhow!("failed to cast canvas context"))?;
        Ok(Self { canvas, context })
    }

    fn resize(&self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if self.canvas.width() != width {
            self.canvas.set_width(width);
        }
        if self.canvas.height() != height {
            self.canvas.set_height(height);
        }
    }

    fn size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    /// Maps a world point to canvas pixels, or `None` when it is behind the camera.
    fn to_screen(&self, camera: &CameraParams, point: Vec3) -> Option<Vec2> {
        let clip = camera.view_proj * point.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.xy() / clip.w;
        let size = self.size();
        Some(Vec2::new(
            (ndc.x * 0.5 + 0.5) * size.x,
            (0.5 - ndc.y * 0.5) * size.y,
        ))
    }

    fn fill(&self, color: Vec3) {
        let size = self.size();
        self.context.set_fill_style(&css(color));
        self.context
            .fill_rect(0.0, 0.0, f64::from(size.x), f64::from(size.y));
    }

    fn segment(&self, camera: &CameraParams, from: Vec3, to: Vec3) {
        if let (Some(a), Some(b)) = (self.to_screen(camera, from), self.to_screen(camera, to)) {
            self.context.move_to(f64::from(a.x), f64::from(a.y));
            self.context.line_to(f64::from(b.x), f64::from(b.y));
        }
    }

    fn ground_grid(&self, camera: &CameraParams, half_extent: f32, color: Vec3) {
        self.context.set_stroke_style(&css(color));
        self.context.begin_path();
        let lines = (2.0 * half_extent / GRID_SPACING).round().max(1.0) as i32;
        for i in 0..=lines {
            let offset = -half_extent + i as f32 * GRID_SPACING;
            for j in 0..lines {
                let a = -half_extent + j as f32 * GRID_SPACING;
                let b = a + GRID_SPACING;
                self.segment(camera, Vec3::new(offset, 0.0, a), Vec3::new(offset, 0.0, b));
                self.segment(camera, Vec3::new(a, 0.0, offset), Vec3::new(b, 0.0, offset));
            }
        }
        self.context.stroke();
    }

    fn disc(&self, camera: &CameraParams, center: Vec3, radius: f32, color: Vec3) -> Result<()> {
        let Some(screen) = self.to_screen(camera, center) else {
            return Ok(());
        };
        let edge = self
            .to_screen(camera, center + Vec3::X * radius)
            .unwrap_or(screen);
        let pixels = screen.distance(edge).max(2.0);
        self.context.set_fill_style(&css(color));
        self.context.begin_path();
        self.context
            .arc(
                f64::from(screen.x),
                f64::from(screen.y),
                f64::from(pixels),
                0.0,
                TAU,
            )
            .map_err(|err| anyhow!("arc failed: {err:?}"))?;
        self.context.fill();
        Ok(())
    }
}

impl CanvasPresenter {
    pub fn new(main: HtmlCanvasElement, minimap: HtmlCanvasElement) -> Result<Self> {
        Ok(Self {
            main: Surface::new(main)?,
            minimap: Surface::new(minimap)?,
        })
    }
}

impl Presenter for CanvasPresenter {
    fn present(&mut self, view: &FrameView) -> Result<()> {
        let (width, height) = view.render_size;
        self.main.resize(width, height);
        self.main.fill(view.background);
        self.main
            .ground_grid(&view.camera, view.ground_half_extent, view.ambient);
        self.main.disc(
            &view.camera,
            view.player_position,
            view.player_radius,
            view.player_color,
        )?;

        self.minimap.resize(view.minimap_size, view.minimap_size);
        let size = self.minimap.size();
        self.minimap
            .context
            .clear_rect(0.0, 0.0, f64::from(size.x), f64::from(size.y));
        self.minimap
            .ground_grid(&view.minimap_camera, view.ground_half_extent, view.ambient * 2.0);
        self.minimap.disc(
            &view.minimap_camera,
            view.marker_position,
            view.marker_radius,
            view.marker_color,
        )?;
        Ok(())
    }
}

fn css(color: Vec3) -> JsValue {
    JsValue::from_str(&format_hex_color(color))
}
