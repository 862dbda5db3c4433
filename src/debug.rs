use std::collections::VecDeque;
use std::time::Duration;

use anyhow::Result;
use glam::Vec3;
use log::info;

use crate::scene::{format_hex_color, parse_hex_color, DebugConfig};

const VALUE_MIN: f32 = 0.0;
const VALUE_MAX: f32 = 1.0;
const VALUE_STEP: f32 = 0.001;
const FPS_WINDOW: Duration = Duration::from_secs(1);
const FPS_MAX_SAMPLES: usize = 1024;

/// Live-tweakable parameters shown in the debug panel.
#[derive(Debug, Clone)]
pub struct DebugPanel {
    background: Vec3,
    background_applied: bool,
    value: f32,
    fps: FpsMeter,
}

impl DebugPanel {
    pub fn new(config: &DebugConfig) -> Self {
        Self {
            background: config.background,
            background_applied: false,
            value: snap(config.value),
            fps: FpsMeter::default(),
        }
    }

    pub fn background(&self) -> Vec3 {
        self.background
    }

    pub fn set_background_hex(&mut self, hex: &str) -> Result<()> {
        self.background = parse_hex_color(hex)?;
        self.background_applied = true;
        info!("Background color updated to {}", format_hex_color(self.background));
        Ok(())
    }

    /// The scene clears to `clear_color` until a background has been picked in the panel.
    pub fn scene_background(&self, clear_color: Vec3) -> Vec3 {
        if self.background_applied {
            self.background
        } else {
            clear_color
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Clamps to [0, 1], snaps to the slider step, and returns the stored value.
    pub fn set_value(&mut self, value: f32) -> f32 {
        let value = snap(value);
        if value != self.value {
            self.value = value;
            info!("Number value updated to {}", self.value);
        }
        self.value
    }

    pub fn fps(&self) -> &FpsMeter {
        &self.fps
    }

    pub fn fps_mut(&mut self) -> &mut FpsMeter {
        &mut self.fps
    }
}

fn snap(value: f32) -> f32 {
    if !value.is_finite() {
        return VALUE_MIN;
    }
    let clamped = value.clamp(VALUE_MIN, VALUE_MAX);
    let steps = ((clamped - VALUE_MIN) / VALUE_STEP).round();
    (VALUE_MIN + steps * VALUE_STEP).min(VALUE_MAX)
}

/// Rolling frames-per-second estimate over the last second of presented frames.
#[derive(Debug, Clone, Default)]
pub struct FpsMeter {
    samples: VecDeque<Duration>,
    window_total: Duration,
}

impl FpsMeter {
    pub fn record(&mut self, frame_time: Duration) {
        self.samples.push_back(frame_time);
        self.window_total += frame_time;
        while self.samples.len() > 1
            && (self.window_total > FPS_WINDOW || self.samples.len() > FPS_MAX_SAMPLES)
        {
            if let Some(oldest) = self.samples.pop_front() {
                self.window_total -= oldest;
            }
        }
    }

    pub fn fps(&self) -> f32 {
        if self.window_total.is_zero() {
            return 0.0;
        }
        self.samples.len() as f32 / self.window_total.as_secs_f32()
    }

    /// Mean frame time in the current window.
    pub fn frame_time(&self) -> Duration {
        match u32::try_from(self.samples.len()) {
            Ok(count) if count > 0 => self.window_total / count,
            _ => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_is_clamped_and_snapped() {
        let mut panel = DebugPanel::new(&DebugConfig::default());
        assert_eq!(panel.set_value(1.7), 1.0);
        assert_eq!(panel.set_value(-3.0), 0.0);
        assert!((panel.set_value(0.12345) - 0.123).abs() < 1e-6);
        assert_eq!(panel.set_value(f32::NAN), 0.0);
    }

    #[test]
    fn background_accepts_hex_and_rejects_garbage() {
        let mut panel = DebugPanel::new(&DebugConfig::default());
        assert_eq!(panel.background(), Vec3::ONE);
        assert_eq!(panel.scene_background(Vec3::X), Vec3::X);
        panel.set_background_hex("#000000").unwrap();
        assert_eq!(panel.scene_background(Vec3::X), Vec3::ZERO);
        assert!(panel.set_background_hex("black").is_err());
        assert_eq!(panel.background(), Vec3::ZERO);
    }

    #[test]
    fn fps_meter_tracks_recent_frames() {
        let mut meter = FpsMeter::default();
        assert_eq!(meter.fps(), 0.0);
        for _ in 0..120 {
            meter.record(Duration::from_millis(20));
        }
        assert!((meter.fps() - 50.0).abs() < 0.5);
        assert_eq!(meter.frame_time(), Duration::from_millis(20));
    }

    #[test]
    fn fps_meter_bounds_zero_length_frames() {
        let mut meter = FpsMeter::default();
        for _ in 0..10_000 {
            meter.record(Duration::ZERO);
        }
        assert_eq!(meter.samples.len(), FPS_MAX_SAMPLES);
        assert_eq!(meter.fps(), 0.0);

        meter.record(Duration::from_millis(10));
        assert_eq!(meter.samples.len(), FPS_MAX_SAMPLES);
        assert!(meter.fps() > 0.0);
    }
}
