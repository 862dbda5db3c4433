//! Fixed-timestep animation loop.
//!
//! Real elapsed time between display frames is accumulated and drained in
//! constant-size simulation steps, so the simulation advances identically no
//! matter how irregular the frame timing is. A slow frame produces several
//! catch-up steps before the next frame is requested; a very long gap (a
//! backgrounded tab, a debugger pause) is capped so it cannot trigger a
//! runaway burst.

use std::time::Duration;

use anyhow::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::TimeSource;
use crate::frames::FrameRequester;

pub const DEFAULT_FIXED_STEP: Duration = Duration::from_nanos(16_666_667);
pub const DEFAULT_MAX_FRAME_DELTA: Duration = Duration::from_millis(100);

/// When the handler's `render` runs relative to the simulation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderPolicy {
    /// Once per display frame, after all steps of that frame have run.
    #[default]
    PerFrame,
    /// After every simulation step. A catch-up frame renders several times.
    PerStep,
}

impl RenderPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "per-frame" | "frame" => Some(Self::PerFrame),
            "per-step" | "step" => Some(Self::PerStep),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub fixed_step: Duration,
    pub max_frame_delta: Duration,
    #[serde(default)]
    pub render_policy: RenderPolicy,
}

impl SchedulerConfig {
    /// Configuration stepping `hz` times per simulated second. Zero is treated as one.
    pub fn with_rate(hz: u32) -> Self {
        Self {
            fixed_step: Duration::from_secs_f64(1.0 / f64::from(hz.max(1))),
            ..Self::default()
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            fixed_step: DEFAULT_FIXED_STEP,
            max_frame_delta: DEFAULT_MAX_FRAME_DELTA,
            render_policy: RenderPolicy::PerFrame,
        }
    }
}

/// Receiver of fixed simulation steps.
pub trait StepHandler {
    /// Advances the simulation by `step`. `elapsed` is the total simulated time
    /// observed so far, including the frame that triggered this step.
    fn step(&mut self, step: Duration, elapsed: Duration) -> Result<()>;

    /// Presents the current state. `alpha` is the fraction of a step left in the accumulator.
    fn render(&mut self, _alpha: f32) -> Result<()> {
        Ok(())
    }
}

impl<F> StepHandler for F
where
    F: FnMut(Duration, Duration) -> Result<()>,
{
    fn step(&mut self, step: Duration, elapsed: Duration) -> Result<()> {
        self(step, elapsed)
    }
}

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("failed to request the next frame")]
    FrameRequest(#[source] anyhow::Error),
    #[error("simulation step {tick} failed")]
    Step {
        tick: u64,
        #[source]
        source: anyhow::Error,
    },
    #[error("render failed")]
    Render(#[source] anyhow::Error),
}

/// Outcome of a single frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    pub steps: u32,
    pub raw_delta: Duration,
    pub capped_delta: Duration,
    pub alpha: f32,
}

pub struct FixedTimestep<C, R, H>
where
    C: TimeSource,
    R: FrameRequester,
    H: StepHandler,
{
    config: SchedulerConfig,
    clock: C,
    frames: R,
    handler: H,
    accumulator: Duration,
    total_elapsed: Duration,
    last_sample: Duration,
    running: bool,
    frame_handle: Option<R::Handle>,
    ticks: u64,
    frame_count: u64,
}

impl<C, R, H> FixedTimestep<C, R, H>
where
    C: TimeSource,
    R: FrameRequester,
    H: StepHandler,
{
    pub fn new(config: SchedulerConfig, clock: C, frames: R, handler: H) -> Self {
        let fixed_step = if config.fixed_step.is_zero() {
            DEFAULT_FIXED_STEP
        } else {
            config.fixed_step
        };
        let last_sample = clock.now();
        Self {
            config: SchedulerConfig {
                fixed_step,
                ..config
            },
            clock,
            frames,
            handler,
            accumulator: Duration::ZERO,
            total_elapsed: Duration::ZERO,
            last_sample,
            running: false,
            frame_handle: None,
            ticks: 0,
            frame_count: 0,
        }
    }

    /// Begins requesting frames. Calling it while already running does nothing.
    pub fn start(&mut self) -> Result<(), LoopError> {
        if self.running {
            return Ok(());
        }
        self.last_sample = self.clock.now();
        self.running = true;
        debug!("fixed-step loop started (step {:?})", self.config.fixed_step);
        self.schedule_next()
    }

    /// Cancels the pending frame. An in-flight frame callback still runs to completion.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        if let Some(handle) = self.frame_handle.take() {
            self.frames.cancel_frame(handle);
        }
        self.running = false;
        debug!(
            "fixed-step loop stopped after {} frames / {} ticks",
            self.frame_count, self.ticks
        );
    }

    /// Drops any accumulated time debt and restarts the simulation clock at zero.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
        self.total_elapsed = Duration::ZERO;
        self.last_sample = self.clock.now();
        debug!("fixed-step loop reset");
    }

    /// Frame callback. The host calls this when a requested frame fires.
    pub fn on_frame(&mut self) -> Result<FrameReport, LoopError> {
        // The request that brought us here has been consumed by the host.
        self.frame_handle = None;
        if !self.running {
            return Ok(FrameReport::default());
        }
        self.frame_count += 1;

        let report = match self.advance() {
            Ok(report) => report,
            Err(err) => {
                // A half-drained frame must not be replayed as a catch-up burst on restart.
                self.accumulator = Duration::ZERO;
                self.running = false;
                return Err(err);
            }
        };

        self.schedule_next()?;
        Ok(report)
    }

    fn advance(&mut self) -> Result<FrameReport, LoopError> {
        let now = self.clock.now();
        let raw_delta = now.saturating_sub(self.last_sample);
        self.last_sample = now;

        let capped_delta = raw_delta.min(self.config.max_frame_delta);
        if capped_delta < raw_delta {
            warn!(
                "frame delta {:?} capped to {:?}",
                raw_delta, self.config.max_frame_delta
            );
        }
        self.accumulator += capped_delta;
        self.total_elapsed += capped_delta;

        let step = self.config.fixed_step;
        let mut steps = 0;
        while self.accumulator >= step {
            self.ticks += 1;
            self.handler
                .step(step, self.total_elapsed)
                .map_err(|source| LoopError::Step {
                    tick: self.ticks,
                    source,
                })?;
            self.accumulator -= step;
            steps += 1;

            // The presented state is exactly the post-step state, so there is nothing to blend.
            if self.config.render_policy == RenderPolicy::PerStep {
                self.handler.render(0.0).map_err(LoopError::Render)?;
            }
        }

        let alpha = self.alpha();
        if self.config.render_policy == RenderPolicy::PerFrame {
            self.handler.render(alpha).map_err(LoopError::Render)?;
        }

        Ok(FrameReport {
            steps,
            raw_delta,
            capped_delta,
            alpha,
        })
    }

    fn schedule_next(&mut self) -> Result<(), LoopError> {
        match self.frames.request_frame() {
            Ok(handle) => {
                self.frame_handle = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.running = false;
                Err(LoopError::FrameRequest(err))
            }
        }
    }

    fn alpha(&self) -> f32 {
        (self.accumulator.as_secs_f64() / self.config.fixed_step.as_secs_f64()) as f32
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_pending_frame(&self) -> bool {
        self.frame_handle.is_some()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn fixed_step(&self) -> Duration {
        self.config.fixed_step
    }

    pub fn accumulator(&self) -> Duration {
        self.accumulator
    }

    pub fn total_elapsed(&self) -> Duration {
        self.total_elapsed
    }

    /// Total simulation steps executed since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Total frame callbacks processed while running.
    pub fn frames(&self) -> u64 {
        self.frame_count
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }
}
