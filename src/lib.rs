//! Ground plane, WASD player and top-down minimap driven by a fixed-timestep loop.
//!
//! The loop itself lives in [`scheduler`] and only talks to the outside world
//! through a [`TimeSource`] and a [`FrameRequester`], so it runs the same in
//! the browser (`performance.now()` + `requestAnimationFrame`) as it does in
//! headless tools and tests driven by a [`ManualClock`].

pub mod app;
pub mod camera;
pub mod clock;
pub mod debug;
pub mod frames;
pub mod input;
pub mod minimap;
pub mod player;
pub mod render;
pub mod scene;
pub mod scheduler;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use app::DemoApp;
pub use clock::{ManualClock, SystemClock, TimeSource};
pub use frames::{FrameId, FrameRequester, ManualFrames};
pub use input::{InputState, KeyCode, MouseButton};
pub use render::{CameraParams, FrameView, Presenter, SummaryPresenter};
pub use scene::SceneConfig;
pub use scheduler::{
    FixedTimestep, FrameReport, LoopError, RenderPolicy, SchedulerConfig, StepHandler,
};
