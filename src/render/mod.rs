mod common;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

use anyhow::Result;

pub use common::{CameraParams, FrameView};
#[cfg(target_arch = "wasm32")]
pub use wasm::CanvasPresenter;

/// Draws a [`FrameView`] somewhere: a canvas in the browser, nowhere when headless.
pub trait Presenter {
    fn present(&mut self, view: &FrameView) -> Result<()>;
}

/// Headless presenter that only remembers what it was asked to draw.
#[derive(Debug, Default)]
pub struct SummaryPresenter {
    frames: u64,
    last: Option<FrameView>,
}

impl SummaryPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_view(&self) -> Option<&FrameView> {
        self.last.as_ref()
    }
}

impl Presenter for SummaryPresenter {
    fn present(&mut self, view: &FrameView) -> Result<()> {
        self.frames += 1;
        self.last = Some(view.clone());
        Ok(())
    }
}
