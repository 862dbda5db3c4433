#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use gloo_events::EventListener;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Document, Element, HtmlCanvasElement, Performance, Window};

use crate::input::wasm::WasmInputHandler;
use crate::render::CanvasPresenter;
use crate::{DemoApp, FixedTimestep, FrameRequester, InputState, SceneConfig, TimeSource};

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;
type WebLoop = FixedTimestep<PerformanceClock, AnimationFrames, DemoApp<CanvasPresenter>>;

/// `performance.now()` as a [`TimeSource`].
pub struct PerformanceClock {
    performance: Performance,
}

impl PerformanceClock {
    pub fn new(window: &Window) -> Result<Self> {
        let performance = window
            .performance()
            .ok_or_else(|| anyhow!("performance API not available"))?;
        Ok(Self { performance })
    }
}

impl TimeSource for PerformanceClock {
    fn now(&self) -> Duration {
        Duration::from_secs_f64(self.performance.now().max(0.0) / 1000.0)
    }
}

/// `requestAnimationFrame` as a [`FrameRequester`]. Every request re-arms the same callback.
pub struct AnimationFrames {
    window: Window,
    callback: FrameCallback,
}

impl FrameRequester for AnimationFrames {
    type Handle = i32;

    fn request_frame(&mut self) -> Result<i32> {
        let callback = self.callback.borrow();
        let callback = callback
            .as_ref()
            .ok_or_else(|| anyhow!("frame callback not installed"))?;
        self.window
            .request_animation_frame(callback.as_ref().unchecked_ref::<js_sys::Function>())
            .map_err(|err| anyhow!("requestAnimationFrame failed: {err:?}"))
    }

    fn cancel_frame(&mut self, handle: i32) {
        if let Err(err) = self.window.cancel_animation_frame(handle) {
            log::warn!("cancelAnimationFrame failed: {err:?}");
        }
    }
}

#[wasm_bindgen(start)]
pub fn bootstrap() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Browser entry point: owns the loop, the DOM listeners and the canvases.
#[wasm_bindgen]
pub struct WasmApp {
    inner: Rc<RefCell<WebLoop>>,
    _frame_callback: FrameCallback,
    _input_handler: WasmInputHandler,
    _listeners: Vec<EventListener>,
}

#[wasm_bindgen]
impl WasmApp {
    /// `minimap_id` may name a canvas or a container; a canvas is appended to a container.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: String,
        minimap_id: String,
        scene_xml: Option<String>,
    ) -> Result<WasmApp, JsValue> {
        let config = match scene_xml.as_deref() {
            Some(xml) => SceneConfig::from_xml(xml).map_err(js_error)?,
            None => SceneConfig::default(),
        };

        let window = window().ok_or_else(|| JsValue::from_str("window not available"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("document not available"))?;
        let canvas = document
            .get_element_by_id(&canvas_id)
            .ok_or_else(|| JsValue::from_str("canvas element not found"))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str("element is not a canvas"))?;
        let minimap_container = document
            .get_element_by_id(&minimap_id)
            .ok_or_else(|| JsValue::from_str("minimap element not found"))?;
        let minimap_canvas = minimap_canvas(&document, &minimap_container).map_err(js_error)?;

        let presenter = CanvasPresenter::new(canvas.clone(), minimap_canvas).map_err(js_error)?;
        let input = Arc::new(InputState::new());
        let input_handler =
            WasmInputHandler::attach(&canvas, Arc::clone(&input)).map_err(js_error)?;

        let mut app = DemoApp::new(config, input, presenter);
        let (width, height, ratio) = viewport(&window);
        app.resize(width, height, ratio);

        let scheduler_config = app.config().scheduler_config();
        let frame_callback: FrameCallback = Rc::new(RefCell::new(None));
        let frames = AnimationFrames {
            window: window.clone(),
            callback: Rc::clone(&frame_callback),
        };
        let clock = PerformanceClock::new(&window).map_err(js_error)?;
        let inner = Rc::new(RefCell::new(FixedTimestep::new(
            scheduler_config,
            clock,
            frames,
            app,
        )));

        let weak = Rc::downgrade(&inner);
        *frame_callback.borrow_mut() = Some(Closure::wrap(Box::new(move |_timestamp: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut scheduler = inner.borrow_mut();
            match scheduler.on_frame() {
                Ok(report) => scheduler.handler_mut().record_frame_time(report.raw_delta),
                Err(err) => log::error!("animation loop halted: {:?}", anyhow::Error::from(err)),
            }
        }) as Box<dyn FnMut(f64)>));

        let mut listeners = Vec::new();
        {
            let inner = Rc::clone(&inner);
            let container = minimap_container.clone();
            listeners.push(EventListener::new(&minimap_container, "click", move |_| {
                if let Err(err) = container.class_list().toggle("expanded") {
                    log::warn!("failed to toggle minimap class: {err:?}");
                }
                inner.borrow_mut().handler_mut().toggle_minimap();
            }));
        }
        {
            let inner = Rc::clone(&inner);
            let resize_window = window.clone();
            listeners.push(EventListener::new(&window, "resize", move |_| {
                let (width, height, ratio) = viewport(&resize_window);
                inner.borrow_mut().handler_mut().resize(width, height, ratio);
            }));
        }

        Ok(Self {
            inner,
            _frame_callback: frame_callback,
            _input_handler: input_handler,
            _listeners: listeners,
        })
    }

    pub fn start(&self) -> Result<(), JsValue> {
        self.inner.borrow_mut().start().map_err(js_error)
    }

    pub fn stop(&self) {
        self.inner.borrow_mut().stop();
    }

    pub fn reset(&self) {
        self.inner.borrow_mut().reset();
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.inner.borrow().is_running()
    }

    #[wasm_bindgen(js_name = toggleMinimap)]
    pub fn toggle_minimap(&self) {
        self.inner.borrow_mut().handler_mut().toggle_minimap();
    }

    #[wasm_bindgen(js_name = setBackground)]
    pub fn set_background(&self, hex: String) -> Result<(), JsValue> {
        self.inner
            .borrow_mut()
            .handler_mut()
            .set_background(&hex)
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = setDebugValue)]
    pub fn set_debug_value(&self, value: f32) -> f32 {
        self.inner.borrow_mut().handler_mut().set_debug_value(value)
    }

    pub fn fps(&self) -> f32 {
        self.inner.borrow().handler().debug().fps().fps()
    }
}

fn minimap_canvas(document: &Document, container: &Element) -> Result<HtmlCanvasElement> {
    if let Some(canvas) = container.dyn_ref::<HtmlCanvasElement>() {
        return Ok(canvas.clone());
    }
    let canvas = document
        .create_element("canvas")
        .map_err(|err| anyhow!("failed to create minimap canvas: {err:?}"))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| anyhow!("created element is not a canvas"))?;
    container
        .append_child(&canvas)
        .map_err(|err| anyhow!("failed to attach minimap canvas: {err:?}"))?;
    Ok(canvas)
}

fn viewport(window: &Window) -> (u32, u32, f64) {
    let dimension = |value: Result<JsValue, JsValue>| {
        value
            .ok()
            .and_then(|value| value.as_f64())
            .map(|value| value.max(1.0) as u32)
            .unwrap_or(1)
    };
    (
        dimension(window.inner_width()),
        dimension(window.inner_height()),
        window.device_pixel_ratio(),
    )
}

fn js_error(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
