use std::sync::Arc;

use anyhow::{anyhow, Result};
use glam::Vec2;
use gloo_events::{EventListener, EventListenerOptions};
use wasm_bindgen::JsCast;
use web_sys::{window, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent};

use super::{InputState, KeyCode, MouseButton};

/// Handles DOM input events and updates the shared [`InputState`].
pub struct WasmInputHandler {
    listeners: Vec<EventListener>,
}

impl WasmInputHandler {
    pub fn attach(canvas: &HtmlCanvasElement, input: Arc<InputState>) -> Result<Self> {
        let window = window().ok_or_else(|| anyhow!("window not available"))?;
        let document = window
            .document()
            .ok_or_else(|| anyhow!("document not available"))?;

        let mut listeners = Vec::new();

        // Keys are captured on the whole document so movement works without focusing the canvas.
        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(&document, "keydown", move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                if let Some(code) = KeyCode::from_name(&event.key()) {
                    input_state.press_key(code);
                }
            }));
        }

        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(&document, "keyup", move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                if let Some(code) = KeyCode::from_name(&event.key()) {
                    input_state.release_key(code);
                }
            }));
        }

        // Releasing keys on blur keeps the player from running off while the tab is hidden.
        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(&window, "blur", move |_| {
                input_state.release_all();
            }));
        }

        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(canvas, "pointerdown", move |event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                input_state.move_pointer(offset(event));
                input_state.press_button(MouseButton::from_dom(event.button()));
            }));
        }

        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(&document, "pointerup", move |event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                input_state.release_button(MouseButton::from_dom(event.button()));
            }));
        }

        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(canvas, "pointermove", move |event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    input_state.move_pointer(offset(event));
                }
            }));
        }

        {
            let input_state = Arc::clone(&input);
            let options = EventListenerOptions::enable_prevent_default();
            listeners.push(EventListener::new_with_options(
                canvas,
                "wheel",
                options,
                move |event| {
                    let Some(event) = event.dyn_ref::<WheelEvent>() else {
                        return;
                    };
                    event.prevent_default();
                    input_state.scroll(event.delta_y() as f32);
                },
            ));
        }

        Ok(Self { listeners })
    }
}

impl Drop for WasmInputHandler {
    fn drop(&mut self) {
        self.listeners.clear();
    }
}

fn offset(event: &MouseEvent) -> Vec2 {
    Vec2::new(event.offset_x() as f32, event.offset_y() as f32)
}
