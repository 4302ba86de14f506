//! Browser host and the JS-facing scene handle

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Event, EventTarget, HtmlCanvasElement, MouseEvent, Window,
};

use super::{FrameHandle, Host, HostError, ListenerHandle, ListenerKind};
use crate::audio::AudioManager;
use crate::driver::{Collaborators, SceneLoop, SoundPlayer};
use crate::experience::ExperienceLedger;
use crate::renderer::Canvas2d;
use crate::settings::Settings;
use crate::sim::{PointerInput, Viewport};
use crate::tasks::LocalTaskStore;

type SharedLoop = Rc<RefCell<SceneLoop<BrowserHost>>>;
type WeakLoop = Weak<RefCell<SceneLoop<BrowserHost>>>;

struct InstalledListener {
    target: EventTarget,
    kind: ListenerKind,
    callback: Closure<dyn FnMut(Event)>,
}

/// Host backed by the window, the document and one canvas element
pub struct BrowserHost {
    window: Window,
    canvas: HtmlCanvasElement,
    painter: Canvas2d,
    scene: WeakLoop,
    /// Reused for every requestAnimationFrame; freed with the host
    frame_callback: Option<Closure<dyn FnMut(f64)>>,
    listeners: HashMap<ListenerHandle, InstalledListener>,
    next_listener: u32,
}

impl BrowserHost {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, HostError> {
        let window = web_sys::window().ok_or_else(|| HostError("no window".to_string()))?;
        let ctx = canvas
            .get_context("2d")
            .map_err(js_error)?
            .ok_or_else(|| HostError("2d context unavailable".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| HostError("canvas returned a non-2d context".to_string()))?;

        Ok(Self {
            window,
            canvas,
            painter: Canvas2d::new(ctx),
            scene: Weak::new(),
            frame_callback: None,
            listeners: HashMap::new(),
            next_listener: 1,
        })
    }

    /// Point frame and listener callbacks at the loop that owns this host
    fn bind(&mut self, scene: WeakLoop) {
        let mut painter = self.painter.clone();
        let frame_scene = scene.clone();
        self.frame_callback = Some(Closure::<dyn FnMut(f64)>::new(move |time: f64| {
            let Some(scene) = frame_scene.upgrade() else {
                return;
            };
            match scene.try_borrow_mut() {
                Ok(mut scene_loop) => {
                    scene_loop.on_frame(time, &mut painter);
                }
                Err(_) => log::warn!("Frame at {:.1}ms skipped, scene busy", time),
            }
        }));
        self.scene = scene;
    }
}

/// Pointer position in canvas pixels
fn canvas_point(canvas: &HtmlCanvasElement, event: &MouseEvent) -> (f32, f32) {
    let rect = canvas.get_bounding_client_rect();
    (
        (event.client_x() as f64 - rect.left()) as f32,
        (event.client_y() as f64 - rect.top()) as f32,
    )
}

impl Host for BrowserHost {
    fn screen_size(&self) -> (f32, f32) {
        let width = self.window.inner_width().ok().and_then(|v| v.as_f64());
        let height = self.window.inner_height().ok().and_then(|v| v.as_f64());
        (width.unwrap_or(0.0) as f32, height.unwrap_or(0.0) as f32)
    }

    fn resize_surface(&mut self, viewport: Viewport) {
        self.canvas.set_width(viewport.width as u32);
        self.canvas.set_height(viewport.height as u32);
    }

    fn request_frame(&mut self) -> Result<FrameHandle, HostError> {
        let callback = self
            .frame_callback
            .as_ref()
            .ok_or_else(|| HostError("host is not bound to a scene".to_string()))?;
        let id = self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .map_err(js_error)?;
        Ok(FrameHandle(id))
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Err(e) = self.window.cancel_animation_frame(handle.0) {
            log::warn!("cancelAnimationFrame failed: {:?}", e);
        }
    }

    fn add_listener(&mut self, kind: ListenerKind) -> Result<ListenerHandle, HostError> {
        let target: EventTarget = match kind {
            ListenerKind::Resize => self.window.clone().into(),
            ListenerKind::PointerDown => self
                .window
                .document()
                .ok_or_else(|| HostError("no document".to_string()))?
                .into(),
            ListenerKind::Click => self.canvas.clone().into(),
        };

        let scene = self.scene.clone();
        let canvas = self.canvas.clone();
        let callback = Closure::<dyn FnMut(_)>::new(move |event: Event| {
            let Some(scene) = scene.upgrade() else {
                return;
            };
            let Ok(mut scene_loop) = scene.try_borrow_mut() else {
                return;
            };
            if kind == ListenerKind::Resize {
                scene_loop.on_resize();
                return;
            }
            let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let (x, y) = canvas_point(&canvas, mouse);
            let input = if mouse.shift_key() {
                PointerInput::modified_click(x, y)
            } else {
                PointerInput::click(x, y)
            };
            scene_loop.on_listener_event(kind, input);
        });

        target
            .add_event_listener_with_callback(kind.event_name(), callback.as_ref().unchecked_ref())
            .map_err(js_error)?;

        let handle = ListenerHandle(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(
            handle,
            InstalledListener {
                target,
                kind,
                callback,
            },
        );
        Ok(handle)
    }

    fn remove_listener(&mut self, handle: ListenerHandle) {
        let Some(listener) = self.listeners.remove(&handle) else {
            return;
        };
        if let Err(e) = listener.target.remove_event_listener_with_callback(
            listener.kind.event_name(),
            listener.callback.as_ref().unchecked_ref(),
        ) {
            log::warn!("Could not remove {} listener: {:?}", listener.kind.event_name(), e);
        }
    }
}

fn js_error(e: JsValue) -> HostError {
    HostError(format!("{:?}", e))
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Scene handle exposed to the page
#[wasm_bindgen]
pub struct BubbleScene {
    scene: SharedLoop,
    ledger: Rc<RefCell<ExperienceLedger>>,
}

#[wasm_bindgen]
impl BubbleScene {
    /// Mount a scene on the canvas with the given element id
    pub fn mount(canvas_id: &str) -> Result<BubbleScene, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element #{}", canvas_id)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str(&format!("#{} is not a canvas", canvas_id)))?;

        let mut settings = Settings::load();
        if let Some(window) = web_sys::window() {
            if let Ok(search) = window.location().search() {
                if settings.apply_query(&search) {
                    settings.save();
                }
            }
        }
        let ledger = Rc::new(RefCell::new(ExperienceLedger::load()));
        let sound: Option<Box<dyn SoundPlayer>> = if settings.pop_sound {
            Some(Box::new(AudioManager::new(&settings)))
        } else {
            None
        };
        let collaborators = Collaborators {
            tasks: Box::new(LocalTaskStore),
            rewards: Box::new(ledger.clone()),
            sound,
        };

        let host = BrowserHost::new(canvas).map_err(to_js)?;
        let seed = js_sys::Date::now() as u64;
        let scene = Rc::new(RefCell::new(SceneLoop::new(host, seed, settings, collaborators)));
        {
            let mut scene_loop = scene.borrow_mut();
            scene_loop.host_mut().bind(Rc::downgrade(&scene));
            scene_loop.mount().map_err(to_js)?;
        }

        Ok(Self { scene, ledger })
    }

    /// Stop the animation and detach every listener
    pub fn unmount(&self) {
        match self.scene.try_borrow_mut() {
            Ok(mut scene_loop) => scene_loop.unmount(),
            Err(_) => log::error!("Unmount requested while the scene was busy"),
        }
    }

    pub fn create_task(&self, label: &str) -> Result<(), JsValue> {
        self.scene
            .try_borrow_mut()
            .map_err(to_js)?
            .create_task(label)
            .map(|_| ())
            .map_err(to_js)
    }

    /// Label given to the next mini attached with a shift-click
    pub fn set_pending_label(&self, label: &str) {
        if let Ok(mut scene_loop) = self.scene.try_borrow_mut() {
            scene_loop.set_pending_label(label);
        }
    }

    /// Label the next shift-click will give its mini
    pub fn pending_label(&self) -> String {
        self.scene
            .try_borrow()
            .map(|s| s.pending_label().to_string())
            .unwrap_or_default()
    }

    /// Experience earned so far
    pub fn experience(&self) -> f64 {
        self.ledger.borrow().total as f64
    }

    pub fn bubble_count(&self) -> u32 {
        self.scene
            .try_borrow()
            .map(|s| s.scene().bubbles.len() as u32)
            .unwrap_or(0)
    }
}

impl Drop for BubbleScene {
    fn drop(&mut self) {
        self.unmount();
    }
}
