//! Bubble Galaxy entry point
//!
//! Mounts the scene on the page canvas in the browser; natively it drives a
//! short headless session and logs what happened.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_page {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlInputElement, KeyboardEvent};

    use bubble_galaxy::platform::web::BubbleScene;

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Bubble Galaxy starting...");

        let window = web_sys::window().expect("No window");
        let document = window.document().expect("No document");

        if let Some(loading) = document.get_element_by_id("loading") {
            loading.set_class_name("hidden");
        }

        let scene = match BubbleScene::mount("canvas") {
            Ok(scene) => Rc::new(scene),
            Err(e) => {
                log::error!("Could not mount scene: {:?}", e);
                return;
            }
        };

        let task_input = document
            .get_element_by_id("task-input")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok());
        let mini_input = document
            .get_element_by_id("mini-label")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok());

        if let Some(input) = task_input.clone() {
            setup_task_input(&input, scene.clone());
        }
        if let Some(input) = mini_input {
            setup_mini_label(&input, scene.clone());
        }
        if let (Some(btn), Some(input)) = (document.get_element_by_id("add-task"), task_input) {
            let scene = scene.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                submit_task(&input, &scene);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        update_xp(&scene);
        SCENE.with(|slot| *slot.borrow_mut() = Some(scene));
    }

    thread_local! {
        /// Keeps the mounted scene alive for the page's lifetime
        static SCENE: RefCell<Option<Rc<BubbleScene>>> = const { RefCell::new(None) };
    }

    fn submit_task(input: &HtmlInputElement, scene: &BubbleScene) {
        match scene.create_task(&input.value()) {
            Ok(()) => input.set_value(""),
            Err(e) => log::warn!("Task not created: {:?}", e),
        }
    }

    fn update_xp(scene: &BubbleScene) {
        let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("xp"))
        else {
            return;
        };
        el.set_text_content(Some(&format!("{} XP", scene.experience())));
    }

    fn setup_task_input(input: &HtmlInputElement, scene: Rc<BubbleScene>) {
        let field = input.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            if event.key() == "Enter" {
                submit_task(&field, &scene);
            }
        });
        let _ = input.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_mini_label(input: &HtmlInputElement, scene: Rc<BubbleScene>) {
        {
            let field = input.clone();
            let scene = scene.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                scene.set_pending_label(&field.value());
            });
            let _ = input.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // The scene consumes the label only when a mini is attached; mirror
        // its label into the field and refresh the XP counter after every click
        let document = web_sys::window().and_then(|w| w.document());
        if let Some(document) = document {
            let field = input.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::MouseEvent| {
                if event.shift_key() {
                    let label = scene.pending_label();
                    if field.value() != label {
                        field.set_value(&label);
                    }
                }
                update_xp(&scene);
            });
            let _ = document.add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_page::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Bubble Galaxy (native) starting...");
    log::info!("Native mode runs headless - use `trunk serve` for the web version");

    headless_session();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Mount a scene on a headless host, play with it for a few seconds, unmount
#[cfg(not(target_arch = "wasm32"))]
fn headless_session() {
    use std::cell::RefCell;
    use std::rc::Rc;

    use bubble_galaxy::platform::HeadlessHost;
    use bubble_galaxy::renderer::FrameRecorder;
    use bubble_galaxy::sim::PointerInput;
    use bubble_galaxy::tasks::MemoryTaskStore;
    use bubble_galaxy::{Collaborators, ExperienceLedger, SceneLoop, Settings};

    let ledger = Rc::new(RefCell::new(ExperienceLedger::load()));
    let collaborators = Collaborators {
        tasks: Box::new(MemoryTaskStore::new()),
        rewards: Box::new(ledger.clone()),
        sound: None,
    };
    let mut scene = SceneLoop::new(
        HeadlessHost::new(1280.0, 1024.0),
        42,
        Settings::load(),
        collaborators,
    );
    if let Err(e) = scene.mount() {
        log::error!("Mount failed: {}", e);
        return;
    }

    let mut canvas = FrameRecorder::new();
    for label in ["Water plants", "Write report"] {
        if let Err(e) = scene.create_task(label) {
            log::warn!("Could not create '{}': {}", label, e);
        }
    }

    let mut time_ms = 0.0;
    let mut step = |scene: &mut SceneLoop<HeadlessHost>, frames: u32| {
        for _ in 0..frames {
            scene.host_mut().take_frame();
            scene.on_frame(time_ms, &mut canvas);
            time_ms += 1000.0 / 60.0;
        }
    };
    step(&mut scene, 60);

    // Attach two minis to the first bubble, then pop everything
    if let Some(pos) = scene.scene().bubbles.first().map(|b| b.pos) {
        for label in ["step 1", "step 2"] {
            scene.set_pending_label(label);
            scene.on_pointer(PointerInput::modified_click(pos.x, pos.y));
        }
    }
    step(&mut scene, 30);

    for _ in 0..32 {
        let Some(target) = next_target(&scene) else {
            break;
        };
        let outcome = scene.on_pointer(PointerInput::click(target.x, target.y));
        log::info!("Click at ({:.0}, {:.0}): {:?}", target.x, target.y, outcome);
    }
    step(&mut scene, 30);

    scene.unmount();
    println!(
        "Rendered {} frames, earned {} XP, {} bubbles left",
        scene.frames_rendered(),
        ledger.borrow().total,
        scene.scene().bubbles.len()
    );
}

/// First mini if any bubble has one, else the first bubble
#[cfg(not(target_arch = "wasm32"))]
fn next_target<H: bubble_galaxy::platform::Host>(
    scene: &bubble_galaxy::SceneLoop<H>,
) -> Option<glam::Vec2> {
    let bubbles = &scene.scene().bubbles;
    bubbles
        .iter()
        .flat_map(|b| b.minis.iter().map(|m| m.pos))
        .next()
        .or_else(|| bubbles.first().map(|b| b.pos))
}
