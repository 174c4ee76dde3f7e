//! Cloudscape entry point
//!
//! The browser build hosts the interactive scene; the native build runs a
//! short scripted session headlessly and logs what happened.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_scene {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use cloudscape::Settings;
    use cloudscape::consts::*;
    use cloudscape::renderer::{DrawList, RenderError, RenderState, compose_frame, tessellate};
    use cloudscape::sim::{InputTracker, Interpreter, Key, Scene, TickOutcome, tick};

    /// Browser host failures
    #[derive(Debug, thiserror::Error)]
    pub enum HostError {
        #[error("missing browser object: {0}")]
        Missing(&'static str),

        #[error(transparent)]
        Render(#[from] RenderError),
    }

    /// Everything the frame loop and event handlers share
    struct App {
        scene: Scene,
        interpreter: Interpreter,
        tracker: InputTracker,
        render_state: Option<RenderState>,
        frame: DrawList,
        accumulator: f32,
        last_time: f64,
        running: bool,
        overlay_text: String,
    }

    impl App {
        fn new(scene: Scene) -> Self {
            Self {
                scene,
                interpreter: Interpreter::new(),
                tracker: InputTracker::new(),
                render_state: None,
                frame: DrawList::new(),
                accumulator: 0.0,
                last_time: 0.0,
                running: true,
                overlay_text: String::new(),
            }
        }

        /// Run fixed ticks for the elapsed time
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.tracker.snapshot();
                let (outcome, stats) = tick(&mut self.scene, &mut self.interpreter, &input);
                self.accumulator -= SIM_DT;
                substeps += 1;

                if outcome == TickOutcome::Quit {
                    self.running = false;
                    return;
                }
                if stats.shadows_rebuilt > 0 {
                    log::debug!(
                        "Tick {}: {} shadows rebuilt",
                        self.scene.time_ticks,
                        stats.shadows_rebuilt
                    );
                }
            }
        }

        /// Compose, tessellate and present the current scene
        fn render(&mut self, document: &Document) {
            self.frame.clear();
            compose_frame(&self.scene, self.interpreter.drag(), &mut self.frame);
            let tess = tessellate(&self.frame);

            if let Some(render_state) = self.render_state.as_mut() {
                match render_state.render(&tess.vertices) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        log::warn!("Surface lost, reconfiguring");
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("GPU out of memory, stopping");
                        self.running = false;
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }

            let text = tess
                .labels
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            self.update_overlay(document, text);
        }

        /// Mirror the frame's text labels into the DOM overlay
        fn update_overlay(&mut self, document: &Document, text: String) {
            if text == self.overlay_text {
                return;
            }
            if let Some(el) = document.get_element_by_id("overlay") {
                el.set_text_content(Some(&text));
                let class = if self.scene.params.overlay_visible {
                    "panel"
                } else {
                    "hint"
                };
                let _ = el.set_attribute("class", class);
            }
            self.overlay_text = text;
        }
    }

    /// Optional JSON overrides from `<script id="scene-settings">`
    fn load_settings(document: &Document) -> Settings {
        let Some(el) = document.get_element_by_id("scene-settings") else {
            return Settings::default();
        };
        let json = el.text_content().unwrap_or_default();
        match Settings::from_json(&json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring scene settings: {}", e);
                Settings::default()
            }
        }
    }

    /// Convert a mouse event to scene pixels
    fn scene_point(canvas: &HtmlCanvasElement, event: &MouseEvent) -> Vec2 {
        let rect = canvas.get_bounding_client_rect();
        let scale_x = SCREEN_WIDTH / (rect.width().max(1.0) as f32);
        let scale_y = SCREEN_HEIGHT / (rect.height().max(1.0) as f32);
        Vec2::new(
            (event.client_x() as f64 - rect.left()) as f32 * scale_x,
            (event.client_y() as f64 - rect.top()) as f32 * scale_y,
        )
    }

    pub async fn run() -> Result<(), HostError> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        let window = web_sys::window().ok_or(HostError::Missing("window"))?;
        let document = window.document().ok_or(HostError::Missing("document"))?;
        document.set_title(WINDOW_TITLE);

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or(HostError::Missing("canvas element"))?
            .dyn_into()
            .map_err(|_| HostError::Missing("canvas element"))?;

        // Backing store at device resolution, scene stays 800×600
        let dpr = window.device_pixel_ratio();
        let width = (SCREEN_WIDTH as f64 * dpr) as u32;
        let height = (SCREEN_HEIGHT as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let settings = load_settings(&document);
        let seed = settings.seed.unwrap_or_else(|| js_sys::Date::now() as u64);
        log::info!("Cloudscape starting, seed {}", seed);
        log::info!("Settings: {}", settings.to_log_string());

        let app = Rc::new(RefCell::new(App::new(Scene::new(&settings, seed))));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(RenderError::from)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(RenderError::from)?;
        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = RenderState::new(surface, &adapter, width, height).await?;
        app.borrow_mut().render_state = Some(render_state);

        setup_input_handlers(&window, &canvas, app.clone());
        request_animation_frame(app);
        Ok(())
    }

    fn setup_input_handlers(
        window: &web_sys::Window,
        canvas: &HtmlCanvasElement,
        app: Rc<RefCell<App>>,
    ) {
        // Pointer press on the canvas only
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                if event.button() != 0 {
                    return;
                }
                let pos = scene_point(&canvas_clone, &event);
                app.borrow_mut().tracker.pointer_down(pos);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Move and release are tracked window-wide so drags survive leaving the canvas
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let pos = scene_point(&canvas_clone, &event);
                app.borrow_mut().tracker.pointer_moved(pos);
            });
            let _ = window
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                if event.button() != 0 {
                    return;
                }
                let pos = scene_point(&canvas_clone, &event);
                app.borrow_mut().tracker.pointer_up(pos);
            });
            let _ = window
                .add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Losing focus mid-drag would otherwise leave the button stuck down
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                app.borrow_mut().tracker.pointer_cancel();
            });
            let _ = window
                .add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                if let Some(key) = Key::from_dom_key(&event.key()) {
                    if matches!(key, Key::Up | Key::Down | Key::Left | Key::Right) {
                        event.prevent_default();
                    }
                    app.borrow_mut().tracker.key_down(key);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            log::error!("No window, frame loop stopped");
            return;
        };
        let closure = Closure::once(move |time: f64| {
            frame_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document, frame loop stopped");
            return;
        };

        let running = {
            let mut a = app.borrow_mut();

            let dt = if a.last_time > 0.0 {
                ((time - a.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            a.last_time = time;

            a.update(dt);
            if a.running {
                a.render(&document);
            } else {
                log::info!("Stopped after {} ticks", a.scene.time_ticks);
                a.update_overlay(&document, "Stopped. Reload to start again.".to_owned());
            }
            a.running
        };

        if running {
            request_animation_frame(app);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_scene::run().await {
        log::error!("Cloudscape failed to start: {}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    headless::run();
}

/// Scripted session: drives the scene through the same tick and frame path
/// the browser uses, without a window.
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::time::{SystemTime, UNIX_EPOCH};

    use glam::Vec2;

    use cloudscape::Settings;
    use cloudscape::renderer::{DrawList, compose_frame, tessellate};
    use cloudscape::sim::{InputTracker, Interpreter, Key, Scene, TickOutcome, tick};

    enum Step {
        Idle(u32),
        Press(Key),
        Drag { from: Vec2, to: Vec2, ticks: u32 },
    }

    struct Session {
        scene: Scene,
        interpreter: Interpreter,
        tracker: InputTracker,
        frame: DrawList,
        shadows_rebuilt: usize,
        vertices: usize,
    }

    impl Session {
        fn tick(&mut self) -> TickOutcome {
            let input = self.tracker.snapshot();
            let (outcome, stats) = tick(&mut self.scene, &mut self.interpreter, &input);
            if outcome == TickOutcome::Continue {
                self.shadows_rebuilt += stats.shadows_rebuilt;
                self.frame.clear();
                compose_frame(&self.scene, self.interpreter.drag(), &mut self.frame);
                self.vertices = tessellate(&self.frame).vertices.len();
            }
            outcome
        }

        fn play(&mut self, step: &Step) -> TickOutcome {
            match *step {
                Step::Idle(n) => {
                    for _ in 0..n {
                        if self.tick() == TickOutcome::Quit {
                            return TickOutcome::Quit;
                        }
                    }
                    TickOutcome::Continue
                }
                Step::Press(key) => {
                    self.tracker.key_down(key);
                    self.tick()
                }
                Step::Drag { from, to, ticks } => {
                    self.tracker.pointer_down(from);
                    self.tick();
                    for i in 1..=ticks {
                        self.tracker.pointer_moved(from.lerp(to, i as f32 / ticks as f32));
                        self.tick();
                    }
                    self.tracker.pointer_up(to);
                    self.tick()
                }
            }
        }
    }

    pub fn run() {
        let settings = Settings::default();
        let seed = settings.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        });
        log::info!("Cloudscape (headless) starting, seed {}", seed);
        log::info!("Settings: {}", settings.to_log_string());

        let scene = Scene::new(&settings, seed);
        let sun = scene.sun.pos;
        let tree = scene.trees[0].pos - Vec2::new(0.0, 5.0);

        let script = [
            Step::Idle(30),
            Step::Drag {
                from: sun,
                to: Vec2::new(200.0, 160.0),
                ticks: 20,
            },
            Step::Press(Key::ToggleOverlay),
            Step::Press(Key::Up),
            Step::Press(Key::Up),
            Step::Press(Key::Up),
            Step::Press(Key::ShadowMore),
            Step::Press(Key::Left),
            Step::Drag {
                from: tree,
                to: tree + Vec2::new(60.0, 10.0),
                ticks: 10,
            },
            Step::Press(Key::ToggleOverlay),
            Step::Press(Key::Up),
            Step::Idle(60),
            Step::Press(Key::Quit),
        ];

        let mut session = Session {
            scene,
            interpreter: Interpreter::new(),
            tracker: InputTracker::new(),
            frame: DrawList::new(),
            shadows_rebuilt: 0,
            vertices: 0,
        };
        for step in &script {
            if session.play(step) == TickOutcome::Quit {
                break;
            }
        }

        let scene = &session.scene;
        log::info!(
            "Ran {} ticks: sun at ({:.0}, {:.0}), {} trees, {} active clouds, {} shadow rebuilds",
            scene.time_ticks,
            scene.sun.pos.x,
            scene.sun.pos.y,
            scene.trees.len(),
            scene.active_cloud_count(),
            session.shadows_rebuilt,
        );
        log::info!(
            "Last frame: {} draw calls, {} vertices",
            session.frame.len(),
            session.vertices
        );
        match serde_json::to_string(&scene.params) {
            Ok(json) => log::info!("Final parameters: {}", json),
            Err(e) => log::warn!("Could not serialize parameters: {}", e),
        }
    }
}
