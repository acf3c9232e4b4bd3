//! Browser mount of the orb field
//!
//! One interval drives the simulation, animation frames redraw the latest
//! snapshot. Everything registered here is released when the `Mount` drops.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use glam::Vec2;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event, HtmlCanvasElement, Window};

use super::{CallbackSlot, OVERLAY_STYLE, TUNING_ATTRIBUTE, backing_size, rect_center_percent};
use crate::renderer::{OpacityTransitions, OrbRenderState, VisualStyle, orb_visuals};
use crate::settings::{QualityPreset, Settings};
use crate::sim::{FieldEvent, OrbField, TickInput, tick};
use crate::tuning::{DeviceClass, Tuning};

fn viewport(window: &Window) -> Vec2 {
    let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    Vec2::new(w as f32, h as f32)
}

fn user_agent(window: &Window) -> String {
    window.navigator().user_agent().unwrap_or_default()
}

fn detect_device(window: &Window) -> DeviceClass {
    DeviceClass::detect(viewport(window).x as f64, &user_agent(window))
}

/// Everything the callbacks share
struct App {
    field: OrbField,
    pending_trigger: Option<Vec2>,
    render_state: Option<OrbRenderState>,
    transitions: OpacityTransitions,
    settings: Settings,
    overrides: Option<String>,
    canvas: HtmlCanvasElement,
}

impl App {
    fn tick(&mut self, now_ms: f64) {
        let input = TickInput {
            now_ms,
            trigger: self.pending_trigger.take(),
        };
        for event in tick(&mut self.field, &input) {
            match event {
                FieldEvent::Met => {}
                other => log::debug!("Orb field event: {:?}", other),
            }
        }
    }

    /// Match the canvas backing store to its CSS size
    fn fit_canvas(&mut self, window: &Window) {
        let (width, height, scale) = backing_size(
            self.canvas.client_width(),
            self.canvas.client_height(),
            window.device_pixel_ratio(),
            self.settings.quality.render_scale(),
        );
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        if let Some(ref mut render_state) = self.render_state {
            render_state.resize(width, height, scale);
        }
    }

    fn render(&mut self, time_ms: f64) {
        let viewport = Vec2::new(
            self.canvas.client_width() as f32,
            self.canvas.client_height() as f32,
        );
        let style = VisualStyle::new(self.field.tuning(), &self.settings);
        let Some(ref mut render_state) = self.render_state else {
            return;
        };
        let time_s = (time_ms / 1000.0) as f32;
        let visuals = orb_visuals(
            self.field.orbs(),
            viewport,
            time_s,
            &style,
            &mut self.transitions,
        );
        match render_state.render(&visuals, time_s) {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                render_state.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory!");
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }
    }

    /// Re-check the device class and swap tuning if it changed
    ///
    /// Returns the new tick interval when the class changed.
    fn refresh_device(&mut self, window: &Window) -> Option<u32> {
        let device = detect_device(window);
        if device == self.field.tuning().device {
            return None;
        }
        let tuning = Tuning::resolve(device, self.overrides.as_deref());
        let tick_ms = tuning.tick_ms;
        self.field.set_tuning(tuning);
        Some(tick_ms)
    }
}

async fn init_renderer(
    canvas: &HtmlCanvasElement,
    width: u32,
    height: u32,
    scale: f32,
) -> Option<OrbRenderState> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
        ..Default::default()
    });

    let surface = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
        Ok(surface) => surface,
        Err(e) => {
            log::warn!("Orb field disabled, no surface: {:?}", e);
            return None;
        }
    };

    let adapter = match instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        })
        .await
    {
        Ok(adapter) => adapter,
        Err(e) => {
            log::warn!("Orb field disabled, no adapter: {:?}", e);
            return None;
        }
    };
    log::debug!("Using adapter: {:?}", adapter.get_info().name);

    match OrbRenderState::new(surface, &adapter, width, height, scale).await {
        Ok(render_state) => Some(render_state),
        Err(e) => {
            log::warn!("Orb field disabled, no device: {:?}", e);
            None
        }
    }
}

fn schedule_interval(window: &Window, handler: &js_sys::Function, tick_ms: u32) -> Option<i32> {
    match window.set_interval_with_callback_and_timeout_and_arguments_0(handler, tick_ms as i32) {
        Ok(id) => Some(id),
        Err(e) => {
            log::warn!("Failed to start orb tick: {:?}", e);
            None
        }
    }
}

type FrameCallback = Closure<dyn FnMut(f64)>;

/// Start the redraw loop; one closure re-arms itself every frame
///
/// The closure only holds the app weakly, and clearing the returned slot
/// frees the closure itself.
fn start_frames(
    window: &Window,
    app: Weak<RefCell<App>>,
    alive: Rc<Cell<bool>>,
    raf: Rc<Cell<Option<i32>>>,
) -> CallbackSlot<FrameCallback> {
    let slot = CallbackSlot::new();
    let rearm = slot.clone();
    let frame_window = window.clone();
    let frame_raf = raf.clone();
    slot.set(Closure::<dyn FnMut(f64)>::new(move |time: f64| {
        let Some(app) = app.upgrade().filter(|_| alive.get()) else {
            return;
        };
        app.borrow_mut().render(time);
        let next = rearm
            .with(|frame: &FrameCallback| {
                frame_window
                    .request_animation_frame(frame.as_ref().unchecked_ref())
                    .ok()
            })
            .flatten();
        frame_raf.set(next);
    }));
    let first = slot
        .with(|frame| window.request_animation_frame(frame.as_ref().unchecked_ref()).ok())
        .flatten();
    raf.set(first);
    slot
}

/// A live orb field on a canvas; dropping it tears everything down
struct Mount {
    app: Rc<RefCell<App>>,
    window: Window,
    alive: Rc<Cell<bool>>,
    interval: Rc<Cell<Option<i32>>>,
    raf: Rc<Cell<Option<i32>>>,
    frame: CallbackSlot<FrameCallback>,
    _tick: Closure<dyn FnMut()>,
    click: Closure<dyn FnMut(Event)>,
    resize: Closure<dyn FnMut(Event)>,
}

impl Mount {
    fn start(window: Window, app: App) -> Result<Self, JsValue> {
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let app = Rc::new(RefCell::new(app));
        let alive = Rc::new(Cell::new(true));
        let interval = Rc::new(Cell::new(None));
        let raf = Rc::new(Cell::new(None));

        // Simulation clock
        let tick = {
            let app = app.clone();
            let alive = alive.clone();
            Closure::<dyn FnMut()>::new(move || {
                if alive.get() {
                    app.borrow_mut().tick(js_sys::Date::now());
                }
            })
        };
        let tick_fn: js_sys::Function = tick.as_ref().unchecked_ref::<js_sys::Function>().clone();

        // Any click on a button (or inside one) scatters the orbs
        let click = {
            let app = app.clone();
            let window = window.clone();
            Closure::<dyn FnMut(_)>::new(move |event: Event| {
                let Some(button) = event
                    .target()
                    .and_then(|t| t.dyn_into::<Element>().ok())
                    .and_then(|el| el.closest("button").ok().flatten())
                else {
                    return;
                };
                let rect = button.get_bounding_client_rect();
                let origin = rect_center_percent(
                    rect.left(),
                    rect.top(),
                    rect.width(),
                    rect.height(),
                    viewport(&window),
                );
                app.borrow_mut().pending_trigger = Some(origin);
            })
        };
        document.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;

        // Resize refits the canvas and may switch device class
        let resize = {
            let app = app.clone();
            let window = window.clone();
            let interval = interval.clone();
            let tick_fn = tick_fn.clone();
            Closure::<dyn FnMut(_)>::new(move |_event: Event| {
                let changed = {
                    let mut app = app.borrow_mut();
                    app.fit_canvas(&window);
                    app.refresh_device(&window)
                };
                if let Some(tick_ms) = changed {
                    if let Some(id) = interval.take() {
                        window.clear_interval_with_handle(id);
                    }
                    interval.set(schedule_interval(&window, &tick_fn, tick_ms));
                }
            })
        };
        window.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref())?;

        let tick_ms = app.borrow().field.tuning().tick_ms;
        interval.set(schedule_interval(&window, &tick_fn, tick_ms));
        let frame = start_frames(&window, Rc::downgrade(&app), alive.clone(), raf.clone());

        Ok(Self {
            app,
            window,
            alive,
            interval,
            raf,
            frame,
            _tick: tick,
            click,
            resize,
        })
    }
}

impl Drop for Mount {
    fn drop(&mut self) {
        self.alive.set(false);
        if let Some(id) = self.interval.take() {
            self.window.clear_interval_with_handle(id);
        }
        if let Some(id) = self.raf.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        self.frame.clear();
        if let Some(document) = self.window.document() {
            let _ = document
                .remove_event_listener_with_callback("click", self.click.as_ref().unchecked_ref());
        }
        let _ = self
            .window
            .remove_event_listener_with_callback("resize", self.resize.as_ref().unchecked_ref());
        log::info!("Orb field unmounted");
    }
}

/// Handle returned to the page
#[wasm_bindgen]
pub struct OrbFieldHandle {
    mount: Option<Mount>,
}

#[wasm_bindgen]
impl OrbFieldHandle {
    /// Stop the effect and release every timer and listener
    pub fn unmount(&mut self) {
        self.mount = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.is_some()
    }

    /// A scatter episode is playing
    pub fn is_interacting(&self) -> bool {
        self.mount
            .as_ref()
            .is_some_and(|m| m.app.borrow().field.is_interacting())
    }

    /// Switch quality preset ("low", "medium", "high") and persist it
    pub fn set_quality(&mut self, preset: &str) -> bool {
        let (Some(mount), Some(quality)) = (self.mount.as_ref(), QualityPreset::from_str(preset))
        else {
            return false;
        };
        let mut app = mount.app.borrow_mut();
        app.settings.quality = quality;
        app.settings.save();
        app.fit_canvas(&mount.window);
        true
    }
}

/// Mount the orb field on the canvas with id `canvas_id`
///
/// A missing GPU is not an error: the field still runs, nothing is drawn.
#[wasm_bindgen]
pub async fn mount(canvas_id: String) -> Result<OrbFieldHandle, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas: HtmlCanvasElement = document
        .get_element_by_id(&canvas_id)
        .ok_or_else(|| JsValue::from_str("no canvas"))?
        .dyn_into()
        .map_err(|_| JsValue::from_str("not a canvas"))?;

    // Full-viewport layer that never swallows clicks meant for buttons
    let style = canvas.style();
    for (name, value) in OVERLAY_STYLE {
        style.set_property(name, value)?;
    }

    let settings = Settings::load();
    let overrides = canvas.get_attribute(TUNING_ATTRIBUTE);
    let tuning = Tuning::resolve(detect_device(&window), overrides.as_deref());

    let (width, height, scale) = backing_size(
        canvas.client_width(),
        canvas.client_height(),
        window.device_pixel_ratio(),
        settings.quality.render_scale(),
    );
    canvas.set_width(width);
    canvas.set_height(height);
    let render_state = init_renderer(&canvas, width, height, scale).await;

    let now = js_sys::Date::now();
    let app = App {
        field: OrbField::new(now as u64, tuning, now),
        pending_trigger: None,
        render_state,
        transitions: OpacityTransitions::new(),
        settings,
        overrides,
        canvas,
    };

    let mount = Mount::start(window, app)?;
    Ok(OrbFieldHandle { mount: Some(mount) })
}
