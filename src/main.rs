//! Orb field entry point
//!
//! In the browser this mounts the effect on `#orbfield`. Natively it runs a
//! short headless episode and logs what happens.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_entry {
    use std::cell::RefCell;

    use orbfield::platform::web::{OrbFieldHandle, mount};

    /// Canvas id the page is expected to provide
    const CANVAS_ID: &str = "orbfield";

    thread_local! {
        static HANDLE: RefCell<Option<OrbFieldHandle>> = const { RefCell::new(None) };
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"orbfield: logger already initialized".into());
        }

        match mount(CANVAS_ID.to_string()).await {
            Ok(handle) => HANDLE.with(|h| *h.borrow_mut() = Some(handle)),
            Err(e) => log::warn!("Orb field not mounted: {:?}", e),
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_entry::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Orb field (native) starting...");
    log::info!("Rendering needs a browser - run with `trunk serve` for the web version");

    run_headless_episode();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Tick a desktop field for five seconds with one click at 500 ms
#[cfg(not(target_arch = "wasm32"))]
fn run_headless_episode() {
    use glam::Vec2;
    use orbfield::sim::{FieldEvent, OrbField, TickInput, tick};
    use orbfield::tuning::{DeviceClass, Tuning};

    let tuning = Tuning::for_device(DeviceClass::Desktop);
    let step = tuning.tick_ms as f64;
    let mut field = OrbField::new(42, tuning, 0.0);

    let mut now = 0.0;
    let mut clicked = false;
    while now <= 5000.0 {
        let trigger = if !clicked && now >= 500.0 {
            clicked = true;
            Some(Vec2::splat(50.0))
        } else {
            None
        };
        for event in tick(&mut field, &TickInput { now_ms: now, trigger }) {
            if event != FieldEvent::Met {
                log::info!("{:>6.0} ms  {:?} ({:?})", now, event, field.episode_phase());
            }
        }
        now += step;
    }

    for orb in field.orbs() {
        log::info!(
            "{}  pos ({:6.1}, {:6.1})  size {:5.1}  opacity {:.2}",
            orb.id,
            orb.pos.x,
            orb.pos.y,
            orb.size,
            orb.opacity()
        );
    }
    println!("✓ Headless episode finished after {} ticks", field.time_ticks());
}
