//! Platform abstraction layer
//!
//! Browser glue lives in `web` (wasm32 only):
//! - Fixed-rate tick interval
//! - Document click listener for buttons
//! - Resize handling and device-class changes
//! - Animation-frame redraw and teardown
//!
//! The helpers below (geometry, overlay style, callback slot) are shared
//! and testable natively.

#[cfg(target_arch = "wasm32")]
pub mod web;

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use crate::px_to_percent;

/// Canvas attribute holding JSON tuning overrides
pub const TUNING_ATTRIBUTE: &str = "data-orbfield-tuning";

/// Inline style forced on the canvas: a full-viewport layer clicks pass through
pub const OVERLAY_STYLE: [(&str, &str); 5] = [
    ("pointer-events", "none"),
    ("position", "fixed"),
    ("inset", "0"),
    ("width", "100%"),
    ("height", "100%"),
];

/// Shared slot for a callback that re-arms itself
///
/// The callback may hold a clone of its own slot to schedule itself again.
/// `clear` breaks that cycle so everything it captured is freed.
pub struct CallbackSlot<T>(Rc<RefCell<Option<T>>>);

impl<T> CallbackSlot<T> {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    pub fn set(&self, callback: T) {
        *self.0.borrow_mut() = Some(callback);
    }

    /// Run `f` on the callback if one is installed
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.0.borrow().as_ref().map(f)
    }

    pub fn clear(&self) -> Option<T> {
        self.0.borrow_mut().take()
    }

    pub fn is_set(&self) -> bool {
        self.0.borrow().is_some()
    }
}

impl<T> Clone for CallbackSlot<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> Default for CallbackSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Center of a client rect as viewport percent
pub fn rect_center_percent(left: f64, top: f64, width: f64, height: f64, viewport: Vec2) -> Vec2 {
    let center = Vec2::new((left + width / 2.0) as f32, (top + height / 2.0) as f32);
    px_to_percent(center, viewport)
}

/// Backing-store size for a canvas of `client` CSS pixels
///
/// Returns the size in device pixels along with the device pixels per CSS
/// pixel. Never returns a zero dimension.
pub fn backing_size(client_w: i32, client_h: i32, dpr: f64, render_scale: f32) -> (u32, u32, f32) {
    let scale = (dpr.max(0.0) * render_scale as f64).max(0.25);
    let w = ((client_w.max(1) as f64) * scale).round().max(1.0) as u32;
    let h = ((client_h.max(1) as f64) * scale).round().max(1.0) as u32;
    (w, h, scale as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_center_percent() {
        let p = rect_center_percent(100.0, 200.0, 200.0, 100.0, Vec2::new(800.0, 500.0));
        assert!((p.x - 25.0).abs() < 1e-4);
        assert!((p.y - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_rect_center_degenerate_viewport() {
        let p = rect_center_percent(10.0, 10.0, 0.0, 0.0, Vec2::ZERO);
        assert_eq!(p, Vec2::splat(50.0));
    }

    #[test]
    fn test_overlay_lets_clicks_through() {
        assert!(OVERLAY_STYLE.contains(&("pointer-events", "none")));
        assert!(OVERLAY_STYLE.contains(&("position", "fixed")));
    }

    #[test]
    fn test_cleared_slot_frees_captures() {
        let app = Rc::new(RefCell::new(0u32));
        let slot: CallbackSlot<Box<dyn Fn() -> u32>> = CallbackSlot::new();

        // Self-referencing callback holding the app, like an animation frame
        let rearm = slot.clone();
        let held = Rc::clone(&app);
        slot.set(Box::new(move || {
            *held.borrow_mut() += 1;
            rearm.with(|_| 1).unwrap_or(0)
        }));
        assert_eq!(slot.with(|frame| frame()), Some(1));
        assert_eq!(*app.borrow(), 1);
        assert_eq!(Rc::strong_count(&app), 2);

        assert!(slot.clear().is_some());
        assert!(!slot.is_set());
        assert_eq!(Rc::strong_count(&app), 1);
        assert_eq!(slot.with(|frame| frame()), None);
    }

    #[test]
    fn test_backing_size() {
        assert_eq!(backing_size(800, 600, 2.0, 0.5), (800, 600, 1.0));
        assert_eq!(backing_size(1000, 500, 1.0, 0.75), (750, 375, 0.75));
        let (w, h, _) = backing_size(0, 0, 1.0, 1.0);
        assert!(w >= 1 && h >= 1);
    }
}
