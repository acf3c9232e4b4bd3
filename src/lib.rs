//! Orbfield - decorative lava-lamp orbs behind a portfolio page
//!
//! Core modules:
//! - `sim`: Deterministic orb simulation (motion, proximity, scatter episodes)
//! - `renderer`: Orb visuals and the WebGPU pipeline that draws them
//! - `platform`: Browser mounting, timers, click/resize input
//! - `tuning`: Device-class tuning profiles
//! - `settings`: Render preferences

pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::{QualityPreset, Settings};
pub use tuning::{DeviceClass, Tuning};

use glam::Vec2;

/// Simulation and timing constants
///
/// Positions are percentages of the viewport (0..100 on each axis), sizes are
/// pixel diameters, times are milliseconds.
pub mod consts {
    /// Tick interval on desktop (~30 Hz)
    pub const TICK_MS_DESKTOP: u32 = 33;
    /// Tick interval on mobile (20 Hz)
    pub const TICK_MS_MOBILE: u32 = 50;
    /// Viewports narrower than this are mobile
    pub const MOBILE_MAX_WIDTH: f64 = 768.0;

    pub const ORB_COUNT_DESKTOP: usize = 8;
    pub const ORB_COUNT_MOBILE: usize = 4;

    /// Size bounds during ambient motion
    pub const MIN_SIZE: f32 = 20.0;
    pub const MAX_SIZE: f32 = 120.0;
    /// Range for freshly rolled target sizes
    pub const TARGET_SIZE_MIN: f32 = 40.0;
    pub const TARGET_SIZE_MAX: f32 = 100.0;

    /// Ambient position clamp
    pub const AMBIENT_MIN: f32 = -5.0;
    pub const AMBIENT_MAX: f32 = 105.0;
    /// Re-target range (slight overshoot for edge exploration)
    pub const RETARGET_MIN: f32 = -10.0;
    pub const RETARGET_MAX: f32 = 110.0;
    /// Distance outside the viewport where entering orbs start
    pub const EDGE_OFFSET: f32 = 10.0;

    /// Below this distance an orb snaps onto its target
    pub const SNAP_DISTANCE: f32 = 1.0;
    /// Fraction of the size gap closed per tick
    pub const SIZE_EASE: f32 = 0.05;

    pub const RETARGET_CHANCE_DESKTOP: f64 = 0.015;
    pub const RETARGET_CHANCE_MOBILE: f64 = 0.008;

    /// Ambient step fraction (times 100 = percent per tick)
    pub const AMBIENT_SPEED: f32 = 0.015;
    pub const INITIAL_SPEED_MIN: f32 = 0.01;
    pub const INITIAL_SPEED_MAX: f32 = 0.03;

    /// Pull applied to a target when another orb is close
    pub const ATTRACT_FORCE: f32 = 0.1;
    /// Share of the smaller orb's size absorbed by the larger one
    pub const ABSORB_FRACTION: f32 = 0.1;
    /// Bookkeeping-only meeting threshold
    pub const MEETING_DISTANCE: f32 = 15.0;
    pub const MEETING_HOLD_MS: f64 = 2000.0;
    pub const POST_MEETING_MS: f64 = 2000.0;

    /// Steady opacity is `OPACITY_BASE + size / OPACITY_SIZE_DIVISOR`
    pub const OPACITY_BASE: f32 = 0.3;
    pub const OPACITY_SIZE_DIVISOR: f32 = 200.0;
    /// Opacity of orbs entering the scene
    pub const ENTRY_OPACITY: f32 = 0.1;
    /// Delay after mount before the intro fade-in
    pub const INTRO_FADE_MS: f64 = 1000.0;

    /// Click origin is clamped into this band on both axes
    pub const CLICK_CLAMP_MIN: f32 = 10.0;
    pub const CLICK_CLAMP_MAX: f32 = 90.0;
    /// Scatter destinations lie this far from the click origin
    pub const SCATTER_RADIUS_MIN: f32 = 150.0;
    pub const SCATTER_RADIUS_MAX: f32 = 250.0;
    /// Duration of the parabolic scatter ease
    pub const SCATTER_EASE_MS: f64 = 2000.0;
    /// Scatter rate at the start and end of the ease
    pub const SCATTER_BASE_RATE: f32 = 0.08;
    /// Rate gain, peaking at `SCATTER_BASE_RATE + SCATTER_PEAK_GAIN * 0.75`
    pub const SCATTER_PEAK_GAIN: f32 = 0.15;
    pub const SCATTER_SNAP_DISTANCE: f32 = 0.5;

    /// Episode timeline, relative to the click
    pub const FADE_START_MS: f64 = 1000.0;
    pub const FADE_END_MS: f64 = 1200.0;
    pub const REJOIN_MS: f64 = 3000.0;
    pub const FADE_IN_MS: f64 = 3200.0;

    /// Pulse oscillation amplitude (scale ± amplitude)
    pub const PULSE_AMPLITUDE_DESKTOP: f32 = 0.1;
    pub const PULSE_AMPLITUDE_MOBILE: f32 = 0.05;
    /// Pulse loop lasts `PULSE_PERIOD_MIN_S + rand * PULSE_PERIOD_SPAN_S` seconds
    pub const PULSE_PERIOD_MIN_S: f32 = 3.0;
    pub const PULSE_PERIOD_SPAN_S: f32 = 2.0;

    /// Outer and inner glow radii relative to size
    pub const GLOW_FACTOR: f32 = 0.8;
    pub const INNER_GLOW_FACTOR: f32 = 0.4;
    /// Displayed opacity eases toward the simulated value over this long
    pub const OPACITY_TRANSITION_S: f32 = 0.5;

    /// Upper bound on orbs uploaded to the GPU
    pub const MAX_RENDERED_ORBS: usize = 16;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert a viewport pixel position to percentage coordinates
///
/// A degenerate viewport maps everything to the center.
#[inline]
pub fn px_to_percent(px: Vec2, viewport: Vec2) -> Vec2 {
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return Vec2::splat(50.0);
    }
    px / viewport * 100.0
}

/// Convert percentage coordinates to viewport pixels
#[inline]
pub fn percent_to_px(percent: Vec2, viewport: Vec2) -> Vec2 {
    percent / 100.0 * viewport
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_conversion() {
        let viewport = Vec2::new(1200.0, 800.0);
        let p = px_to_percent(Vec2::new(600.0, 200.0), viewport);
        assert!((p.x - 50.0).abs() < 1e-4);
        assert!((p.y - 25.0).abs() < 1e-4);

        let back = percent_to_px(p, viewport);
        assert!((back.x - 600.0).abs() < 1e-3);
        assert!((back.y - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_viewport() {
        assert_eq!(px_to_percent(Vec2::new(10.0, 10.0), Vec2::ZERO), Vec2::splat(50.0));
    }

    #[test]
    fn test_polar_to_cartesian() {
        let p = polar_to_cartesian(2.0, std::f32::consts::FRAC_PI_2);
        assert!(p.x.abs() < 1e-5);
        assert!((p.y - 2.0).abs() < 1e-5);
    }
}
