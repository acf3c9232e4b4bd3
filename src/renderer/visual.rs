//! Orb to visual mapping
//!
//! One-way: reads an orb snapshot, never writes back into the simulation.
//! The pulse and the eased opacity are layered on top here and have no
//! effect on the simulated values.

use std::collections::HashMap;

use glam::Vec2;

use crate::consts::*;
use crate::percent_to_px;
use crate::settings::Settings;
use crate::sim::{Orb, OrbId};
use crate::tuning::Tuning;

/// How orbs should look, resolved from tuning and settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualStyle {
    /// Pulse amplitude; 0 disables the pulse
    pub pulse_amplitude: f32,
    pub glow: bool,
    /// Edge blur in pixels
    pub blur_px: f32,
}

impl VisualStyle {
    pub fn new(tuning: &Tuning, settings: &Settings) -> Self {
        Self {
            pulse_amplitude: if settings.effective_pulse() {
                tuning.pulse_amplitude
            } else {
                0.0
            },
            glow: settings.effective_glow(),
            blur_px: settings.quality.blur_px(),
        }
    }
}

/// Everything needed to draw one orb
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbVisual {
    /// Center in viewport pixels
    pub center: Vec2,
    /// Drawn diameter in pixels (size times pulse)
    pub diameter: f32,
    /// Linear RGBA, alpha 1
    pub color: [f32; 4],
    pub opacity: f32,
    /// Outer glow radius in pixels (0 when glow is off)
    pub glow: f32,
    /// Inner glow radius in pixels
    pub inner_glow: f32,
    pub blur: f32,
}

/// sRGB-encoded channel to linear light
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Unpack 0xRRGGBB (sRGB, as written in CSS) into linear RGBA
pub fn hex_to_rgba(color: u32, alpha: f32) -> [f32; 4] {
    let channel = |shift: u32| srgb_to_linear(((color >> shift) & 0xFF) as f32 / 255.0);
    [channel(16), channel(8), channel(0), alpha]
}

fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Breathing scale at `time_s` for a loop of `period_s`
///
/// Keyframes `1, 1+a, 1-a, 1` spaced evenly over the loop, eased between.
pub fn pulse_scale(time_s: f32, period_s: f32, amplitude: f32) -> f32 {
    if amplitude == 0.0 || period_s <= 0.0 {
        return 1.0;
    }
    let keys = [1.0, 1.0 + amplitude, 1.0 - amplitude, 1.0];
    let t = (time_s / period_s).rem_euclid(1.0) * 3.0;
    let segment = (t.floor() as usize).min(2);
    let local = ease_in_out(t - segment as f32);
    keys[segment] + (keys[segment + 1] - keys[segment]) * local
}

/// One in-flight opacity transition
#[derive(Debug, Clone, Copy, PartialEq)]
struct Transition {
    from: f32,
    to: f32,
    start_s: f32,
}

impl Transition {
    fn value(&self, time_s: f32) -> f32 {
        let t = ((time_s - self.start_s) / OPACITY_TRANSITION_S).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * ease_in_out(t)
    }
}

/// Below this, a change of simulated opacity (size easing) moves the
/// endpoint of the running transition instead of restarting it
const OPACITY_DRIFT: f32 = 0.05;

/// Displayed opacity per orb, eased toward the simulated value
///
/// A jump of the simulated opacity starts a new ease-in-out from whatever
/// is on screen at that moment.
#[derive(Debug, Clone, Default)]
pub struct OpacityTransitions {
    by_orb: HashMap<OrbId, Transition>,
}

impl OpacityTransitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opacity to draw `id` with at `time_s` when the simulation says `target`
    pub fn shown(&mut self, id: OrbId, target: f32, time_s: f32) -> f32 {
        let transition = self.by_orb.entry(id).or_insert(Transition {
            from: target,
            to: target,
            start_s: time_s,
        });
        let change = (transition.to - target).abs();
        if change < OPACITY_DRIFT {
            transition.to = target;
        } else {
            *transition = Transition {
                from: transition.value(time_s),
                to: target,
                start_s: time_s,
            };
        }
        transition.value(time_s)
    }
}

/// Map one orb to its visual
pub fn orb_visual(orb: &Orb, viewport: Vec2, time_s: f32, style: &VisualStyle) -> OrbVisual {
    let pulse = pulse_scale(time_s, orb.pulse_period_s, style.pulse_amplitude);
    OrbVisual {
        center: percent_to_px(orb.pos, viewport),
        diameter: orb.size * pulse,
        color: hex_to_rgba(orb.color, 1.0),
        opacity: orb.opacity().clamp(0.0, 1.0),
        glow: if style.glow { orb.size * GLOW_FACTOR } else { 0.0 },
        inner_glow: orb.size * INNER_GLOW_FACTOR,
        blur: style.blur_px,
    }
}

/// Map the whole snapshot with eased opacity, skipping invisible orbs
pub fn orb_visuals(
    orbs: &[Orb],
    viewport: Vec2,
    time_s: f32,
    style: &VisualStyle,
    transitions: &mut OpacityTransitions,
) -> Vec<OrbVisual> {
    orbs.iter()
        .map(|orb| {
            let mut visual = orb_visual(orb, viewport, time_s, style);
            visual.opacity = transitions.shown(orb.id, visual.opacity, time_s);
            visual
        })
        .filter(|v| v.opacity > 0.0)
        .take(MAX_RENDERED_ORBS)
        .collect()
}
