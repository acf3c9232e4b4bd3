//! Orb field state and core simulation types
//!
//! The field owns the orb list. Every tick builds a new list from the previous
//! snapshot and replaces it wholesale; nothing edits the live list element by
//! element while other orbs are still reading it.

use std::fmt;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::interaction::{Episode, EpisodePhase};
use super::spawn;
use crate::consts::*;
use crate::tuning::{DeviceClass, Tuning};

/// Stable orb identifier, assigned at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrbId(pub u32);

impl fmt::Display for OrbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "orb-{}", self.0)
    }
}

/// Whether an orb is wandering or reacting to a nearby orb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MotionPhase {
    /// Ambient wandering (the steady state)
    #[default]
    Random,
    /// Another orb came within the meeting distance
    Meeting,
    /// Cooling down after a meeting
    PostMeeting,
}

/// A single decorative orb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orb {
    pub id: OrbId,
    /// Position in viewport percent
    pub pos: Vec2,
    /// Diameter in pixels
    pub size: f32,
    /// 0xRRGGBB, fixed at creation
    pub color: u32,
    pub target: Vec2,
    pub target_size: f32,
    /// Step fraction per tick (ambient) or gap fraction per tick (scatter)
    pub speed: f32,
    pub phase: MotionPhase,
    /// When `phase` last changed
    pub phase_since_ms: f64,
    pub has_met: bool,
    pub last_meeting_ms: f64,
    /// Explicit opacity during fades; `None` derives it from size
    pub opacity_override: Option<f32>,
    /// Still flying in from off-screen (ambient position clamp suspended)
    pub entering: bool,
    /// Pulse loop length in seconds (render only)
    pub pulse_period_s: f32,
}

impl Orb {
    /// Opacity as a function of size
    #[inline]
    pub fn steady_opacity(&self) -> f32 {
        OPACITY_BASE + self.size / OPACITY_SIZE_DIVISOR
    }

    /// Current opacity
    #[inline]
    pub fn opacity(&self) -> f32 {
        self.opacity_override
            .unwrap_or_else(|| self.steady_opacity())
    }
}

/// Input for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Simulation clock
    pub now_ms: f64,
    /// Button click this tick, in viewport percent
    pub trigger: Option<Vec2>,
}

/// Notable things that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEvent {
    /// Intro or re-entry fade-in finished
    FadedIn,
    EpisodeStarted,
    FadeStarted,
    FadeCompleted,
    /// Orbs were placed back at the edges
    Rejoined,
    /// At least one orb flagged a meeting
    Met,
}

/// The whole simulation
#[derive(Debug, Clone)]
pub struct OrbField {
    pub(crate) orbs: Vec<Orb>,
    pub(crate) rng: Pcg32,
    pub(crate) tuning: Tuning,
    pub(crate) episode: Episode,
    /// Pending intro fade-in deadline
    pub(crate) intro_fade_at: Option<f64>,
    pub(crate) time_ticks: u64,
    pub(crate) episodes_started: u32,
}

impl OrbField {
    /// Seed a new field at `now_ms`
    pub fn new(seed: u64, tuning: Tuning, now_ms: f64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let orbs = spawn::seed_orbs(&tuning, &mut rng);
        log::info!(
            "Orb field mounted: {} orbs, {} profile, {} ms ticks",
            orbs.len(),
            tuning.device.as_str(),
            tuning.tick_ms
        );
        Self {
            orbs,
            rng,
            tuning,
            episode: Episode::default(),
            intro_fade_at: Some(now_ms + INTRO_FADE_MS),
            time_ticks: 0,
            episodes_started: 0,
        }
    }

    /// Seed a field sized for the given viewport and user agent
    pub fn for_viewport(seed: u64, viewport_width: f64, user_agent: &str, now_ms: f64) -> Self {
        let device = DeviceClass::detect(viewport_width, user_agent);
        Self::new(seed, Tuning::for_device(device), now_ms)
    }

    /// Read-only snapshot of the orbs, in creation order
    pub fn orbs(&self) -> &[Orb] {
        &self.orbs
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Swap in a new tuning after a device-class change
    ///
    /// Existing orbs are kept as they are; only future ticks see the change.
    pub fn set_tuning(&mut self, tuning: Tuning) {
        if tuning.device != self.tuning.device {
            log::debug!(
                "Device class {} -> {}",
                self.tuning.device.as_str(),
                tuning.device.as_str()
            );
        }
        self.tuning = tuning;
    }

    pub fn episode_phase(&self) -> EpisodePhase {
        self.episode.phase
    }

    /// A scatter episode is playing
    pub fn is_interacting(&self) -> bool {
        self.episode.phase.is_interacting()
    }

    /// Orbs are back in the scene and a new episode may start
    pub fn has_rejoined(&self) -> bool {
        !self.episode.phase.is_interacting()
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_viewport() {
        let ua = "Mozilla/5.0 (X11; Linux x86_64)";
        assert_eq!(OrbField::for_viewport(1, 500.0, ua, 0.0).orbs().len(), 4);
        assert_eq!(OrbField::for_viewport(1, 1200.0, ua, 0.0).orbs().len(), 8);
    }

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let field = OrbField::new(7, Tuning::default(), 0.0);
        let ids: Vec<u32> = field.orbs().iter().map(|o| o.id.0).collect();
        assert_eq!(ids, (0..8).collect::<Vec<_>>());
        assert_eq!(field.orbs()[3].id.to_string(), "orb-3");
    }

    #[test]
    fn test_opacity_override() {
        let mut orb = OrbField::new(3, Tuning::default(), 0.0).orbs()[0].clone();
        orb.size = 80.0;
        orb.opacity_override = None;
        assert!((orb.opacity() - 0.7).abs() < 1e-6);
        orb.opacity_override = Some(0.0);
        assert_eq!(orb.opacity(), 0.0);
    }

    #[test]
    fn test_retune_keeps_orbs() {
        let mut field = OrbField::new(9, Tuning::default(), 0.0);
        let before = field.orbs().to_vec();
        field.set_tuning(Tuning::for_device(DeviceClass::Mobile));
        assert_eq!(field.orbs(), before.as_slice());
        assert_eq!(field.tuning().tick_ms, TICK_MS_MOBILE);
    }

    #[test]
    fn test_starts_idle() {
        let field = OrbField::new(1, Tuning::default(), 0.0);
        assert!(!field.is_interacting());
        assert!(field.has_rejoined());
        assert_eq!(field.episode_phase(), EpisodePhase::Idle);
    }
}
