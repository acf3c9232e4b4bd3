//! Click-triggered scatter episodes
//!
//! A button click sends every orb flying away from the click, fades them
//! out, drops them back in at the edges and fades them up again. The episode
//! is one finite-state machine whose phase is a pure function of the time
//! since the click:
//!
//! ```text
//! 0 ms        1000 ms     3000 ms      3200 ms
//! Scattering -> Fading -> Returning -> Idle
//! ```
//!
//! Only one episode exists at a time. Starting a new one replaces the old,
//! so no stale step of a previous episode can fire later.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Orb, OrbField};
use crate::consts::*;
use crate::polar_to_cartesian;

/// Phase of the global scatter episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EpisodePhase {
    /// No episode (ambient motion)
    #[default]
    Idle,
    /// Orbs flee the click point
    Scattering,
    /// Orbs keep fleeing while fading out
    Fading,
    /// Orbs re-entered from the edges, waiting to fade in
    Returning,
}

impl EpisodePhase {
    /// Phase reached `elapsed_ms` after a click
    pub fn at(elapsed_ms: f64) -> Self {
        if elapsed_ms < FADE_START_MS {
            EpisodePhase::Scattering
        } else if elapsed_ms < REJOIN_MS {
            EpisodePhase::Fading
        } else if elapsed_ms < FADE_IN_MS {
            EpisodePhase::Returning
        } else {
            EpisodePhase::Idle
        }
    }

    /// The phase after this one, `None` once idle
    pub fn successor(self) -> Option<Self> {
        match self {
            EpisodePhase::Scattering => Some(EpisodePhase::Fading),
            EpisodePhase::Fading => Some(EpisodePhase::Returning),
            EpisodePhase::Returning => Some(EpisodePhase::Idle),
            EpisodePhase::Idle => None,
        }
    }

    /// Orbs are under episode control (ambient motion suspended)
    pub fn is_interacting(self) -> bool {
        matches!(self, EpisodePhase::Scattering | EpisodePhase::Fading)
    }
}

/// The current (or last) episode
#[derive(Debug, Clone, Copy, Default)]
pub struct Episode {
    pub phase: EpisodePhase,
    pub started_ms: f64,
    /// Click origin in viewport percent, after clamping
    pub origin: Vec2,
    /// Opacity already bottomed out this episode
    pub fade_completed: bool,
}

impl Episode {
    pub fn begin(origin: Vec2, now_ms: f64) -> Self {
        Self {
            phase: EpisodePhase::Scattering,
            started_ms: now_ms,
            origin,
            fade_completed: false,
        }
    }

    /// A trigger would be accepted
    pub fn can_trigger(&self) -> bool {
        !self.phase.is_interacting()
    }

    pub fn elapsed(&self, now_ms: f64) -> f64 {
        (now_ms - self.started_ms).max(0.0)
    }

    /// Advance one phase toward where the clock says we should be
    ///
    /// Returns the newly entered phase. Call repeatedly until `None` so a
    /// late tick still passes through every phase in order.
    pub fn advance(&mut self, now_ms: f64) -> Option<EpisodePhase> {
        if self.phase == EpisodePhase::Idle {
            return None;
        }
        let due = EpisodePhase::at(self.elapsed(now_ms));
        if due == self.phase {
            return None;
        }
        let next = self.phase.successor()?;
        self.phase = next;
        Some(next)
    }
}

/// Clamp a click position into the scatter origin band
pub fn click_origin(click: Vec2) -> Vec2 {
    click.clamp(Vec2::splat(CLICK_CLAMP_MIN), Vec2::splat(CLICK_CLAMP_MAX))
}

/// Random destination 150-250 units from the origin
pub fn scatter_target(origin: Vec2, rng: &mut impl Rng) -> Vec2 {
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    let radius = rng.random_range(SCATTER_RADIUS_MIN..SCATTER_RADIUS_MAX);
    origin + polar_to_cartesian(radius, angle)
}

/// Fraction of the remaining gap covered per scatter tick
///
/// Parabolic in time: slow at the start, fastest at the midpoint of the
/// ease, slow again at the end.
pub fn scatter_rate(elapsed_ms: f64) -> f32 {
    let progress = (elapsed_ms / SCATTER_EASE_MS).clamp(0.0, 1.0) as f32;
    SCATTER_BASE_RATE + SCATTER_PEAK_GAIN * 3.0 * progress * (1.0 - progress)
}

/// Episode opacity for an orb whose steady opacity is `steady`
pub fn fade_opacity(steady: f32, elapsed_ms: f64) -> f32 {
    if elapsed_ms < FADE_START_MS {
        steady
    } else if elapsed_ms < FADE_END_MS {
        let t = ((elapsed_ms - FADE_START_MS) / (FADE_END_MS - FADE_START_MS)) as f32;
        steady * (1.0 - t)
    } else {
        0.0
    }
}

/// Move an orb one scatter tick; positions are not clamped
pub fn scatter_step(orb: &Orb, rate: f32) -> Vec2 {
    let gap = orb.target - orb.pos;
    if gap.length() > SCATTER_SNAP_DISTANCE {
        orb.pos + gap * rate
    } else {
        orb.target
    }
}

/// Advance every orb one scatter tick
pub fn scatter_orbs(prev: &[Orb], episode: &Episode, now_ms: f64) -> Vec<Orb> {
    let elapsed = episode.elapsed(now_ms);
    let rate = scatter_rate(elapsed);
    prev.iter()
        .map(|orb| {
            let mut next = orb.clone();
            next.pos = scatter_step(orb, rate);
            next.speed = rate;
            if episode.phase == EpisodePhase::Fading {
                next.opacity_override = Some(fade_opacity(orb.steady_opacity(), elapsed));
            }
            next
        })
        .collect()
}

impl OrbField {
    /// Start a scatter episode from a click at `click` (viewport percent)
    ///
    /// Returns false, changing nothing, while an episode is still running.
    pub fn trigger(&mut self, click: Vec2, now_ms: f64) -> bool {
        if !self.episode.can_trigger() {
            return false;
        }

        let origin = click_origin(click);
        // An unfinished intro fade is superseded along with any fade-in
        let clear_fade = self.intro_fade_at.take().is_some()
            || self.episode.phase == EpisodePhase::Returning;

        let rng = &mut self.rng;
        let next: Vec<Orb> = self
            .orbs
            .iter()
            .map(|orb| {
                let mut next = orb.clone();
                next.target = scatter_target(origin, &mut *rng);
                next.speed = SCATTER_BASE_RATE;
                next.entering = false;
                if clear_fade {
                    next.opacity_override = None;
                }
                next
            })
            .collect();
        self.orbs = next;

        self.episode = Episode::begin(origin, now_ms);
        self.episodes_started += 1;
        if self.episodes_started == 1 {
            log::info!(
                "First scatter from ({:.1}, {:.1}) - orbs will be back shortly",
                origin.x,
                origin.y
            );
        } else {
            log::debug!("Scatter #{} from ({:.1}, {:.1})", self.episodes_started, origin.x, origin.y);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_phase_timeline() {
        assert_eq!(EpisodePhase::at(0.0), EpisodePhase::Scattering);
        assert_eq!(EpisodePhase::at(999.0), EpisodePhase::Scattering);
        assert_eq!(EpisodePhase::at(1000.0), EpisodePhase::Fading);
        assert_eq!(EpisodePhase::at(2999.0), EpisodePhase::Fading);
        assert_eq!(EpisodePhase::at(3000.0), EpisodePhase::Returning);
        assert_eq!(EpisodePhase::at(3200.0), EpisodePhase::Idle);
    }

    #[test]
    fn test_late_tick_walks_every_phase() {
        let mut episode = Episode::begin(Vec2::splat(50.0), 0.0);
        let mut seen = Vec::new();
        while let Some(phase) = episode.advance(5000.0) {
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![EpisodePhase::Fading, EpisodePhase::Returning, EpisodePhase::Idle]
        );
        assert_eq!(episode.advance(9000.0), None);
    }

    #[test]
    fn test_scatter_rate_curve() {
        assert!((scatter_rate(0.0) - 0.08).abs() < 1e-6);
        assert!((scatter_rate(1000.0) - (0.08 + 0.15 * 0.75)).abs() < 1e-6);
        assert!((scatter_rate(2000.0) - 0.08).abs() < 1e-6);
        assert!((scatter_rate(2500.0) - 0.08).abs() < 1e-6);
        assert!(scatter_rate(500.0) < scatter_rate(1000.0));
    }

    #[test]
    fn test_fade_opacity() {
        assert_eq!(fade_opacity(0.6, 500.0), 0.6);
        assert!((fade_opacity(0.6, 1100.0) - 0.3).abs() < 1e-6);
        assert_eq!(fade_opacity(0.6, 1200.0), 0.0);
        assert_eq!(fade_opacity(0.6, 2500.0), 0.0);
    }

    #[test]
    fn test_click_origin_clamped() {
        assert_eq!(click_origin(Vec2::new(2.0, 97.0)), Vec2::new(10.0, 90.0));
        assert_eq!(click_origin(Vec2::new(40.0, 60.0)), Vec2::new(40.0, 60.0));
    }

    #[test]
    fn test_scatter_targets_in_band() {
        let mut rng = Pcg32::seed_from_u64(8);
        let origin = Vec2::new(30.0, 70.0);
        for _ in 0..100 {
            let d = scatter_target(origin, &mut rng).distance(origin);
            assert!((SCATTER_RADIUS_MIN - 1e-3..=SCATTER_RADIUS_MAX + 1e-3).contains(&d));
        }
    }
}
