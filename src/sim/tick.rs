//! Fixed-rate simulation tick
//!
//! The single update entry point: advances the intro fade and the scatter
//! episode, applies a pending click, then moves every orb.

use super::interaction::{self, EpisodePhase};
use super::motion;
use super::spawn;
use super::state::{FieldEvent, OrbField, TickInput};
use crate::consts::*;

/// Advance the field by one tick
pub fn tick(field: &mut OrbField, input: &TickInput) -> Vec<FieldEvent> {
    let now = input.now_ms;
    let mut events = Vec::new();
    field.time_ticks += 1;

    if field.intro_fade_at.is_some_and(|at| now >= at) {
        field.intro_fade_at = None;
        clear_opacity_overrides(field);
        events.push(FieldEvent::FadedIn);
    }

    let mut rejoined = false;
    while let Some(phase) = field.episode.advance(now) {
        log::debug!("Episode phase -> {:?}", phase);
        match phase {
            EpisodePhase::Fading => events.push(FieldEvent::FadeStarted),
            EpisodePhase::Returning => {
                rejoin(field, now);
                rejoined = true;
                events.push(FieldEvent::Rejoined);
            }
            EpisodePhase::Idle => {
                clear_opacity_overrides(field);
                events.push(FieldEvent::FadedIn);
            }
            EpisodePhase::Scattering => {}
        }
    }

    // Guards see the phase the clock is in, not the one from the last tick
    if let Some(click) = input.trigger {
        if field.trigger(click, now) {
            events.push(FieldEvent::EpisodeStarted);
        }
    }

    if field.episode.phase.is_interacting() {
        field.orbs = interaction::scatter_orbs(&field.orbs, &field.episode, now);
        if !field.episode.fade_completed && field.episode.elapsed(now) >= FADE_END_MS {
            field.episode.fade_completed = true;
            events.push(FieldEvent::FadeCompleted);
        }
    } else if !rejoined {
        // Re-entered orbs hold their edge position for the tick they land on
        let (next, met) = motion::ambient_step(&field.orbs, &field.tuning, &mut field.rng, now);
        field.orbs = next;
        if met {
            events.push(FieldEvent::Met);
        }
    }

    events
}

/// Drop every orb back at an edge, heading for a fresh on-screen target
fn rejoin(field: &mut OrbField, now: f64) {
    let rng = &mut field.rng;
    let tuning = &field.tuning;
    let next = field
        .orbs
        .iter()
        .map(|orb| spawn::respawn(orb, tuning, &mut *rng, now))
        .collect();
    field.orbs = next;
}

fn clear_opacity_overrides(field: &mut OrbField) {
    let next = field
        .orbs
        .iter()
        .map(|orb| {
            let mut orb = orb.clone();
            orb.opacity_override = None;
            orb
        })
        .collect();
    field.orbs = next;
}
