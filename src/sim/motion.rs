//! Ambient wandering
//!
//! Each tick an orb steps toward its target, eases its size, occasionally
//! rolls a new destination and is kept near the viewport.

use glam::Vec2;
use rand::Rng;

use super::proximity;
use super::state::{MotionPhase, Orb};
use crate::consts::*;
use crate::tuning::Tuning;

/// Step `pos` toward `target` by `speed * 100` percent
///
/// Within `SNAP_DISTANCE` (including a zero-length gap) the orb lands on the
/// target instead of dividing by a vanishing distance.
pub fn step_toward(pos: Vec2, target: Vec2, speed: f32) -> Vec2 {
    let delta = target - pos;
    let distance = delta.length();
    if distance > SNAP_DISTANCE {
        let step = (speed * 100.0).min(distance);
        pos + delta / distance * step
    } else {
        target
    }
}

/// Close `SIZE_EASE` of the remaining size gap
#[inline]
pub fn ease_size(size: f32, target_size: f32) -> f32 {
    size + (target_size - size) * SIZE_EASE
}

/// Maybe roll a new wander target (only while wandering)
pub fn maybe_retarget(orb: &mut Orb, was_wandering: bool, chance: f64, rng: &mut impl Rng) {
    if !was_wandering || chance <= 0.0 {
        return;
    }
    if rng.random::<f64>() < chance {
        orb.target = Vec2::new(
            rng.random_range(RETARGET_MIN..RETARGET_MAX),
            rng.random_range(RETARGET_MIN..RETARGET_MAX),
        );
        orb.target_size = rng.random_range(TARGET_SIZE_MIN..TARGET_SIZE_MAX);
    }
}

/// Keep an orb near the viewport and its size in range
///
/// Entering orbs are left unclamped until they cross into the ambient box.
pub fn clamp_ambient(orb: &mut Orb) {
    if orb.entering {
        if in_ambient_box(orb.pos) {
            orb.entering = false;
        }
    } else {
        orb.pos = orb
            .pos
            .clamp(Vec2::splat(AMBIENT_MIN), Vec2::splat(AMBIENT_MAX));
    }
    orb.size = orb.size.clamp(MIN_SIZE, MAX_SIZE);
}

#[inline]
pub fn in_ambient_box(pos: Vec2) -> bool {
    (AMBIENT_MIN..=AMBIENT_MAX).contains(&pos.x) && (AMBIENT_MIN..=AMBIENT_MAX).contains(&pos.y)
}

/// Advance every orb one ambient tick
///
/// Reads only `prev` and returns the replacement list along with whether any
/// orb newly flagged a meeting.
pub fn ambient_step(
    prev: &[Orb],
    tuning: &Tuning,
    rng: &mut impl Rng,
    now_ms: f64,
) -> (Vec<Orb>, bool) {
    let meeting = proximity::any_meeting(prev);
    let mut met = false;

    let next = prev
        .iter()
        .map(|orb| {
            let mut next = orb.clone();
            next.pos = step_toward(orb.pos, orb.target, orb.speed);
            next.size = ease_size(orb.size, orb.target_size);

            proximity::attract(&mut next, orb, prev);
            met |= proximity::update_meeting(&mut next, meeting, now_ms);

            maybe_retarget(
                &mut next,
                orb.phase == MotionPhase::Random,
                tuning.retarget_chance,
                &mut *rng,
            );
            clamp_ambient(&mut next);
            next
        })
        .collect();

    (next, met)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::spawn;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn orb_at(pos: Vec2, target: Vec2) -> Orb {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut orb = spawn::seed_orbs(&Tuning::default(), &mut rng).remove(0);
        orb.pos = pos;
        orb.target = target;
        orb.entering = false;
        orb
    }

    #[test]
    fn test_step_moves_by_speed() {
        let p = step_toward(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), 0.015);
        assert!((p.x - 1.5).abs() < 1e-5);
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn test_step_snaps_when_close() {
        let target = Vec2::new(10.5, 10.5);
        assert_eq!(step_toward(Vec2::new(10.0, 10.0), target, 0.02), target);
        // Degenerate zero-length gap
        assert_eq!(step_toward(target, target, 0.02), target);
    }

    #[test]
    fn test_step_never_overshoots() {
        let p = step_toward(Vec2::ZERO, Vec2::new(2.0, 0.0), 0.03);
        assert_eq!(p, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_ease_size() {
        assert!((ease_size(40.0, 100.0) - 43.0).abs() < 1e-5);
        assert_eq!(ease_size(60.0, 60.0), 60.0);
    }

    #[test]
    fn test_retarget_only_while_wandering() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut orb = orb_at(Vec2::splat(50.0), Vec2::splat(50.0));
        maybe_retarget(&mut orb, false, 1.0, &mut rng);
        assert_eq!(orb.target, Vec2::splat(50.0));

        maybe_retarget(&mut orb, true, 1.0, &mut rng);
        assert!((RETARGET_MIN..RETARGET_MAX).contains(&orb.target.x));
        assert!((TARGET_SIZE_MIN..TARGET_SIZE_MAX).contains(&orb.target_size));
    }

    #[test]
    fn test_clamp_ambient() {
        let mut orb = orb_at(Vec2::new(120.0, -30.0), Vec2::ZERO);
        orb.size = 200.0;
        clamp_ambient(&mut orb);
        assert_eq!(orb.pos, Vec2::new(AMBIENT_MAX, AMBIENT_MIN));
        assert_eq!(orb.size, MAX_SIZE);
    }

    #[test]
    fn test_entering_orb_is_not_clamped() {
        let mut orb = orb_at(Vec2::new(-10.0, 40.0), Vec2::new(50.0, 40.0));
        orb.entering = true;
        clamp_ambient(&mut orb);
        assert_eq!(orb.pos.x, -10.0);
        assert!(orb.entering);

        orb.pos.x = -4.0;
        clamp_ambient(&mut orb);
        assert!(!orb.entering);
    }
}
