//! Proximity attraction and meeting bookkeeping
//!
//! Orbs that overlap pull each other's targets together, and the larger one
//! slowly absorbs part of the smaller one's size.

use super::state::{MotionPhase, Orb};
use crate::consts::*;

/// Two orbs are close when nearer than twice their average size
#[inline]
pub fn attraction_range(a_size: f32, b_size: f32) -> f32 {
    a_size + b_size
}

/// Apply attraction from every other orb in `prev` to `next`
///
/// `orb` is `next`'s previous state; sizes and neighbour positions come from
/// the previous snapshot so the result does not depend on iteration order.
pub fn attract(next: &mut Orb, orb: &Orb, prev: &[Orb]) {
    for other in prev.iter().filter(|o| o.id != orb.id) {
        let distance = next.pos.distance(other.pos);
        if distance >= attraction_range(orb.size, other.size) {
            continue;
        }
        next.target += (other.pos - next.target) * ATTRACT_FORCE;
        if orb.size > other.size {
            next.target_size = (orb.size + other.size * ABSORB_FRACTION).min(MAX_SIZE);
        }
    }
}

/// Whether any pair of orbs is within the meeting distance
pub fn any_meeting(orbs: &[Orb]) -> bool {
    orbs.iter().enumerate().any(|(i, a)| {
        orbs[i + 1..]
            .iter()
            .any(|b| a.pos.distance(b.pos) < MEETING_DISTANCE)
    })
}

/// Advance meeting labels; returns true when `orb` newly flags a meeting
///
/// The label only records that orbs met. A meeting decays back to wandering
/// after `MEETING_HOLD_MS + POST_MEETING_MS`.
pub fn update_meeting(orb: &mut Orb, meeting: bool, now_ms: f64) -> bool {
    let mut flagged = false;
    if meeting && !orb.has_met {
        orb.has_met = true;
        orb.last_meeting_ms = now_ms;
        orb.phase = MotionPhase::Meeting;
        orb.phase_since_ms = now_ms;
        flagged = true;
    }

    let held = now_ms - orb.phase_since_ms;
    match orb.phase {
        MotionPhase::Meeting if held >= MEETING_HOLD_MS => {
            orb.phase = MotionPhase::PostMeeting;
            orb.phase_since_ms = now_ms;
        }
        MotionPhase::PostMeeting if held >= POST_MEETING_MS => {
            orb.phase = MotionPhase::Random;
            orb.phase_since_ms = now_ms;
        }
        _ => {}
    }

    if !meeting && orb.phase == MotionPhase::Random {
        orb.has_met = false;
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::spawn;
    use crate::tuning::Tuning;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn pair(a: (Vec2, f32), b: (Vec2, f32)) -> Vec<Orb> {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut orbs = spawn::seed_orbs(&Tuning::default(), &mut rng);
        orbs.truncate(2);
        for (orb, (pos, size)) in orbs.iter_mut().zip([a, b]) {
            orb.pos = pos;
            orb.target = pos;
            orb.size = size;
            orb.target_size = size;
            orb.entering = false;
        }
        orbs
    }

    #[test]
    fn test_smaller_target_moves_toward_larger() {
        let orbs = pair((Vec2::new(40.0, 40.0), 100.0), (Vec2::new(60.0, 50.0), 50.0));
        let small = &orbs[1];
        let mut next = small.clone();
        next.target = Vec2::new(80.0, 80.0);
        let before = next.target.distance(orbs[0].pos);

        attract(&mut next, small, &orbs);
        assert!(next.target.distance(orbs[0].pos) < before);
        // The smaller orb does not grow
        assert_eq!(next.target_size, small.target_size);
    }

    #[test]
    fn test_larger_absorbs_capped() {
        let orbs = pair((Vec2::new(40.0, 40.0), 115.0), (Vec2::new(45.0, 40.0), 90.0));
        let big = &orbs[0];
        let mut next = big.clone();
        attract(&mut next, big, &orbs);
        assert_eq!(next.target_size, MAX_SIZE);

        let orbs = pair((Vec2::new(40.0, 40.0), 60.0), (Vec2::new(45.0, 40.0), 50.0));
        let mut next = orbs[0].clone();
        attract(&mut next, &orbs[0], &orbs);
        assert!((next.target_size - 65.0).abs() < 1e-4);
    }

    #[test]
    fn test_far_orbs_ignore_each_other() {
        let orbs = pair((Vec2::new(0.0, 0.0), 20.0), (Vec2::new(100.0, 100.0), 20.0));
        let mut next = orbs[0].clone();
        attract(&mut next, &orbs[0], &orbs);
        assert_eq!(next, orbs[0]);
    }

    #[test]
    fn test_meeting_detection() {
        let orbs = pair((Vec2::new(10.0, 10.0), 40.0), (Vec2::new(20.0, 10.0), 40.0));
        assert!(any_meeting(&orbs));
        let orbs = pair((Vec2::new(10.0, 10.0), 40.0), (Vec2::new(30.0, 10.0), 40.0));
        assert!(!any_meeting(&orbs));
    }

    #[test]
    fn test_meeting_label_decays() {
        let mut orb = pair((Vec2::ZERO, 40.0), (Vec2::ONE, 40.0)).remove(0);
        assert!(update_meeting(&mut orb, true, 100.0));
        assert_eq!(orb.phase, MotionPhase::Meeting);
        assert_eq!(orb.last_meeting_ms, 100.0);

        // Still close; no re-trigger
        assert!(!update_meeting(&mut orb, true, 200.0));
        assert_eq!(orb.last_meeting_ms, 100.0);

        update_meeting(&mut orb, true, 100.0 + MEETING_HOLD_MS);
        assert_eq!(orb.phase, MotionPhase::PostMeeting);
        update_meeting(&mut orb, false, 100.0 + MEETING_HOLD_MS + POST_MEETING_MS);
        assert_eq!(orb.phase, MotionPhase::Random);
        assert!(!orb.has_met);
    }
}
