//! Seeding and re-entry placement
//!
//! Orbs always come in from just outside a viewport edge and head for a
//! random on-screen point.

use glam::Vec2;
use rand::Rng;

use super::state::{MotionPhase, Orb, OrbId};
use crate::consts::*;
use crate::tuning::Tuning;

/// Orb colors in creation order
pub const PALETTE: [u32; 8] = [
    0x8B5CF6, 0x06B6D4, 0x3B82F6, 0xEC4899, 0x10B981, 0xF59E0B, 0x6366F1, 0xA855F7,
];

/// A viewport edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];

    /// Pick an edge uniformly
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Point just outside this edge, `along` percent along it
    pub fn entry_point(self, along: f32) -> Vec2 {
        let near = -EDGE_OFFSET;
        let far = 100.0 + EDGE_OFFSET;
        match self {
            Edge::Top => Vec2::new(along, near),
            Edge::Right => Vec2::new(far, along),
            Edge::Bottom => Vec2::new(along, far),
            Edge::Left => Vec2::new(near, along),
        }
    }

    /// The edge template a position sits on, if any
    pub fn of(pos: Vec2) -> Option<Self> {
        let near = -EDGE_OFFSET;
        let far = 100.0 + EDGE_OFFSET;
        let along = |v: f32| (0.0..100.0).contains(&v);
        if pos.y == near && along(pos.x) {
            Some(Edge::Top)
        } else if pos.x == far && along(pos.y) {
            Some(Edge::Right)
        } else if pos.y == far && along(pos.x) {
            Some(Edge::Bottom)
        } else if pos.x == near && along(pos.y) {
            Some(Edge::Left)
        } else {
            None
        }
    }
}

/// Random off-screen entry point
pub fn entry_point(rng: &mut impl Rng) -> Vec2 {
    let edge = Edge::random(rng);
    edge.entry_point(rng.random_range(0.0..100.0))
}

/// Random on-screen point
pub fn onscreen_point(rng: &mut impl Rng) -> Vec2 {
    Vec2::new(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0))
}

/// Random size in the target-size range
pub fn random_size(rng: &mut impl Rng) -> f32 {
    rng.random_range(TARGET_SIZE_MIN..TARGET_SIZE_MAX)
}

/// Create the initial orbs
pub fn seed_orbs(tuning: &Tuning, rng: &mut impl Rng) -> Vec<Orb> {
    (0..tuning.orb_count)
        .map(|i| {
            let speed = if tuning.initial_speed_max > tuning.initial_speed_min {
                rng.random_range(tuning.initial_speed_min..tuning.initial_speed_max)
            } else {
                tuning.initial_speed_min
            };
            Orb {
                id: OrbId(i as u32),
                pos: entry_point(rng),
                size: random_size(rng),
                color: PALETTE[i % PALETTE.len()],
                target: onscreen_point(rng),
                target_size: random_size(rng),
                speed,
                phase: MotionPhase::Random,
                phase_since_ms: 0.0,
                has_met: false,
                last_meeting_ms: 0.0,
                opacity_override: Some(ENTRY_OPACITY),
                entering: true,
                pulse_period_s: PULSE_PERIOD_MIN_S + rng.random::<f32>() * PULSE_PERIOD_SPAN_S,
            }
        })
        .collect()
}

/// Put an orb back at an edge after a scatter episode
///
/// Identity, color, size and pulse survive; everything about where it is
/// going is reset.
pub fn respawn(orb: &Orb, tuning: &Tuning, rng: &mut impl Rng, now_ms: f64) -> Orb {
    Orb {
        pos: entry_point(rng),
        target: onscreen_point(rng),
        target_size: random_size(rng),
        speed: tuning.ambient_speed,
        phase: MotionPhase::Random,
        phase_since_ms: now_ms,
        has_met: false,
        last_meeting_ms: 0.0,
        opacity_override: Some(ENTRY_OPACITY),
        entering: true,
        ..orb.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_entry_points_sit_on_templates() {
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..200 {
            let p = entry_point(&mut rng);
            assert!(Edge::of(p).is_some(), "{p:?} is not an edge template");
            // Off-screen
            assert!(p.x < 0.0 || p.x > 100.0 || p.y < 0.0 || p.y > 100.0);
        }
    }

    #[test]
    fn test_edge_of_rejects_onscreen() {
        assert_eq!(Edge::of(Vec2::new(50.0, 50.0)), None);
        assert_eq!(Edge::of(Edge::Left.entry_point(30.0)), Some(Edge::Left));
        assert_eq!(Edge::of(Edge::Bottom.entry_point(0.0)), Some(Edge::Bottom));
    }

    #[test]
    fn test_all_edges_used() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut seen = [false; 4];
        for _ in 0..100 {
            let e = Edge::random(&mut rng);
            seen[Edge::ALL.iter().position(|x| *x == e).unwrap()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_seed_orbs() {
        let mut rng = Pcg32::seed_from_u64(1);
        let orbs = seed_orbs(&Tuning::default(), &mut rng);
        assert_eq!(orbs.len(), 8);
        for (i, orb) in orbs.iter().enumerate() {
            assert_eq!(orb.color, PALETTE[i]);
            assert!(orb.entering);
            assert_eq!(orb.opacity_override, Some(ENTRY_OPACITY));
            assert!((0.0..100.0).contains(&orb.target.x));
            assert!((0.0..100.0).contains(&orb.target.y));
            assert!((TARGET_SIZE_MIN..TARGET_SIZE_MAX).contains(&orb.size));
            assert!((INITIAL_SPEED_MIN..INITIAL_SPEED_MAX).contains(&orb.speed));
            assert!((3.0..5.0).contains(&orb.pulse_period_s));
        }
    }

    #[test]
    fn test_respawn_keeps_identity() {
        let mut rng = Pcg32::seed_from_u64(2);
        let tuning = Tuning::default();
        let mut orb = seed_orbs(&tuning, &mut rng).remove(3);
        orb.phase = MotionPhase::Meeting;
        orb.has_met = true;
        orb.last_meeting_ms = 900.0;
        orb.speed = 0.2;

        let back = respawn(&orb, &tuning, &mut rng, 3000.0);
        assert_eq!(back.id, orb.id);
        assert_eq!(back.color, orb.color);
        assert_eq!(back.phase, MotionPhase::Random);
        assert!(!back.has_met);
        assert_eq!(back.last_meeting_ms, 0.0);
        assert_eq!(back.speed, tuning.ambient_speed);
        assert!(Edge::of(back.pos).is_some());
    }
}
