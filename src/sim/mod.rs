//! Deterministic orb simulation
//!
//! All motion logic lives here. This module must stay pure:
//! - Time only enters through `TickInput::now_ms`
//! - Seeded RNG only
//! - Stable iteration order (orb creation order)
//! - No rendering or platform dependencies

pub mod interaction;
pub mod motion;
pub mod proximity;
pub mod spawn;
pub mod state;
pub mod tick;

pub use interaction::{Episode, EpisodePhase};
pub use spawn::{Edge, PALETTE};
pub use state::{FieldEvent, MotionPhase, Orb, OrbField, OrbId, TickInput};
pub use tick::tick;
