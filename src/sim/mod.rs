//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One tick per frame, no wall-clock dependence (except the elapsed spawn policy's input)
//! - Seeded RNG only
//! - Stable iteration order (pairs ordered by x)
//! - No rendering or platform dependencies

pub mod collision;
pub mod kinematics;
pub mod obstacles;
pub mod state;
pub mod tick;

pub use collision::{Aabb, Contact, collides, first_contact};
pub use kinematics::Bird;
pub use obstacles::{ObstaclePair, ObstacleRect, ObstacleSide, ObstacleStream, StreamStep};
pub use state::{GameEvent, GamePhase, GameState};
pub use tick::{TickInput, tick};
