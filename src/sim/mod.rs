//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod level;
pub mod modifiers;
pub mod stabilizer;
pub mod state;
pub mod tick;

pub use collision::{BallContacts, CollisionResult, PaddleContact, ball_brick_collision};
pub use level::{BrickKind, BrickSlot, INDESTRUCTIBLE_HP, LevelDefinition};
pub use modifiers::{Modifiers, TimedModifier, apply_powerup};
pub use state::{
    Ball, BallState, Bolt, Brick, DestroyCause, GameEvent, GamePhase, GameState, HitOutcome,
    Paddle, PendingDestruction, PowerUp, PowerUpKind, RoundCarry, RoundSnapshot, TickResult,
};
pub use tick::{TickInput, tick};
