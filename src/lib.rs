//! RX Ball - a breakout round simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (collisions, modifiers, round state)
//! - `tuning`: Data-driven game balance
//! - `effects`: Fire-and-forget bridge to presentation/audio
//! - `highscores`: High-score boundary (the core only supplies candidates)

pub mod effects;
pub mod highscores;
pub mod sim;
pub mod tuning;

pub use effects::{EffectsBridge, EffectsSink, LogSink, SoundEffect};
pub use highscores::{
    HighScoreStore, JsonFileStore, MemoryStore, submit_at_boundary, submit_score,
};
pub use tuning::Tuning;

/// Simulation clock constants
pub mod consts {
    /// Ticks per simulated second
    pub const TICKS_PER_SECOND: u32 = 120;
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / TICKS_PER_SECOND as f32;
}

/// Convert a millisecond duration to a whole number of ticks (at least one)
#[inline]
pub fn ms_to_ticks(ms: u32) -> u32 {
    let ticks = (ms as u64 * consts::TICKS_PER_SECOND as u64).div_ceil(1000);
    (ticks as u32).max(1)
}

/// Convert a tick count back to seconds (for display and logging)
#[inline]
pub fn ticks_to_secs(ticks: u64) -> f32 {
    ticks as f32 * consts::SIM_DT
}
