//! Effects bridge
//!
//! Maps simulation events to sound/visual cues and fans them out to
//! whatever presentation layer is attached. Sinks are fire-and-forget: they
//! never feed back into the simulation.

use crate::sim::{BrickKind, GameEvent};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Ball launched or released
    Launch,
    /// Ball hits paddle
    PaddleHit,
    /// Ball hits wall
    WallHit,
    /// Ball hits brick (doesn't break)
    BrickHit,
    /// Brick breaks
    BrickBreak,
    /// Explosive brick goes off
    Explosion,
    /// Helpful power-up collected
    PowerUp,
    /// Harmful power-up collected
    PowerDown,
    /// Laser volley
    Laser,
    /// Last ball lost
    LifeLost,
    /// Level cleared
    LevelComplete,
    /// Game over
    GameOver,
}

impl SoundEffect {
    /// Cue for an event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        let cue = match event {
            GameEvent::BallLaunched { .. } => SoundEffect::Launch,
            GameEvent::PaddleHit { .. } | GameEvent::BallCaught { .. } => SoundEffect::PaddleHit,
            GameEvent::WallBounce { .. } => SoundEffect::WallHit,
            GameEvent::BrickHit { .. } => SoundEffect::BrickHit,
            // The explosion event carries its own cue
            GameEvent::BrickDestroyed {
                kind: BrickKind::Explosive,
                ..
            } => return None,
            GameEvent::BrickDestroyed { .. } => SoundEffect::BrickBreak,
            GameEvent::Explosion { .. } => SoundEffect::Explosion,
            GameEvent::PowerUpCollected { good: true, .. } => SoundEffect::PowerUp,
            GameEvent::PowerUpCollected { good: false, .. } => SoundEffect::PowerDown,
            GameEvent::BoltFired { .. } => SoundEffect::Laser,
            GameEvent::LifeLost { .. } => SoundEffect::LifeLost,
            GameEvent::LevelWon { .. } => SoundEffect::LevelComplete,
            GameEvent::GameOver { .. } => SoundEffect::GameOver,
            GameEvent::PowerUpSpawned { .. }
            | GameEvent::ModifierExpired { .. }
            | GameEvent::BallStabilized { .. } => return None,
        };
        Some(cue)
    }
}

/// Receives every event of a tick, in emission order
pub trait EffectsSink {
    fn notify(&mut self, event: &GameEvent);
}

/// Fan-out of tick events to registered sinks
#[derive(Default)]
pub struct EffectsBridge {
    sinks: Vec<Box<dyn EffectsSink>>,
    muted: bool,
}

impl EffectsBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, sink: Box<dyn EffectsSink>) {
        self.sinks.push(sink);
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Mute/unmute all sinks
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Deliver a tick's events to every sink
    pub fn dispatch(&mut self, events: &[GameEvent]) {
        if self.muted {
            return;
        }
        for event in events {
            for sink in &mut self.sinks {
                sink.notify(event);
            }
        }
    }
}

/// Logs each cue at debug level and counts them
#[derive(Debug, Default)]
pub struct LogSink {
    pub cues: usize,
}

impl EffectsSink for LogSink {
    fn notify(&mut self, event: &GameEvent) {
        if let Some(cue) = SoundEffect::for_event(event) {
            self.cues += 1;
            log::debug!("cue {:?} <- {:?}", cue, event);
        }
    }
}
