//! Game state and core simulation types
//!
//! All state a round needs to be replayed deterministically lives here.
//! Bricks are never removed from `GameState::bricks` during a level, so their
//! indices are stable for the whole round; destroyed bricks are only flagged.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::level::{BrickKind, BrickSlot, LevelDefinition};
use super::modifiers::{Modifiers, TimedModifier};
use crate::tuning::Tuning;

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ball parked on the paddle, waiting for launch input
    Serving,
    /// Ball launched, active gameplay
    InPlay,
    /// Last ball left the playfield; next tick resets to Serving
    BallLost,
    /// Level cleared (terminal for this level)
    LevelWon,
    /// Lives exhausted (terminal)
    GameOver,
    /// Paused by input
    Paused,
}

impl GamePhase {
    /// Terminal phases accept no further ticks
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::LevelWon | GamePhase::GameOver)
    }
}

/// Ball state - parked, caught by the paddle, or free-moving
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BallState {
    /// Waiting on the paddle before launch
    Parked,
    /// Held by catch mode at a horizontal offset from the paddle centre
    Caught { offset: f32 },
    /// Free-moving
    Free,
}

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub state: BallState,
    /// Tick of the last brick resolution (at most one per tick)
    pub last_hit_tick: Option<u64>,
    /// Consecutive ticks spent in a too-flat trajectory
    pub stuck_ticks: u32,
}

impl Ball {
    pub fn new(id: u32, pos: Vec2, radius: f32) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius,
            state: BallState::Parked,
            last_hit_tick: None,
            stuck_ticks: 0,
        }
    }

    /// A free ball with the given velocity
    pub fn free(id: u32, pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            vel,
            state: BallState::Free,
            ..Self::new(id, pos, radius)
        }
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.state == BallState::Free
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Keep a parked or caught ball riding on the paddle
    pub fn follow_paddle(&mut self, paddle: &Paddle, paddle_y: f32, carry_offset: f32) {
        let offset = match self.state {
            BallState::Parked => 0.0,
            BallState::Caught { offset } => offset,
            BallState::Free => return,
        };
        self.pos = Vec2::new(paddle.x + offset, paddle_y - carry_offset);
    }
}

/// The player's paddle. Its y position is fixed by tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    /// Centre x
    pub x: f32,
    pub width: f32,
    pub height: f32,
}

impl Paddle {
    pub fn new(x: f32, width: f32, height: f32) -> Self {
        Self { x, width, height }
    }

    #[inline]
    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    /// Move the centre, keeping the paddle inside the playfield
    pub fn move_to(&mut self, x: f32, playfield_width: f32) {
        let half = self.half_width();
        let x = if x.is_finite() { x } else { self.x };
        self.x = if playfield_width > self.width {
            x.clamp(half, playfield_width - half)
        } else {
            playfield_width / 2.0
        };
    }

    /// Change width within [min, max], re-clamping the position
    pub fn set_width(&mut self, width: f32, min: f32, max: f32, playfield_width: f32) {
        self.width = width.clamp(min, max);
        self.move_to(self.x, playfield_width);
    }
}

/// Result of a single hit on a brick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Indestructible brick, nothing changed
    Deflected,
    /// Lost a hit point, `hp` remain
    Damaged { hp: u8 },
    /// Hit points reached zero
    Destroyed,
}

/// A brick entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brick {
    /// Stable index into `GameState::bricks`
    pub id: u32,
    pub row: u32,
    pub col: u32,
    pub kind: BrickKind,
    pub hp: u8,
    pub center: Vec2,
    pub half_extents: Vec2,
    /// Logically removed; collision-inert
    pub destroyed: bool,
}

impl Brick {
    pub fn from_slot(id: u32, slot: &BrickSlot, size: Vec2) -> Self {
        Self {
            id,
            row: slot.row,
            col: slot.col,
            kind: slot.kind,
            hp: slot.kind.hit_points(),
            center: slot.center,
            half_extents: size / 2.0,
            destroyed: false,
        }
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        !self.destroyed
    }

    /// Returns true if this brick must be destroyed to clear the level
    pub fn counts_for_clear(&self) -> bool {
        !self.kind.is_indestructible()
    }

    /// Apply one hit (ball or bolt)
    pub fn take_hit(&mut self) -> HitOutcome {
        if self.kind.is_indestructible() {
            return HitOutcome::Deflected;
        }
        self.hp = self.hp.saturating_sub(1);
        if self.hp == 0 {
            self.destroyed = true;
            HitOutcome::Destroyed
        } else {
            HitOutcome::Damaged { hp: self.hp }
        }
    }

    /// Destroy outright (explosions). Metal bricks ignore this.
    pub fn shatter(&mut self) -> bool {
        if self.destroyed || self.kind.is_indestructible() {
            return false;
        }
        self.hp = 0;
        self.destroyed = true;
        true
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    WidenPaddle,
    NarrowPaddle,
    MultiplyBalls,
    CatchMode,
    LaserMode,
    SlowBalls,
    SpeedBalls,
    ExtraLife,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 8] = [
        PowerUpKind::WidenPaddle,
        PowerUpKind::NarrowPaddle,
        PowerUpKind::MultiplyBalls,
        PowerUpKind::CatchMode,
        PowerUpKind::LaserMode,
        PowerUpKind::SlowBalls,
        PowerUpKind::SpeedBalls,
        PowerUpKind::ExtraLife,
    ];

    /// Whether the pickup helps the player (feedback only)
    pub fn is_good(&self) -> bool {
        !matches!(self, PowerUpKind::NarrowPaddle | PowerUpKind::SpeedBalls)
    }
}

/// A falling power-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub good: bool,
}

/// A laser bolt travelling upward
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bolt {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
}

/// What destroyed a brick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestroyCause {
    Ball { ball: u32 },
    Bolt,
    Explosion,
}

/// Tagged notifications for presentation/audio, in emission order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BallLaunched { ball: u32 },
    PaddleHit { ball: u32, offset: f32 },
    BallCaught { ball: u32 },
    WallBounce { ball: u32 },
    BrickHit { brick: u32, kind: BrickKind, hp: u8, damaged: bool },
    BrickDestroyed { brick: u32, kind: BrickKind, points: u64, cause: DestroyCause },
    Explosion { brick: u32, center: Vec2, radius: f32 },
    PowerUpSpawned { powerup: u32, kind: PowerUpKind, pos: Vec2 },
    PowerUpCollected { kind: PowerUpKind, good: bool },
    BoltFired { count: u32 },
    ModifierExpired { modifier: TimedModifier },
    BallStabilized { ball: u32 },
    LifeLost { lives_left: u8 },
    LevelWon { level: u32, score: u64, lives: u8 },
    GameOver { score: u64 },
}

/// A brick destruction deferred by an explosion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDestruction {
    pub brick: u32,
    pub due_tick: u64,
}

/// Score and lives handed from one level to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundCarry {
    pub score: u64,
    pub lives: u8,
}

impl RoundCarry {
    /// Start-of-game carry
    pub fn fresh(tuning: &Tuning) -> Self {
        Self {
            score: 0,
            lives: tuning.starting_lives,
        }
    }
}

/// Read-only view of the round after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub level_index: u32,
    pub level_name: String,
    pub score: u64,
    pub lives: u8,
    pub balls: usize,
    pub breakable_bricks: usize,
    pub paddle_x: f32,
    pub paddle_width: f32,
    pub ball_speed: f32,
    pub catching: bool,
    pub catch_ticks_left: u32,
    pub laser_active: bool,
    pub laser_ticks_left: u32,
}

/// Everything produced by one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickResult {
    pub events: Vec<GameEvent>,
    pub snapshot: RoundSnapshot,
}

/// Complete round state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub level_index: u32,
    pub level_name: String,
    pub score: u64,
    pub lives: u8,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: GamePhase,
    /// Ball has been launched at least once this serve
    pub launched: bool,
    /// Level-scaled speed restored after a lost life
    pub base_speed: f32,
    /// Current target ball speed
    pub ball_speed: f32,
    pub paddle: Paddle,
    /// Active balls (sorted by id)
    pub balls: Vec<Ball>,
    /// All bricks of the level, indexed by id
    pub bricks: Vec<Brick>,
    pub powerups: Vec<PowerUp>,
    pub bolts: Vec<Bolt>,
    pub modifiers: Modifiers,
    /// Explosion fallout, drained at a fixed point of each tick
    pub pending: Vec<PendingDestruction>,
    /// Power-ups spawned so far this level (capped)
    pub powerups_spawned: u32,
    next_id: u32,
}

impl GameState {
    /// Load a built-in level
    pub fn new(seed: u64, level_index: u32, carry: RoundCarry, tuning: Tuning) -> Self {
        let level = LevelDefinition::builtin(level_index);
        Self::with_level(seed, level_index, &level, carry, tuning)
    }

    /// Load an arbitrary level definition
    pub fn with_level(
        seed: u64,
        level_index: u32,
        level: &LevelDefinition,
        carry: RoundCarry,
        tuning: Tuning,
    ) -> Self {
        let tuning = tuning.sanitized();
        let base_speed = tuning.base_speed_for_level(level_index);
        let brick_size = Vec2::new(tuning.brick_width, tuning.brick_height);
        let bricks = level
            .layout(&tuning)
            .iter()
            .enumerate()
            .map(|(i, slot)| Brick::from_slot(i as u32, slot, brick_size))
            .collect::<Vec<_>>();
        let paddle = Paddle::new(
            tuning.playfield_width / 2.0,
            tuning.paddle_width,
            tuning.paddle_height,
        );

        log::info!(
            "Level {} '{}': {} bricks ({} breakable), base speed {}",
            level_index + 1,
            level.name,
            bricks.len(),
            bricks.iter().filter(|b| b.counts_for_clear()).count(),
            base_speed
        );

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed ^ ((level_index as u64) << 32)),
            level_index,
            level_name: level.name.clone(),
            score: carry.score,
            lives: carry.lives.max(1),
            time_ticks: 0,
            phase: GamePhase::Serving,
            launched: false,
            base_speed,
            ball_speed: base_speed,
            paddle,
            balls: Vec::new(),
            bricks,
            powerups: Vec::new(),
            bolts: Vec::new(),
            modifiers: Modifiers::default(),
            pending: Vec::new(),
            powerups_spawned: 0,
            next_id: 1,
            tuning,
        };

        state.spawn_ball_parked();
        state
    }

    /// State for the level after a win, or `None` once the last built-in level is cleared
    pub fn next_level(&self) -> Option<GameState> {
        if self.phase != GamePhase::LevelWon {
            return None;
        }
        let next = self.level_index + 1;
        if next >= LevelDefinition::builtin_count() {
            return None;
        }
        Some(GameState::new(
            self.seed,
            next,
            self.carry(),
            self.tuning.clone(),
        ))
    }

    /// Score and lives to hand to the next level
    pub fn carry(&self) -> RoundCarry {
        RoundCarry {
            score: self.score,
            lives: self.lives,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Spawn a ball parked on the paddle
    pub fn spawn_ball_parked(&mut self) {
        let id = self.next_entity_id();
        let mut ball = Ball::new(id, Vec2::ZERO, self.tuning.ball_radius);
        ball.follow_paddle(&self.paddle, self.tuning.paddle_y(), self.tuning.carry_offset);
        self.balls.push(ball);
    }

    /// Bricks still standing that must be destroyed to win
    pub fn breakable_remaining(&self) -> usize {
        self.bricks
            .iter()
            .filter(|b| b.is_live() && b.counts_for_clear())
            .count()
    }

    /// Current ball speed relative to the level base
    pub fn speed_multiplier(&self) -> f32 {
        if self.base_speed > 0.0 {
            self.ball_speed / self.base_speed
        } else {
            1.0
        }
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            tick: self.time_ticks,
            phase: self.phase,
            level_index: self.level_index,
            level_name: self.level_name.clone(),
            score: self.score,
            lives: self.lives,
            balls: self.balls.len(),
            breakable_bricks: self.breakable_remaining(),
            paddle_x: self.paddle.x,
            paddle_width: self.paddle.width,
            ball_speed: self.ball_speed,
            catching: self.modifiers.catching(),
            catch_ticks_left: self.modifiers.remaining(TimedModifier::Catch),
            laser_active: self.modifiers.laser_active(),
            laser_ticks_left: self.modifiers.remaining(TimedModifier::Laser),
        }
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.balls.sort_by_key(|b| b.id);
        self.powerups.sort_by_key(|p| p.id);
        self.bolts.sort_by_key(|b| b.id);
    }
}
