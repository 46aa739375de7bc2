//! Power-up effects and timed modifiers
//!
//! Timed modifiers are deadline counters decremented once per tick, so expiry
//! is reproducible. Re-collecting an active modifier resets its countdown.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Ball, BallState, GameEvent, GameState, PowerUpKind};

/// Modifiers that expire on a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimedModifier {
    Catch,
    Laser,
}

/// Active timed modifiers (ticks remaining, 0 = inactive)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub catch_ticks: u32,
    pub laser_ticks: u32,
    /// Ticks until the next laser volley
    pub laser_fire_ticks: u32,
}

/// What happened to the timers this tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierTick {
    pub expired: Vec<TimedModifier>,
    pub fire_bolts: bool,
}

impl Modifiers {
    #[inline]
    pub fn catching(&self) -> bool {
        self.catch_ticks > 0
    }

    #[inline]
    pub fn laser_active(&self) -> bool {
        self.laser_ticks > 0
    }

    pub fn remaining(&self, modifier: TimedModifier) -> u32 {
        match modifier {
            TimedModifier::Catch => self.catch_ticks,
            TimedModifier::Laser => self.laser_ticks,
        }
    }

    /// (Re)start catch mode
    pub fn start_catch(&mut self, duration: u32) {
        self.catch_ticks = duration.max(1);
    }

    /// (Re)start laser mode; the first volley fires one interval later
    pub fn start_laser(&mut self, duration: u32, interval: u32) {
        self.laser_ticks = duration.max(1);
        self.laser_fire_ticks = interval.max(1);
    }

    /// Cancel everything (life lost)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Advance all countdowns by one tick
    pub fn tick(&mut self, laser_interval: u32) -> ModifierTick {
        let mut out = ModifierTick::default();

        if self.catch_ticks > 0 {
            self.catch_ticks -= 1;
            if self.catch_ticks == 0 {
                out.expired.push(TimedModifier::Catch);
            }
        }

        if self.laser_ticks > 0 {
            self.laser_ticks -= 1;
            if self.laser_ticks == 0 {
                self.laser_fire_ticks = 0;
                out.expired.push(TimedModifier::Laser);
            } else {
                self.laser_fire_ticks = self.laser_fire_ticks.saturating_sub(1);
                if self.laser_fire_ticks == 0 {
                    out.fire_bolts = true;
                    self.laser_fire_ticks = laser_interval.max(1);
                }
            }
        }

        out
    }
}

/// Apply a collected power-up to the round
pub fn apply_powerup(state: &mut GameState, kind: PowerUpKind, events: &mut Vec<GameEvent>) {
    let tuning = &state.tuning;
    match kind {
        PowerUpKind::WidenPaddle => {
            let width = state.paddle.width + tuning.paddle_widen_step;
            state.paddle.set_width(
                width,
                tuning.paddle_min_width,
                tuning.paddle_max_width,
                tuning.playfield_width,
            );
        }
        PowerUpKind::NarrowPaddle => {
            let width = state.paddle.width - tuning.paddle_narrow_step;
            state.paddle.set_width(
                width,
                tuning.paddle_min_width,
                tuning.paddle_max_width,
                tuning.playfield_width,
            );
        }
        PowerUpKind::MultiplyBalls => multiply_balls(state),
        PowerUpKind::CatchMode => {
            let duration = tuning.catch_ticks();
            state.modifiers.start_catch(duration);
        }
        PowerUpKind::LaserMode => {
            let duration = tuning.laser_ticks();
            let interval = tuning.laser_interval_ticks();
            state.modifiers.start_laser(duration, interval);
        }
        PowerUpKind::SlowBalls => {
            let speed = state.ball_speed - tuning.ball_speed_step;
            set_ball_speed(state, speed);
        }
        PowerUpKind::SpeedBalls => {
            let speed = state.ball_speed + tuning.ball_speed_step;
            set_ball_speed(state, speed);
        }
        PowerUpKind::ExtraLife => {
            state.lives = state.lives.saturating_add(1);
        }
    }

    log::debug!(
        "Power-up {:?}: paddle {} speed {} lives {}",
        kind,
        state.paddle.width,
        state.ball_speed,
        state.lives
    );
    events.push(GameEvent::PowerUpCollected {
        kind,
        good: kind.is_good(),
    });
}

/// Clamp the target speed and rescale every moving ball to it
pub fn set_ball_speed(state: &mut GameState, speed: f32) {
    state.ball_speed = speed.clamp(state.tuning.ball_min_speed, state.tuning.ball_max_speed);
    rescale_balls(&mut state.balls, state.ball_speed);
}

/// Change each moving ball's speed, preserving its direction
pub fn rescale_balls(balls: &mut [Ball], speed: f32) {
    for ball in balls.iter_mut() {
        if let Some(dir) = ball.vel.try_normalize() {
            ball.vel = dir * speed;
        }
    }
}

/// Every live ball spawns two children at ± the split angle.
///
/// Children inherit the parent's speed; a ball at rest (caught) splits
/// upward at the round's ball speed. The ball cap limits growth.
pub fn multiply_balls(state: &mut GameState) {
    let angle = state.tuning.multi_ball_angle_deg.to_radians();
    let max_balls = state.tuning.max_balls;
    let parents: Vec<(Vec2, Vec2)> = state
        .balls
        .iter()
        .filter(|b| b.state != BallState::Parked)
        .map(|b| {
            let vel = if b.vel.length_squared() > 0.0 {
                b.vel
            } else {
                Vec2::new(0.0, -state.ball_speed)
            };
            (b.pos, vel)
        })
        .collect();

    let radius = state.tuning.ball_radius;
    'parents: for (pos, vel) in parents {
        for sign in [-1.0_f32, 1.0] {
            if state.balls.len() >= max_balls {
                break 'parents;
            }
            let child_vel = Vec2::from_angle(sign * angle).rotate(vel);
            let id = state.next_entity_id();
            state.balls.push(Ball::free(id, pos, child_vel, radius));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::RoundCarry;
    use crate::tuning::Tuning;

    fn in_play() -> GameState {
        let tuning = Tuning::default();
        let mut state = GameState::new(3, 0, RoundCarry::fresh(&tuning), tuning);
        state.balls[0].state = BallState::Free;
        state.balls[0].vel = Vec2::new(0.0, -state.ball_speed);
        state
    }

    #[test]
    fn test_catch_timer_expires() {
        let mut mods = Modifiers::default();
        mods.start_catch(3);
        assert!(mods.catching());
        assert!(mods.tick(10).expired.is_empty());
        assert!(mods.tick(10).expired.is_empty());
        assert_eq!(mods.tick(10).expired, vec![TimedModifier::Catch]);
        assert!(!mods.catching());
        assert!(mods.tick(10).expired.is_empty());
    }

    #[test]
    fn test_retrigger_resets_not_stacks() {
        let mut mods = Modifiers::default();
        mods.start_catch(100);
        for _ in 0..60 {
            mods.tick(10);
        }
        mods.start_catch(100);
        assert_eq!(mods.catch_ticks, 100);
    }

    #[test]
    fn test_laser_fires_on_interval_then_expires() {
        let mut mods = Modifiers::default();
        mods.start_laser(10, 3);
        let fired: Vec<bool> = (0..10).map(|_| mods.tick(3).fire_bolts).collect();
        // Fires every third tick while active; the expiry tick never fires
        assert_eq!(
            fired,
            vec![false, false, true, false, false, true, false, false, true, false]
        );
        assert!(!mods.laser_active());
        assert_eq!(mods.laser_fire_ticks, 0);
    }

    #[test]
    fn test_widen_and_narrow_clamp() {
        let mut state = in_play();
        let mut events = Vec::new();
        for _ in 0..10 {
            apply_powerup(&mut state, PowerUpKind::WidenPaddle, &mut events);
        }
        assert_eq!(state.paddle.width, state.tuning.paddle_max_width);
        for _ in 0..10 {
            apply_powerup(&mut state, PowerUpKind::NarrowPaddle, &mut events);
        }
        assert_eq!(state.paddle.width, state.tuning.paddle_min_width);
        assert_eq!(events.len(), 20);
    }

    #[test]
    fn test_speed_rescale_preserves_direction() {
        let mut state = in_play();
        state.balls[0].vel = Vec2::new(3.0, -4.0).normalize() * state.ball_speed;
        let dir_before = state.balls[0].vel.normalize();

        let mut events = Vec::new();
        apply_powerup(&mut state, PowerUpKind::SlowBalls, &mut events);
        assert_eq!(state.ball_speed, 270.0);
        assert!((state.balls[0].speed() - 270.0).abs() < 1e-3);
        assert!(state.balls[0].vel.normalize().abs_diff_eq(dir_before, 1e-5));

        for _ in 0..5 {
            apply_powerup(&mut state, PowerUpKind::SlowBalls, &mut events);
        }
        assert_eq!(state.ball_speed, state.tuning.ball_min_speed);

        for _ in 0..10 {
            apply_powerup(&mut state, PowerUpKind::SpeedBalls, &mut events);
        }
        assert_eq!(state.ball_speed, state.tuning.ball_max_speed);
        assert!((state.balls[0].speed() - state.tuning.ball_max_speed).abs() < 1e-3);
    }

    #[test]
    fn test_rescale_skips_resting_balls() {
        let mut balls = vec![Ball::new(1, Vec2::ZERO, 8.0)];
        rescale_balls(&mut balls, 500.0);
        assert_eq!(balls[0].vel, Vec2::ZERO);
    }

    #[test]
    fn test_multiply_one_ball_makes_three() {
        let mut state = in_play();
        let mut events = Vec::new();
        apply_powerup(&mut state, PowerUpKind::MultiplyBalls, &mut events);
        assert_eq!(state.balls.len(), 3);

        let speeds: Vec<f32> = state.balls.iter().map(Ball::speed).collect();
        for s in &speeds {
            assert!((s - speeds[0]).abs() < 1e-3);
        }
        let a0 = state.balls[0].vel.to_angle();
        let a1 = state.balls[1].vel.to_angle();
        let a2 = state.balls[2].vel.to_angle();
        assert!((a0 - a1).abs() > 0.1);
        assert!((a0 - a2).abs() > 0.1);
        assert!((a1 - a2).abs() > 0.1);
    }

    #[test]
    fn test_multiply_respects_ball_cap() {
        let mut state = in_play();
        let mut events = Vec::new();
        for _ in 0..5 {
            apply_powerup(&mut state, PowerUpKind::MultiplyBalls, &mut events);
        }
        assert_eq!(state.balls.len(), state.tuning.max_balls);
    }

    #[test]
    fn test_extra_life_and_timed_modes() {
        let mut state = in_play();
        let mut events = Vec::new();
        apply_powerup(&mut state, PowerUpKind::ExtraLife, &mut events);
        assert_eq!(state.lives, 4);
        apply_powerup(&mut state, PowerUpKind::CatchMode, &mut events);
        assert!(state.modifiers.catching());
        apply_powerup(&mut state, PowerUpKind::LaserMode, &mut events);
        assert!(state.modifiers.laser_active());
        assert_eq!(
            events.last(),
            Some(&GameEvent::PowerUpCollected {
                kind: PowerUpKind::LaserMode,
                good: true
            })
        );
    }
}
