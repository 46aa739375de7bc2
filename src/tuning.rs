//! Data-driven game balance
//!
//! Every number the simulation uses lives here so a round can be replayed
//! or rebalanced from a JSON file. Durations are stored in milliseconds and
//! converted to ticks on demand.

use serde::{Deserialize, Serialize};

use crate::ms_to_ticks;

/// Game balance and geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Playfield ===
    pub playfield_width: f32,
    pub playfield_height: f32,

    // === Paddle ===
    pub paddle_width: f32,
    pub paddle_min_width: f32,
    pub paddle_max_width: f32,
    pub paddle_height: f32,
    /// Distance from the playfield bottom to the paddle centre
    pub paddle_y_offset: f32,
    pub paddle_widen_step: f32,
    pub paddle_narrow_step: f32,
    /// Keyboard movement speed (pixels/s)
    pub paddle_speed: f32,
    /// Horizontal speed at the paddle edge, as a fraction of ball speed
    pub paddle_horizontal_factor: f32,
    /// Vertical speed after any paddle bounce, as a fraction of ball speed
    pub paddle_vertical_factor: f32,
    /// Height above the paddle centre where parked/caught balls sit
    pub carry_offset: f32,

    // === Ball ===
    pub ball_radius: f32,
    pub ball_base_speed: f32,
    /// Base speed added per level index
    pub ball_speed_per_level: f32,
    pub ball_speed_step: f32,
    pub ball_min_speed: f32,
    pub ball_max_speed: f32,
    /// Launch hit-offset range (± this value)
    pub launch_spread: f32,
    /// Release-from-catch hit-offset range (± this value)
    pub release_spread: f32,
    pub max_balls: usize,
    /// Angle (degrees) between a split ball and its children
    pub multi_ball_angle_deg: f32,

    // === Bricks ===
    pub brick_width: f32,
    pub brick_height: f32,
    pub brick_gap: f32,
    /// Centre y of the first brick row
    pub brick_top: f32,
    /// Push-out beyond the overlap when resolving a brick hit
    pub push_epsilon: f32,
    pub explosion_radius: f32,
    pub explosion_delay_ms: u32,

    // === Power-ups ===
    pub powerup_chance: f32,
    pub powerup_cap_per_level: u32,
    pub powerup_fall_speed: f32,
    pub powerup_size: f32,
    pub catch_duration_ms: u32,
    pub laser_duration_ms: u32,
    pub laser_interval_ms: u32,
    pub bolt_speed: f32,
    pub bolt_offset_x: f32,
    pub bolt_width: f32,
    pub bolt_height: f32,

    // === Stabilizer ===
    pub stuck_min_speed: f32,
    pub flat_threshold: f32,
    pub stuck_tick_limit: u32,
    pub unstick_speed: f32,

    // === Bounds ===
    pub ball_lost_margin: f32,
    pub powerup_lost_margin: f32,
    pub bolt_lost_margin: f32,

    // === Round ===
    pub starting_lives: u8,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            playfield_width: 480.0,
            playfield_height: 800.0,

            paddle_width: 80.0,
            paddle_min_width: 40.0,
            paddle_max_width: 160.0,
            paddle_height: 16.0,
            paddle_y_offset: 60.0,
            paddle_widen_step: 30.0,
            paddle_narrow_step: 20.0,
            paddle_speed: 600.0,
            paddle_horizontal_factor: 0.9,
            paddle_vertical_factor: 0.75,
            carry_offset: 25.0,

            ball_radius: 8.0,
            ball_base_speed: 350.0,
            ball_speed_per_level: 15.0,
            ball_speed_step: 80.0,
            ball_min_speed: 200.0,
            ball_max_speed: 600.0,
            launch_spread: 0.67,
            release_spread: 0.33,
            max_balls: 24,
            multi_ball_angle_deg: 30.0,

            brick_width: 50.0,
            brick_height: 24.0,
            brick_gap: 4.0,
            brick_top: 100.0,
            push_epsilon: 0.5,
            explosion_radius: 60.0,
            explosion_delay_ms: 50,

            powerup_chance: 0.20,
            powerup_cap_per_level: 12,
            powerup_fall_speed: 120.0,
            powerup_size: 28.0,
            catch_duration_ms: 15_000,
            laser_duration_ms: 10_000,
            laser_interval_ms: 300,
            bolt_speed: 500.0,
            bolt_offset_x: 20.0,
            bolt_width: 4.0,
            bolt_height: 14.0,

            stuck_min_speed: 1.0,
            flat_threshold: 60.0,
            stuck_tick_limit: 60,
            unstick_speed: 180.0,

            ball_lost_margin: 20.0,
            powerup_lost_margin: 30.0,
            bolt_lost_margin: 20.0,

            starting_lives: 3,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let tuning: Tuning = serde_json::from_str(json)?;
        Ok(tuning.sanitized())
    }

    /// Clamp values that would make the simulation degenerate.
    ///
    /// Nothing is rejected: bad values are pulled back into range and logged.
    pub fn sanitized(mut self) -> Self {
        fn at_least(name: &str, value: &mut f32, min: f32) {
            if !value.is_finite() || *value < min {
                log::warn!("tuning.{name} = {value} out of range, using {min}");
                *value = min;
            }
        }

        at_least("playfield_width", &mut self.playfield_width, 100.0);
        at_least("playfield_height", &mut self.playfield_height, 100.0);
        at_least("paddle_min_width", &mut self.paddle_min_width, 4.0);
        let min_w = self.paddle_min_width;
        at_least("paddle_max_width", &mut self.paddle_max_width, min_w);
        if self.paddle_max_width > self.playfield_width {
            log::warn!("tuning.paddle_max_width wider than playfield, clamping");
            self.paddle_max_width = self.playfield_width.max(min_w);
        }
        self.paddle_width = self
            .paddle_width
            .clamp(self.paddle_min_width, self.paddle_max_width);
        at_least("paddle_height", &mut self.paddle_height, 1.0);
        at_least("ball_radius", &mut self.ball_radius, 1.0);
        at_least("ball_min_speed", &mut self.ball_min_speed, 1.0);
        let min_speed = self.ball_min_speed;
        at_least("ball_max_speed", &mut self.ball_max_speed, min_speed);
        at_least("paddle_vertical_factor", &mut self.paddle_vertical_factor, 0.1);
        at_least("flat_threshold", &mut self.flat_threshold, 0.0);
        let flat = self.flat_threshold;
        at_least("unstick_speed", &mut self.unstick_speed, flat + 1.0);
        at_least("brick_width", &mut self.brick_width, 1.0);
        at_least("brick_height", &mut self.brick_height, 1.0);
        at_least("explosion_radius", &mut self.explosion_radius, 0.0);
        self.powerup_chance = if self.powerup_chance.is_finite() {
            self.powerup_chance.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.max_balls = self.max_balls.max(1);
        self.starting_lives = self.starting_lives.max(1);
        self
    }

    /// Paddle centre y (fixed for the whole round)
    #[inline]
    pub fn paddle_y(&self) -> f32 {
        self.playfield_height - self.paddle_y_offset
    }

    /// Level-scaled base ball speed
    pub fn base_speed_for_level(&self, level_index: u32) -> f32 {
        (self.ball_base_speed + level_index as f32 * self.ball_speed_per_level)
            .clamp(self.ball_min_speed, self.ball_max_speed)
    }

    pub fn catch_ticks(&self) -> u32 {
        ms_to_ticks(self.catch_duration_ms)
    }

    pub fn laser_ticks(&self) -> u32 {
        ms_to_ticks(self.laser_duration_ms)
    }

    pub fn laser_interval_ticks(&self) -> u32 {
        ms_to_ticks(self.laser_interval_ms)
    }

    pub fn explosion_delay_ticks(&self) -> u32 {
        ms_to_ticks(self.explosion_delay_ms)
    }
}
