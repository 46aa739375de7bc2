//! Anti-softlock for near-horizontal trajectories
//!
//! A ball bouncing wall to wall with almost no vertical speed never reaches
//! the paddle or the bricks. After `stuck_tick_limit` consecutive flat ticks
//! its vertical velocity is reset, pointing away from the nearer edge.

use super::state::Ball;
use crate::tuning::Tuning;

/// Is the ball moving but too flat to make progress?
#[inline]
pub fn is_flat(ball: &Ball, tuning: &Tuning) -> bool {
    ball.speed() > tuning.stuck_min_speed && ball.vel.y.abs() < tuning.flat_threshold
}

/// Update one ball's flat-tick counter and correct it once the limit is hit.
///
/// Returns true if the ball was corrected.
pub fn stabilize(ball: &mut Ball, tuning: &Tuning) -> bool {
    if !ball.is_free() || !is_flat(ball, tuning) {
        ball.stuck_ticks = 0;
        return false;
    }

    ball.stuck_ticks += 1;
    if ball.stuck_ticks <= tuning.stuck_tick_limit {
        return false;
    }

    // Upper half drifts toward the ceiling, so push down; lower half pushes up
    let upper_half = ball.pos.y < tuning.playfield_height / 2.0;
    ball.vel.y = if upper_half {
        tuning.unstick_speed
    } else {
        -tuning.unstick_speed
    };
    ball.stuck_ticks = 0;
    log::debug!(
        "Ball {} stabilized at ({:.1}, {:.1}) vel ({:.1}, {:.1})",
        ball.id,
        ball.pos.x,
        ball.pos.y,
        ball.vel.x,
        ball.vel.y
    );
    true
}

/// Run the stabilizer over every ball; returns the ids that were corrected
pub fn stabilize_all(balls: &mut [Ball], tuning: &Tuning) -> Vec<u32> {
    balls
        .iter_mut()
        .filter_map(|ball| stabilize(ball, tuning).then_some(ball.id))
        .collect()
}
