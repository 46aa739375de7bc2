//! Collision detection and response for balls, paddle, bricks and bolts
//!
//! Everything is axis-aligned: bricks and the paddle are boxes, balls are
//! circles. `resolve_ball` moves one ball through one tick and reports what it
//! touched; the caller applies brick damage so a destroyed brick is inert for
//! the next ball in the same tick.

use glam::Vec2;

use super::state::{Ball, BallState, Brick, Paddle};
use crate::tuning::Tuning;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Axis-aligned surface normal, pointing toward the ball centre
    pub normal: Vec2,
    /// Penetration depth along the normal (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Broad phase: does a circle touch an axis-aligned box?
#[inline]
pub fn circle_touches_box(pos: Vec2, radius: f32, center: Vec2, half: Vec2) -> bool {
    let closest = pos.clamp(center - half, center + half);
    pos.distance_squared(closest) < radius * radius
}

/// Overlap test for two axis-aligned boxes
#[inline]
pub fn boxes_overlap(a_center: Vec2, a_half: Vec2, b_center: Vec2, b_half: Vec2) -> bool {
    let d = (a_center - b_center).abs();
    d.x < a_half.x + b_half.x && d.y < a_half.y + b_half.y
}

/// Check collision between a ball and a brick box.
///
/// Resolves along the axis with the smaller overlap of the ball's bounding
/// square against the box. A ball centred exactly on an axis uses its
/// velocity to pick the side.
pub fn ball_brick_collision(
    ball_pos: Vec2,
    ball_vel: Vec2,
    ball_radius: f32,
    center: Vec2,
    half: Vec2,
) -> CollisionResult {
    if !circle_touches_box(ball_pos, ball_radius, center, half) {
        return CollisionResult::miss();
    }

    let d = ball_pos - center;
    let overlap_x = (half.x + ball_radius) - d.x.abs();
    let overlap_y = (half.y + ball_radius) - d.y.abs();
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return CollisionResult::miss();
    }

    let side = |offset: f32, vel: f32| {
        if offset != 0.0 {
            offset.signum()
        } else if vel != 0.0 {
            -vel.signum()
        } else {
            1.0
        }
    };

    if overlap_x < overlap_y {
        CollisionResult {
            hit: true,
            normal: Vec2::new(side(d.x, ball_vel.x), 0.0),
            penetration: overlap_x,
        }
    } else {
        CollisionResult {
            hit: true,
            normal: Vec2::new(0.0, side(d.y, ball_vel.y)),
            penetration: overlap_y,
        }
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Clamp a ball inside the left, top and right walls (the bottom is open).
///
/// Returns true if any wall was touched.
pub fn resolve_walls(ball: &mut Ball, playfield_width: f32) -> bool {
    let r = ball.radius;
    let mut hit = false;
    if ball.pos.x - r < 0.0 {
        ball.pos.x = r;
        ball.vel.x = ball.vel.x.abs();
        hit = true;
    } else if ball.pos.x + r > playfield_width {
        ball.pos.x = playfield_width - r;
        ball.vel.x = -ball.vel.x.abs();
        hit = true;
    }
    if ball.pos.y - r < 0.0 {
        ball.pos.y = r;
        ball.vel.y = ball.vel.y.abs();
        hit = true;
    }
    hit
}

/// Normalised contact position across the paddle: -1 left edge, 0 centre, +1 right edge
pub fn hit_offset(ball_x: f32, paddle: &Paddle) -> f32 {
    let half = paddle.half_width();
    if half <= f32::EPSILON {
        return 0.0;
    }
    ((ball_x - paddle.x) / half).clamp(-1.0, 1.0)
}

/// Velocity leaving the paddle (or a serve) at a given hit offset.
///
/// The angle depends only on where the ball touched; the vertical component
/// is a fixed fraction of the round's ball speed.
pub fn paddle_bounce_velocity(offset: f32, ball_speed: f32, tuning: &Tuning) -> Vec2 {
    let offset = offset.clamp(-1.0, 1.0);
    Vec2::new(
        offset * ball_speed * tuning.paddle_horizontal_factor,
        -ball_speed * tuning.paddle_vertical_factor,
    )
}

/// What a ball touched during its tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BallContacts {
    pub wall: bool,
    pub paddle: Option<PaddleContact>,
    /// Index of the brick resolved this tick
    pub brick: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaddleContact {
    Bounce { offset: f32 },
    Caught,
}

/// Per-tick inputs to ball resolution
#[derive(Debug, Clone, Copy)]
pub struct ResolveCtx<'a> {
    pub tuning: &'a Tuning,
    pub tick: u64,
    pub dt: f32,
    pub catching: bool,
    pub ball_speed: f32,
}

/// Move one free ball and resolve walls, paddle and at most one brick
pub fn resolve_ball(
    ball: &mut Ball,
    paddle: &Paddle,
    bricks: &[Brick],
    ctx: &ResolveCtx,
) -> BallContacts {
    let mut contacts = BallContacts::default();
    if !ball.is_free() {
        return contacts;
    }
    let tuning = ctx.tuning;

    let prev_y = ball.pos.y;
    ball.pos += ball.vel * ctx.dt;

    contacts.wall = resolve_walls(ball, tuning.playfield_width);

    // Paddle: only a descending ball that was above the top face can land on it;
    // one already below the top passes the edge and falls
    let paddle_y = tuning.paddle_y();
    let paddle_half = Vec2::new(paddle.half_width(), paddle.height / 2.0);
    let paddle_top = paddle_y - paddle_half.y;
    if ball.vel.y > 0.0
        && prev_y <= paddle_top
        && circle_touches_box(ball.pos, ball.radius, Vec2::new(paddle.x, paddle_y), paddle_half)
    {
        if ctx.catching {
            ball.vel = Vec2::ZERO;
            ball.state = BallState::Caught {
                offset: ball.pos.x - paddle.x,
            };
            ball.pos.y = paddle_y - tuning.carry_offset;
            ball.stuck_ticks = 0;
            contacts.paddle = Some(PaddleContact::Caught);
            return contacts;
        }

        let offset = hit_offset(ball.pos.x, paddle);
        ball.vel = paddle_bounce_velocity(offset, ctx.ball_speed, tuning);
        ball.pos.y = paddle_y - paddle_half.y - ball.radius - tuning.push_epsilon;
        contacts.paddle = Some(PaddleContact::Bounce { offset });
    }

    // Bricks: one resolution per ball per tick
    if ball.last_hit_tick == Some(ctx.tick) {
        return contacts;
    }
    for (idx, brick) in bricks.iter().enumerate() {
        if !brick.is_live() {
            continue;
        }
        let result =
            ball_brick_collision(ball.pos, ball.vel, ball.radius, brick.center, brick.half_extents);
        if !result.hit {
            continue;
        }

        ball.pos += result.normal * (result.penetration + tuning.push_epsilon);
        // Only reflect if moving toward the surface
        if ball.vel.dot(result.normal) < 0.0 {
            ball.vel = reflect_velocity(ball.vel, result.normal);
        }
        ball.last_hit_tick = Some(ctx.tick);
        contacts.brick = Some(idx);
        break;
    }

    contacts
}

/// First live brick a bolt box overlaps
pub fn bolt_brick_hit(bolt_pos: Vec2, bolt_half: Vec2, bricks: &[Brick]) -> Option<usize> {
    bricks.iter().position(|brick| {
        brick.is_live() && boxes_overlap(bolt_pos, bolt_half, brick.center, brick.half_extents)
    })
}
