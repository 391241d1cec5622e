//! Player controller
//!
//! Intent-driven horizontal motion with acceleration and friction, an
//! edge-triggered jump, gravity (sign follows the level's inversion flag),
//! and collision against platforms plus all currently-solid echoes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rect::{Rect, resolve_rect};
use crate::consts::*;
use crate::tuning::Tuning;

/// What a collider belongs to; the player cares because standing on an echo
/// feeds downstream cosmetics (jump dust) and future mechanics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColliderSource {
    World,
    Echo(u32),
}

/// A solid rectangle tagged with its owner.
#[derive(Debug, Clone, Copy)]
pub struct Collider {
    pub rect: Rect,
    pub source: ColliderSource,
}

/// The player avatar. One per session; fields are reset on every level build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub on_ground: bool,
    /// -1 or +1; never 0 (keeps the last direction).
    pub facing: i8,
    /// Last non-zero movement intent, falling back to the velocity sign.
    pub last_move_dir: i8,
    /// The surface under the player this tick was an echo.
    pub grounded_on_echo: bool,
}

impl Player {
    pub fn new(spawn: Vec2) -> Self {
        Self {
            pos: spawn,
            vel: Vec2::ZERO,
            on_ground: false,
            facing: 1,
            last_move_dir: 0,
            grounded_on_echo: false,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, PLAYER_W, PLAYER_H)
    }

    /// Reset for a level (re)build.
    pub fn reset(&mut self, spawn: Vec2) {
        *self = Self::new(spawn);
    }

    /// Advance one tick. `intent` is -1/0/+1, `jump` is already
    /// edge-detected by the input layer, `gravity_dir` is +1.0 normally and
    /// -1.0 while the level's gravity is inverted.
    pub fn update(
        &mut self,
        intent: i8,
        jump: bool,
        gravity_dir: f32,
        dt: f32,
        colliders: &[Collider],
        tuning: &Tuning,
    ) {
        if intent != 0 {
            self.last_move_dir = intent;
        } else if self.vel.x.abs() > PLAYER_STOP_SPEED {
            self.last_move_dir = if self.vel.x > 0.0 { 1 } else { -1 };
        }

        if intent != 0 {
            self.vel.x = (self.vel.x + intent as f32 * tuning.move_accel * dt)
                .clamp(-tuning.move_speed, tuning.move_speed);
        } else {
            self.vel.x *= 1.0 - (8.0 * dt).clamp(0.0, 1.0);
            if self.vel.x.abs() < PLAYER_STOP_SPEED {
                self.vel.x = 0.0;
            }
        }
        if self.vel.x > 0.0 {
            self.facing = 1;
        } else if self.vel.x < 0.0 {
            self.facing = -1;
        }

        if jump && self.on_ground {
            self.vel.y = tuning.jump_velocity * gravity_dir;
            self.on_ground = false;
        }

        self.vel.y += tuning.gravity * gravity_dir * dt;
        self.pos += self.vel * dt;

        self.on_ground = false;
        self.grounded_on_echo = false;
        // Platforms come first in the collider list, echoes after, both in
        // collection order.
        let rects: Vec<Rect> = colliders.iter().map(|c| c.rect).collect();
        let res = resolve_rect(&mut self.pos, &mut self.vel, PLAYER_W, PLAYER_H, &rects, gravity_dir);
        if res.grounded {
            self.on_ground = true;
            if let Some(idx) = res.grounded_on {
                self.grounded_on_echo = matches!(colliders[idx].source, ColliderSource::Echo(_));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(rect: Rect) -> Collider {
        Collider { rect, source: ColliderSource::World }
    }

    fn floor() -> Collider {
        world(Rect::new(0.0, 400.0, 960.0, 24.0))
    }

    fn settled_player() -> Player {
        let mut p = Player::new(Vec2::new(100.0, 400.0 - PLAYER_H - RESOLVE_EPS));
        let t = Tuning::default();
        for _ in 0..10 {
            p.update(0, false, 1.0, 1.0 / 60.0, &[floor()], &t);
        }
        assert!(p.on_ground);
        p
    }

    #[test]
    fn accelerates_up_to_speed_cap() {
        let mut p = settled_player();
        let t = Tuning::default();
        for _ in 0..120 {
            p.update(1, false, 1.0, 1.0 / 60.0, &[floor()], &t);
        }
        assert!((p.vel.x - t.move_speed).abs() < 1e-3);
        assert_eq!(p.facing, 1);
    }

    #[test]
    fn friction_stops_player_without_intent() {
        let mut p = settled_player();
        let t = Tuning::default();
        p.vel.x = t.move_speed;
        for _ in 0..120 {
            p.update(0, false, 1.0, 1.0 / 60.0, &[floor()], &t);
        }
        assert_eq!(p.vel.x, 0.0);
    }

    #[test]
    fn jump_only_when_grounded() {
        let t = Tuning::default();
        let mut airborne = Player::new(Vec2::new(100.0, 100.0));
        airborne.update(0, true, 1.0, 1.0 / 60.0, &[], &t);
        assert!(airborne.vel.y > t.jump_velocity, "airborne jump intent must be ignored");

        let mut p = settled_player();
        p.update(0, true, 1.0, 1.0 / 60.0, &[floor()], &t);
        assert!(p.vel.y < 0.0);
        assert!(!p.on_ground);
    }

    #[test]
    fn grounded_recomputed_every_tick() {
        let t = Tuning::default();
        let mut p = settled_player();
        // Walk off the right edge of a short ledge.
        let ledge = world(Rect::new(0.0, 400.0, 130.0, 24.0));
        for _ in 0..60 {
            p.update(1, false, 1.0, 1.0 / 60.0, &[ledge], &t);
        }
        assert!(!p.on_ground, "leaving the ledge must clear the grounded flag");
        assert!(p.vel.y > 0.0);
    }

    #[test]
    fn grounded_on_echo_flag_set() {
        let t = Tuning::default();
        let echo_top = Collider {
            rect: Rect::new(80.0, 400.0, 22.0, 36.0),
            source: ColliderSource::Echo(9),
        };
        let mut p = Player::new(Vec2::new(85.0, 400.0 - PLAYER_H - 2.0));
        for _ in 0..10 {
            p.update(0, false, 1.0, 1.0 / 60.0, &[echo_top], &t);
        }
        assert!(p.on_ground);
        assert!(p.grounded_on_echo);
    }

    #[test]
    fn inverted_gravity_falls_upward_and_lands_on_ceiling() {
        let t = Tuning::default();
        let ceiling = world(Rect::new(0.0, 50.0, 960.0, 24.0));
        let mut p = Player::new(Vec2::new(100.0, 200.0));
        for _ in 0..240 {
            p.update(0, false, -1.0, 1.0 / 60.0, &[ceiling], &t);
            if p.on_ground {
                break;
            }
        }
        assert!(p.on_ground, "player should rest against the ceiling under inverted gravity");
        assert!(p.pos.y >= ceiling.rect.bottom());
    }
}
