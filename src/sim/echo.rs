//! Echo entities: temporary solid duplicates of the player
//!
//! An echo is spawned by the echo manager ([`super::spawn`]), runs its own
//! physics against the level platforms every tick, and goes non-solid once
//! its life runs out. Moving echoes are the exception: they keep travelling
//! until a collision stops them and never age out.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::rect::{Rect, resolve_rect};
use super::state::Particle;
use crate::consts::*;

/// Movement mode, fixed at spawn except for the automatic fall -> static
/// transition on first landing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EchoMode {
    /// Parked in place; skips gravity while grounded to avoid jitter.
    Static,
    /// Travels horizontally at constant speed until something stops it.
    Moving,
    /// Falling; becomes `Static` the first time it lands.
    Fall,
}

/// A temporary solid duplicate of the player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Echo {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub mode: EchoMode,
    pub age: f32,
    /// Remaining-life budget in seconds; `None` means the echo never expires
    /// by age (moving mode).
    pub life: Option<f32>,
    pub solid: bool,
    pub opacity: f32,
    pub grounded: bool,
    /// One level's mechanic: gravity is suspended until this echo has passed
    /// both triggers of the level's trigger pair.
    pub ignore_gravity_until_triggers: bool,
    pub passed_triggers: bool,
    /// Cosmetic trail, emitted only while in moving mode.
    #[serde(skip)]
    pub trail: Vec<Particle>,
}

impl Echo {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, mode: EchoMode) -> Self {
        let life = match mode {
            EchoMode::Moving => None,
            _ => Some(ECHO_LIFE),
        };
        Self {
            id,
            pos,
            vel,
            mode,
            age: 0.0,
            life,
            solid: true,
            opacity: ECHO_BASE_OPACITY,
            grounded: false,
            ignore_gravity_until_triggers: false,
            passed_triggers: false,
            trail: Vec::new(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, ECHO_W, ECHO_H)
    }

    /// Aged past its life budget; moving echoes never report true.
    pub fn expired(&self) -> bool {
        self.life.is_some_and(|life| self.age >= life)
    }

    /// Advance one tick: gravity, friction, integration, platform collision,
    /// trail upkeep and the end-of-life fade.
    pub fn update(&mut self, dt: f32, platforms: &[Rect], gravity: f32, rng: &mut Pcg32) {
        self.age += dt;

        let gravity_suspended = self.ignore_gravity_until_triggers && !self.passed_triggers;
        if !gravity_suspended && !(self.mode == EchoMode::Static && self.grounded) {
            self.vel.y += gravity * dt;
        }

        // Moving echoes hold vx indefinitely; everything else bleeds it off
        // once grounded.
        if self.mode != EchoMode::Moving && self.grounded {
            self.vel.x *= 1.0 - (10.0 * dt).clamp(0.0, 1.0);
        }
        self.pos += self.vel * dt;

        self.grounded = false;
        let res = resolve_rect(&mut self.pos, &mut self.vel, ECHO_W, ECHO_H, platforms, 1.0);
        if res.grounded {
            self.grounded = true;
            if self.mode == EchoMode::Fall {
                self.mode = EchoMode::Static;
            }
        }

        if self.mode == EchoMode::Moving && self.vel.x.abs() > 0.1 && !self.expired() {
            if rng.random::<f32>() < 0.6 * dt * 60.0 {
                let center = self.rect().center();
                self.trail.push(Particle {
                    pos: center + Vec2::new(rng.random_range(-3.0..3.0), rng.random_range(-3.0..3.0)),
                    vel: Vec2::new(
                        -self.vel.x * 0.1 + rng.random_range(-5.0..5.0),
                        rng.random_range(-5.0..5.0),
                    ),
                    age: 0.0,
                    life: 0.5,
                    size: rng.random_range(1.0..3.0),
                });
            }
        }
        for p in &mut self.trail {
            p.update(dt);
        }
        self.trail.retain(|p| p.alive());

        if let Some(life) = self.life {
            let remaining = life - self.age;
            if remaining < ECHO_FADE_WINDOW {
                self.opacity = (remaining / ECHO_FADE_WINDOW).clamp(0.0, 1.0) * ECHO_BASE_OPACITY;
            }
            if self.age >= life {
                self.solid = false;
            }
        }
    }
}
