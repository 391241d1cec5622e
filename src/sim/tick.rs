//! Fixed-timestep tick: input intents in, one simulation step out
//!
//! Ordering per tick: pending transitions and meta inputs run first on raw
//! frame time, then (while playing and unpaused) platform motion, player
//! physics, echo spawning and updates, gate evaluation, hazard and win/death
//! checks.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::level::DeathBound;
use super::player::{Collider, ColliderSource};
use super::rect::Rect;
use super::spawn::{self, SpawnRejected};
use super::state::{GameEvent, GamePhase, GameState, Particle};
use crate::consts::*;

/// Edge-detected input intents for one tick. Held keys are pre-processed by
/// the input layer; the simulation never sees raw key state.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TickInput {
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
    pub spawn_echo: bool,
    pub restart: bool,
    pub pause_toggle: bool,
    pub debug_toggle: bool,
    pub debug_level: Option<u32>,
}

impl TickInput {
    pub fn any(&self) -> bool {
        self.move_left
            || self.move_right
            || self.jump
            || self.spawn_echo
            || self.restart
            || self.pause_toggle
            || self.debug_toggle
            || self.debug_level.is_some()
    }
}

/// Advance the simulation by `dt` seconds.
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let dt = dt.clamp(0.0, MAX_DT);

    state.events.clear();
    state.blocked_warn = (state.blocked_warn - dt).max(0.0);
    state.overlap_warn = (state.overlap_warn - dt).max(0.0);

    // Pending transitions run on raw frame time so a death restart still
    // fires while paused or frozen.
    state.advance_pending(dt);

    if input.debug_toggle {
        state.debug_mode = !state.debug_mode;
        log::debug!("debug mode: {}", state.debug_mode);
    }
    if state.debug_mode {
        if let Some(level) = input.debug_level {
            state.build_level(level);
            return;
        }
    }

    if input.pause_toggle && state.phase == GamePhase::Playing {
        state.paused = !state.paused;
    }

    match state.phase {
        GamePhase::FinalWin => {
            if input.any() {
                state.restart_game();
            }
            return;
        }
        GamePhase::LevelComplete | GamePhase::Dead => return,
        GamePhase::Playing => {}
    }

    if input.restart && state.pending.is_none() {
        state.events.push(GameEvent::PlayerDied);
        state.schedule_transition(state.current_level, DEATH_RESTART_DELAY);
    }

    if state.paused {
        state.gates.age_windows(dt, state.level_time);
        return;
    }

    state.level_time += dt;

    for platform in &mut state.platforms {
        platform.update(dt);
    }
    for hazard in &mut state.hazards {
        hazard.update(dt);
    }

    let gravity_dir = if state.gravity_inverted { -1.0 } else { 1.0 };

    // World geometry first, then solid echoes, so ground attribution
    // prefers real platforms.
    let mut colliders: Vec<Collider> = state
        .platforms
        .iter()
        .map(|p| Collider { rect: p.rect, source: ColliderSource::World })
        .collect();
    if let Some(cond) = &state.gates.conditional {
        if let Some(rect) = cond.platform_rect() {
            colliders.push(Collider { rect, source: ColliderSource::World });
        }
    }
    for echo in &state.echoes {
        if echo.solid {
            colliders.push(Collider { rect: echo.rect(), source: ColliderSource::Echo(echo.id) });
        }
    }

    let intent: i8 = match (input.move_left, input.move_right) {
        (true, false) => -1,
        (false, true) => 1,
        _ => 0,
    };

    let was_grounded = state.player.on_ground;
    let tuning = state.tuning;
    state
        .player
        .update(intent, input.jump, gravity_dir, dt, &colliders, &tuning);

    if input.jump && was_grounded {
        jump_dust(state);
    }

    if input.spawn_echo {
        let id = state.next_entity_id();
        let platform_rects: Vec<Rect> = colliders
            .iter()
            .filter(|c| c.source == ColliderSource::World)
            .map(|c| c.rect)
            .collect();
        match spawn::try_spawn(&mut state.player, &state.echoes, &platform_rects, &tuning, id) {
            Ok(echo) => {
                log::debug!("echo {} spawned as {:?}", echo.id, echo.mode);
                state.events.push(GameEvent::EchoSpawned { id: echo.id });
                state.echoes.push(echo);
            }
            Err(reason) => {
                match reason {
                    SpawnRejected::CapacityExceeded => state.blocked_warn = BLOCKED_WARN_TTL,
                    SpawnRejected::Overlap => state.overlap_warn = OVERLAP_WARN_TTL,
                }
                state.events.push(GameEvent::SpawnBlocked { reason });
            }
        }
    }

    // Echoes collide against level geometry only, never against each other
    // or the player.
    let mut echo_obstacles: Vec<Rect> = state.platforms.iter().map(|p| p.rect).collect();
    if let Some(cond) = &state.gates.conditional {
        if let Some(rect) = cond.platform_rect() {
            echo_obstacles.push(rect);
        }
    }
    // Gravity inversion affects only the player; echoes always fall down,
    // which matches the downward ground direction of their resolver.
    for echo in &mut state.echoes {
        echo.update(dt, &echo_obstacles, tuning.gravity, &mut state.rng);
    }

    let mut removed: Vec<u32> = Vec::new();
    {
        let GameState { echoes, hazards, events, .. } = &mut *state;
        echoes.retain(|echo| {
            let dissolved = hazards.iter().any(|h| h.rect.overlaps(&echo.rect()));
            let gone = echo.expired() || dissolved;
            if gone {
                removed.push(echo.id);
                events.push(GameEvent::EchoExpired { id: echo.id });
            }
            !gone
        });
    }
    if !removed.is_empty() {
        state.gates.purge_echoes(&removed);
    }

    let player_rect = state.player.rect();
    let GameState {
        gates,
        echoes,
        gravity_inverted,
        events,
        particles,
        rng,
        level_time,
        ..
    } = state;
    gates.evaluate(
        *level_time,
        dt,
        player_rect,
        echoes,
        gravity_inverted,
        events,
        particles,
        rng,
    );

    if state.hazards.iter().any(|h| h.rect.overlaps(&player_rect)) {
        kill_player(state, DEATH_RESTART_DELAY);
        return;
    }

    if !state.flag_activated
        && player_rect.overlaps(&state.flag)
        && state.gates.exit_open(state.level_time)
    {
        state.flag_activated = true;
        state.events.push(GameEvent::LevelWon { level: state.current_level });
        log::info!("level {} won", state.current_level);
        if state.final_level {
            state.phase = GamePhase::FinalWin;
        } else {
            state.phase = GamePhase::LevelComplete;
            state.schedule_transition(state.current_level + 1, WIN_ADVANCE_DELAY);
        }
        return;
    }

    let fell = match state.death_bound {
        DeathBound::WorldBottom => {
            let cutoff = if state.gravity_inverted {
                state.player.pos.y + PLAYER_H < -FALL_DEATH_MARGIN
            } else {
                state.player.pos.y > WORLD_H + FALL_DEATH_MARGIN
            };
            cutoff
        }
        DeathBound::BelowStart(meters) => state.player.pos.y > state.spawn_point.y + meters * METER,
    };
    if fell {
        kill_player(state, FALL_RESTART_DELAY);
        return;
    }

    state.particles.retain_mut(|p| {
        p.update(dt);
        p.alive()
    });
}

fn kill_player(state: &mut GameState, delay: f32) {
    state.phase = GamePhase::Dead;
    state.events.push(GameEvent::PlayerDied);
    log::info!("player died on level {}", state.current_level);
    state.schedule_transition(state.current_level, delay);
}

fn jump_dust(state: &mut GameState) {
    let rect = state.player.rect();
    let feet = if state.gravity_inverted {
        Vec2::new(rect.center().x, rect.y)
    } else {
        Vec2::new(rect.center().x, rect.bottom())
    };
    for _ in 0..6 {
        let vel = Vec2::new(
            state.rng.random_range(-30.0..30.0),
            state.rng.random_range(-20.0..0.0),
        );
        state.particles.push(Particle {
            pos: feet + Vec2::new(state.rng.random_range(-6.0..6.0), 0.0),
            vel,
            age: 0.0,
            life: 0.35,
            size: state.rng.random_range(1.0..2.5),
        });
    }
}
