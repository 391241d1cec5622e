//! Echo manager: spawn validation and placement
//!
//! Spawning is a three-step pipeline: capacity check (hard block), placement
//! search (nudges the candidate away from platform overlap), then an
//! echo-overlap check (soft reject). A successful static or fall spawn may
//! also snap the player to stand on the new echo.

use glam::Vec2;

use super::echo::{Echo, EchoMode};
use super::player::Player;
use super::rect::Rect;
use crate::consts::*;
use crate::tuning::Tuning;

/// Why a spawn request was refused. Capacity is a hard block (nothing is
/// evicted to make room); overlap is a soft reject after placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnRejected {
    CapacityExceeded,
    Overlap,
}

/// Offset directions probed by the placement search, scaled by the ring
/// radius. Upward and sideways first; an echo buried in a floor is most
/// often freed by lifting it.
const NUDGE_DIRS: [(f32, f32); 8] = [
    (0.0, -1.0),
    (-1.0, 0.0),
    (1.0, 0.0),
    (-1.0, -1.0),
    (1.0, -1.0),
    (0.0, -2.0),
    (-2.0, 0.0),
    (2.0, 0.0),
];

/// Probe increasing radii around `candidate` until a spot free of platform
/// overlap turns up. Never fails outright: past the radius budget the last
/// probed spot is used as-is.
fn adjust_spawn_position(candidate: Vec2, platforms: &[Rect]) -> Vec2 {
    let rings = (SPAWN_NUDGE_MAX / SPAWN_NUDGE_STEP) as i32;
    let mut last = candidate;
    for ring in 0..=rings {
        for (dx, dy) in NUDGE_DIRS {
            let probe = candidate + Vec2::new(dx, dy) * SPAWN_NUDGE_STEP * ring as f32;
            last = probe;
            let rect = Rect::from_pos_size(probe, ECHO_W, ECHO_H);
            if !platforms.iter().any(|p| rect.overlaps(p)) {
                return probe;
            }
        }
    }
    last
}

/// Attempt to spawn an echo from the player's current state. On success the
/// player may be snapped on top of the new echo; on rejection nothing
/// changes.
pub fn try_spawn(
    player: &mut Player,
    echoes: &[Echo],
    platforms: &[Rect],
    tuning: &Tuning,
    id: u32,
) -> Result<Echo, SpawnRejected> {
    if echoes.len() >= tuning.max_echoes {
        return Err(SpawnRejected::CapacityExceeded);
    }

    let airborne = !player.on_ground;
    let moving = player.vel.x.abs() > MOVING_SPAWN_MIN_VX;
    let dir = if player.vel.x >= 0.0 { 1.0 } else { -1.0 };

    let (mode, vel, candidate) = if airborne {
        (
            EchoMode::Fall,
            Vec2::new(player.vel.x, 0.0),
            player.pos,
        )
    } else if moving {
        // Speed pinned to the player's cap, direction from the current
        // velocity sign; spawned a half meter ahead of the player.
        (
            EchoMode::Moving,
            Vec2::new(dir * tuning.move_speed, 0.0),
            Vec2::new(player.pos.x + dir * (0.5 * METER + PLAYER_W * 0.5), player.pos.y),
        )
    } else {
        // Parked under the player's feet, bottom-aligned.
        (
            EchoMode::Static,
            Vec2::ZERO,
            Vec2::new(player.pos.x, player.pos.y + PLAYER_H - ECHO_H),
        )
    };

    let pos = adjust_spawn_position(candidate, platforms);

    let rect = Rect::from_pos_size(pos, ECHO_W, ECHO_H);
    if echoes.iter().any(|e| e.solid && e.rect().overlaps(&rect)) {
        return Err(SpawnRejected::Overlap);
    }

    let mut echo = Echo::new(id, pos, vel, mode);
    if echo.life.is_some() {
        echo.life = Some(tuning.echo_life);
    }
    match mode {
        EchoMode::Static => {
            // Lift the player clear of the new echo so they stand on it with
            // the fixed clearance.
            player.pos.y = echo.pos.y - PLAYER_H - RESOLVE_EPS - STATIC_SNAP_CLEARANCE;
            player.vel.y = 0.0;
            player.on_ground = true;
        }
        EchoMode::Fall => {
            if player.rect().overlaps(&echo.rect()) {
                player.pos.y = echo.pos.y - PLAYER_H - RESOLVE_EPS;
                player.vel.y = 0.0;
                player.on_ground = true;
            }
        }
        EchoMode::Moving => {}
    }

    Ok(echo)
}
