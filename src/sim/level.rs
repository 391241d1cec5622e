//! Level definitions: platform geometry, hazards, gates, flag and spawn
//! point for the ten stock levels
//!
//! Everything a level does is expressed as data here; the tick loop and
//! [`super::gates`] interpret it uniformly, so no module branches on a level
//! number.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::gates::GateSpec;
use super::rect::Rect;
use crate::consts::*;

pub const LEVEL_COUNT: u32 = 10;

/// Horizontal back-and-forth motion between two x bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Drift {
    pub vx: f32,
    pub min_x: f32,
    pub max_x: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Platform {
    pub rect: Rect,
    pub drift: Option<Drift>,
}

impl Platform {
    pub fn fixed(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { rect: Rect::new(x, y, w, h), drift: None }
    }

    pub fn drifting(x: f32, y: f32, w: f32, h: f32, vx: f32, min_x: f32, max_x: f32) -> Self {
        Self { rect: Rect::new(x, y, w, h), drift: Some(Drift { vx, min_x, max_x }) }
    }

    /// Advance drift, reflecting when either edge leaves the bounds: the
    /// left edge against `min_x`, the right edge against `max_x`.
    pub fn update(&mut self, dt: f32) {
        if let Some(drift) = &mut self.drift {
            self.rect.x += drift.vx * dt;
            if self.rect.x <= drift.min_x {
                self.rect.x = drift.min_x;
                drift.vx = drift.vx.abs();
            } else if self.rect.right() >= drift.max_x {
                self.rect.x = drift.max_x - self.rect.w;
                drift.vx = -drift.vx.abs();
            }
        }
    }
}

/// Lethal patrolling obstacle. Contact kills the player and dissolves
/// echoes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Hazard {
    pub rect: Rect,
    pub vx: f32,
    pub min_x: f32,
    pub max_x: f32,
}

impl Hazard {
    pub fn update(&mut self, dt: f32) {
        self.rect.x += self.vx * dt;
        if self.rect.x <= self.min_x {
            self.rect.x = self.min_x;
            self.vx = self.vx.abs();
        } else if self.rect.right() >= self.max_x {
            self.rect.x = self.max_x - self.rect.w;
            self.vx = -self.vx.abs();
        }
    }
}

/// Where falling counts as death.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum DeathBound {
    /// Past the bottom edge of the world.
    WorldBottom,
    /// The given number of meters below the spawn point. Used by levels
    /// whose playfield sits high above the world floor.
    BelowStart(f32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDef {
    pub index: u32,
    pub platforms: Vec<Platform>,
    pub hazards: Vec<Hazard>,
    pub gates: Vec<GateSpec>,
    pub flag: Rect,
    pub spawn: Vec2,
    pub death_bound: DeathBound,
    pub final_level: bool,
}

fn base() -> LevelDef {
    LevelDef {
        index: 0,
        platforms: Vec::new(),
        hazards: Vec::new(),
        gates: Vec::new(),
        flag: Rect::new(0.0, 0.0, 24.0, 48.0),
        spawn: Vec2::ZERO,
        death_bound: DeathBound::WorldBottom,
        final_level: false,
    }
}

const BASE_Y: f32 = WORLD_H - 120.0;

/// Build the definition of a stock level. Indices outside `1..=LEVEL_COUNT`
/// clamp to the nearest valid level.
pub fn level_def(index: u32) -> LevelDef {
    let index = index.clamp(1, LEVEL_COUNT);
    let mut def = base();
    def.index = index;
    def.spawn = Vec2::new(60.0, BASE_Y - PLAYER_H);

    match index {
        1 => {
            // Gaps too wide to jump; bridge them with echoes.
            def.platforms = vec![
                Platform::fixed(20.0, BASE_Y, 220.0, 24.0),
                Platform::fixed(420.0, BASE_Y, 180.0, 24.0),
                Platform::fixed(720.0, BASE_Y, 200.0, 24.0),
            ];
            def.flag = Rect::new(880.0, BASE_Y - 48.0, 24.0, 48.0);
        }
        2 => {
            // Two buttons must be held down at once to open the exit.
            def.platforms = vec![
                Platform::fixed(20.0, BASE_Y, 220.0, 24.0),
                Platform::fixed(312.0, BASE_Y, 140.0, 24.0),
                Platform::fixed(512.0, BASE_Y, 140.0, 24.0),
                Platform::fixed(740.0, BASE_Y, 160.0, 24.0),
            ];
            def.gates = vec![
                GateSpec::Button {
                    rect: Rect::new(332.0, BASE_Y - 14.0, 28.0, 12.0),
                    ttl: None,
                    required_for_exit: true,
                },
                GateSpec::Button {
                    rect: Rect::new(532.0, BASE_Y - 14.0, 28.0, 12.0),
                    ttl: None,
                    required_for_exit: true,
                },
            ];
            def.flag = Rect::new(820.0, BASE_Y - 48.0, 24.0, 48.0);
        }
        3 => {
            // Ascending ledges.
            def.platforms = vec![
                Platform::fixed(20.0, BASE_Y, 200.0, 24.0),
                Platform::fixed(320.0, BASE_Y - 1.2 * METER, 140.0, 20.0),
                Platform::fixed(560.0, BASE_Y - 2.5 * METER, 160.0, 20.0),
                Platform::fixed(760.0, BASE_Y - 2.5 * METER, 120.0, 20.0),
            ];
            def.flag = Rect::new(840.0, BASE_Y - 2.5 * METER - 48.0, 24.0, 48.0);
        }
        4 => {
            // A conveyor platform shuttles across the middle gap.
            def.platforms = vec![
                Platform::fixed(20.0, BASE_Y, 220.0, 24.0),
                Platform::drifting(320.0, BASE_Y, 160.0, 20.0, 1.6 * METER, 280.0, 520.0),
                Platform::fixed(620.0, BASE_Y, 180.0, 24.0),
            ];
            def.flag = Rect::new(760.0, BASE_Y - 48.0, 24.0, 48.0);
        }
        5 => {
            // Tall staircase climb finishing far above the floor.
            def.platforms = vec![Platform::fixed(40.0, BASE_Y, 180.0, 24.0)];
            for i in 0..5 {
                let fi = i as f32;
                def.platforms.push(Platform::fixed(
                    40.0 + fi * 48.0,
                    BASE_Y - (fi + 1.0) * 2.0 * METER,
                    140.0,
                    18.0,
                ));
            }
            def.platforms.push(Platform::fixed(360.0, BASE_Y - 10.0 * METER, 160.0, 20.0));
            def.flag = Rect::new(480.0, BASE_Y - 10.0 * METER - 48.0, 24.0, 48.0);
        }
        6 => {
            // A gravity-flip zone lets the player walk the ceiling ledge.
            def.platforms = vec![
                Platform::fixed(20.0, BASE_Y, 220.0, 24.0),
                Platform::fixed(360.0, BASE_Y - 2.0 * METER, 160.0, 20.0),
                Platform::fixed(560.0, BASE_Y - 3.4 * METER, 120.0, 20.0),
            ];
            def.gates = vec![GateSpec::GravityZone {
                rect: Rect::new(520.0, BASE_Y - 40.0, 40.0, 40.0),
                dwell: 0.0,
            }];
            def.flag = Rect::new(640.0, BASE_Y - 3.4 * METER - 48.0, 24.0, 48.0);
        }
        7 => {
            // Two drifting platforms moving in opposite directions.
            def.platforms = vec![
                Platform::fixed(20.0, BASE_Y, 220.0, 24.0),
                Platform::drifting(320.0, BASE_Y, 140.0, 24.0, 0.8 * METER, 300.0, 460.0),
                Platform::drifting(520.0, BASE_Y, 140.0, 24.0, -0.8 * METER, 500.0, 680.0),
            ];
            def.flag = Rect::new(720.0, BASE_Y - 48.0, 24.0, 48.0);
        }
        8 => {
            // Gravity flip requires standing in the zone for a while; the
            // floor below the short start ledge is lethal.
            def.platforms = vec![
                Platform::fixed(20.0, BASE_Y, 96.0, 24.0),
                Platform::fixed(236.0, BASE_Y, 140.0, 24.0),
                Platform::fixed(560.0, BASE_Y - 3.4 * METER, 120.0, 20.0),
            ];
            def.gates = vec![GateSpec::GravityZone {
                rect: Rect::new(196.0, BASE_Y - 40.0, 40.0, 40.0),
                dwell: 3.0,
            }];
            def.flag = Rect::new(640.0, BASE_Y - 3.4 * METER - 48.0, 24.0, 48.0);
            def.death_bound = DeathBound::BelowStart(SAFE_START_FALL_METERS);
        }
        9 => {
            // Two timed triggers conjure a platform up by the exit.
            let start_x = 40.0;
            def.platforms = vec![Platform::fixed(start_x, BASE_Y, 220.0, 24.0)];
            let trig_w = 48.0;
            let trig_h = 16.0;
            let trig_rect = |cx_m: f32, cy_m: f32| {
                Rect::new(
                    start_x + cx_m * METER - trig_w / 2.0,
                    BASE_Y - cy_m * METER - trig_h / 2.0,
                    trig_w,
                    trig_h,
                )
            };
            let cond_rect = Rect::centered(
                Vec2::new(start_x + 20.0 * METER, BASE_Y - 4.0 * METER),
                2.0 * METER,
                0.5 * METER,
            );
            // The triggers gate only the conditional platform; the flag
            // itself stays open.
            def.gates = vec![
                GateSpec::Trigger { rect: trig_rect(15.0, 3.0), required_for_exit: false },
                GateSpec::Trigger { rect: trig_rect(20.0, 3.0), required_for_exit: false },
                GateSpec::ConditionalSpawn {
                    rect: cond_rect,
                    lifetime: CONDITIONAL_PLATFORM_LIFE,
                    requires: [0, 1],
                },
            ];
            let flag_plat = Rect::centered(
                Vec2::new(start_x + 25.0 * METER, BASE_Y - 4.0 * METER),
                2.0 * METER,
                0.5 * METER,
            );
            def.platforms.push(Platform { rect: flag_plat, drift: None });
            def.flag = Rect::new(
                flag_plat.x + flag_plat.w / 2.0 - 12.0,
                flag_plat.y - 48.0,
                24.0,
                48.0,
            );
        }
        _ => {
            // Final room: one floor, two walls, a button at each end.
            def.platforms = vec![
                Platform::fixed(0.0, BASE_Y, WORLD_W, 32.0),
                Platform::fixed(8.0, BASE_Y - 64.0, 16.0, 64.0),
                Platform::fixed(WORLD_W - 24.0, BASE_Y - 64.0, 16.0, 64.0),
            ];
            def.gates = vec![
                GateSpec::Button {
                    rect: Rect::new(32.0, BASE_Y - 16.0, 32.0, 16.0),
                    ttl: None,
                    required_for_exit: true,
                },
                GateSpec::Button {
                    rect: Rect::new(WORLD_W - 64.0, BASE_Y - 16.0, 32.0, 16.0),
                    ttl: None,
                    required_for_exit: true,
                },
            ];
            def.flag = Rect::new(WORLD_W / 2.0 - 32.0, BASE_Y - 48.0, 24.0, 48.0);
            def.spawn = Vec2::new(WORLD_W / 2.0, BASE_Y - PLAYER_H);
            def.final_level = true;
        }
    }

    def
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_levels_build_with_reachable_spawn() {
        for i in 1..=LEVEL_COUNT {
            let def = level_def(i);
            assert_eq!(def.index, i);
            assert!(!def.platforms.is_empty());
            let spawn_rect = Rect::new(def.spawn.x, def.spawn.y, PLAYER_W, PLAYER_H);
            let feet = Rect::new(spawn_rect.x, spawn_rect.bottom(), PLAYER_W, 2.0);
            assert!(
                def.platforms.iter().any(|p| p.rect.overlaps(&feet)),
                "level {i} spawn must stand on a platform"
            );
        }
    }

    #[test]
    fn only_last_level_is_final() {
        for i in 1..=LEVEL_COUNT {
            assert_eq!(level_def(i).final_level, i == LEVEL_COUNT);
        }
    }

    #[test]
    fn out_of_range_indices_clamp() {
        assert_eq!(level_def(0).index, 1);
        assert_eq!(level_def(99).index, LEVEL_COUNT);
    }

    #[test]
    fn drifting_platform_reflects_at_bounds() {
        let mut p = Platform::drifting(280.0, 100.0, 160.0, 20.0, 51.2, 280.0, 520.0);
        for _ in 0..2000 {
            p.update(1.0 / 60.0);
            assert!(p.rect.x >= 280.0, "left edge inside bounds: {}", p.rect.x);
            assert!(p.rect.right() <= 520.0, "right edge inside bounds: {}", p.rect.right());
        }
    }

    #[test]
    fn conveyor_never_reaches_the_far_platform() {
        // The middle conveyor must reflect on its right edge; otherwise it
        // would travel a full width too far and interpenetrate the fixed
        // platform across the gap.
        let def = level_def(4);
        let mut conveyor = def.platforms[1];
        let fixed = def.platforms[2].rect;
        assert!(conveyor.drift.is_some());
        for _ in 0..5000 {
            conveyor.update(1.0 / 60.0);
            assert!(
                !conveyor.rect.overlaps(&fixed),
                "conveyor interpenetrated the static platform at x={}",
                fixed.x
            );
            assert!(conveyor.rect.right() <= 520.0);
        }
    }

    #[test]
    fn hazard_patrols_between_bounds() {
        let mut h = Hazard { rect: Rect::new(300.0, 400.0, 24.0, 24.0), vx: 80.0, min_x: 280.0, max_x: 420.0 };
        for _ in 0..1000 {
            h.update(1.0 / 60.0);
            assert!(h.rect.x >= 280.0);
            assert!(h.rect.right() <= 420.0);
        }
    }
}
