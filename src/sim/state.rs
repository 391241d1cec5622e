//! Whole-game state: level lifecycle, phase machine, pending transitions
//! and the per-tick event queue

use std::collections::BTreeMap;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::echo::Echo;
use super::gates::{self, Gates};
use super::level::{DeathBound, Hazard, LEVEL_COUNT, Platform, level_def};
use super::player::Player;
use super::rect::Rect;
use super::spawn::SpawnRejected;
use crate::Tuning;

/// What the game is doing right now. Pause is orthogonal and lives in
/// [`GameState::paused`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    /// Flag reached; physics frozen until the pending advance fires.
    LevelComplete,
    /// Physics frozen until the pending restart fires.
    Dead,
    /// Last level cleared; any input starts a fresh run.
    FinalWin,
}

/// A scheduled level change. The generation stamp lets a rebuild cancel
/// transitions scheduled before it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PendingTransition {
    pub target: u32,
    pub delay: f32,
    pub generation: u64,
}

/// One-tick notifications for audio and UI layers. Cleared at the start of
/// every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    EchoSpawned { id: u32 },
    EchoExpired { id: u32 },
    SpawnBlocked { reason: SpawnRejected },
    ButtonPressed,
    TriggerActivated { index: usize },
    PlatformSpawned,
    PlatformRemoved,
    GravityFlipped { inverted: bool },
    PlayerDied,
    LevelWon { level: u32 },
}

/// Cosmetic spark. Never collides with anything.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub age: f32,
    pub life: f32,
    pub size: f32,
}

impl Particle {
    pub fn update(&mut self, dt: f32) {
        self.age += dt;
        self.pos += self.vel * dt;
        self.vel *= 1.0 - (3.0 * dt).clamp(0.0, 1.0);
    }

    pub fn alive(&self) -> bool {
        self.age < self.life
    }
}

fn fresh_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub seed: u64,
    #[serde(skip, default = "fresh_rng")]
    pub rng: Pcg32,
    pub tuning: Tuning,

    pub current_level: u32,
    pub unlocked: BTreeMap<u32, bool>,
    pub phase: GamePhase,
    pub paused: bool,
    pub debug_mode: bool,

    /// Seconds of unpaused play on the current level.
    pub level_time: f32,
    /// Bumped by every level build; stale pending transitions compare
    /// against it and drop.
    pub generation: u64,
    pub pending: Option<PendingTransition>,

    pub player: Player,
    pub platforms: Vec<Platform>,
    pub hazards: Vec<Hazard>,
    pub echoes: Vec<Echo>,
    pub gates: Gates,
    pub flag: Rect,
    pub spawn_point: Vec2,
    pub death_bound: DeathBound,
    pub final_level: bool,
    pub gravity_inverted: bool,
    /// Latched on the first win overlap so the flag fires exactly once.
    pub flag_activated: bool,

    /// Countdown feedback timers for rejected echo spawns.
    pub blocked_warn: f32,
    pub overlap_warn: f32,

    #[serde(skip)]
    pub particles: Vec<Particle>,
    #[serde(skip)]
    pub events: Vec<GameEvent>,

    next_id: u32,
}

impl GameState {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            current_level: 1,
            unlocked: BTreeMap::from([(1, true)]),
            phase: GamePhase::Playing,
            paused: false,
            debug_mode: false,
            level_time: 0.0,
            generation: 0,
            pending: None,
            player: Player::new(Vec2::ZERO),
            platforms: Vec::new(),
            hazards: Vec::new(),
            echoes: Vec::new(),
            gates: Gates::default(),
            flag: Rect::new(0.0, 0.0, 24.0, 48.0),
            spawn_point: Vec2::ZERO,
            death_bound: DeathBound::WorldBottom,
            final_level: false,
            gravity_inverted: false,
            flag_activated: false,
            blocked_warn: 0.0,
            overlap_warn: 0.0,
            particles: Vec::new(),
            events: Vec::new(),
            next_id: 0,
        };
        state.build_level(1);
        state
    }

    pub fn next_entity_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn echo_count(&self) -> usize {
        self.echoes.len()
    }

    /// Tear down the current level and build `index` from its definition.
    /// Cancels any pending transition.
    pub fn build_level(&mut self, index: u32) {
        let def = level_def(index);
        self.generation += 1;
        self.pending = None;

        self.current_level = def.index;
        if def.index > 1 {
            self.unlocked.insert(def.index, true);
        }
        self.phase = GamePhase::Playing;
        self.paused = false;
        self.level_time = 0.0;
        self.player = Player::new(def.spawn);
        self.platforms = def.platforms;
        self.hazards = def.hazards;
        self.echoes.clear();
        self.gates = gates::build(&def.gates);
        self.flag = def.flag;
        self.spawn_point = def.spawn;
        self.death_bound = def.death_bound;
        self.final_level = def.final_level;
        self.gravity_inverted = false;
        self.flag_activated = false;
        self.blocked_warn = 0.0;
        self.overlap_warn = 0.0;
        self.particles.clear();

        log::info!("level {} built", self.current_level);
    }

    /// Schedule a level change after `delay` seconds. Replaces any earlier
    /// pending transition.
    pub fn schedule_transition(&mut self, target: u32, delay: f32) {
        self.pending = Some(PendingTransition {
            target,
            delay,
            generation: self.generation,
        });
    }

    /// Count down the pending transition on raw frame time and fire it when
    /// due. Stale generations are dropped without firing.
    pub fn advance_pending(&mut self, dt: f32) {
        let Some(pending) = &mut self.pending else {
            return;
        };
        if pending.generation != self.generation {
            self.pending = None;
            return;
        }
        pending.delay -= dt;
        if pending.delay <= 0.0 {
            let target = pending.target;
            self.build_level(target);
        }
    }

    /// Full reset back to a fresh run on level 1.
    pub fn restart_game(&mut self) {
        self.unlocked = BTreeMap::from([(1, true)]);
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.build_level(1);
        log::info!("game restarted");
    }

    pub fn last_level(&self) -> u32 {
        LEVEL_COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        GameState::new(42, Tuning::default())
    }

    #[test]
    fn new_game_starts_on_level_one() {
        let s = state();
        assert_eq!(s.current_level, 1);
        assert_eq!(s.phase, GamePhase::Playing);
        assert_eq!(s.unlocked, BTreeMap::from([(1, true)]));
        assert_eq!(s.player.pos, s.spawn_point);
    }

    #[test]
    fn building_a_level_unlocks_it() {
        let mut s = state();
        s.build_level(4);
        assert!(s.unlocked[&4]);
        assert_eq!(s.current_level, 4);
        assert_eq!(s.level_time, 0.0);
        assert!(s.echoes.is_empty());
    }

    #[test]
    fn restart_resets_unlocks() {
        let mut s = state();
        s.build_level(7);
        s.restart_game();
        assert_eq!(s.current_level, 1);
        assert_eq!(s.unlocked, BTreeMap::from([(1, true)]));
    }

    #[test]
    fn pending_transition_fires_after_delay() {
        let mut s = state();
        s.schedule_transition(2, 0.2);
        s.advance_pending(0.1);
        assert_eq!(s.current_level, 1);
        s.advance_pending(0.15);
        assert_eq!(s.current_level, 2);
        assert!(s.pending.is_none());
    }

    #[test]
    fn rebuild_cancels_stale_pending() {
        let mut s = state();
        s.schedule_transition(5, 0.2);
        // A manual rebuild (debug level select, restart) bumps the
        // generation; the old transition must never fire.
        s.build_level(3);
        s.advance_pending(1.0);
        assert_eq!(s.current_level, 3);
        assert!(s.pending.is_none());
    }

    #[test]
    fn entity_ids_are_monotonic() {
        let mut s = state();
        let a = s.next_entity_id();
        let b = s.next_entity_id();
        assert!(b > a);
    }
}
