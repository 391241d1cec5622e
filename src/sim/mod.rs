//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One `tick(dt)` advances the whole world; dt is clamped to `MAX_DT`
//! - Seeded RNG only, and only for cosmetic particles
//! - Stable entity iteration order (spawn order, ids monotonic)
//! - No rendering, audio or platform dependencies

pub mod echo;
pub mod gates;
pub mod level;
pub mod player;
pub mod rect;
pub mod spawn;
pub mod state;
pub mod tick;

pub use echo::{Echo, EchoMode};
pub use gates::{GateSpec, Gates, OccupantId};
pub use level::{DeathBound, Drift, Hazard, LevelDef, Platform, LEVEL_COUNT, level_def};
pub use player::{Collider, ColliderSource, Player};
pub use rect::{Rect, Resolution, resolve_rect};
pub use spawn::{SpawnRejected, try_spawn};
pub use state::{GameEvent, GamePhase, GameState, Particle, PendingTransition};
pub use tick::{TickInput, tick};
