//! Echo Step - a 2D platformer simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, echoes, levels, game state)
//! - `tuning`: Data-driven game balance
//!
//! Rendering, audio, menus and key-to-intent mapping are external collaborators;
//! they consume read-only snapshots of the state and feed [`sim::TickInput`] intents.

pub mod sim;
pub mod tuning;

pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// World tile size in pixels; also one simulated meter.
    pub const TILE: f32 = 32.0;
    /// Pixels per meter.
    pub const METER: f32 = TILE;

    /// World extent in pixels (+y is down).
    pub const WORLD_W: f32 = 960.0;
    pub const WORLD_H: f32 = 540.0;
    /// Falling this far past the world bottom kills the player.
    pub const FALL_DEATH_MARGIN: f32 = 20.0;

    /// Gravity acceleration (pixels/s^2, toward +y).
    pub const GRAVITY: f32 = 20.0 * METER;
    /// Jump impulse (pixels/s, upward under normal gravity).
    pub const JUMP_VELOCITY: f32 = -8.0 * METER;

    /// Player dimensions and movement.
    pub const PLAYER_W: f32 = 22.0;
    pub const PLAYER_H: f32 = 36.0;
    pub const PLAYER_SPEED: f32 = 5.0 * METER;
    pub const PLAYER_ACCEL: f32 = 2000.0;
    /// Horizontal speeds below this snap to zero under friction.
    pub const PLAYER_STOP_SPEED: f32 = 6.0;

    /// Echoes match the player's dimensions.
    pub const ECHO_W: f32 = PLAYER_W;
    pub const ECHO_H: f32 = PLAYER_H;
    /// Lifetime of static/fall echoes in seconds (moving echoes never age out).
    pub const ECHO_LIFE: f32 = 5.0;
    /// Opacity ramps down over this final slice of an echo's life.
    pub const ECHO_FADE_WINDOW: f32 = 0.7;
    pub const ECHO_BASE_OPACITY: f32 = 0.5;
    /// Maximum concurrent echoes; the next spawn request is a hard block.
    pub const MAX_ECHO: usize = 3;
    /// Player horizontal speed above which a grounded spawn becomes a moving echo.
    pub const MOVING_SPAWN_MIN_VX: f32 = 10.0;

    /// Spawn placement search budget.
    pub const SPAWN_NUDGE_MAX: f32 = 0.6 * METER;
    pub const SPAWN_NUDGE_STEP: f32 = 0.1 * METER;
    /// Extra lift when snapping the player onto a freshly spawned static echo.
    pub const STATIC_SNAP_CLEARANCE: f32 = 0.3 * METER;

    /// Separation epsilon applied by the collision resolver.
    pub const RESOLVE_EPS: f32 = 0.01;
    /// Maximum simulation step; larger frame deltas are clamped.
    pub const MAX_DT: f32 = 0.032;

    /// Timed-entry trigger activity window in seconds.
    pub const TRIGGER_WINDOW: f32 = 3.0;
    /// Conditionally spawned platforms live this long.
    pub const CONDITIONAL_PLATFORM_LIFE: f32 = 4.0;
    /// Occupants must be at least this fraction of the player's size to arm a trigger.
    pub const TRIGGER_SIZE_RATIO: f32 = 0.7;

    /// Transient warning durations (capacity block, overlap reject).
    pub const BLOCKED_WARN_TTL: f32 = 0.6;
    pub const OVERLAP_WARN_TTL: f32 = 0.8;

    /// Restart delay after hazard death or an explicit restart intent.
    pub const DEATH_RESTART_DELAY: f32 = 1.0;
    /// Shorter delay for fall-off-the-world auto-restarts.
    pub const FALL_RESTART_DELAY: f32 = 0.12;
    /// Delay before advancing after the flag is taken.
    pub const WIN_ADVANCE_DELAY: f32 = 0.2;

    /// Safe-start levels die after falling this far below the spawn point (meters).
    pub const SAFE_START_FALL_METERS: f32 = 2.0;
}
