//! Headless soak run: drives the simulation with scripted inputs at a fixed
//! timestep and logs progress. Useful for profiling and sanity-checking the
//! sim without a renderer.

use echo_step::Tuning;
use echo_step::sim::{GameEvent, GamePhase, GameState, TickInput, tick};

const SIM_DT: f32 = 1.0 / 120.0;
const RUN_SECONDS: f32 = 120.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0xec40_57e9);
    let tuning = match args.next() {
        Some(path) => Tuning::load(&path),
        None => Tuning::default(),
    };

    log::info!("soak run: seed={seed} dt={SIM_DT}");
    let mut state = GameState::new(seed, tuning);

    let mut elapsed = 0.0f32;
    let mut step = 0u64;
    let mut deaths = 0u32;
    let mut wins = 0u32;
    let mut spawned = 0u32;

    while elapsed < RUN_SECONDS && state.phase != GamePhase::FinalWin {
        let input = script(step, &state);
        tick(&mut state, &input, SIM_DT);
        for event in &state.events {
            match event {
                GameEvent::PlayerDied => deaths += 1,
                GameEvent::LevelWon { level } => {
                    wins += 1;
                    log::info!("cleared level {level} at t={elapsed:.1}s");
                }
                GameEvent::EchoSpawned { .. } => spawned += 1,
                _ => {}
            }
        }
        elapsed += SIM_DT;
        step += 1;
    }

    log::info!(
        "done: t={elapsed:.1}s level={} echoes_spawned={spawned} wins={wins} deaths={deaths}",
        state.current_level
    );
}

/// A crude wandering script: hold right, hop periodically, drop an echo now
/// and then. Enough to exercise movement, spawning and restarts.
fn script(step: u64, state: &GameState) -> TickInput {
    let mut input = TickInput {
        move_right: true,
        ..Default::default()
    };
    if step % 90 == 0 && state.player.on_ground {
        input.jump = true;
    }
    if step % 240 == 120 {
        input.spawn_echo = true;
    }
    input
}
