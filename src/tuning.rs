//! Data-driven game balance
//!
//! Every gameplay constant a designer might want to poke lives here, with
//! defaults matching `consts`. Values load leniently from JSON: a missing or
//! malformed file logs a warning and falls back to defaults rather than
//! failing the process.

use serde::{Deserialize, Serialize};

use crate::consts::*;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Gravity acceleration in pixels/s^2.
    pub gravity: f32,
    /// Jump impulse in pixels/s (negative is up).
    pub jump_velocity: f32,
    /// Horizontal speed cap in pixels/s.
    pub move_speed: f32,
    /// Horizontal acceleration in pixels/s^2.
    pub move_accel: f32,
    /// Lifetime of static/fall echoes in seconds.
    pub echo_life: f32,
    /// Concurrent echo cap.
    pub max_echoes: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            jump_velocity: JUMP_VELOCITY,
            move_speed: PLAYER_SPEED,
            move_accel: PLAYER_ACCEL,
            echo_life: ECHO_LIFE,
            max_echoes: MAX_ECHO,
        }
    }
}

impl Tuning {
    /// Parse tuning from a JSON string, falling back to defaults on error.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::warn!("Failed to parse tuning JSON: {e}, using defaults");
                Self::default()
            }
        }
    }

    /// Load tuning from a JSON file; missing files are not an error.
    pub fn load(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let tuning = Self::from_json(&content);
                log::info!("Loaded tuning from {path}");
                tuning
            }
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_consts() {
        let t = Tuning::default();
        assert_eq!(t.gravity, GRAVITY);
        assert_eq!(t.max_echoes, MAX_ECHO);
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let t = Tuning::from_json(r#"{"move_speed": 200.0}"#);
        assert_eq!(t.move_speed, 200.0);
        assert_eq!(t.gravity, GRAVITY);
    }

    #[test]
    fn malformed_json_falls_back_to_defaults() {
        let t = Tuning::from_json("not json");
        assert_eq!(t.move_speed, PLAYER_SPEED);
    }
}
