//! Level gate logic: buttons, timed triggers, conditional spawn platforms
//! and gravity-flip zones
//!
//! Levels declare their gates as data ([`GateSpec`]) and this module
//! evaluates them uniformly every tick, after all positions are final. The
//! flag only accepts the win transition once every gate marked
//! `required_for_exit` is satisfied.

use std::collections::HashSet;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::echo::Echo;
use super::rect::Rect;
use super::state::{GameEvent, Particle};
use crate::consts::*;

/// Identity of something standing on a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OccupantId {
    Player,
    Echo(u32),
}

/// Declarative gate description supplied by a level definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GateSpec {
    /// Pressed while at least one occupant overlaps; an optional TTL keeps
    /// it pressed for a grace period after the last occupant leaves.
    Button {
        rect: Rect,
        ttl: Option<f32>,
        required_for_exit: bool,
    },
    /// Arms for a fixed window on entry by a large-enough occupant.
    Trigger { rect: Rect, required_for_exit: bool },
    /// Spawns a countdown platform while the two referenced triggers are
    /// active at the same time.
    ConditionalSpawn {
        rect: Rect,
        lifetime: f32,
        requires: [usize; 2],
    },
    /// Flips the level's gravity sign after `dwell` seconds of continuous
    /// player occupancy.
    GravityZone { rect: Rect, dwell: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Button {
    pub rect: Rect,
    pub ttl: Option<f32>,
    pub required_for_exit: bool,
    pub occupants: HashSet<OccupantId>,
    pub pressed: bool,
    /// Level time of the most recent occupancy; drives the TTL grace window.
    last_occupied_at: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub rect: Rect,
    pub required_for_exit: bool,
    /// Level time at which the current activity window closes.
    pub active_until: f32,
    /// Occupants currently inside (entry-edge detection).
    pub occupants: HashSet<OccupantId>,
    /// Everything that has ever entered; feeds the passed-both-triggers
    /// echo mechanic.
    pub visited: HashSet<OccupantId>,
    /// Activation history.
    pub activations: u32,
}

impl Trigger {
    pub fn active(&self, now: f32) -> bool {
        now < self.active_until
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalSpawn {
    /// Where the platform materializes; the center is the defended invariant.
    pub rect: Rect,
    pub lifetime: f32,
    pub requires: [usize; 2],
    /// The live platform and its remaining time, when spawned.
    pub platform: Option<(Rect, f32)>,
}

impl ConditionalSpawn {
    pub fn platform_rect(&self) -> Option<Rect> {
        self.platform.map(|(r, _)| r)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GravityZone {
    pub rect: Rect,
    pub dwell: f32,
    /// Continuous player occupancy so far.
    pub stand_time: f32,
    /// Set once flipped; cleared when the player leaves, so re-entering can
    /// flip again.
    pub latched: bool,
}

/// All gates of the active level, built from its `GateSpec` list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Gates {
    pub buttons: Vec<Button>,
    pub triggers: Vec<Trigger>,
    pub conditional: Option<ConditionalSpawn>,
    pub gravity_zones: Vec<GravityZone>,
}

pub fn build(specs: &[GateSpec]) -> Gates {
    let mut gates = Gates::default();
    for spec in specs {
        match spec.clone() {
            GateSpec::Button { rect, ttl, required_for_exit } => gates.buttons.push(Button {
                rect,
                ttl,
                required_for_exit,
                occupants: HashSet::new(),
                pressed: false,
                last_occupied_at: None,
            }),
            GateSpec::Trigger { rect, required_for_exit } => gates.triggers.push(Trigger {
                rect,
                required_for_exit,
                active_until: 0.0,
                occupants: HashSet::new(),
                visited: HashSet::new(),
                activations: 0,
            }),
            GateSpec::ConditionalSpawn { rect, lifetime, requires } => {
                gates.conditional = Some(ConditionalSpawn { rect, lifetime, requires, platform: None });
            }
            GateSpec::GravityZone { rect, dwell } => gates.gravity_zones.push(GravityZone {
                rect,
                dwell,
                stand_time: 0.0,
                latched: false,
            }),
        }
    }
    gates
}

impl Gates {
    /// All exit-gating conditions currently satisfied.
    pub fn exit_open(&self, now: f32) -> bool {
        self.buttons
            .iter()
            .filter(|b| b.required_for_exit)
            .all(|b| b.pressed)
            && self
                .triggers
                .iter()
                .filter(|t| t.required_for_exit)
                .all(|t| t.active(now))
    }

    /// Shrink active trigger windows by `dt` of real time. Called while the
    /// simulation is paused: level time freezes there, but trigger windows
    /// keep counting down like pending transitions do.
    pub fn age_windows(&mut self, dt: f32, now: f32) {
        for trigger in &mut self.triggers {
            if trigger.active_until > now {
                trigger.active_until = (trigger.active_until - dt).max(now);
            }
        }
    }

    /// Drop stale occupant ids of removed echoes so buttons release and
    /// trigger edges re-arm correctly.
    pub fn purge_echoes(&mut self, removed: &[u32]) {
        for id in removed {
            let occ = OccupantId::Echo(*id);
            for b in &mut self.buttons {
                if b.occupants.remove(&occ) {
                    b.pressed = !b.occupants.is_empty();
                }
            }
            for t in &mut self.triggers {
                t.occupants.remove(&occ);
            }
        }
    }

    /// Evaluate every gate against the final positions of this tick.
    /// Returns platform rects to add/remove via the conditional spawn.
    pub fn evaluate(
        &mut self,
        now: f32,
        dt: f32,
        player_rect: Rect,
        echoes: &mut [Echo],
        gravity_inverted: &mut bool,
        events: &mut Vec<GameEvent>,
        particles: &mut Vec<Particle>,
        rng: &mut Pcg32,
    ) {
        // Buttons: occupant sets rebuilt from scratch each evaluation.
        for button in &mut self.buttons {
            button.occupants.clear();
            if player_rect.overlaps(&button.rect) {
                button.occupants.insert(OccupantId::Player);
            }
            for echo in echoes.iter() {
                if echo.solid && echo.rect().overlaps(&button.rect) {
                    button.occupants.insert(OccupantId::Echo(echo.id));
                }
            }
            if !button.occupants.is_empty() {
                button.last_occupied_at = Some(now);
            }
            let was_pressed = button.pressed;
            button.pressed = match (button.ttl, button.last_occupied_at) {
                (Some(ttl), Some(at)) => now - at <= ttl,
                (None, _) => !button.occupants.is_empty(),
                (Some(_), None) => false,
            };
            if button.pressed && !was_pressed {
                events.push(GameEvent::ButtonPressed);
            }
        }

        // Triggers: entry edges by qualifying occupants arm the window.
        for (idx, trigger) in self.triggers.iter_mut().enumerate() {
            let mut candidates: Vec<(OccupantId, Rect, bool)> =
                vec![(OccupantId::Player, player_rect, true)];
            for echo in echoes.iter() {
                if !echo.solid {
                    continue;
                }
                let size_ok = ECHO_W >= PLAYER_W * TRIGGER_SIZE_RATIO
                    && ECHO_H >= PLAYER_H * TRIGGER_SIZE_RATIO;
                candidates.push((OccupantId::Echo(echo.id), echo.rect(), size_ok));
            }
            for (occ, rect, size_ok) in candidates {
                let inside = rect.overlaps(&trigger.rect);
                if inside && size_ok && !trigger.occupants.contains(&occ) {
                    trigger.active_until = now + TRIGGER_WINDOW;
                    trigger.activations += 1;
                    trigger.visited.insert(occ);
                    events.push(GameEvent::TriggerActivated { index: idx });
                    for _ in 0..18 {
                        particles.push(Particle {
                            pos: Vec2::new(
                                trigger.rect.x + rng.random::<f32>() * trigger.rect.w,
                                trigger.rect.y + rng.random::<f32>() * trigger.rect.h,
                            ),
                            vel: Vec2::new(
                                rng.random_range(-40.0..40.0),
                                rng.random_range(-40.0..40.0),
                            ),
                            age: 0.0,
                            life: 0.5,
                            size: rng.random_range(1.0..3.0),
                        });
                    }
                }
                if inside {
                    trigger.occupants.insert(occ);
                } else {
                    trigger.occupants.remove(&occ);
                }
            }
        }

        // Echoes that have now passed both triggers of a pair regain gravity.
        if self.triggers.len() == 2 {
            for echo in echoes.iter_mut() {
                if echo.ignore_gravity_until_triggers && !echo.passed_triggers {
                    let occ = OccupantId::Echo(echo.id);
                    if self.triggers.iter().all(|t| t.visited.contains(&occ)) {
                        echo.passed_triggers = true;
                    }
                }
            }
        }

        // Conditional spawn: platform exists only after both required
        // triggers are active at once; countdown removes it.
        if let Some(cond) = &mut self.conditional {
            let both_active = cond
                .requires
                .iter()
                .all(|&i| self.triggers.get(i).is_some_and(|t| t.active(now)));
            match &mut cond.platform {
                None if both_active => {
                    cond.platform = Some((cond.rect, cond.lifetime));
                    events.push(GameEvent::PlatformSpawned);
                }
                Some((rect, timer)) => {
                    // The platform's center must stay where the level
                    // definition puts it; correct any drift in place.
                    let expected = cond.rect.center();
                    if (rect.center().y - expected.y).abs() > 1.0 {
                        rect.y = expected.y - rect.h / 2.0;
                    }
                    *timer -= dt;
                    if *timer <= 0.0 {
                        cond.platform = None;
                        events.push(GameEvent::PlatformRemoved);
                    }
                }
                None => {}
            }
        }

        // Gravity zones: dwell, flip, latch until the player leaves.
        for zone in &mut self.gravity_zones {
            if player_rect.overlaps(&zone.rect) {
                zone.stand_time += dt;
                if !zone.latched && zone.stand_time >= zone.dwell {
                    *gravity_inverted = !*gravity_inverted;
                    zone.latched = true;
                    events.push(GameEvent::GravityFlipped { inverted: *gravity_inverted });
                }
            } else {
                zone.stand_time = 0.0;
                zone.latched = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::echo::EchoMode;
    use rand::SeedableRng;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(11)
    }

    fn eval(
        gates: &mut Gates,
        now: f32,
        dt: f32,
        player_rect: Rect,
        echoes: &mut [Echo],
        inverted: &mut bool,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let mut particles = Vec::new();
        let mut r = rng();
        gates.evaluate(now, dt, player_rect, echoes, inverted, &mut events, &mut particles, &mut r);
        events
    }

    fn player_at(x: f32, y: f32) -> Rect {
        Rect::new(x, y, PLAYER_W, PLAYER_H)
    }

    const FAR: Rect = Rect { x: -500.0, y: -500.0, w: PLAYER_W, h: PLAYER_H };

    #[test]
    fn button_pressed_iff_occupied() {
        let mut gates = build(&[GateSpec::Button {
            rect: Rect::new(100.0, 100.0, 28.0, 12.0),
            ttl: None,
            required_for_exit: true,
        }]);
        let mut inv = false;
        eval(&mut gates, 0.0, 0.016, player_at(100.0, 90.0), &mut [], &mut inv);
        assert!(gates.buttons[0].pressed);
        assert!(gates.exit_open(0.0));

        eval(&mut gates, 0.016, 0.016, FAR, &mut [], &mut inv);
        assert!(!gates.buttons[0].pressed, "pressed must drop when the last occupant leaves");
        assert!(!gates.exit_open(0.016));
    }

    #[test]
    fn solid_echo_presses_button() {
        let mut gates = build(&[GateSpec::Button {
            rect: Rect::new(100.0, 100.0, 28.0, 12.0),
            ttl: None,
            required_for_exit: true,
        }]);
        let mut inv = false;
        let mut echoes = [Echo::new(7, Vec2::new(100.0, 90.0), Vec2::ZERO, EchoMode::Static)];
        eval(&mut gates, 0.0, 0.016, FAR, &mut echoes, &mut inv);
        assert!(gates.buttons[0].pressed);
        assert!(gates.buttons[0].occupants.contains(&OccupantId::Echo(7)));

        echoes[0].solid = false;
        eval(&mut gates, 0.016, 0.016, FAR, &mut echoes, &mut inv);
        assert!(!gates.buttons[0].pressed, "non-solid echoes stop counting");
    }

    #[test]
    fn button_ttl_keeps_pressed_briefly() {
        let mut gates = build(&[GateSpec::Button {
            rect: Rect::new(100.0, 100.0, 28.0, 12.0),
            ttl: Some(0.5),
            required_for_exit: false,
        }]);
        let mut inv = false;
        eval(&mut gates, 0.0, 0.016, player_at(100.0, 90.0), &mut [], &mut inv);
        assert!(gates.buttons[0].pressed);
        // Occupant gone, still within the grace window.
        eval(&mut gates, 0.3, 0.016, FAR, &mut [], &mut inv);
        assert!(gates.buttons[0].pressed);
        // Grace expired.
        eval(&mut gates, 0.6, 0.016, FAR, &mut [], &mut inv);
        assert!(!gates.buttons[0].pressed);
    }

    #[test]
    fn trigger_window_is_exactly_three_seconds() {
        let mut gates = build(&[GateSpec::Trigger {
            rect: Rect::new(200.0, 200.0, 48.0, 16.0),
            required_for_exit: false,
        }]);
        let mut inv = false;
        let entry = player_at(210.0, 195.0);
        eval(&mut gates, 1.0, 0.016, entry, &mut [], &mut inv);
        assert!(gates.triggers[0].active(1.0));
        assert!(gates.triggers[0].active(3.9));
        assert!(!gates.triggers[0].active(4.0));
        assert_eq!(gates.triggers[0].activations, 1);
    }

    #[test]
    fn staying_inside_does_not_extend_window() {
        let mut gates = build(&[GateSpec::Trigger {
            rect: Rect::new(200.0, 200.0, 48.0, 16.0),
            required_for_exit: false,
        }]);
        let mut inv = false;
        let inside = player_at(210.0, 195.0);
        eval(&mut gates, 1.0, 0.016, inside, &mut [], &mut inv);
        // Still inside two seconds later; no re-fire.
        eval(&mut gates, 3.0, 0.016, inside, &mut [], &mut inv);
        assert_eq!(gates.triggers[0].activations, 1);
        assert!((gates.triggers[0].active_until - 4.0).abs() < 1e-6);
    }

    #[test]
    fn leave_and_reenter_rearms_trigger() {
        let mut gates = build(&[GateSpec::Trigger {
            rect: Rect::new(200.0, 200.0, 48.0, 16.0),
            required_for_exit: false,
        }]);
        let mut inv = false;
        let inside = player_at(210.0, 195.0);
        eval(&mut gates, 1.0, 0.016, inside, &mut [], &mut inv);
        eval(&mut gates, 2.0, 0.016, FAR, &mut [], &mut inv);
        eval(&mut gates, 2.5, 0.016, inside, &mut [], &mut inv);
        assert_eq!(gates.triggers[0].activations, 2);
        assert!((gates.triggers[0].active_until - 5.5).abs() < 1e-6);
    }

    #[test]
    fn aging_windows_expires_active_triggers() {
        let mut gates = build(&[GateSpec::Trigger {
            rect: Rect::new(200.0, 200.0, 48.0, 16.0),
            required_for_exit: false,
        }]);
        let mut inv = false;
        eval(&mut gates, 1.0, 0.016, player_at(210.0, 195.0), &mut [], &mut inv);
        assert!(gates.triggers[0].active(1.0));
        // Level time stays at 1.0 while real time passes.
        for _ in 0..35 {
            gates.age_windows(0.1, 1.0);
        }
        assert!(!gates.triggers[0].active(1.0));
        // Already-closed windows are untouched.
        let before = gates.triggers[0].active_until;
        gates.age_windows(0.1, 1.0);
        assert_eq!(gates.triggers[0].active_until, before);
    }

    #[test]
    fn conditional_platform_spawns_once_and_expires() {
        let trig_a = Rect::new(200.0, 200.0, 48.0, 16.0);
        let trig_b = Rect::new(400.0, 200.0, 48.0, 16.0);
        let mut gates = build(&[
            GateSpec::Trigger { rect: trig_a, required_for_exit: false },
            GateSpec::Trigger { rect: trig_b, required_for_exit: false },
            GateSpec::ConditionalSpawn {
                rect: Rect::centered(Vec2::new(300.0, 150.0), 64.0, 16.0),
                lifetime: 4.0,
                requires: [0, 1],
            },
        ]);
        let mut inv = false;
        // Arm both triggers inside one window.
        eval(&mut gates, 0.0, 0.016, player_at(210.0, 195.0), &mut [], &mut inv);
        assert!(gates.conditional.as_ref().unwrap().platform.is_none());
        let events = eval(&mut gates, 1.0, 0.016, player_at(410.0, 195.0), &mut [], &mut inv);
        assert!(events.contains(&GameEvent::PlatformSpawned));
        let plat = gates.conditional.as_ref().unwrap().platform_rect().unwrap();
        assert_eq!(plat.center(), Vec2::new(300.0, 150.0));

        // No double spawn while one exists.
        let events = eval(&mut gates, 1.1, 0.016, player_at(410.0, 195.0), &mut [], &mut inv);
        assert!(!events.contains(&GameEvent::PlatformSpawned));

        // Countdown removal.
        let mut now = 1.1;
        for _ in 0..80 {
            now += 0.1;
            eval(&mut gates, now, 0.1, FAR, &mut [], &mut inv);
        }
        assert!(gates.conditional.as_ref().unwrap().platform.is_none());
    }

    #[test]
    fn conditional_platform_drift_is_corrected() {
        let mut gates = build(&[
            GateSpec::Trigger { rect: Rect::new(200.0, 200.0, 48.0, 16.0), required_for_exit: false },
            GateSpec::Trigger { rect: Rect::new(400.0, 200.0, 48.0, 16.0), required_for_exit: false },
            GateSpec::ConditionalSpawn {
                rect: Rect::centered(Vec2::new(300.0, 150.0), 64.0, 16.0),
                lifetime: 60.0,
                requires: [0, 1],
            },
        ]);
        let mut inv = false;
        eval(&mut gates, 0.0, 0.016, player_at(210.0, 195.0), &mut [], &mut inv);
        eval(&mut gates, 0.5, 0.016, player_at(410.0, 195.0), &mut [], &mut inv);
        // Nudge the live platform out of place; the next evaluation restores it.
        if let Some(cond) = &mut gates.conditional {
            if let Some((rect, _)) = &mut cond.platform {
                rect.y += 10.0;
            }
        }
        eval(&mut gates, 0.6, 0.016, FAR, &mut [], &mut inv);
        let plat = gates.conditional.as_ref().unwrap().platform_rect().unwrap();
        assert!((plat.center().y - 150.0).abs() <= 1.0);
    }

    #[test]
    fn gravity_zone_flips_after_dwell_and_latches() {
        let zone = Rect::new(500.0, 380.0, 40.0, 40.0);
        let mut gates = build(&[GateSpec::GravityZone { rect: zone, dwell: 0.5 }]);
        let mut inv = false;
        let inside = player_at(505.0, 385.0);
        let mut now = 0.0;
        while now < 0.35 {
            eval(&mut gates, now, 0.1, inside, &mut [], &mut inv);
            now += 0.1;
        }
        assert!(!inv, "not enough dwell yet");
        eval(&mut gates, now, 0.1, inside, &mut [], &mut inv);
        assert!(inv, "flips after dwell");
        // Staying inside does not flip again.
        eval(&mut gates, now + 0.1, 0.1, inside, &mut [], &mut inv);
        assert!(inv);
        // Leaving unlatches; re-entering can flip back.
        eval(&mut gates, now + 0.2, 0.1, FAR, &mut [], &mut inv);
        for _ in 0..7 {
            eval(&mut gates, now + 0.3, 0.1, inside, &mut [], &mut inv);
        }
        assert!(!inv, "re-entry flips gravity back");
    }

    #[test]
    fn purge_releases_buttons_and_trigger_occupancy() {
        let mut gates = build(&[
            GateSpec::Button {
                rect: Rect::new(100.0, 100.0, 28.0, 12.0),
                ttl: None,
                required_for_exit: true,
            },
            GateSpec::Trigger { rect: Rect::new(100.0, 100.0, 28.0, 12.0), required_for_exit: false },
        ]);
        let mut inv = false;
        let mut echoes = [Echo::new(9, Vec2::new(100.0, 95.0), Vec2::ZERO, EchoMode::Static)];
        eval(&mut gates, 0.0, 0.016, FAR, &mut echoes, &mut inv);
        assert!(gates.buttons[0].pressed);
        assert!(gates.triggers[0].occupants.contains(&OccupantId::Echo(9)));

        gates.purge_echoes(&[9]);
        assert!(!gates.buttons[0].pressed);
        assert!(!gates.triggers[0].occupants.contains(&OccupantId::Echo(9)));
    }
}
