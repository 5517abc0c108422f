//! Per-frame simulation tick
//!
//! Advances one session by a variable frame delta. Per-frame constants are
//! scaled by `frames_for(dt_ms)` so a 30 Hz and a 120 Hz host see the same
//! motion.

use glam::Vec2;

use super::balloon::BalloonKind;
use super::effects;
use super::hit;
use super::spawn;
use super::state::{EndReason, GameEvent, GamePhase, SessionState};
use crate::consts::MAX_TICK_MS;
use crate::frames_for;

/// Pointer input in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Vec2),
    Move(Vec2),
    Up,
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer events since the last tick, in arrival order
    pub pointer: Vec<PointerEvent>,
    /// Pause toggle
    pub pause: bool,
    /// Demo mode: the session clicks balloons on its own
    pub autoplay: bool,
}

impl TickInput {
    pub fn click(at: Vec2) -> Self {
        Self {
            pointer: vec![PointerEvent::Down(at), PointerEvent::Up],
            ..Default::default()
        }
    }
}

/// Ticks between autoplay clicks
const AUTOPLAY_INTERVAL: u64 = 12;

/// Advance the session by `dt_ms` milliseconds
pub fn tick(state: &mut SessionState, input: &TickInput, dt_ms: f32) {
    let dt_ms = dt_ms.clamp(0.0, MAX_TICK_MS);
    let frames = frames_for(dt_ms);

    // Ambient scenery keeps moving behind the pause menu
    let pointer = state.pointer.pos;
    let frozen = state.is_frozen();
    state.environment.update(frames, pointer, frozen);

    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                log::debug!("Paused at {:.0} ms", state.clock_ms);
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            GamePhase::GameOver => {}
        }
    }
    if state.phase != GamePhase::Playing {
        return;
    }

    state.clock_ms += f64::from(dt_ms);
    state.ticks += 1;
    let dt_s = dt_ms / 1000.0;
    state.elapsed_s += dt_s;

    if let Some(left) = state.time_left_s.as_mut() {
        *left = (*left - dt_s).max(0.0);
        if *left <= 0.0 {
            state.end(EndReason::Time);
            return;
        }
    }
    if state.rules.endless {
        state.difficulty = 1 + (state.elapsed_s / 30.0) as u32;
    }

    advance_timers(state, dt_ms);

    // Combo decay runs before this tick's input so a fresh pop keeps its window
    if state.combo.decay_ticks > 0 {
        state.combo.decay_ticks -= 1;
        if state.combo.decay_ticks == 0 {
            state.combo.count = 0;
        }
    }

    for event in &input.pointer {
        if !state.is_playing() {
            break;
        }
        match *event {
            PointerEvent::Down(p) => hit::pointer_down(state, p),
            PointerEvent::Move(p) => hit::pointer_move(state, p),
            PointerEvent::Up => hit::pointer_up(state),
        }
    }
    if input.autoplay && state.ticks % AUTOPLAY_INTERVAL == 0 {
        autoplay_click(state);
    }

    while state.is_playing() {
        let Some(action) = state.scheduler.pop_due(state.clock_ms) else {
            break;
        };
        effects::run_deferred(state, action);
    }
    if !state.is_playing() {
        return;
    }

    update_balloons(state, frames);
    state.fx.update(frames);
    spawn::roll_spawn(state, frames);
}

/// Freeze, frenzy and power-up expiry
fn advance_timers(state: &mut SessionState, dt_ms: f32) {
    if state.freeze_ms > 0.0 {
        state.freeze_ms = (state.freeze_ms - dt_ms).max(0.0);
    }
    if !state.rules.always_frenzy && state.frenzy_ms > 0.0 {
        state.frenzy_ms = (state.frenzy_ms - dt_ms).max(0.0);
    }
    for kind in state.powerups.advance(dt_ms) {
        log::debug!("Power-up {} expired", kind.as_str());
        state.emit(GameEvent::PowerUpExpired(kind));
    }
}

fn update_balloons(state: &mut SessionState, frames: f32) {
    let factor = state.speed_factor();
    let width = state.bounds.x;
    let magnet = state
        .pointer
        .pos
        .filter(|_| state.powerups.magnet());
    let (radius, pull) = (state.tuning.magnet_radius, state.tuning.magnet_pull);

    for balloon in &mut state.balloons {
        balloon.current_speed = balloon.base_speed * factor;
        balloon.update(frames, width);
        if let Some(p) = magnet {
            if balloon.is_active() && balloon.kind != BalloonKind::Boss {
                let to = p - balloon.pos;
                if to.length() < radius {
                    balloon.pos += to * (pull * frames).min(1.0);
                }
            }
        }
    }

    state.balloons.retain(|b| !b.is_expired());
    if let Some(boss) = state.current_boss {
        if state.balloon_index(boss).is_none() {
            log::debug!("Boss {boss} escaped");
            state.current_boss = None;
        }
    }
}

/// Click the highest poppable balloon that isn't a bomb
fn autoplay_click(state: &mut SessionState) {
    let target = state
        .balloons
        .iter()
        .filter(|b| b.is_active() && b.kind != BalloonKind::Bomb && b.pos.y < state.bounds.y)
        .filter(|b| b.is_hit(b.pos))
        .min_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
        .map(|b| b.pos);
    if let Some(p) = target {
        hit::pointer_down(state, p);
        hit::pointer_up(state);
    }
}
