//! Pointer input and hit resolution
//!
//! A click is one hit test. A swipe is resampled into hit tests every
//! `SWIPE_STEP` pixels once it has travelled `SWIPE_MIN_TRAVEL`. Each
//! sample pops at most one balloon, searching newest first.

use glam::Vec2;
use rand::Rng;

use super::balloon::{Balloon, BalloonKind, HitOutcome};
use super::effects;
use super::environment::ScreenEffect;
use super::particles::{Preset, TextParticle};
use super::scheduler::Deferred;
use super::state::{GameEvent, SessionState, TargetState};
use crate::consts::{BALLOON_COLORS, POP_MILESTONES, SWIPE_MIN_TRAVEL, SWIPE_STEP, TARGET_COLOR_COUNT};
use crate::lerp_point;

/// Neighbours within this many popped radii get jostled
const SHOCKWAVE_RADII: f32 = 3.0;

pub fn pointer_down(state: &mut SessionState, point: Vec2) {
    state.pointer.down = true;
    state.pointer.last = Some(point);
    state.pointer.pos = Some(point);
    try_pop_at(state, point);
}

pub fn pointer_move(state: &mut SessionState, point: Vec2) {
    state.pointer.pos = Some(point);
    if !state.pointer.down {
        return;
    }
    let Some(last) = state.pointer.last else {
        state.pointer.last = Some(point);
        return;
    };
    let travel = last.distance(point);
    if travel < SWIPE_MIN_TRAVEL {
        return;
    }
    let steps = (travel / SWIPE_STEP).ceil().max(1.0) as usize;
    for i in 1..=steps {
        if !state.is_playing() {
            break;
        }
        try_pop_at(state, lerp_point(last, point, i as f32 / steps as f32));
    }
    state.pointer.last = Some(point);
}

pub fn pointer_up(state: &mut SessionState) {
    state.pointer.down = false;
    state.pointer.last = None;
}

/// Hit-test one sample. Returns true if a balloon was struck.
pub fn try_pop_at(state: &mut SessionState, point: Vec2) -> bool {
    match state.balloons.iter().rposition(|b| b.is_hit(point)) {
        Some(index) => {
            resolve_hit(state, index);
            true
        }
        None => false,
    }
}

/// Strike the balloon at `index` and run the full pop path
pub fn resolve_hit(state: &mut SessionState, index: usize) {
    let outcome = state.balloons[index].handle_hit();
    let balloon = state.balloons[index].clone();

    if outcome != HitOutcome::Pop {
        state.fx.emit(
            &mut state.rng,
            Preset::SparkleCloud { count: 6 },
            balloon.pos,
        );
        state.emit(GameEvent::Hit {
            id: balloon.id,
            kind: balloon.kind,
            outcome,
        });
        return;
    }

    if balloon.kind == BalloonKind::Bomb {
        effects::bomb_hit(state, &balloon);
        return;
    }

    score_pop(state, &balloon);
}

/// Points, combo, colour chain, effects and feedback for a scoring pop
fn score_pop(state: &mut SessionState, balloon: &Balloon) {
    let now = state.clock_ms;
    let window = f64::from(state.tuning.combo_window_ms);

    let mut points = balloon.kind.points();
    let mut coins = balloon.kind.coins();
    if state.powerups.double_score() {
        points *= 2;
    }
    if state.is_frenzy() {
        points *= 2;
    }
    if state.powerups.coin_magnet() {
        coins *= 2;
    }

    // Combo
    let within = state
        .combo
        .last_pop_ms
        .is_some_and(|last| now - last < window);
    state.combo.count = if within { state.combo.count + 1 } else { 1 };
    state.combo.last_pop_ms = Some(now);
    state.combo.decay_ticks = state.tuning.combo_decay_ticks;
    let combo = state.combo.count;
    if combo >= 2 {
        points += u64::from(combo - 1);
        state.emit(GameEvent::Combo(combo));
    }
    state.stats.max_combo = state.stats.max_combo.max(combo);

    // Colour chain
    state.chain.count = if state.chain.last_color == Some(balloon.color_index) {
        state.chain.count + 1
    } else {
        1
    };
    state.chain.last_color = Some(balloon.color_index);
    let chain = state.chain.count;
    state.stats.max_chain = state.stats.max_chain.max(chain);
    let color = BALLOON_COLORS[usize::from(balloon.color_index) % BALLOON_COLORS.len()];
    if chain >= state.tuning.chain_bonus_min {
        let bonus = u64::from(chain) * 2;
        state.score += bonus;
        state
            .fx
            .emit(&mut state.rng, Preset::ColorMatchChain { color, chain }, balloon.pos);
        state.emit(GameEvent::ChainBonus { chain, bonus });
    }
    if chain >= state.tuning.chain_ripple_min {
        state.environment.add_effect(ScreenEffect::ripple(balloon.pos, color));
    }

    if state.target.is_some() {
        apply_target(state, balloon.color_index);
    }

    effects::dispatch(state, balloon);

    state.score += points;
    state.coins += coins;
    tally_pop(state, balloon.kind);
    state.emit(GameEvent::Popped {
        id: balloon.id,
        kind: balloon.kind,
        points,
        coins,
        cascade: false,
    });

    state.fx.emit(
        &mut state.rng,
        Preset::Explosion { color, count: 20 },
        balloon.pos,
    );
    state.fx.text(TextParticle::score(balloon.pos, points, combo));
    jostle_neighbours(state, balloon);
    if coins > 0 {
        state.fx.text(TextParticle::new(
            balloon.pos + Vec2::new(0.0, 24.0),
            format!("+{coins} coins"),
            0xffd700,
        ));
    }

    after_pop(state);
}

fn jostle_neighbours(state: &mut SessionState, popped: &Balloon) {
    let reach = popped.radius * SHOCKWAVE_RADII;
    for other in state.balloons.iter_mut() {
        if other.id != popped.id
            && other.is_active()
            && other.pos.distance(popped.pos) < reach + other.radius
        {
            other.apply_impact();
        }
    }
}

/// Target mode bookkeeping for one normal pop
fn apply_target(state: &mut SessionState, color: u8) {
    let Some(target) = state.target.as_mut() else {
        return;
    };
    if color != target.color {
        state.emit(GameEvent::WrongTarget);
        effects::lose_life(state);
        return;
    }
    target.remaining = target.remaining.saturating_sub(1);
    if target.remaining > 0 {
        return;
    }
    target.round += 1;
    target.remaining = TargetState::quota(target.round);
    target.color = state.rng.random_range(0..TARGET_COLOR_COUNT);
    let (round, color) = (target.round, target.color);
    state.score += u64::from(round) * 10;
    state.emit(GameEvent::TargetRound { round, color });
}

/// Count a pop toward the session statistics
pub(crate) fn tally_pop(state: &mut SessionState, kind: BalloonKind) {
    state.stats.pops += 1;
    *state.stats.kind_pops.entry(kind).or_insert(0) += 1;
    if kind == BalloonKind::Glitter {
        state.stats.glitter_pops += 1;
    }
}

/// Checks that follow any pop: boss schedule, frenzy trigger, milestones
pub(crate) fn after_pop(state: &mut SessionState) {
    let pops = state.stats.pops;

    if let (Some(interval), Some(due)) = (state.rules.boss_interval, state.next_boss_at) {
        if pops >= due && state.current_boss.is_none() && !state.boss_pending {
            state.boss_pending = true;
            state.next_boss_at = Some(pops + interval);
            state.scheduler.schedule(
                state.clock_ms,
                state.tuning.boss_warning_ms,
                Deferred::SpawnBoss,
            );
            log::debug!("Boss warning at {pops} pops");
            state.emit(GameEvent::BossWarning);
        }
    }

    if state.rules.frenzy
        && !state.rules.always_frenzy
        && state.frenzy_ms <= 0.0
        && state.combo.count >= state.tuning.frenzy_combo
    {
        effects::start_frenzy(state);
    }

    while let Some(&milestone) = POP_MILESTONES.get(state.next_milestone) {
        if pops < milestone {
            break;
        }
        state.next_milestone += 1;
        let center = state.bounds / 2.0;
        state
            .fx
            .text(TextParticle::new(center, format!("{milestone} POPS!"), 0xffd700));
        state.emit(GameEvent::Milestone { pops: milestone });
    }
}
