//! Spawn engine
//!
//! Weighted type draw, per-type physical parameters and per-type extra
//! state. Spawning always succeeds; an empty or all-zero roster degrades to
//! a normal balloon.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::balloon::{Balloon, BalloonExtra, BalloonKind, MysteryEffect};
use super::environment::ScreenEffect;
use super::state::{GameEvent, SessionState};
use crate::consts::{BALLOON_COLORS, TARGET_COLOR_COUNT};

/// Health at or below which a boss enrages
pub const BOSS_ENRAGE_AT: u8 = 2;

/// Boss archetypes, cycled in order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossTemplate {
    pub name: &'static str,
    pub health: u8,
    /// Radius multiplier
    pub size: f32,
    /// Minimum rise speed; the roll adds up to half again
    pub speed: f32,
}

pub const BOSS_TEMPLATES: [BossTemplate; 5] = [
    BossTemplate { name: "Balloon King", health: 5, size: 1.0, speed: 0.4 },
    BossTemplate { name: "Frost Giant", health: 4, size: 1.2, speed: 0.3 },
    BossTemplate { name: "Fire Lord", health: 6, size: 0.9, speed: 0.5 },
    BossTemplate { name: "Shadow Boss", health: 4, size: 0.8, speed: 0.6 },
    BossTemplate { name: "Golden Emperor", health: 8, size: 1.3, speed: 0.25 },
];

/// Inverse-CDF draw over `(item, weight)` pairs. Zero weights never win.
pub fn pick_weighted<T: Copy>(items: &[(T, f32)], rng: &mut Pcg32) -> Option<T> {
    let total: f32 = items.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let mut remaining = rng.random::<f32>() * total;
    let mut last = None;
    for &(item, weight) in items {
        if weight <= 0.0 {
            continue;
        }
        last = Some(item);
        remaining -= weight;
        if remaining <= 0.0 {
            return Some(item);
        }
    }
    // Float rounding can leave a sliver past the end
    last
}

/// Draw a balloon type from `kinds` using the static weight table
pub fn pick_kind(kinds: &[BalloonKind], rng: &mut Pcg32) -> BalloonKind {
    let weighted: Vec<_> = kinds.iter().map(|&k| (k, k.weight())).collect();
    pick_weighted(&weighted, rng).unwrap_or(BalloonKind::Normal)
}

fn roll_radius(kind: BalloonKind, rng: &mut Pcg32) -> f32 {
    let r = rng.random::<f32>();
    match kind {
        BalloonKind::Boss => 120.0 + r * 30.0,
        BalloonKind::Giant => 80.0 + r * 20.0,
        BalloonKind::Tiny => 25.0 + r * 8.0,
        BalloonKind::Normal => 48.0 + r * 12.0,
        _ => 55.0 + r * 12.0,
    }
}

fn roll_speed(kind: BalloonKind, rng: &mut Pcg32) -> f32 {
    let r = rng.random::<f32>();
    match kind {
        BalloonKind::Bomb => r * 0.9 + 1.8,
        BalloonKind::Time => r * 0.8 + 1.7,
        BalloonKind::Tiny => r * 1.5 + 2.5,
        BalloonKind::Giant => r * 0.3 + 0.6,
        BalloonKind::Boss => r * 0.2 + 0.4,
        BalloonKind::Ghost => r * 0.8 + 1.2,
        BalloonKind::Golden => r * 1.2 + 2.0,
        _ => r + 1.3,
    }
}

fn roll_mystery(weights: &[f32; 7], rng: &mut Pcg32) -> MysteryEffect {
    let weighted: Vec<_> = MysteryEffect::ALL.iter().copied().zip(weights.iter().copied()).collect();
    pick_weighted(&weighted, rng).unwrap_or(MysteryEffect::Coins)
}

/// Build a balloon of `kind` just below the playfield
pub fn build_balloon(
    rng: &mut Pcg32,
    id: u32,
    kind: BalloonKind,
    bounds: Vec2,
    color_count: u8,
    mystery_weights: &[f32; 7],
) -> Balloon {
    let radius = roll_radius(kind, rng);
    let speed = roll_speed(kind, rng);
    let span = (bounds.x - radius * 2.0).max(0.0);
    let pos = Vec2::new(radius + rng.random::<f32>() * span, bounds.y + radius);
    let color_index = rng.random_range(0..color_count.max(1));
    let extra = match kind {
        BalloonKind::Boss => {
            let t = BOSS_TEMPLATES[0];
            BalloonExtra::Boss {
                health: t.health,
                max_health: t.health,
                enrage_at: BOSS_ENRAGE_AT,
                enraged: false,
                template: 0,
            }
        }
        BalloonKind::Armored => BalloonExtra::Armored { has_armor: true },
        BalloonKind::Ghost => BalloonExtra::Ghost {
            phase: rng.random::<f32>() * TAU,
            phase_speed: 0.03 + rng.random::<f32>() * 0.02,
            visible: false,
        },
        BalloonKind::Mystery => BalloonExtra::Mystery {
            effect: roll_mystery(mystery_weights, rng),
        },
        _ => BalloonExtra::Plain,
    };
    let mut balloon = Balloon::new(id, kind, pos, radius, speed, color_index, extra);
    balloon.sine_freq = 0.008 + rng.random::<f32>() * 0.015;
    balloon
}

/// Spawn one balloon into the session. Returns its id.
pub fn spawn_balloon(state: &mut SessionState, forced: Option<BalloonKind>) -> u32 {
    let kind = match forced {
        Some(BalloonKind::Boss) => return spawn_boss(state),
        Some(kind) => kind,
        None => {
            let kinds = state.rules.spawnable_kinds();
            pick_kind(&kinds, &mut state.rng)
        }
    };
    let color_count = if state.rules.target {
        TARGET_COLOR_COUNT
    } else {
        BALLOON_COLORS.len() as u8
    };
    let id = state.next_entity_id();
    let weights = state.tuning.mystery_weights;
    let mut balloon = build_balloon(&mut state.rng, id, kind, state.bounds, color_count, &weights);
    balloon.current_speed = balloon.base_speed * state.speed_factor();
    log::trace!("Spawned {} balloon {id}", kind.as_str());
    state.balloons.push(balloon);
    id
}

/// Spawn the next boss from the template cycle
pub fn spawn_boss(state: &mut SessionState) -> u32 {
    let index = state.boss_count as usize % BOSS_TEMPLATES.len();
    let template = BOSS_TEMPLATES[index];
    let id = state.next_entity_id();
    let rng = &mut state.rng;

    let radius = roll_radius(BalloonKind::Boss, rng) * template.size;
    let speed = template.speed * (1.0 + rng.random::<f32>() * 0.5);
    let pos = Vec2::new(state.bounds.x / 2.0, state.bounds.y + radius);
    let color_index = rng.random_range(0..BALLOON_COLORS.len() as u8);
    let extra = BalloonExtra::Boss {
        health: template.health,
        max_health: template.health,
        enrage_at: BOSS_ENRAGE_AT,
        enraged: false,
        template: index,
    };
    let mut boss = Balloon::new(id, BalloonKind::Boss, pos, radius, speed, color_index, extra);
    boss.current_speed = speed * state.speed_factor();
    state.balloons.push(boss);

    state.boss_count += 1;
    state.current_boss = Some(id);
    state.boss_pending = false;
    state
        .environment
        .add_effect(ScreenEffect::shockwave(pos, 0xff6464));
    log::info!("Boss {} arrived ({} hp)", template.name, template.health);
    state.emit(GameEvent::BossSpawned {
        id,
        name: template.name,
    });
    id
}

/// Frames between spawns on average. Lower is busier.
pub fn spawn_rate(state: &SessionState) -> f32 {
    let t = &state.tuning;
    // The endless ramp takes precedence over frenzy
    let rate = if state.rules.endless {
        (t.spawn_rate - state.difficulty as f32 * 2.0).max(t.endless_min_spawn_rate)
    } else if state.is_frenzy() {
        t.frenzy_spawn_rate
    } else {
        t.spawn_rate
    };
    let steps = state.score.checked_div(t.score_per_rate_step).unwrap_or(0) as f32;
    (rate - steps).max(t.min_spawn_rate)
}

/// Probabilistic spawn for one tick of `frames` reference frames
pub fn roll_spawn(state: &mut SessionState, frames: f32) -> Option<u32> {
    let rate = spawn_rate(state);
    if state.rng.random::<f32>() * rate < frames {
        Some(spawn_balloon(state, None))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::mode::GameMode;
    use rand::SeedableRng;

    fn session(mode: GameMode) -> SessionState {
        SessionState::new(mode, 42, Vec2::new(800.0, 600.0))
    }

    #[test]
    fn test_empty_roster_is_normal() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(pick_kind(&[], &mut rng), BalloonKind::Normal);
        assert_eq!(pick_kind(&[BalloonKind::Boss], &mut rng), BalloonKind::Normal);
    }

    #[test]
    fn test_single_kind_always_wins() {
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(pick_kind(&[BalloonKind::Glitter], &mut rng), BalloonKind::Glitter);
        }
    }

    #[test]
    fn test_ranges_per_type() {
        let mut rng = Pcg32::seed_from_u64(9);
        let bounds = Vec2::new(800.0, 600.0);
        for _ in 0..200 {
            let tiny = build_balloon(&mut rng, 1, BalloonKind::Tiny, bounds, 6, &[1.0; 7]);
            assert!((25.0..=33.0).contains(&tiny.radius));
            assert!((2.5..=4.0).contains(&tiny.base_speed));
            let giant = build_balloon(&mut rng, 2, BalloonKind::Giant, bounds, 6, &[1.0; 7]);
            assert!((80.0..=100.0).contains(&giant.radius));
            let normal = build_balloon(&mut rng, 3, BalloonKind::Normal, bounds, 6, &[1.0; 7]);
            assert!((48.0..=60.0).contains(&normal.radius));
            assert!(normal.color_index < 6);
            assert!(normal.pos.y > bounds.y);
        }
    }

    #[test]
    fn test_extra_state_initialized() {
        let mut rng = Pcg32::seed_from_u64(3);
        let bounds = Vec2::new(800.0, 600.0);
        let armored = build_balloon(&mut rng, 1, BalloonKind::Armored, bounds, 6, &[1.0; 7]);
        assert_eq!(armored.extra, BalloonExtra::Armored { has_armor: true });
        let ghost = build_balloon(&mut rng, 2, BalloonKind::Ghost, bounds, 6, &[1.0; 7]);
        match ghost.extra {
            BalloonExtra::Ghost { phase_speed, .. } => assert!((0.03..=0.05).contains(&phase_speed)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_mystery_weights_are_honored() {
        let mut rng = Pcg32::seed_from_u64(4);
        let bounds = Vec2::new(800.0, 600.0);
        let mut only_freeze = [0.0; 7];
        only_freeze[4] = 1.0;
        for id in 0..50 {
            let b = build_balloon(&mut rng, id, BalloonKind::Mystery, bounds, 6, &only_freeze);
            assert_eq!(b.extra, BalloonExtra::Mystery { effect: MysteryEffect::FreezeAll });
        }
    }

    #[test]
    fn test_boss_templates_cycle() {
        let mut s = session(GameMode::BossRush);
        let first = spawn_boss(&mut s);
        assert_eq!(s.balloon(first).and_then(|b| b.health()), Some(5));
        let second = spawn_boss(&mut s);
        assert_eq!(s.balloon(second).and_then(|b| b.health()), Some(4));
        assert_eq!(s.current_boss, Some(second));
        assert_eq!(s.boss_count, 2);
    }

    #[test]
    fn test_target_mode_uses_four_colors() {
        let mut s = session(GameMode::Target);
        for _ in 0..100 {
            spawn_balloon(&mut s, None);
        }
        assert!(s.balloons.iter().all(|b| b.color_index < TARGET_COLOR_COUNT));
        assert!(s.balloons.iter().all(|b| b.kind == BalloonKind::Normal));
    }

    #[test]
    fn test_spawn_rate_rules() {
        let mut s = session(GameMode::Classic);
        assert_eq!(spawn_rate(&s), 60.0);
        s.score = 500;
        assert_eq!(spawn_rate(&s), 50.0);
        s.score = 100_000;
        assert_eq!(spawn_rate(&s), 30.0);

        let s = session(GameMode::Frenzy);
        assert_eq!(spawn_rate(&s), 30.0);

        let mut s = session(GameMode::Endless);
        s.difficulty = 5;
        assert_eq!(spawn_rate(&s), 50.0);
        // The ramp bottoms out at 20 but the score floor still applies
        s.difficulty = 30;
        assert_eq!(spawn_rate(&s), 30.0);
    }

    #[test]
    fn test_endless_rate_keeps_global_floor_under_score() {
        let mut s = session(GameMode::Endless);
        s.difficulty = 10;
        s.score = 1000;
        assert_eq!(spawn_rate(&s), 30.0);
    }

    #[test]
    fn test_endless_ramp_overrides_frenzy() {
        let mut s = session(GameMode::Endless);
        s.difficulty = 2;
        s.frenzy_ms = 5000.0;
        assert!(s.is_frenzy());
        assert_eq!(spawn_rate(&s), 56.0);
    }

    #[test]
    fn test_new_spawns_inherit_freeze() {
        let mut s = session(GameMode::Classic);
        s.freeze_ms = 1000.0;
        let id = spawn_balloon(&mut s, Some(BalloonKind::Normal));
        let b = s.balloon(id).unwrap();
        assert!((b.current_speed - b.base_speed * 0.2).abs() < 1e-6);
    }
}
