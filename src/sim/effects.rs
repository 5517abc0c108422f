//! Effect dispatcher
//!
//! Maps a popped balloon's kind to its side effect. Cascades are queued on
//! the session scheduler; their handlers skip targets that are already gone.

use glam::Vec2;
use rand::Rng;

use super::balloon::{Balloon, BalloonExtra, BalloonKind, MysteryEffect};
use super::environment::ScreenEffect;
use super::hit;
use super::particles::{Preset, TextParticle};
use super::powerup::PowerUpKind;
use super::scheduler::{CascadeScore, Deferred};
use super::spawn::{self, BOSS_TEMPLATES};
use super::state::{EndReason, GameEvent, SessionState};
use crate::consts::BALLOON_COLORS;

/// Power-ups a mystery balloon can hand out
const MYSTERY_POWERUPS: [PowerUpKind; 4] = [
    PowerUpKind::Magnet,
    PowerUpKind::DoubleScore,
    PowerUpKind::SlowMo,
    PowerUpKind::CoinMagnet,
];
const BOMB_SWARM_SIZE: usize = 3;

/// Side effect of a scoring pop
pub(crate) fn dispatch(state: &mut SessionState, balloon: &Balloon) {
    match balloon.kind {
        BalloonKind::Normal
        | BalloonKind::Glitter
        | BalloonKind::Armored
        | BalloonKind::Ghost
        | BalloonKind::Tiny
        | BalloonKind::Giant
        | BalloonKind::Golden => {}
        // Bombs take `bomb_hit` and never score
        BalloonKind::Bomb => {}
        BalloonKind::Freeze => {
            let ms = state.tuning.freeze_ms;
            start_freeze(state, ms, balloon.pos);
        }
        BalloonKind::Time => time_bonus(state, balloon.pos),
        BalloonKind::Mega => mega(state, balloon),
        BalloonKind::Mystery => {
            if let BalloonExtra::Mystery { effect } = balloon.extra {
                mystery(state, effect, balloon);
            }
        }
        BalloonKind::Chain => chain(state, balloon),
        BalloonKind::Boss => boss_defeated(state, balloon),
        BalloonKind::Rainbow
        | BalloonKind::Star
        | BalloonKind::Alien
        | BalloonKind::Unicorn
        | BalloonKind::Diamond => rare_found(state, balloon.kind, balloon.pos),
    }
}

/// A bomb was struck
pub(crate) fn bomb_hit(state: &mut SessionState, bomb: &Balloon) {
    if state.powerups.take_shield() {
        log::debug!("Shield absorbed bomb {}", bomb.id);
        state
            .fx
            .emit(&mut state.rng, Preset::RingExpand { color: 0x64b5f6 }, bomb.pos);
        state.emit(GameEvent::BombHit { shielded: true });
        return;
    }
    state.stats.hit_bomb = true;
    state.fx.emit(&mut state.rng, Preset::Fire { count: 10 }, bomb.pos);
    state
        .fx
        .emit(&mut state.rng, Preset::SmokeCloud { count: 8 }, bomb.pos);
    state
        .environment
        .add_effect(ScreenEffect::flash(0xff0000, 0.3));
    state.emit(GameEvent::BombHit { shielded: false });
    lose_life(state);
}

/// Take a life, or end the session outright in modes without lives
pub(crate) fn lose_life(state: &mut SessionState) {
    match state.lives {
        Some(lives) => {
            let remaining = lives.saturating_sub(1);
            state.lives = Some(remaining);
            state.stats.lives_lost += 1;
            state.emit(GameEvent::LifeLost { remaining });
            if remaining == 0 {
                state.end(EndReason::Lives);
            }
        }
        None => state.end(EndReason::Bomb),
    }
}

pub(crate) fn start_freeze(state: &mut SessionState, duration_ms: f32, pos: Vec2) {
    state.freeze_ms = state.freeze_ms.max(duration_ms);
    state
        .fx
        .emit(&mut state.rng, Preset::IceShatter { count: 15 }, pos);
    state.emit(GameEvent::FreezeStarted { duration_ms });
}

fn time_bonus(state: &mut SessionState, pos: Vec2) {
    let seconds = state.tuning.time_bonus_s;
    if let Some(left) = state.time_left_s.as_mut() {
        *left += seconds;
        state
            .fx
            .text(TextParticle::new(pos, format!("+{seconds}s"), 0x4caf50));
        state.emit(GameEvent::TimeBonus { seconds });
    }
}

/// Queue cascade pops for every eligible balloon near `origin`
fn mega(state: &mut SessionState, origin: &Balloon) {
    state.stats.mega_pops += 1;
    let radius = state.tuning.mega_radius;
    let per_px = state.tuning.mega_delay_per_px;
    let now = state.clock_ms;
    for b in &state.balloons {
        if b.id == origin.id || !b.is_active() || b.kind.is_cascade_immune() {
            continue;
        }
        let dist = b.pos.distance(origin.pos);
        if dist <= radius {
            state.scheduler.schedule(
                now,
                dist * per_px,
                Deferred::CascadePop {
                    balloon_id: b.id,
                    score: CascadeScore::Own,
                },
            );
        }
    }
    state
        .environment
        .add_effect(ScreenEffect::shockwave(origin.pos, 0xffc864));
}

/// Queue staggered cascade pops for every other balloon matching `filter`
fn cascade_all(
    state: &mut SessionState,
    origin: &Balloon,
    stagger_ms: f32,
    score: CascadeScore,
    filter: impl Fn(&Balloon) -> bool,
) {
    let now = state.clock_ms;
    let targets: Vec<u32> = state
        .balloons
        .iter()
        .filter(|b| b.id != origin.id && b.is_active() && !b.kind.is_cascade_immune())
        .filter(|b| filter(*b))
        .map(|b| b.id)
        .collect();
    for (i, balloon_id) in targets.into_iter().enumerate() {
        state.scheduler.schedule(
            now,
            (i + 1) as f32 * stagger_ms,
            Deferred::CascadePop { balloon_id, score },
        );
    }
}

fn chain(state: &mut SessionState, origin: &Balloon) {
    let color = origin.color_index;
    let stagger = state.tuning.chain_stagger_ms;
    cascade_all(state, origin, stagger, CascadeScore::Flat(2), |b| {
        b.color_index == color
    });
}

fn mystery(state: &mut SessionState, effect: MysteryEffect, balloon: &Balloon) {
    log::debug!("Mystery balloon {} revealed {effect:?}", balloon.id);
    state
        .fx
        .emit(&mut state.rng, Preset::MysteryReveal(effect), balloon.pos);
    state.emit(GameEvent::MysteryRevealed(effect));

    let tuning = &state.tuning;
    match effect {
        MysteryEffect::Coins => state.coins += tuning.mystery_coins,
        MysteryEffect::PowerUp => {
            let kind = MYSTERY_POWERUPS[state.rng.random_range(0..MYSTERY_POWERUPS.len())];
            state.activate_powerup(kind);
        }
        MysteryEffect::BombSwarm => {
            if state.rules.bombs {
                let stagger = tuning.bomb_swarm_stagger_ms;
                queue_spawns(state, BOMB_SWARM_SIZE, stagger, Some(BalloonKind::Bomb));
            }
        }
        MysteryEffect::PointBurst => state.score += tuning.mystery_points,
        MysteryEffect::FreezeAll => {
            let ms = tuning.mystery_freeze_ms;
            start_freeze(state, ms, balloon.pos);
        }
        MysteryEffect::DoubleSpawn => {
            let (count, stagger) = (tuning.frenzy_spawns as usize, tuning.spawn_burst_stagger_ms);
            queue_spawns(state, count, stagger, None);
        }
        MysteryEffect::MegaChain => {
            let stagger = tuning.mega_chain_stagger_ms;
            cascade_all(state, balloon, stagger, CascadeScore::Flat(1), |_| true);
        }
    }
}

fn boss_defeated(state: &mut SessionState, boss: &Balloon) {
    let name = match boss.extra {
        BalloonExtra::Boss { template, .. } => BOSS_TEMPLATES[template % BOSS_TEMPLATES.len()].name,
        _ => BOSS_TEMPLATES[0].name,
    };
    state.stats.bosses_defeated += 1;
    if state.current_boss == Some(boss.id) {
        state.current_boss = None;
    }
    log::info!("Boss {name} defeated");
    state.fx.emit(&mut state.rng, Preset::BossDefeated, boss.pos);
    state
        .environment
        .add_effect(ScreenEffect::shockwave(boss.pos, 0xffd700));
    state.emit(GameEvent::BossDefeated { id: boss.id, name });

    let (count, stagger) = (
        state.tuning.boss_reward_spawns as usize,
        state.tuning.spawn_burst_stagger_ms,
    );
    queue_spawns(state, count, stagger, Some(BalloonKind::Glitter));
}

fn rare_found(state: &mut SessionState, kind: BalloonKind, pos: Vec2) {
    state.stats.rare_pops += 1;
    state
        .fx
        .emit(&mut state.rng, Preset::SparkleCloud { count: 20 }, pos);
    state
        .fx
        .emit(&mut state.rng, Preset::CoinShower { count: 15 }, pos);
    state.emit(GameEvent::RareFound(kind));
}

pub(crate) fn start_frenzy(state: &mut SessionState) {
    state.frenzy_ms = state.tuning.frenzy_ms;
    state.stats.frenzy_count += 1;
    log::debug!("Frenzy started (#{})", state.stats.frenzy_count);
    state.emit(GameEvent::FrenzyStarted);
    let (count, stagger) = (
        state.tuning.frenzy_spawns as usize,
        state.tuning.spawn_burst_stagger_ms,
    );
    queue_spawns(state, count, stagger, None);
}

pub(crate) fn queue_spawns(
    state: &mut SessionState,
    count: usize,
    stagger_ms: f32,
    kind: Option<BalloonKind>,
) {
    let now = state.clock_ms;
    for i in 0..count {
        state
            .scheduler
            .schedule(now, i as f32 * stagger_ms, Deferred::Spawn(kind));
    }
}

/// Auto-pop power-up: a handful of non-bomb balloons, staggered
pub(crate) fn queue_auto_pop(state: &mut SessionState) {
    let now = state.clock_ms;
    let stagger = state.tuning.auto_pop_stagger_ms;
    let targets: Vec<u32> = state
        .balloons
        .iter()
        .filter(|b| b.is_active() && b.kind != BalloonKind::Bomb)
        .take(state.tuning.auto_pop_count)
        .map(|b| b.id)
        .collect();
    for (i, balloon_id) in targets.into_iter().enumerate() {
        state
            .scheduler
            .schedule(now, (i + 1) as f32 * stagger, Deferred::AutoPop { balloon_id });
    }
}

/// Run one due deferred action
pub(crate) fn run_deferred(state: &mut SessionState, action: Deferred) {
    match action {
        Deferred::CascadePop { balloon_id, score } => cascade_pop(state, balloon_id, score),
        Deferred::AutoPop { balloon_id } => {
            if let Some(index) = state.balloon_index(balloon_id) {
                if state.balloons[index].is_active() {
                    hit::resolve_hit(state, index);
                }
            }
        }
        Deferred::Spawn(kind) => {
            spawn::spawn_balloon(state, kind);
        }
        Deferred::SpawnBoss => {
            if state.current_boss.is_none() {
                spawn::spawn_boss(state);
            } else {
                state.boss_pending = false;
            }
        }
    }
}

/// Pop without combo, chain or secondary effects
fn cascade_pop(state: &mut SessionState, balloon_id: u32, score: CascadeScore) {
    let Some(index) = state.balloon_index(balloon_id) else {
        return;
    };
    if !state.balloons[index].is_active() {
        return;
    }
    state.balloons[index].start_popping();
    let balloon = state.balloons[index].clone();

    let points = match score {
        CascadeScore::Own => balloon.kind.points(),
        CascadeScore::Flat(points) => points,
    };
    state.score += points;
    hit::tally_pop(state, balloon.kind);
    if balloon.kind.is_rare() {
        rare_found(state, balloon.kind, balloon.pos);
    }
    state.emit(GameEvent::Popped {
        id: balloon.id,
        kind: balloon.kind,
        points,
        coins: 0,
        cascade: true,
    });

    let color = BALLOON_COLORS[usize::from(balloon.color_index) % BALLOON_COLORS.len()];
    state.fx.emit(
        &mut state.rng,
        Preset::Explosion { color, count: 10 },
        balloon.pos,
    );
    state.fx.text(TextParticle::score(balloon.pos, points, 0));
    hit::after_pop(state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::mode::GameMode;

    fn session(mode: GameMode) -> SessionState {
        SessionState::new(mode, 11, Vec2::new(800.0, 600.0))
    }

    fn place(state: &mut SessionState, kind: BalloonKind, pos: Vec2, color: u8) -> u32 {
        let id = state.next_entity_id();
        let extra = match kind {
            BalloonKind::Mystery => BalloonExtra::Mystery {
                effect: MysteryEffect::MegaChain,
            },
            _ => BalloonExtra::Plain,
        };
        state.insert_balloon(Balloon::new(id, kind, pos, 30.0, 0.0, color, extra));
        id
    }

    fn drain_scheduler(state: &mut SessionState, until_ms: f64) {
        state.clock_ms = until_ms;
        while let Some(action) = state.scheduler.pop_due(until_ms) {
            run_deferred(state, action);
        }
    }

    #[test]
    fn test_bomb_without_lives_ends_game() {
        let mut s = session(GameMode::Classic);
        let id = place(&mut s, BalloonKind::Bomb, Vec2::new(100.0, 100.0), 0);
        hit::try_pop_at(&mut s, Vec2::new(100.0, 100.0));
        assert!(s.is_over());
        assert_eq!(s.end_reason, Some(EndReason::Bomb));
        assert_eq!(s.score, 0);
        assert!(!s.balloon(id).unwrap().is_active());
    }

    #[test]
    fn test_shield_blocks_bomb() {
        let mut s = session(GameMode::Classic);
        s.powerups.start(PowerUpKind::Shield);
        place(&mut s, BalloonKind::Bomb, Vec2::new(100.0, 100.0), 0);
        hit::try_pop_at(&mut s, Vec2::new(100.0, 100.0));
        assert!(s.is_playing());
        assert!(!s.stats.hit_bomb);
        assert!(!s.powerups.shield);
    }

    #[test]
    fn test_bomb_costs_a_life_in_survival() {
        let mut s = session(GameMode::Survival);
        place(&mut s, BalloonKind::Bomb, Vec2::new(100.0, 100.0), 0);
        hit::try_pop_at(&mut s, Vec2::new(100.0, 100.0));
        assert_eq!(s.lives, Some(2));
        assert!(s.is_playing());
        assert!(s.stats.hit_bomb);
    }

    #[test]
    fn test_freeze_and_time_bonus() {
        let mut s = session(GameMode::Classic);
        place(&mut s, BalloonKind::Freeze, Vec2::new(100.0, 100.0), 0);
        place(&mut s, BalloonKind::Time, Vec2::new(300.0, 100.0), 1);
        hit::try_pop_at(&mut s, Vec2::new(100.0, 100.0));
        hit::try_pop_at(&mut s, Vec2::new(300.0, 100.0));
        assert_eq!(s.freeze_ms, 3000.0);
        assert_eq!(s.time_left_s, Some(95.0));
    }

    #[test]
    fn test_time_bonus_ignored_without_countdown() {
        let mut s = session(GameMode::Survival);
        place(&mut s, BalloonKind::Time, Vec2::new(100.0, 100.0), 0);
        hit::try_pop_at(&mut s, Vec2::new(100.0, 100.0));
        assert_eq!(s.time_left_s, None);
    }

    #[test]
    fn test_mega_pops_nearby_in_distance_order() {
        let mut s = session(GameMode::Classic);
        place(&mut s, BalloonKind::Mega, Vec2::new(400.0, 300.0), 0);
        let near = place(&mut s, BalloonKind::Glitter, Vec2::new(450.0, 300.0), 1);
        let far = place(&mut s, BalloonKind::Normal, Vec2::new(540.0, 300.0), 2);
        let bomb = place(&mut s, BalloonKind::Bomb, Vec2::new(400.0, 360.0), 3);
        let out = place(&mut s, BalloonKind::Normal, Vec2::new(700.0, 300.0), 4);

        hit::try_pop_at(&mut s, Vec2::new(400.0, 300.0));
        assert_eq!(s.scheduler.len(), 2);

        drain_scheduler(&mut s, 100.0);
        assert!(s.balloon(near).unwrap().is_popping());
        assert!(s.balloon(far).unwrap().is_active());

        drain_scheduler(&mut s, 300.0);
        assert!(s.balloon(far).unwrap().is_popping());
        assert!(s.balloon(bomb).unwrap().is_active());
        assert!(s.balloon(out).unwrap().is_active());
        // mega 3 + glitter 5 + normal 1, no coins from the cascade
        assert_eq!(s.score, 9);
        assert_eq!(s.coins, BalloonKind::Mega.coins());
        assert_eq!(s.stats.pops, 3);
        assert_eq!(s.stats.mega_pops, 1);
    }

    #[test]
    fn test_chain_pops_same_color_only() {
        let mut s = session(GameMode::Classic);
        place(&mut s, BalloonKind::Chain, Vec2::new(100.0, 100.0), 2);
        let same = place(&mut s, BalloonKind::Normal, Vec2::new(300.0, 100.0), 2);
        let other = place(&mut s, BalloonKind::Normal, Vec2::new(500.0, 100.0), 3);
        hit::try_pop_at(&mut s, Vec2::new(100.0, 100.0));
        drain_scheduler(&mut s, 1000.0);
        assert!(s.balloon(same).unwrap().is_popping());
        assert!(s.balloon(other).unwrap().is_active());
        assert_eq!(s.score, 2 + 2);
    }

    #[test]
    fn test_cascade_skips_balloon_popped_meanwhile() {
        let mut s = session(GameMode::Classic);
        place(&mut s, BalloonKind::Chain, Vec2::new(100.0, 100.0), 2);
        let same = place(&mut s, BalloonKind::Normal, Vec2::new(300.0, 100.0), 2);
        hit::try_pop_at(&mut s, Vec2::new(100.0, 100.0));
        // Player gets there first
        s.clock_ms = 10.0;
        hit::try_pop_at(&mut s, Vec2::new(300.0, 100.0));
        let pops_before = s.stats.pops;
        drain_scheduler(&mut s, 1000.0);
        assert_eq!(s.stats.pops, pops_before);
        assert!(s.balloon(same).unwrap().is_popping());
    }

    #[test]
    fn test_mystery_mega_chain_pops_everything_but_bombs() {
        let mut s = session(GameMode::Classic);
        place(&mut s, BalloonKind::Mystery, Vec2::new(100.0, 100.0), 0);
        for i in 0..4 {
            place(&mut s, BalloonKind::Normal, Vec2::new(200.0 + 100.0 * i as f32, 100.0), i);
        }
        let bomb = place(&mut s, BalloonKind::Bomb, Vec2::new(100.0, 400.0), 0);
        hit::try_pop_at(&mut s, Vec2::new(100.0, 100.0));
        drain_scheduler(&mut s, 1000.0);
        assert_eq!(s.stats.pops, 5);
        assert!(s.balloon(bomb).unwrap().is_active());
        assert!(s.events.contains(&GameEvent::MysteryRevealed(MysteryEffect::MegaChain)));
    }

    #[test]
    fn test_boss_defeat_clears_reference_and_rewards() {
        let mut s = session(GameMode::BossRush);
        let id = spawn::spawn_boss(&mut s);
        let pos = s.balloon(id).unwrap().pos;
        for i in 0..5 {
            s.clock_ms = f64::from(i) * 1000.0;
            assert!(hit::try_pop_at(&mut s, pos));
        }
        assert_eq!(s.current_boss, None);
        assert_eq!(s.stats.bosses_defeated, 1);
        assert_eq!(s.score, 100);
        assert_eq!(s.coins, 50);
        drain_scheduler(&mut s, 10_000.0);
        let glitter = s.balloons.iter().filter(|b| b.kind == BalloonKind::Glitter).count();
        assert_eq!(glitter, 5);
    }

    #[test]
    fn test_rare_pop_reports_discovery() {
        let mut s = session(GameMode::Classic);
        place(&mut s, BalloonKind::Diamond, Vec2::new(100.0, 100.0), 0);
        hit::try_pop_at(&mut s, Vec2::new(100.0, 100.0));
        assert_eq!(s.coins, 1000);
        assert_eq!(s.stats.rare_pops, 1);
        assert!(s.events.contains(&GameEvent::RareFound(BalloonKind::Diamond)));
    }

    #[test]
    fn test_frenzy_triggers_at_combo_threshold() {
        let mut s = session(GameMode::Classic);
        for i in 0..10 {
            let p = Vec2::new(40.0 + 70.0 * i as f32, 100.0);
            place(&mut s, BalloonKind::Normal, p, (i % 6) as u8);
            s.clock_ms = f64::from(i) * 100.0;
            hit::try_pop_at(&mut s, p);
        }
        assert_eq!(s.combo.count, 10);
        assert!(s.is_frenzy());
        assert_eq!(s.stats.frenzy_count, 1);
        assert_eq!(s.scheduler.len(), 10);
    }

    #[test]
    fn test_auto_pop_goes_through_hit_path() {
        let mut s = session(GameMode::Classic);
        for i in 0..6 {
            place(&mut s, BalloonKind::Normal, Vec2::new(60.0 + 100.0 * i as f32, 100.0), i);
        }
        place(&mut s, BalloonKind::Bomb, Vec2::new(100.0, 400.0), 0);
        assert!(s.use_powerup(PowerUpKind::AutoPopBonus));
        drain_scheduler(&mut s, 1000.0);
        assert_eq!(s.stats.pops, 5);
        assert!(s.is_playing());
        assert_eq!(s.stats.powerups_used, 1);
    }
}
