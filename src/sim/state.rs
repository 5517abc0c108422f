//! Session state and core simulation types
//!
//! One `SessionState` exists per play. It is created when a game starts and
//! folded into the progression record when it ends.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::balloon::{Balloon, BalloonKind, HitOutcome, MysteryEffect};
use super::environment::Environment;
use super::mode::{GameMode, ModeRules};
use super::particles::ParticleSystem;
use super::powerup::{ActivePowerUps, PowerUpKind};
use super::scheduler::Scheduler;
use crate::consts::TARGET_COLOR_COUNT;
use crate::tuning::Tuning;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Playing,
    Paused,
    GameOver,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Countdown ran out
    Time,
    /// Bomb in a mode without lives
    Bomb,
    /// Last life lost
    Lives,
    /// Player left (zen has no other way out)
    Quit,
}

/// Everything the session reports outward: audio, haptics, UI, progression
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Popped {
        id: u32,
        kind: BalloonKind,
        points: u64,
        coins: u64,
        /// Popped by a chain/mega cascade rather than the pointer
        cascade: bool,
    },
    /// Struck but still up (armor, boss health)
    Hit {
        id: u32,
        kind: BalloonKind,
        outcome: HitOutcome,
    },
    Combo(u32),
    ChainBonus {
        chain: u32,
        bonus: u64,
    },
    BombHit {
        shielded: bool,
    },
    LifeLost {
        remaining: u8,
    },
    TimeBonus {
        seconds: f32,
    },
    FreezeStarted {
        duration_ms: f32,
    },
    FrenzyStarted,
    PowerUpStarted(PowerUpKind),
    PowerUpExpired(PowerUpKind),
    MysteryRevealed(MysteryEffect),
    BossWarning,
    BossSpawned {
        id: u32,
        name: &'static str,
    },
    BossDefeated {
        id: u32,
        name: &'static str,
    },
    RareFound(BalloonKind),
    TargetRound {
        round: u32,
        color: u8,
    },
    WrongTarget,
    Milestone {
        pops: u64,
    },
    GameOver {
        reason: EndReason,
    },
}

/// Combo bookkeeping
#[derive(Debug, Clone, Default)]
pub struct ComboState {
    pub count: u32,
    /// Ticks left before the combo drops to zero
    pub decay_ticks: u32,
    pub last_pop_ms: Option<f64>,
}

/// Consecutive same-colour pops
#[derive(Debug, Clone, Default)]
pub struct ChainState {
    pub count: u32,
    pub last_color: Option<u8>,
}

/// Target mode: pop balloons of one colour
#[derive(Debug, Clone, PartialEq)]
pub struct TargetState {
    pub color: u8,
    pub remaining: u32,
    pub round: u32,
}

impl TargetState {
    pub fn quota(round: u32) -> u32 {
        5 + round * 2
    }
}

/// Per-session counters folded into progression at the end
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub pops: u64,
    pub glitter_pops: u64,
    pub rare_pops: u64,
    pub mega_pops: u64,
    pub bosses_defeated: u64,
    pub powerups_used: u64,
    pub frenzy_count: u64,
    pub max_combo: u32,
    pub max_chain: u32,
    pub hit_bomb: bool,
    pub lives_lost: u8,
    pub kind_pops: BTreeMap<BalloonKind, u64>,
}

/// Pointer tracking for clicks and swipes
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    pub down: bool,
    /// Last resampled swipe point
    pub last: Option<Vec2>,
    /// Latest known position, also used by the magnet and butterflies
    pub pos: Option<Vec2>,
}

/// Complete state of one play session
#[derive(Debug, Clone)]
pub struct SessionState {
    pub seed: u64,
    pub mode: GameMode,
    pub rules: ModeRules,
    pub tuning: Tuning,
    /// Playfield size in canvas pixels
    pub bounds: Vec2,
    pub phase: GamePhase,
    pub end_reason: Option<EndReason>,

    /// Session clock, frozen while paused
    pub clock_ms: f64,
    pub ticks: u64,
    pub elapsed_s: f32,
    pub time_left_s: Option<f32>,
    /// Endless difficulty level (1-based)
    pub difficulty: u32,

    pub score: u64,
    pub coins: u64,
    pub lives: Option<u8>,
    pub combo: ComboState,
    pub chain: ChainState,
    pub powerups: ActivePowerUps,
    pub freeze_ms: f32,
    pub frenzy_ms: f32,
    pub target: Option<TargetState>,

    pub current_boss: Option<u32>,
    pub boss_pending: bool,
    pub boss_count: u32,
    pub next_boss_at: Option<u64>,
    pub next_milestone: usize,

    pub stats: SessionStats,
    pub balloons: Vec<Balloon>,
    pub fx: ParticleSystem,
    pub environment: Environment,
    pub scheduler: Scheduler,
    pub pointer: PointerState,
    /// Outbox drained by the controller after each tick
    pub events: Vec<GameEvent>,

    pub(crate) rng: Pcg32,
    next_id: u32,
}

impl SessionState {
    /// Start a session with default balance
    pub fn new(mode: GameMode, seed: u64, bounds: Vec2) -> Self {
        Self::with_tuning(mode, seed, bounds, Tuning::default())
    }

    pub fn with_tuning(mode: GameMode, seed: u64, bounds: Vec2, tuning: Tuning) -> Self {
        let rules = mode.rules(&tuning);
        let mut rng = Pcg32::seed_from_u64(seed);
        let target = rules.target.then(|| TargetState {
            color: rng.random_range(0..TARGET_COLOR_COUNT),
            remaining: TargetState::quota(1),
            round: 1,
        });
        log::info!("Starting {} session (seed {seed})", mode.as_str());
        Self {
            seed,
            mode,
            time_left_s: rules.time_limit_s,
            lives: rules.lives,
            next_boss_at: rules.boss_interval,
            rules,
            tuning,
            bounds,
            phase: GamePhase::Playing,
            end_reason: None,
            clock_ms: 0.0,
            ticks: 0,
            elapsed_s: 0.0,
            difficulty: 1,
            score: 0,
            coins: 0,
            combo: ComboState::default(),
            chain: ChainState::default(),
            powerups: ActivePowerUps::default(),
            freeze_ms: 0.0,
            frenzy_ms: 0.0,
            target,
            current_boss: None,
            boss_pending: false,
            boss_count: 0,
            next_milestone: 0,
            stats: SessionStats::default(),
            balloons: Vec::new(),
            fx: ParticleSystem::default(),
            environment: Environment::new(seed, bounds),
            scheduler: Scheduler::new(),
            pointer: PointerState::default(),
            events: Vec::new(),
            rng,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn is_frenzy(&self) -> bool {
        self.rules.always_frenzy || self.frenzy_ms > 0.0
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze_ms > 0.0
    }

    /// Multiplier applied to every balloon's base speed
    pub fn speed_factor(&self) -> f32 {
        if self.is_frozen() {
            self.tuning.freeze_factor
        } else if self.powerups.slowmo() {
            self.tuning.slowmo_factor
        } else {
            1.0
        }
    }

    pub fn balloon_index(&self, id: u32) -> Option<usize> {
        self.balloons.iter().position(|b| b.id == id)
    }

    pub fn balloon(&self, id: u32) -> Option<&Balloon> {
        self.balloons.iter().find(|b| b.id == id)
    }

    /// Add a balloon that was built outside the spawn engine
    pub fn insert_balloon(&mut self, balloon: Balloon) {
        self.balloons.push(balloon);
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// End the session. Later calls are ignored.
    pub fn end(&mut self, reason: EndReason) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        log::info!(
            "{} session over ({reason:?}): score {}, {} pops",
            self.mode.as_str(),
            self.score,
            self.stats.pops
        );
        self.phase = GamePhase::GameOver;
        self.end_reason = Some(reason);
        self.scheduler.clear();
        self.emit(GameEvent::GameOver { reason });
    }

    /// Activate a power-up for this session
    pub fn activate_powerup(&mut self, kind: PowerUpKind) {
        if kind == PowerUpKind::AutoPopBonus {
            super::effects::queue_auto_pop(self);
        } else {
            self.powerups.start(kind);
        }
        log::debug!("Power-up {} active", kind.as_str());
        self.emit(GameEvent::PowerUpStarted(kind));
    }

    /// Player-triggered power-up (counts toward challenges)
    pub fn use_powerup(&mut self, kind: PowerUpKind) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.stats.powerups_used += 1;
        self.activate_powerup(kind);
        true
    }
}
