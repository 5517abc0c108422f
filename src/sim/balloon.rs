//! Balloon entity
//!
//! Balloons rise from below the playfield, wobble sideways and jiggle when
//! struck. Coordinates are canvas pixels with y growing downward, so
//! "rising" means y decreases.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Balloon types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BalloonKind {
    Normal,
    Glitter,
    Bomb,
    Freeze,
    Time,
    Mega,
    Mystery,
    Armored,
    Ghost,
    Tiny,
    Giant,
    Chain,
    Golden,
    Rainbow,
    Star,
    Alien,
    Unicorn,
    Diamond,
    Boss,
}

impl BalloonKind {
    pub const ALL: [BalloonKind; 19] = [
        BalloonKind::Normal,
        BalloonKind::Glitter,
        BalloonKind::Bomb,
        BalloonKind::Freeze,
        BalloonKind::Time,
        BalloonKind::Mega,
        BalloonKind::Mystery,
        BalloonKind::Armored,
        BalloonKind::Ghost,
        BalloonKind::Tiny,
        BalloonKind::Giant,
        BalloonKind::Chain,
        BalloonKind::Golden,
        BalloonKind::Rainbow,
        BalloonKind::Star,
        BalloonKind::Alien,
        BalloonKind::Unicorn,
        BalloonKind::Diamond,
        BalloonKind::Boss,
    ];

    /// The five collectible tiers
    pub const RARE: [BalloonKind; 5] = [
        BalloonKind::Rainbow,
        BalloonKind::Star,
        BalloonKind::Alien,
        BalloonKind::Unicorn,
        BalloonKind::Diamond,
    ];

    /// Relative spawn weight. Bosses only arrive through the boss schedule.
    pub fn weight(self) -> f32 {
        match self {
            BalloonKind::Normal => 60.0,
            BalloonKind::Glitter => 10.0,
            BalloonKind::Bomb => 7.0,
            BalloonKind::Freeze => 4.0,
            BalloonKind::Time => 3.0,
            BalloonKind::Mega => 2.0,
            BalloonKind::Mystery => 2.0,
            BalloonKind::Armored => 3.0,
            BalloonKind::Ghost => 2.0,
            BalloonKind::Tiny => 3.0,
            BalloonKind::Giant => 1.5,
            BalloonKind::Chain => 1.5,
            BalloonKind::Golden => 0.5,
            BalloonKind::Rainbow => 1.0,
            BalloonKind::Star => 0.5,
            BalloonKind::Alien => 0.3,
            BalloonKind::Unicorn => 0.1,
            BalloonKind::Diamond => 0.05,
            BalloonKind::Boss => 0.0,
        }
    }

    /// Base score for popping one
    pub fn points(self) -> u64 {
        match self {
            BalloonKind::Normal | BalloonKind::Bomb => 1,
            BalloonKind::Glitter => 5,
            BalloonKind::Mega | BalloonKind::Mystery => 3,
            BalloonKind::Freeze | BalloonKind::Time | BalloonKind::Chain => 2,
            BalloonKind::Tiny => 8,
            BalloonKind::Giant => 15,
            BalloonKind::Boss => 100,
            BalloonKind::Armored => 5,
            BalloonKind::Ghost => 10,
            BalloonKind::Golden => 25,
            BalloonKind::Rainbow | BalloonKind::Star => 10,
            BalloonKind::Alien => 15,
            BalloonKind::Unicorn => 25,
            BalloonKind::Diamond => 50,
        }
    }

    /// Base coin reward for popping one
    pub fn coins(self) -> u64 {
        match self {
            BalloonKind::Normal | BalloonKind::Bomb | BalloonKind::Mystery => 0,
            BalloonKind::Glitter => 2,
            BalloonKind::Mega | BalloonKind::Freeze | BalloonKind::Time | BalloonKind::Chain => 1,
            BalloonKind::Tiny | BalloonKind::Armored => 3,
            BalloonKind::Giant => 8,
            BalloonKind::Boss | BalloonKind::Rainbow => 50,
            BalloonKind::Ghost => 5,
            BalloonKind::Golden => 75,
            BalloonKind::Star => 100,
            BalloonKind::Alien => 200,
            BalloonKind::Unicorn => 500,
            BalloonKind::Diamond => 1000,
        }
    }

    pub fn is_rare(self) -> bool {
        Self::RARE.contains(&self)
    }

    /// Skipped by chain and mega cascades
    pub fn is_cascade_immune(self) -> bool {
        matches!(self, BalloonKind::Bomb | BalloonKind::Boss)
    }

    /// Stable name used as a key in stored statistics
    pub fn as_str(self) -> &'static str {
        match self {
            BalloonKind::Normal => "normal",
            BalloonKind::Glitter => "glitter",
            BalloonKind::Bomb => "bomb",
            BalloonKind::Freeze => "freeze",
            BalloonKind::Time => "time",
            BalloonKind::Mega => "mega",
            BalloonKind::Mystery => "mystery",
            BalloonKind::Armored => "armored",
            BalloonKind::Ghost => "ghost",
            BalloonKind::Tiny => "tiny",
            BalloonKind::Giant => "giant",
            BalloonKind::Chain => "chain",
            BalloonKind::Golden => "golden",
            BalloonKind::Rainbow => "rainbow",
            BalloonKind::Star => "star",
            BalloonKind::Alien => "alien",
            BalloonKind::Unicorn => "unicorn",
            BalloonKind::Diamond => "diamond",
            BalloonKind::Boss => "boss",
        }
    }
}

/// The seven pre-rolled outcomes of a mystery balloon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MysteryEffect {
    Coins,
    PowerUp,
    BombSwarm,
    PointBurst,
    FreezeAll,
    DoubleSpawn,
    MegaChain,
}

impl MysteryEffect {
    pub const ALL: [MysteryEffect; 7] = [
        MysteryEffect::Coins,
        MysteryEffect::PowerUp,
        MysteryEffect::BombSwarm,
        MysteryEffect::PointBurst,
        MysteryEffect::FreezeAll,
        MysteryEffect::DoubleSpawn,
        MysteryEffect::MegaChain,
    ];
}

/// Lifecycle: Active -> Popping -> Removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    /// Fading out, no longer hittable
    Popping,
    Removed,
}

/// Per-type state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BalloonExtra {
    Plain,
    Boss {
        health: u8,
        max_health: u8,
        enrage_at: u8,
        enraged: bool,
        /// Index into `BOSS_TEMPLATES`
        template: usize,
    },
    Armored {
        has_armor: bool,
    },
    Ghost {
        phase: f32,
        phase_speed: f32,
        visible: bool,
    },
    Mystery {
        effect: MysteryEffect,
    },
}

/// Result of striking a balloon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// The balloon pops
    Pop,
    /// Armor absorbed the hit
    ArmorBroken,
    /// Boss lost one health point and is still up
    BossDamaged { health: u8, enraged_now: bool },
}

/// Enrage speed multiplier, applied once
pub const BOSS_ENRAGE_SPEED: f32 = 1.5;
/// Ghosts are hittable above this opacity
pub const GHOST_VISIBLE_OPACITY: f32 = 0.5;

const JIGGLE_SPRING: f32 = 0.1;
const JIGGLE_DAMPING: f32 = 0.9;
const JIGGLE_LIMIT: f32 = 0.8;

/// A balloon entity
#[derive(Debug, Clone)]
pub struct Balloon {
    pub id: u32,
    pub kind: BalloonKind,
    pub pos: Vec2,
    pub radius: f32,
    /// Rise speed in pixels per reference frame before speed factors
    pub base_speed: f32,
    pub current_speed: f32,
    pub opacity: f32,
    pub lifecycle: Lifecycle,
    pub color_index: u8,
    pub extra: BalloonExtra,
    /// Animation clock (advances 0.04 per frame)
    pub time: f32,
    pub sine_freq: f32,
    pub jiggle: f32,
    pub jiggle_vel: f32,
    pub pop_scale: f32,
}

impl Balloon {
    pub fn new(
        id: u32,
        kind: BalloonKind,
        pos: Vec2,
        radius: f32,
        speed: f32,
        color_index: u8,
        extra: BalloonExtra,
    ) -> Self {
        let opacity = if matches!(extra, BalloonExtra::Ghost { .. }) { 0.3 } else { 1.0 };
        Self {
            id,
            kind,
            pos,
            radius,
            base_speed: speed,
            current_speed: speed,
            opacity,
            lifecycle: Lifecycle::Active,
            color_index,
            extra,
            time: 0.0,
            sine_freq: 0.015,
            jiggle: 0.0,
            jiggle_vel: 0.0,
            pop_scale: 1.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    pub fn is_popping(&self) -> bool {
        self.lifecycle == Lifecycle::Popping
    }

    /// Boss health, if this is a boss
    pub fn health(&self) -> Option<u8> {
        match self.extra {
            BalloonExtra::Boss { health, .. } => Some(health),
            _ => None,
        }
    }

    /// Strike the balloon. Multi-hit types may survive; the rest pop.
    pub fn handle_hit(&mut self) -> HitOutcome {
        let outcome = match &mut self.extra {
            BalloonExtra::Boss {
                health,
                enrage_at,
                enraged,
                ..
            } => {
                *health = health.saturating_sub(1);
                self.jiggle_vel = 0.5;
                let enraged_now = *health <= *enrage_at && !*enraged;
                if enraged_now {
                    *enraged = true;
                    self.base_speed *= BOSS_ENRAGE_SPEED;
                }
                if *health == 0 {
                    HitOutcome::Pop
                } else {
                    HitOutcome::BossDamaged {
                        health: *health,
                        enraged_now,
                    }
                }
            }
            BalloonExtra::Armored { has_armor } if *has_armor => {
                *has_armor = false;
                self.jiggle_vel = 0.4;
                HitOutcome::ArmorBroken
            }
            _ => HitOutcome::Pop,
        };
        if outcome == HitOutcome::Pop {
            self.start_popping();
        }
        outcome
    }

    /// Enter the fade-out animation
    pub fn start_popping(&mut self) {
        if self.lifecycle == Lifecycle::Active {
            self.lifecycle = Lifecycle::Popping;
        }
    }

    /// Nudge the jiggle spring when a neighbour pops
    pub fn apply_impact(&mut self) {
        self.jiggle_vel = 0.3;
    }

    /// Advance one step of `frames` reference frames
    pub fn update(&mut self, frames: f32, field_width: f32) {
        match self.lifecycle {
            Lifecycle::Removed => return,
            Lifecycle::Popping => {
                self.pop_scale += 0.2 * frames;
                self.opacity -= 0.15 * frames;
                if self.opacity <= 0.0 {
                    self.opacity = 0.0;
                    self.lifecycle = Lifecycle::Removed;
                }
                return;
            }
            Lifecycle::Active => {}
        }

        self.time += 0.04 * frames;
        self.pos.y -= self.current_speed * frames;

        let drift = match self.kind {
            BalloonKind::Ghost => (self.time * self.sine_freq * 3.0).sin() * 1.5,
            BalloonKind::Boss => (self.time * 0.02).sin() * 0.8,
            _ => (self.time * self.sine_freq).sin() * 0.4,
        };
        self.pos.x += drift * frames;
        if field_width > self.radius * 2.0 {
            self.pos.x = self.pos.x.clamp(self.radius, field_width - self.radius);
        }

        if let BalloonExtra::Ghost {
            phase,
            phase_speed,
            visible,
        } = &mut self.extra
        {
            *phase += *phase_speed * frames;
            self.opacity = 0.3 + phase.sin().abs() * 0.7;
            *visible = self.opacity > GHOST_VISIBLE_OPACITY;
        }

        self.jiggle_vel += -JIGGLE_SPRING * self.jiggle * frames;
        self.jiggle_vel *= JIGGLE_DAMPING.powf(frames);
        self.jiggle = (self.jiggle + self.jiggle_vel * frames).clamp(-JIGGLE_LIMIT, JIGGLE_LIMIT);
    }

    /// Ellipse hit test against the jiggle-deformed outline
    pub fn is_hit(&self, point: Vec2) -> bool {
        if !self.is_active() {
            return false;
        }
        if let BalloonExtra::Ghost { visible: false, .. } = self.extra {
            return false;
        }
        let jx = (1.0 + self.jiggle).max(0.2);
        let jy = (1.0 - self.jiggle).max(0.2);
        let dx = (point.x - self.pos.x) / jx;
        let dy = (point.y - self.pos.y) / jy;
        dx * dx + dy * dy <= self.radius * self.radius
    }

    /// Floated past the top edge
    pub fn is_off_screen(&self) -> bool {
        self.pos.y < -self.radius * 2.0
    }

    /// Ready to be dropped from the session
    pub fn is_expired(&self) -> bool {
        self.lifecycle == Lifecycle::Removed || self.is_off_screen()
    }
}
