//! Visual particles and floating text
//!
//! Nothing here affects gameplay. Particles and text fade by a fixed decay
//! per frame and are dropped at zero life.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::balloon::MysteryEffect;
use crate::consts::{MAX_PARTICLES, MAX_TEXT_PARTICLES};

const GOLD: u32 = 0xffd700;
const WHITE: u32 = 0xffffff;
const CONFETTI_COLORS: [u32; 6] = [0xff0000, 0x00ff00, 0x0000ff, 0xffff00, 0xff00ff, 0x00ffff];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Star,
    Confetti,
    Sparkle,
    Coin,
    Fire,
    Ice,
    Smoke,
    /// Expanding outline
    Ring,
    Lightning,
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub kind: ParticleKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: u32,
    pub size: f32,
    pub gravity: f32,
    pub friction: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
    /// 1.0 at birth, dropped at 0
    pub life: f32,
    pub decay: f32,
}

impl Particle {
    /// A particle with the defaults for its kind and a random drift
    pub fn new(rng: &mut Pcg32, pos: Vec2, color: u32, kind: ParticleKind) -> Self {
        let mut p = Self {
            kind,
            pos,
            vel: Vec2::new(
                (rng.random::<f32>() - 0.5) * 10.0,
                (rng.random::<f32>() - 0.5) * 10.0,
            ),
            color,
            size: rng.random::<f32>() * 8.0 + 4.0,
            gravity: 0.2,
            friction: 0.95,
            rotation: rng.random::<f32>() * TAU,
            rotation_speed: (rng.random::<f32>() - 0.5) * 0.2,
            life: 1.0,
            decay: rng.random::<f32>() * 0.02 + 0.01,
        };
        match kind {
            ParticleKind::Fire => {
                p.gravity = -0.1;
                p.decay = 0.03;
                p.vel.y = -rng.random::<f32>() * 3.0 - 2.0;
            }
            ParticleKind::Ice => {
                p.gravity = 0.05;
                p.decay = 0.015;
                p.rotation_speed = 0.05;
            }
            ParticleKind::Smoke => {
                p.gravity = -0.05;
                p.decay = 0.008;
                p.friction = 0.98;
                p.size = rng.random::<f32>() * 15.0 + 10.0;
            }
            ParticleKind::Confetti => {
                p.gravity = 0.15;
                p.rotation_speed = 0.2;
                p.decay = 0.01;
            }
            ParticleKind::Coin => {
                p.gravity = 0.1;
                p.decay = 0.015;
            }
            ParticleKind::Lightning => p.decay = 0.1,
            ParticleKind::Ring => {
                p.vel = Vec2::ZERO;
                p.gravity = 0.0;
                p.decay = 0.025;
            }
            ParticleKind::Star | ParticleKind::Sparkle => {}
        }
        p
    }

    pub fn update(&mut self, frames: f32) {
        if self.kind == ParticleKind::Ring {
            self.size += 5.0 * frames;
        } else {
            self.vel.y += self.gravity * frames;
            self.vel *= self.friction.powf(frames);
            self.pos += self.vel * frames;
        }
        self.rotation += self.rotation_speed * frames;
        self.life -= self.decay * frames;
    }

    pub fn opacity(&self) -> f32 {
        self.life.max(0.0)
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }
}

/// Floating score/coin/banner text
#[derive(Debug, Clone)]
pub struct TextParticle {
    pub pos: Vec2,
    pub text: String,
    pub color: u32,
    pub font_size: f32,
    pub speed_y: f32,
    pub opacity: f32,
    pub decay: f32,
}

impl TextParticle {
    pub fn new(pos: Vec2, text: impl Into<String>, color: u32) -> Self {
        Self {
            pos,
            text: text.into(),
            color,
            font_size: 24.0,
            speed_y: -2.0,
            opacity: 1.0,
            decay: 0.02,
        }
    }

    /// Score popup sized by the current combo
    pub fn score(pos: Vec2, points: u64, combo: u32) -> Self {
        Self {
            font_size: 20.0 + (combo as f32 * 2.0).min(20.0),
            decay: 0.015,
            ..Self::new(pos, format!("+{points}"), WHITE)
        }
    }

    pub fn update(&mut self, frames: f32) {
        self.pos.y += self.speed_y * frames;
        self.opacity -= self.decay * frames;
    }

    pub fn is_alive(&self) -> bool {
        self.opacity > 0.0
    }
}

/// Named bursts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Preset {
    Explosion { color: u32, count: usize },
    ConfettiBurst { count: usize },
    CoinShower { count: usize },
    Fire { count: usize },
    IceShatter { count: usize },
    SparkleCloud { count: usize },
    SmokeCloud { count: usize },
    RingExpand { color: u32 },
    BossDefeated,
    MysteryReveal(MysteryEffect),
    ColorMatchChain { color: u32, chain: u32 },
}

/// Owns the live particles and text of a session
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    pub particles: Vec<Particle>,
    pub texts: Vec<TextParticle>,
    cap: usize,
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::with_cap(MAX_PARTICLES)
    }
}

impl ParticleSystem {
    pub fn with_cap(cap: usize) -> Self {
        Self {
            particles: Vec::new(),
            texts: Vec::new(),
            cap,
        }
    }

    /// Emit a preset burst at `pos`. Bursts beyond the cap are dropped.
    pub fn emit(&mut self, rng: &mut Pcg32, preset: Preset, pos: Vec2) {
        match preset {
            Preset::Explosion { color, count } => {
                for i in 0..count {
                    let angle = TAU * i as f32 / count as f32;
                    let speed = 5.0 + rng.random::<f32>() * 5.0;
                    let mut p = Particle::new(rng, pos, color, ParticleKind::Star);
                    p.vel = Vec2::from_angle(angle) * speed;
                    self.push(p);
                }
            }
            Preset::ConfettiBurst { count } => {
                for _ in 0..count {
                    let color = CONFETTI_COLORS[rng.random_range(0..CONFETTI_COLORS.len())];
                    let mut p = Particle::new(rng, pos, color, ParticleKind::Confetti);
                    p.vel = Vec2::new(
                        (rng.random::<f32>() - 0.5) * 15.0,
                        (rng.random::<f32>() - 0.5) * 15.0 - 5.0,
                    );
                    p.gravity = 0.3;
                    self.push(p);
                }
            }
            Preset::CoinShower { count } => {
                for _ in 0..count {
                    let mut p = Particle::new(rng, pos, GOLD, ParticleKind::Coin);
                    p.vel = Vec2::new(
                        (rng.random::<f32>() - 0.5) * 10.0,
                        -rng.random::<f32>() * 10.0 - 5.0,
                    );
                    p.gravity = 0.25;
                    p.size = 8.0 + rng.random::<f32>() * 6.0;
                    self.push(p);
                }
            }
            Preset::Fire { count } => {
                for _ in 0..count {
                    let mut p = Particle::new(rng, pos, 0xff4500, ParticleKind::Fire);
                    p.vel = Vec2::new(
                        (rng.random::<f32>() - 0.5) * 4.0,
                        -rng.random::<f32>() * 5.0 - 3.0,
                    );
                    p.size = 10.0 + rng.random::<f32>() * 10.0;
                    self.push(p);
                }
            }
            Preset::IceShatter { count } => {
                for _ in 0..count {
                    let mut p = Particle::new(rng, pos, 0xb3e5fc, ParticleKind::Ice);
                    p.vel = Vec2::new(
                        (rng.random::<f32>() - 0.5) * 12.0,
                        (rng.random::<f32>() - 0.5) * 12.0,
                    );
                    p.size = 8.0 + rng.random::<f32>() * 8.0;
                    p.gravity = 0.1;
                    self.push(p);
                }
            }
            Preset::SparkleCloud { count } => {
                for _ in 0..count {
                    let mut p = Particle::new(rng, pos, WHITE, ParticleKind::Sparkle);
                    p.vel = Vec2::new(
                        (rng.random::<f32>() - 0.5) * 6.0,
                        (rng.random::<f32>() - 0.5) * 6.0,
                    );
                    p.size = 4.0 + rng.random::<f32>() * 6.0;
                    p.decay = 0.02;
                    self.push(p);
                }
            }
            Preset::SmokeCloud { count } => {
                for _ in 0..count {
                    let mut p = Particle::new(rng, pos, 0x666666, ParticleKind::Smoke);
                    p.vel = Vec2::new(
                        (rng.random::<f32>() - 0.5) * 2.0,
                        -rng.random::<f32>() * 2.0 - 0.5,
                    );
                    p.size = 15.0 + rng.random::<f32>() * 20.0;
                    self.push(p);
                }
            }
            Preset::RingExpand { color } => {
                let mut p = Particle::new(rng, pos, color, ParticleKind::Ring);
                p.size = 10.0;
                self.push(p);
            }
            Preset::BossDefeated => {
                self.emit(rng, Preset::Explosion { color: 0xff0000, count: 30 }, pos);
                self.emit(rng, Preset::ConfettiBurst { count: 40 }, pos);
                self.emit(rng, Preset::CoinShower { count: 20 }, pos);
                self.emit(rng, Preset::SparkleCloud { count: 30 }, pos);
                self.emit(rng, Preset::RingExpand { color: GOLD }, pos);
            }
            Preset::MysteryReveal(effect) => match effect {
                MysteryEffect::Coins => self.emit(rng, Preset::CoinShower { count: 25 }, pos),
                MysteryEffect::PowerUp => {
                    self.emit(rng, Preset::SparkleCloud { count: 25 }, pos);
                    self.emit(rng, Preset::RingExpand { color: 0x9c27b0 }, pos);
                }
                MysteryEffect::BombSwarm => {
                    self.emit(rng, Preset::SmokeCloud { count: 15 }, pos);
                    self.emit(rng, Preset::Fire { count: 10 }, pos);
                }
                MysteryEffect::FreezeAll => self.emit(rng, Preset::IceShatter { count: 25 }, pos),
                MysteryEffect::MegaChain => {
                    let mut bolt = Particle::new(rng, pos, 0x00bfff, ParticleKind::Lightning);
                    bolt.size = 30.0;
                    self.push(bolt);
                    self.emit(rng, Preset::SparkleCloud { count: 20 }, pos);
                }
                MysteryEffect::PointBurst | MysteryEffect::DoubleSpawn => {
                    self.emit(rng, Preset::ConfettiBurst { count: 20 }, pos)
                }
            },
            Preset::ColorMatchChain { color, chain } => {
                let spread = 8.0 + chain as f32;
                for _ in 0..10 + chain as usize * 5 {
                    let mut p = Particle::new(rng, pos, color, ParticleKind::Star);
                    p.vel = Vec2::new(
                        (rng.random::<f32>() - 0.5) * spread,
                        (rng.random::<f32>() - 0.5) * spread,
                    );
                    p.size = 6.0 + rng.random::<f32>() * 4.0 + chain as f32;
                    self.push(p);
                }
                if chain >= 3 {
                    self.emit(rng, Preset::RingExpand { color }, pos);
                }
            }
        }
    }

    pub fn text(&mut self, text: TextParticle) {
        if self.texts.len() < MAX_TEXT_PARTICLES {
            self.texts.push(text);
        }
    }

    fn push(&mut self, particle: Particle) {
        if self.particles.len() < self.cap {
            self.particles.push(particle);
        }
    }

    /// Advance and drop everything that faded out
    pub fn update(&mut self, frames: f32) {
        for p in &mut self.particles {
            p.update(frames);
        }
        self.particles.retain(Particle::is_alive);
        for t in &mut self.texts {
            t.update(frames);
        }
        self.texts.retain(TextParticle::is_alive);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.texts.clear();
    }
}
