//! Ambient decoration: clouds, butterflies, weather and screen effects
//!
//! Keeps animating while the session is paused. Has its own RNG so that
//! ambient motion never perturbs the gameplay random stream.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

const CLOUD_COUNT: usize = 4;
const BUTTERFLY_COUNT: usize = 3;
/// Squared distance within which butterflies flee the pointer
const BUTTERFLY_FLEE_DIST_SQ: f32 = 8000.0;
const BUTTERFLY_CRUISE: f32 = 1.2;
const BUTTERFLY_FLEE: f32 = 3.0;
/// Frames a fleeing butterfly keeps its burst speed
const BUTTERFLY_FLEE_FRAMES: f32 = 36.0;

#[derive(Debug, Clone)]
pub struct Cloud {
    pub pos: Vec2,
    pub width: f32,
    pub speed: f32,
    pub opacity: f32,
}

impl Cloud {
    fn spawn(rng: &mut Pcg32, bounds: Vec2, on_screen: bool) -> Self {
        let width = rng.random::<f32>() * 100.0 + 100.0;
        let x = if on_screen {
            rng.random::<f32>() * bounds.x
        } else {
            bounds.x + width
        };
        Self {
            pos: Vec2::new(x, rng.random::<f32>() * bounds.y * 0.4),
            width,
            speed: rng.random::<f32>() * 0.5 + 0.2,
            opacity: rng.random::<f32>() * 0.3 + 0.2,
        }
    }

    pub fn height(&self) -> f32 {
        self.width * 0.6
    }
}

#[derive(Debug, Clone)]
pub struct Butterfly {
    pub pos: Vec2,
    pub target: Vec2,
    pub size: f32,
    pub hue: f32,
    pub wing_angle: f32,
    wing_speed: f32,
    speed: f32,
    flee_frames: f32,
}

impl Butterfly {
    fn spawn(rng: &mut Pcg32, bounds: Vec2) -> Self {
        Self {
            pos: random_upper(rng, bounds),
            target: random_upper(rng, bounds),
            size: rng.random::<f32>() * 6.0 + 10.0,
            hue: rng.random::<f32>() * 360.0,
            wing_angle: rng.random::<f32>() * std::f32::consts::TAU,
            wing_speed: 0.12 + rng.random::<f32>() * 0.08,
            speed: BUTTERFLY_CRUISE,
            flee_frames: 0.0,
        }
    }

    fn update(&mut self, rng: &mut Pcg32, bounds: Vec2, frames: f32) {
        let delta = self.target - self.pos;
        let dist_sq = delta.length_squared();
        if dist_sq < 400.0 {
            self.target = random_upper(rng, bounds);
        } else if dist_sq > 4.0 {
            self.pos += delta.normalize() * self.speed * frames;
        }
        self.pos.x = self.pos.x.clamp(20.0, (bounds.x - 20.0).max(20.0));
        self.pos.y = self.pos.y.clamp(20.0, (bounds.y * 0.7).max(20.0));
        self.wing_angle += self.wing_speed * frames;

        if self.flee_frames > 0.0 {
            self.flee_frames -= frames;
            if self.flee_frames <= 0.0 {
                self.speed = BUTTERFLY_CRUISE;
            }
        }
    }

    /// Dart away from a nearby pointer
    fn react(&mut self, pointer: Vec2) {
        let away = self.pos - pointer;
        let dist_sq = away.length_squared();
        if dist_sq < BUTTERFLY_FLEE_DIST_SQ && dist_sq > 4.0 {
            self.target = self.pos + away.normalize() * 150.0;
            self.speed = BUTTERFLY_FLEE;
            self.flee_frames = BUTTERFLY_FLEE_FRAMES;
        }
    }

    /// Wing opening, 0.4 (closed) to 1.0 (open)
    pub fn flap(&self) -> f32 {
        0.4 + self.wing_angle.sin().abs() * 0.6
    }
}

fn random_upper(rng: &mut Pcg32, bounds: Vec2) -> Vec2 {
    Vec2::new(rng.random::<f32>() * bounds.x, rng.random::<f32>() * bounds.y * 0.6)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherKind {
    #[default]
    None,
    Rain,
    Snow,
    Leaves,
    Sakura,
    Aurora,
}

impl WeatherKind {
    fn particle_count(self) -> usize {
        match self {
            WeatherKind::None | WeatherKind::Aurora => 0,
            WeatherKind::Rain => 100,
            WeatherKind::Snow => 60,
            WeatherKind::Leaves => 25,
            WeatherKind::Sakura => 35,
        }
    }
}

/// A falling raindrop, flake, leaf or petal
#[derive(Debug, Clone)]
pub struct WeatherParticle {
    pub pos: Vec2,
    pub speed: f32,
    pub size: f32,
    pub rotation: f32,
    pub opacity: f32,
    rotation_speed: f32,
    wobble: f32,
    wobble_speed: f32,
    wobble_amp: f32,
}

impl WeatherParticle {
    fn spawn(rng: &mut Pcg32, kind: WeatherKind, bounds: Vec2, spread: bool) -> Self {
        let (speed, size, wobble_amp) = match kind {
            WeatherKind::Rain => (rng.random::<f32>() * 5.0 + 10.0, rng.random::<f32>() * 20.0 + 10.0, 0.0),
            WeatherKind::Snow => (rng.random::<f32>() + 0.5, rng.random::<f32>() * 4.0 + 2.0, 0.5),
            WeatherKind::Leaves => (
                rng.random::<f32>() * 1.5 + 0.5,
                rng.random::<f32>() * 10.0 + 8.0,
                rng.random::<f32>() * 2.0 + 1.0,
            ),
            WeatherKind::Sakura | WeatherKind::None | WeatherKind::Aurora => (
                rng.random::<f32>() + 0.3,
                rng.random::<f32>() * 8.0 + 5.0,
                rng.random::<f32>() * 3.0 + 1.0,
            ),
        };
        let y = if spread {
            rng.random::<f32>() * bounds.y
        } else {
            -rng.random::<f32>() * 100.0
        };
        Self {
            pos: Vec2::new(rng.random::<f32>() * (bounds.x + 100.0) - 50.0, y),
            speed,
            size,
            rotation: rng.random::<f32>() * std::f32::consts::TAU,
            opacity: rng.random::<f32>() * 0.4 + 0.3,
            rotation_speed: (rng.random::<f32>() - 0.5) * 0.1,
            wobble: rng.random::<f32>() * std::f32::consts::TAU,
            wobble_speed: rng.random::<f32>() * 0.03 + 0.01,
            wobble_amp,
        }
    }

    fn update(&mut self, frames: f32) {
        self.pos.y += self.speed * frames;
        self.wobble += self.wobble_speed * frames;
        self.pos.x += self.wobble.sin() * self.wobble_amp * frames;
        self.rotation += self.rotation_speed * frames;
    }
}

/// One band of the aurora curtain
#[derive(Debug, Clone)]
pub struct AuroraWave {
    pub y: f32,
    pub amplitude: f32,
    pub offset: f32,
    pub hue: f32,
    pub opacity: f32,
    speed: f32,
}

#[derive(Debug, Clone, Default)]
pub struct WeatherSystem {
    pub kind: WeatherKind,
    pub particles: Vec<WeatherParticle>,
    pub aurora: Vec<AuroraWave>,
}

impl WeatherSystem {
    fn set(&mut self, rng: &mut Pcg32, kind: WeatherKind, bounds: Vec2) {
        if self.kind == kind {
            return;
        }
        self.kind = kind;
        self.particles = (0..kind.particle_count())
            .map(|_| WeatherParticle::spawn(rng, kind, bounds, true))
            .collect();
        self.aurora.clear();
        if kind == WeatherKind::Aurora {
            self.aurora = (0..5)
                .map(|i| AuroraWave {
                    y: bounds.y * (0.1 + i as f32 * 0.08),
                    amplitude: 30.0 + rng.random::<f32>() * 20.0,
                    offset: rng.random::<f32>() * std::f32::consts::TAU,
                    hue: 120.0 + i as f32 * 30.0,
                    opacity: 0.15 + rng.random::<f32>() * 0.1,
                    speed: 0.005 + rng.random::<f32>() * 0.005,
                })
                .collect();
        }
    }

    fn update(&mut self, rng: &mut Pcg32, bounds: Vec2, frames: f32) {
        let kind = self.kind;
        for p in &mut self.particles {
            p.update(frames);
            if p.pos.y > bounds.y + 20.0 {
                *p = WeatherParticle::spawn(rng, kind, bounds, false);
            }
        }
        for wave in &mut self.aurora {
            wave.offset += wave.speed * frames;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScreenEffectKind {
    Ripple,
    Shockwave,
    Flash,
}

/// Full-screen or expanding-ring overlay
#[derive(Debug, Clone)]
pub struct ScreenEffect {
    pub kind: ScreenEffectKind,
    pub pos: Vec2,
    pub color: u32,
    pub radius: f32,
    pub max_radius: f32,
    pub opacity: f32,
    speed: f32,
}

impl ScreenEffect {
    pub fn ripple(pos: Vec2, color: u32) -> Self {
        Self {
            kind: ScreenEffectKind::Ripple,
            pos,
            color,
            radius: 0.0,
            max_radius: 150.0,
            opacity: 1.0,
            speed: 5.0,
        }
    }

    pub fn shockwave(pos: Vec2, color: u32) -> Self {
        Self {
            kind: ScreenEffectKind::Shockwave,
            radius: 0.0,
            max_radius: 300.0,
            speed: 15.0,
            ..Self::ripple(pos, color)
        }
    }

    /// Flash lasting `duration_s`
    pub fn flash(color: u32, duration_s: f32) -> Self {
        Self {
            kind: ScreenEffectKind::Flash,
            pos: Vec2::ZERO,
            color,
            radius: 0.0,
            max_radius: 0.0,
            opacity: 1.0,
            speed: 1.0 / (duration_s * 60.0).max(1.0),
        }
    }

    fn update(&mut self, frames: f32) {
        match self.kind {
            ScreenEffectKind::Ripple | ScreenEffectKind::Shockwave => {
                self.radius += self.speed * frames;
                self.opacity = 1.0 - self.radius / self.max_radius;
            }
            ScreenEffectKind::Flash => self.opacity -= self.speed * frames,
        }
    }

    /// Stroke width for shockwave rings
    pub fn line_width(&self) -> f32 {
        10.0 * self.opacity.max(0.0)
    }
}

/// Background scene state
#[derive(Debug, Clone)]
pub struct Environment {
    pub bounds: Vec2,
    pub clouds: Vec<Cloud>,
    pub butterflies: Vec<Butterfly>,
    pub weather: WeatherSystem,
    pub screen_effects: Vec<ScreenEffect>,
    /// Weather chosen by the player/theme, restored after a freeze
    base_weather: WeatherKind,
    rng: Pcg32,
}

impl Environment {
    pub fn new(seed: u64, bounds: Vec2) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed ^ 0x5eed_c10d);
        let clouds = (0..CLOUD_COUNT)
            .map(|_| Cloud::spawn(&mut rng, bounds, true))
            .collect();
        let butterflies = (0..BUTTERFLY_COUNT)
            .map(|_| Butterfly::spawn(&mut rng, bounds))
            .collect();
        Self {
            bounds,
            clouds,
            butterflies,
            weather: WeatherSystem::default(),
            screen_effects: Vec::new(),
            base_weather: WeatherKind::None,
            rng,
        }
    }

    pub fn set_weather(&mut self, kind: WeatherKind) {
        self.base_weather = kind;
        self.weather.set(&mut self.rng, kind, self.bounds);
    }

    pub fn add_effect(&mut self, effect: ScreenEffect) {
        self.screen_effects.push(effect);
    }

    /// Animate one step. `frozen` swaps in snow until the freeze ends.
    pub fn update(&mut self, frames: f32, pointer: Option<Vec2>, frozen: bool) {
        let wanted = if frozen { WeatherKind::Snow } else { self.base_weather };
        self.weather.set(&mut self.rng, wanted, self.bounds);

        for cloud in &mut self.clouds {
            cloud.pos.x -= cloud.speed * frames;
            if cloud.pos.x < -cloud.width {
                *cloud = Cloud::spawn(&mut self.rng, self.bounds, false);
            }
        }

        for butterfly in &mut self.butterflies {
            if let Some(p) = pointer {
                butterfly.react(p);
            }
            butterfly.update(&mut self.rng, self.bounds, frames);
        }

        self.weather.update(&mut self.rng, self.bounds, frames);

        for effect in &mut self.screen_effects {
            effect.update(frames);
        }
        self.screen_effects.retain(|e| e.opacity > 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Environment {
        Environment::new(7, Vec2::new(800.0, 600.0))
    }

    #[test]
    fn test_clouds_drift_left_and_respawn() {
        let mut e = env();
        let start = e.clouds[0].pos.x;
        e.update(1.0, None, false);
        assert!(e.clouds[0].pos.x < start);
        for _ in 0..10_000 {
            e.update(1.0, None, false);
        }
        assert_eq!(e.clouds.len(), CLOUD_COUNT);
        assert!(e.clouds.iter().all(|c| c.pos.x >= -c.width));
    }

    #[test]
    fn test_butterfly_flees_pointer() {
        let mut e = env();
        let pos = e.butterflies[0].pos;
        e.update(1.0, Some(pos + Vec2::new(10.0, 0.0)), false);
        assert_eq!(e.butterflies[0].speed, BUTTERFLY_FLEE);
        assert!(e.butterflies[0].target.x < pos.x);
    }

    #[test]
    fn test_freeze_brings_snow_then_restores() {
        let mut e = env();
        e.set_weather(WeatherKind::Rain);
        e.update(1.0, None, true);
        assert_eq!(e.weather.kind, WeatherKind::Snow);
        assert_eq!(e.weather.particles.len(), 60);
        e.update(1.0, None, false);
        assert_eq!(e.weather.kind, WeatherKind::Rain);
    }

    #[test]
    fn test_screen_effects_expire() {
        let mut e = env();
        e.add_effect(ScreenEffect::ripple(Vec2::ZERO, 0xffffff));
        e.add_effect(ScreenEffect::flash(0xffffff, 0.2));
        for _ in 0..40 {
            e.update(1.0, None, false);
        }
        assert!(e.screen_effects.is_empty());
    }
}
