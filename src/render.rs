//! Frame description handed to whatever draws it
//!
//! The core never touches a canvas. `render` walks a session back to front
//! and hands each visible thing to a `RenderSink`. Layer order:
//! weather, clouds, butterflies, balloons, particles, text, screen effects.

use glam::Vec2;

use crate::consts::BALLOON_COLORS;
use crate::settings::Settings;
use crate::sim::environment::{AuroraWave, Butterfly, Cloud, WeatherParticle};
use crate::sim::spawn::BOSS_TEMPLATES;
use crate::sim::{
    Balloon, BalloonExtra, BalloonKind, Particle, ScreenEffect, ScreenEffectKind, SessionState,
    TextParticle, WeatherKind,
};

/// Symbols drawn on balloons in colourblind mode, one per palette colour
const COLORBLIND_SYMBOLS: [char; 6] = ['●', '▲', '■', '◆', '★', '✚'];

/// Boss health bar overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthBar {
    pub name: &'static str,
    pub health: u8,
    pub max_health: u8,
    pub enraged: bool,
}

impl HealthBar {
    pub fn fraction(&self) -> f32 {
        if self.max_health == 0 {
            0.0
        } else {
            f32::from(self.health) / f32::from(self.max_health)
        }
    }
}

/// A balloon as drawn
#[derive(Debug, Clone, PartialEq)]
pub struct BalloonSprite {
    pub id: u32,
    pub kind: BalloonKind,
    pub pos: Vec2,
    pub radius: f32,
    /// Jiggle-deformed scale (x, y), including the pop swell
    pub scale: Vec2,
    pub color: u32,
    pub opacity: f32,
    pub symbol: Option<char>,
    pub armored: bool,
    pub health_bar: Option<HealthBar>,
}

impl BalloonSprite {
    fn from_balloon(balloon: &Balloon, colorblind: bool) -> Self {
        let index = usize::from(balloon.color_index) % BALLOON_COLORS.len();
        let scale = Vec2::new(1.0 + balloon.jiggle, 1.0 - balloon.jiggle) * balloon.pop_scale;
        let health_bar = match balloon.extra {
            BalloonExtra::Boss {
                health,
                max_health,
                enraged,
                template,
                ..
            } => Some(HealthBar {
                name: BOSS_TEMPLATES
                    .get(template)
                    .map_or("Boss", |t| t.name),
                health,
                max_health,
                enraged,
            }),
            _ => None,
        };
        Self {
            id: balloon.id,
            kind: balloon.kind,
            pos: balloon.pos,
            radius: balloon.radius,
            scale,
            color: BALLOON_COLORS[index],
            opacity: balloon.opacity,
            symbol: colorblind.then_some(COLORBLIND_SYMBOLS[index]),
            armored: matches!(balloon.extra, BalloonExtra::Armored { has_armor: true }),
            health_bar,
        }
    }
}

/// One thing to draw
#[derive(Debug, Clone)]
pub enum Drawable<'a> {
    Weather {
        kind: WeatherKind,
        particle: &'a WeatherParticle,
    },
    Aurora(&'a AuroraWave),
    Cloud(&'a Cloud),
    Butterfly(&'a Butterfly),
    Balloon(BalloonSprite),
    Particle(&'a Particle),
    Text(&'a TextParticle),
    Effect(&'a ScreenEffect),
}

/// Receives drawables in back-to-front order
pub trait RenderSink {
    fn draw(&mut self, drawable: Drawable<'_>);
}

/// Emit one frame of `state` into `sink`
pub fn render(state: &SessionState, settings: &Settings, sink: &mut dyn RenderSink) {
    let env = &state.environment;

    let kind = env.weather.kind;
    for wave in &env.weather.aurora {
        sink.draw(Drawable::Aurora(wave));
    }
    for particle in &env.weather.particles {
        sink.draw(Drawable::Weather { kind, particle });
    }
    for cloud in &env.clouds {
        sink.draw(Drawable::Cloud(cloud));
    }
    for butterfly in &env.butterflies {
        sink.draw(Drawable::Butterfly(butterfly));
    }

    for balloon in state.balloons.iter().filter(|b| b.opacity > 0.0) {
        sink.draw(Drawable::Balloon(BalloonSprite::from_balloon(
            balloon,
            settings.colorblind_mode,
        )));
    }

    for particle in state.fx.particles.iter().take(settings.max_particles()) {
        sink.draw(Drawable::Particle(particle));
    }
    for text in &state.fx.texts {
        sink.draw(Drawable::Text(text));
    }

    let flashes = settings.effective_flash();
    for effect in &env.screen_effects {
        if effect.kind == ScreenEffectKind::Flash && !flashes {
            continue;
        }
        sink.draw(Drawable::Effect(effect));
    }
}

/// Sink that only counts what it was handed, grouped by layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub weather: usize,
    pub clouds: usize,
    pub butterflies: usize,
    pub balloons: usize,
    pub particles: usize,
    pub texts: usize,
    pub effects: usize,
}

impl RenderSink for FrameStats {
    fn draw(&mut self, drawable: Drawable<'_>) {
        match drawable {
            Drawable::Weather { .. } | Drawable::Aurora(_) => self.weather += 1,
            Drawable::Cloud(_) => self.clouds += 1,
            Drawable::Butterfly(_) => self.butterflies += 1,
            Drawable::Balloon(_) => self.balloons += 1,
            Drawable::Particle(_) => self.particles += 1,
            Drawable::Text(_) => self.texts += 1,
            Drawable::Effect(_) => self.effects += 1,
        }
    }
}
