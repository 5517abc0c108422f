//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure and
//! deterministic:
//! - Seeded RNG only (one `Pcg32` per session)
//! - Time comes from the tick delta, never the wall clock
//! - Stable iteration order (spawn order)
//! - No rendering, audio or storage dependencies

pub mod balloon;
mod effects;
pub mod environment;
pub mod hit;
pub mod mode;
pub mod particles;
pub mod powerup;
pub mod scheduler;
pub mod spawn;
pub mod state;
pub mod tick;

pub use balloon::{Balloon, BalloonExtra, BalloonKind, HitOutcome, Lifecycle, MysteryEffect};
pub use environment::{Environment, ScreenEffect, ScreenEffectKind, WeatherKind};
pub use mode::{GameMode, ModeRules};
pub use particles::{Particle, ParticleKind, ParticleSystem, Preset, TextParticle};
pub use powerup::{ActivePowerUps, PowerUpKind};
pub use scheduler::{CascadeScore, Deferred, Scheduler};
pub use spawn::{spawn_balloon, spawn_boss};
pub use state::{EndReason, GameEvent, GamePhase, SessionState, SessionStats};
pub use tick::{PointerEvent, TickInput, tick};
