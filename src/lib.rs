//! Balloon Pop - core of a browser balloon popping arcade game
//!
//! Core modules:
//! - `sim`: Per-frame simulation (balloons, spawning, hits, effects, modes)
//! - `progression`: Durable player progression and economy
//! - `controller`: Owns one session plus the progression store
//! - `persistence`: Key-value storage backends
//! - `render`: Drawable stream handed to whatever draws the frame
//! - `tuning`: Data-driven game balance

pub mod controller;
pub mod leaderboard;
pub mod persistence;
pub mod platform;
pub mod progression;
pub mod render;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use controller::{GameController, GameSummary};
pub use leaderboard::{LocalLeaderboard, RemoteLeaderboard};
pub use persistence::{MemoryStorage, Storage, StorageError};
pub use progression::{ProgressionRecord, ProgressionStore};
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Reference frame length. Per-frame motion constants are tuned for 60 Hz.
    pub const FRAME_MS: f32 = 1000.0 / 60.0;
    /// Largest delta accepted by one tick (tab switches, debugger pauses)
    pub const MAX_TICK_MS: f32 = 100.0;

    /// Default playfield size
    pub const PLAYFIELD_WIDTH: f32 = 800.0;
    pub const PLAYFIELD_HEIGHT: f32 = 600.0;

    /// Balloon palette (RGB). Colour chains match on the index.
    pub const BALLOON_COLORS: [u32; 6] = [
        0xff6b6b, // red
        0x4ecdc4, // teal
        0xffe66d, // yellow
        0x95e1d3, // mint
        0xf38181, // coral
        0xaa96da, // lavender
    ];
    /// Target mode only uses the first four colours
    pub const TARGET_COLOR_COUNT: u8 = 4;

    /// Swipe resampling
    pub const SWIPE_MIN_TRAVEL: f32 = 10.0;
    pub const SWIPE_STEP: f32 = 20.0;

    /// Visual particle cap per session
    pub const MAX_PARTICLES: usize = 400;
    pub const MAX_TEXT_PARTICLES: usize = 32;

    /// Pop-count milestones that earn a floating banner
    pub const POP_MILESTONES: [u64; 7] = [10, 25, 50, 75, 100, 150, 200];

    /// Storage keys
    pub const PROGRESSION_KEY: &str = "balloonPop_progression";
    pub const LEADERBOARD_KEY: &str = "balloonPop_leaderboard";
}

/// Convert a tick delta in milliseconds to reference frames
#[inline]
pub fn frames_for(dt_ms: f32) -> f32 {
    dt_ms.clamp(0.0, consts::MAX_TICK_MS) / consts::FRAME_MS
}

/// Point `t` of the way from `a` to `b`
#[inline]
pub fn lerp_point(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    a + (b - a) * t
}
