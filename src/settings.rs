//! Player settings and preferences
//!
//! Stored inside the progression record under `settings`, so there is no
//! separate storage key.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_PARTICLES;

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    // === Audio ===
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    // === Accessibility ===
    /// Draw a symbol on each balloon so colours aren't the only cue
    pub colorblind_mode: bool,
    /// Fewer particles, no screen flashes
    pub reduced_motion: bool,

    pub show_tutorial: bool,
    /// Write progression after every change. Off leaves it to explicit saves.
    pub auto_save: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            music_volume: 0.5,
            sfx_volume: 0.7,
            colorblind_mode: false,
            reduced_motion: false,
            show_tutorial: true,
            auto_save: true,
        }
    }
}

impl Settings {
    /// Clamp volumes back into range after an untrusted update
    pub fn sanitize(&mut self) {
        self.music_volume = clamp_volume(self.music_volume);
        self.sfx_volume = clamp_volume(self.sfx_volume);
    }

    /// Particle cap for the render side (reduced motion quarters it)
    pub fn max_particles(&self) -> usize {
        if self.reduced_motion {
            MAX_PARTICLES / 4
        } else {
            MAX_PARTICLES
        }
    }

    /// Whether full-screen flashes should be drawn
    pub fn effective_flash(&self) -> bool {
        !self.reduced_motion
    }
}

fn clamp_volume(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let s: Settings = serde_json::from_str(r#"{"sfxVolume":0.2,"reducedMotion":true}"#).unwrap();
        assert_eq!(s.sfx_volume, 0.2);
        assert!(s.reduced_motion);
        assert_eq!(s.music_volume, 0.5);
        assert!(s.auto_save);
        assert!(s.show_tutorial);
    }

    #[test]
    fn test_sanitize_clamps_volumes() {
        let mut s = Settings {
            music_volume: 3.0,
            sfx_volume: f32::NAN,
            ..Default::default()
        };
        s.sanitize();
        assert_eq!(s.music_volume, 1.0);
        assert_eq!(s.sfx_volume, 0.0);
    }

    #[test]
    fn test_reduced_motion_limits_effects() {
        let s = Settings {
            reduced_motion: true,
            ..Default::default()
        };
        assert_eq!(s.max_particles(), MAX_PARTICLES / 4);
        assert!(!s.effective_flash());
    }
}
