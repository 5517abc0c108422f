//! Data-driven game balance
//!
//! Every knob has a default matching the shipped game. A JSON document can
//! override any subset of them.

use serde::{Deserialize, Serialize};

/// Balance parameters for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tuning {
    // === Combo / chain ===
    /// Two pops closer than this extend the combo
    pub combo_window_ms: f32,
    /// Ticks without a pop before the combo drops to zero
    pub combo_decay_ticks: u32,
    /// Colour chain length that starts paying a bonus
    pub chain_bonus_min: u32,
    /// Colour chain length that adds a ripple
    pub chain_ripple_min: u32,

    // === Effects ===
    pub freeze_factor: f32,
    pub freeze_ms: f32,
    pub mystery_freeze_ms: f32,
    pub slowmo_factor: f32,
    pub time_bonus_s: f32,
    pub mega_radius: f32,
    /// Mega cascade delay per pixel of distance
    pub mega_delay_per_px: f32,
    pub chain_stagger_ms: f32,
    pub mega_chain_stagger_ms: f32,
    pub bomb_swarm_stagger_ms: f32,
    pub spawn_burst_stagger_ms: f32,
    pub mystery_coins: u64,
    pub mystery_points: u64,
    /// Relative weights of the seven mystery outcomes, in `MysteryEffect::ALL` order
    pub mystery_weights: [f32; 7],

    // === Frenzy ===
    pub frenzy_combo: u32,
    pub frenzy_ms: f32,
    pub frenzy_spawns: u32,

    // === Boss ===
    pub boss_interval: u64,
    pub boss_rush_interval: u64,
    pub boss_warning_ms: f32,
    pub boss_reward_spawns: u32,

    // === Spawning ===
    pub spawn_rate: f32,
    pub frenzy_spawn_rate: f32,
    /// Busiest rate any mode reaches after score scaling
    pub min_spawn_rate: f32,
    /// Bottom of the endless difficulty ramp, before score scaling
    pub endless_min_spawn_rate: f32,
    /// Score per step of spawn rate reduction
    pub score_per_rate_step: u64,

    // === Power-ups ===
    pub magnet_radius: f32,
    /// Fraction of the gap closed per frame
    pub magnet_pull: f32,
    pub auto_pop_count: usize,
    pub auto_pop_stagger_ms: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            combo_window_ms: 800.0,
            combo_decay_ticks: 60,
            chain_bonus_min: 3,
            chain_ripple_min: 5,

            freeze_factor: 0.2,
            freeze_ms: 3000.0,
            mystery_freeze_ms: 5000.0,
            slowmo_factor: 0.5,
            time_bonus_s: 5.0,
            mega_radius: 150.0,
            mega_delay_per_px: 2.0,
            chain_stagger_ms: 50.0,
            mega_chain_stagger_ms: 30.0,
            bomb_swarm_stagger_ms: 200.0,
            spawn_burst_stagger_ms: 100.0,
            mystery_coins: 25,
            mystery_points: 50,
            mystery_weights: [1.0; 7],

            frenzy_combo: 10,
            frenzy_ms: 10_000.0,
            frenzy_spawns: 10,

            boss_interval: 50,
            boss_rush_interval: 10,
            boss_warning_ms: 2000.0,
            boss_reward_spawns: 5,

            spawn_rate: 60.0,
            frenzy_spawn_rate: 30.0,
            min_spawn_rate: 30.0,
            endless_min_spawn_rate: 20.0,
            score_per_rate_step: 50,

            magnet_radius: 200.0,
            magnet_pull: 0.02,
            auto_pop_count: 5,
            auto_pop_stagger_ms: 100.0,
        }
    }
}

impl Tuning {
    /// Parse overrides. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{"comboWindowMs": 500.0, "frenzyCombo": 8}"#).unwrap();
        assert_eq!(tuning.combo_window_ms, 500.0);
        assert_eq!(tuning.frenzy_combo, 8);
        assert_eq!(tuning.freeze_factor, 0.2);
        assert_eq!(tuning.mystery_weights, [1.0; 7]);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(Tuning::from_json("{not json").is_err());
    }
}
