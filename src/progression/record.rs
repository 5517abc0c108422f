//! The persisted progression record
//!
//! One camelCase JSON document. Loading overlays the stored blob onto the
//! defaults one key at a time, so older saves with missing or unreadable
//! fields still load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::catalog::{AlbumCategory, ChallengeStat, ItemSlot, Rank, Season};
use crate::settings::Settings;
use crate::sim::{GameMode, PowerUpKind};

/// Current layout version. Blobs without one are version 0.
pub const SCHEMA_VERSION: u32 = 1;

/// Item every player owns
pub const DEFAULT_ITEM: &str = "default";

/// A rolled daily or weekly challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Challenge {
    pub id: String,
    pub desc: String,
    #[serde(alias = "type")]
    pub stat: ChallengeStat,
    pub target: u64,
    pub progress: u64,
    pub completed: bool,
    pub claimed: bool,
    pub reward: u64,
}

impl Default for Challenge {
    fn default() -> Self {
        Self {
            id: String::new(),
            desc: String::new(),
            stat: ChallengeStat::default(),
            target: 1,
            progress: 0,
            completed: false,
            claimed: false,
            reward: 0,
        }
    }
}

/// Count and next-milestone index for one album page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlbumEntry {
    #[serde(alias = "defeated")]
    pub popped: u64,
    pub milestone: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlbumProgress {
    pub normal_balloons: AlbumEntry,
    pub special_balloons: AlbumEntry,
    pub rare_balloons: AlbumEntry,
    pub boss_balloons: AlbumEntry,
}

impl AlbumProgress {
    pub fn entry(&self, category: AlbumCategory) -> &AlbumEntry {
        match category {
            AlbumCategory::Normal => &self.normal_balloons,
            AlbumCategory::Special => &self.special_balloons,
            AlbumCategory::Rare => &self.rare_balloons,
            AlbumCategory::Boss => &self.boss_balloons,
        }
    }

    pub fn entry_mut(&mut self, category: AlbumCategory) -> &mut AlbumEntry {
        match category {
            AlbumCategory::Normal => &mut self.normal_balloons,
            AlbumCategory::Special => &mut self.special_balloons,
            AlbumCategory::Rare => &mut self.rare_balloons,
            AlbumCategory::Boss => &mut self.boss_balloons,
        }
    }
}

/// Owned power-up charges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PowerUpInventory(pub BTreeMap<PowerUpKind, u32>);

impl Default for PowerUpInventory {
    fn default() -> Self {
        Self(PowerUpKind::ALL.into_iter().map(|k| (k, 0)).collect())
    }
}

impl PowerUpInventory {
    pub fn count(&self, kind: PowerUpKind) -> u32 {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    pub fn add(&mut self, kind: PowerUpKind, n: u32) {
        *self.0.entry(kind).or_insert(0) += n;
    }

    /// Take one charge. False when none are left.
    pub fn take(&mut self, kind: PowerUpKind) -> bool {
        match self.0.get_mut(&kind) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModeStats {
    pub played: u64,
    pub best_score: u64,
    pub total_score: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreEntry {
    pub date: String,
    pub score: u64,
    pub mode: String,
}

/// Dashboard statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Statistics {
    /// Games per `YYYY-MM-DD` label
    pub games_per_day: BTreeMap<String, u64>,
    pub score_history: Vec<ScoreEntry>,
    pub favorite_mode: String,
    pub mode_stats: BTreeMap<String, ModeStats>,
    /// Lifetime pops per balloon kind
    pub balloon_type_stats: BTreeMap<String, u64>,
    pub average_score: u64,
    pub best_combo: u32,
    /// Longest game in seconds
    pub longest_game: u64,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            games_per_day: BTreeMap::new(),
            score_history: Vec::new(),
            favorite_mode: GameMode::Classic.as_str().to_string(),
            mode_stats: GameMode::ALL
                .into_iter()
                .map(|m| (m.as_str().to_string(), ModeStats::default()))
                .collect(),
            balloon_type_stats: BTreeMap::new(),
            average_score: 0,
            best_combo: 0,
            longest_game: 0,
        }
    }
}

/// Durable player state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProgressionRecord {
    pub schema_version: u32,

    // === Currency ===
    pub coins: u64,
    pub gems: u64,
    pub total_coins_earned: u64,
    pub lifetime_coins: u64,

    // === Stars and rank ===
    /// Stars in the current prestige cycle
    pub total_stars: u64,
    pub lifetime_stars: u64,
    pub rank: Rank,
    pub rank_rewards_claimed: Vec<Rank>,

    // === Play history ===
    pub high_score: u64,
    pub games_played: u64,
    pub total_pops: u64,
    pub max_combo: u32,
    pub bombs_avoided: u64,
    /// Seconds
    pub total_play_time: u64,
    /// Consecutive days with at least one game
    pub current_streak: u32,
    pub last_play_day: Option<i64>,

    // === Cosmetics ===
    pub unlocked_items: Vec<String>,
    pub purchased_items: Vec<String>,
    pub equipped_theme: String,
    pub equipped_cursor: String,
    pub equipped_balloons: String,
    pub equipped_sound: String,
    pub equipped_trail: String,

    pub powerups: PowerUpInventory,

    // === Collection ===
    pub rare_collection: BTreeMap<String, u64>,
    pub rare_discovered: Vec<String>,
    pub album_progress: AlbumProgress,

    // === Daily challenges ===
    pub daily_challenges: Vec<Challenge>,
    pub challenge_streak: u32,
    pub last_challenge_day: Option<i64>,
    pub challenges_completed: u64,

    // === Weekly challenges ===
    pub weekly_challenges: Vec<Challenge>,
    pub weekly_streak: u32,
    pub last_week: Option<i64>,
    pub weekly_completed: u64,
    /// Modes played since the weekly rollover
    pub weekly_modes: Vec<String>,

    // === Login ===
    pub login_streak: u32,
    pub last_login_day: Option<i64>,
    pub daily_bonus_claimed: bool,

    pub achievements: Vec<String>,
    pub achievement_points: u64,

    // === Prestige ===
    pub prestige_level: u32,
    pub prestige_multiplier: f64,

    // === Season ===
    pub current_season: Option<Season>,
    pub season_progress: u64,
    pub season_rewards_claimed: Vec<String>,

    pub settings: Settings,
    pub statistics: Statistics,

    pub tutorial_completed: bool,
    pub tutorial_step: u32,
}

impl Default for ProgressionRecord {
    fn default() -> Self {
        let default = || DEFAULT_ITEM.to_string();
        Self {
            schema_version: SCHEMA_VERSION,
            coins: 0,
            gems: 0,
            total_coins_earned: 0,
            lifetime_coins: 0,
            total_stars: 0,
            lifetime_stars: 0,
            rank: Rank::Beginner,
            rank_rewards_claimed: Vec::new(),
            high_score: 0,
            games_played: 0,
            total_pops: 0,
            max_combo: 0,
            bombs_avoided: 0,
            total_play_time: 0,
            current_streak: 0,
            last_play_day: None,
            unlocked_items: vec![default()],
            purchased_items: Vec::new(),
            equipped_theme: default(),
            equipped_cursor: default(),
            equipped_balloons: default(),
            equipped_sound: default(),
            equipped_trail: default(),
            powerups: PowerUpInventory::default(),
            rare_collection: BTreeMap::new(),
            rare_discovered: Vec::new(),
            album_progress: AlbumProgress::default(),
            daily_challenges: Vec::new(),
            challenge_streak: 0,
            last_challenge_day: None,
            challenges_completed: 0,
            weekly_challenges: Vec::new(),
            weekly_streak: 0,
            last_week: None,
            weekly_completed: 0,
            weekly_modes: Vec::new(),
            login_streak: 0,
            last_login_day: None,
            daily_bonus_claimed: false,
            achievements: Vec::new(),
            achievement_points: 0,
            prestige_level: 0,
            prestige_multiplier: 1.0,
            current_season: None,
            season_progress: 0,
            season_rewards_claimed: Vec::new(),
            settings: Settings::default(),
            statistics: Statistics::default(),
            tutorial_completed: false,
            tutorial_step: 0,
        }
    }
}

impl ProgressionRecord {
    /// Parse a stored blob, keeping every readable field and defaulting the rest
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let Value::Object(stored) = serde_json::from_str::<Value>(json)? else {
            return Err(serde::de::Error::custom("progression record is not an object"));
        };
        let Value::Object(mut merged) = serde_json::to_value(Self::default())? else {
            return Err(serde::de::Error::custom("default record is not an object"));
        };
        if !stored.contains_key("schemaVersion") {
            merged.insert("schemaVersion".into(), Value::from(0));
        }

        for (key, value) in stored {
            let previous = merged.insert(key.clone(), value);
            if let Err(err) = serde_json::from_value::<Self>(Value::Object(merged.clone())) {
                log::warn!("Dropping unreadable progression field {key}: {err}");
                restore(&mut merged, key, previous);
            }
        }

        let mut record: Self = serde_json::from_value(Value::Object(merged))?;
        record.migrate();
        Ok(record)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Bring an older or hand-edited record up to the current invariants
    pub fn migrate(&mut self) {
        if self.schema_version < SCHEMA_VERSION {
            log::info!(
                "Migrating progression record v{} -> v{SCHEMA_VERSION}",
                self.schema_version
            );
        }
        if !self.unlocked_items.iter().any(|i| i == DEFAULT_ITEM) {
            self.unlocked_items.insert(0, DEFAULT_ITEM.to_string());
        }
        if !self.prestige_multiplier.is_finite() || self.prestige_multiplier < 1.0 {
            self.prestige_multiplier = 1.0;
        }
        for kind in PowerUpKind::ALL {
            self.powerups.0.entry(kind).or_insert(0);
        }
        for mode in GameMode::ALL {
            self.statistics
                .mode_stats
                .entry(mode.as_str().to_string())
                .or_default();
        }
        self.rank = Rank::for_stars(self.total_stars);
        self.schema_version = SCHEMA_VERSION;
    }

    pub fn equipped(&self, slot: ItemSlot) -> &str {
        match slot {
            ItemSlot::Theme => &self.equipped_theme,
            ItemSlot::Cursor => &self.equipped_cursor,
            ItemSlot::Balloons => &self.equipped_balloons,
            ItemSlot::Sound => &self.equipped_sound,
            ItemSlot::Trail => &self.equipped_trail,
        }
    }

    pub(crate) fn equipped_mut(&mut self, slot: ItemSlot) -> &mut String {
        match slot {
            ItemSlot::Theme => &mut self.equipped_theme,
            ItemSlot::Cursor => &mut self.equipped_cursor,
            ItemSlot::Balloons => &mut self.equipped_balloons,
            ItemSlot::Sound => &mut self.equipped_sound,
            ItemSlot::Trail => &mut self.equipped_trail,
        }
    }
}

fn restore(map: &mut Map<String, Value>, key: String, previous: Option<Value>) {
    match previous {
        Some(value) => {
            map.insert(key, value);
        }
        None => {
            map.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record() {
        let r = ProgressionRecord::default();
        assert_eq!(r.unlocked_items, vec!["default".to_string()]);
        assert_eq!(r.prestige_multiplier, 1.0);
        assert_eq!(r.statistics.mode_stats.len(), 8);
        assert_eq!(r.powerups.count(PowerUpKind::Shield), 0);
        assert_eq!(r.settings, Settings::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut r = ProgressionRecord::default();
        r.coins = 120;
        r.total_stars = 350;
        r.rank = Rank::Collector;
        r.powerups.add(PowerUpKind::SlowMo, 2);
        r.rare_discovered.push("unicorn".into());
        r.current_season = Some(Season::Fall);
        let json = r.to_json().unwrap();
        assert!(json.contains("\"slowmo\":2"));
        assert!(json.contains("\"totalStars\":350"));
        assert_eq!(ProgressionRecord::from_json(&json).unwrap(), r);
    }

    #[test]
    fn test_legacy_blob_merges_with_defaults() {
        let legacy = r#"{
            "coins": 340,
            "totalStars": 120,
            "rank": "beginner",
            "lastPlayDate": "Mon Mar 04 2024",
            "lastChallengeDate": "Mon Mar 04 2024",
            "unlockedItems": ["sunset_bg"],
            "powerups": {"magnet": 3},
            "settings": {"sfxVolume": 0.1},
            "albumProgress": {"bossBalloons": {"defeated": 4, "milestone": 1}},
            "statistics": {"modeStats": {"zen": {"played": 2, "bestScore": 40, "totalScore": 60}}},
            "eventParticipation": {}
        }"#;
        let r = ProgressionRecord::from_json(legacy).unwrap();
        assert_eq!(r.coins, 340);
        // Rank is recomputed from stars
        assert_eq!(r.rank, Rank::Popper);
        assert_eq!(r.last_challenge_day, None);
        assert!(r.unlocked_items.contains(&"default".to_string()));
        assert!(r.unlocked_items.contains(&"sunset_bg".to_string()));
        assert_eq!(r.powerups.count(PowerUpKind::Magnet), 3);
        assert_eq!(r.powerups.count(PowerUpKind::CoinMagnet), 0);
        assert_eq!(r.settings.sfx_volume, 0.1);
        assert_eq!(r.settings.music_volume, 0.5);
        assert_eq!(r.album_progress.boss_balloons.popped, 4);
        assert_eq!(r.statistics.mode_stats["zen"].played, 2);
        assert_eq!(r.statistics.mode_stats.len(), 8);
        assert_eq!(r.prestige_multiplier, 1.0);
        assert_eq!(r.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_bad_field_is_dropped_not_fatal() {
        let r = ProgressionRecord::from_json(r#"{"coins": "lots", "gems": 4}"#).unwrap();
        assert_eq!(r.coins, 0);
        assert_eq!(r.gems, 4);
    }

    #[test]
    fn test_non_object_is_an_error() {
        assert!(ProgressionRecord::from_json("[1,2,3]").is_err());
        assert!(ProgressionRecord::from_json("not json").is_err());
    }

    #[test]
    fn test_bogus_multiplier_is_clamped() {
        let r = ProgressionRecord::from_json(r#"{"prestigeMultiplier": 0.2}"#).unwrap();
        assert_eq!(r.prestige_multiplier, 1.0);
    }
}
