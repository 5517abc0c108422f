//! Game modes
//!
//! A mode is pure data: the rule set is chosen before a session starts and
//! never changes during it.

use serde::{Deserialize, Serialize};

use super::balloon::BalloonKind;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum GameMode {
    #[default]
    Classic,
    Zen,
    Survival,
    Frenzy,
    Target,
    BossRush,
    Endless,
    Puzzle,
}

const ZEN_KINDS: &[BalloonKind] = &[
    BalloonKind::Normal,
    BalloonKind::Glitter,
    BalloonKind::Time,
    BalloonKind::Mega,
    BalloonKind::Rainbow,
    BalloonKind::Star,
];
const NORMAL_ONLY: &[BalloonKind] = &[BalloonKind::Normal];

/// Immutable rule set of a session
#[derive(Debug, Clone, PartialEq)]
pub struct ModeRules {
    /// Countdown in seconds, `None` for untimed modes
    pub time_limit_s: Option<f32>,
    /// Starting lives, `None` when a bomb ends the game outright
    pub lives: Option<u8>,
    pub bombs: bool,
    pub frenzy: bool,
    /// Frenzy is on for the whole session
    pub always_frenzy: bool,
    /// Spawnable kinds, `None` for the full roster
    pub allowed: Option<&'static [BalloonKind]>,
    /// Pops between boss appearances, `None` disables bosses
    pub boss_interval: Option<u64>,
    pub target: bool,
    /// Spawn rate ramps with survival time
    pub endless: bool,
}

impl GameMode {
    pub const ALL: [GameMode; 8] = [
        GameMode::Classic,
        GameMode::Zen,
        GameMode::Survival,
        GameMode::Frenzy,
        GameMode::Target,
        GameMode::BossRush,
        GameMode::Endless,
        GameMode::Puzzle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::Zen => "zen",
            GameMode::Survival => "survival",
            GameMode::Frenzy => "frenzy",
            GameMode::Target => "target",
            GameMode::BossRush => "bossRush",
            GameMode::Endless => "endless",
            GameMode::Puzzle => "puzzle",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str().eq_ignore_ascii_case(s))
    }

    pub fn rules(self, tuning: &Tuning) -> ModeRules {
        let base = ModeRules {
            time_limit_s: None,
            lives: None,
            bombs: true,
            frenzy: true,
            always_frenzy: false,
            allowed: None,
            boss_interval: Some(tuning.boss_interval),
            target: false,
            endless: false,
        };
        match self {
            GameMode::Classic => ModeRules {
                time_limit_s: Some(90.0),
                ..base
            },
            GameMode::Zen => ModeRules {
                bombs: false,
                frenzy: false,
                allowed: Some(ZEN_KINDS),
                boss_interval: None,
                ..base
            },
            GameMode::Survival => ModeRules {
                lives: Some(3),
                ..base
            },
            GameMode::Frenzy => ModeRules {
                time_limit_s: Some(30.0),
                always_frenzy: true,
                ..base
            },
            GameMode::Target => ModeRules {
                time_limit_s: Some(60.0),
                lives: Some(3),
                bombs: false,
                frenzy: false,
                allowed: Some(NORMAL_ONLY),
                boss_interval: None,
                target: true,
                ..base
            },
            GameMode::BossRush => ModeRules {
                lives: Some(5),
                bombs: false,
                frenzy: false,
                boss_interval: Some(tuning.boss_rush_interval),
                ..base
            },
            GameMode::Endless => ModeRules {
                lives: Some(1),
                endless: true,
                ..base
            },
            GameMode::Puzzle => ModeRules {
                time_limit_s: Some(120.0),
                bombs: false,
                frenzy: false,
                allowed: Some(NORMAL_ONLY),
                boss_interval: None,
                ..base
            },
        }
    }
}

impl ModeRules {
    /// Kinds the spawn engine may draw, bombs removed when disabled
    pub fn spawnable_kinds(&self) -> Vec<BalloonKind> {
        let roster: &[BalloonKind] = self.allowed.unwrap_or(&BalloonKind::ALL);
        roster
            .iter()
            .copied()
            .filter(|k| *k != BalloonKind::Boss)
            .filter(|k| self.bombs || *k != BalloonKind::Bomb)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_names_roundtrip() {
        for mode in GameMode::ALL {
            assert_eq!(GameMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(GameMode::from_str("BOSSRUSH"), Some(GameMode::BossRush));
        assert_eq!(GameMode::from_str("chess"), None);
    }

    #[test]
    fn test_zen_has_no_bombs_or_bosses() {
        let rules = GameMode::Zen.rules(&Tuning::default());
        let kinds = rules.spawnable_kinds();
        assert_eq!(kinds.len(), 6);
        assert!(!kinds.contains(&BalloonKind::Bomb));
        assert!(rules.boss_interval.is_none());
    }

    #[test]
    fn test_bomb_free_modes_drop_bombs_from_full_roster() {
        let rules = GameMode::BossRush.rules(&Tuning::default());
        let kinds = rules.spawnable_kinds();
        assert!(!kinds.contains(&BalloonKind::Bomb));
        assert!(!kinds.contains(&BalloonKind::Boss));
        assert_eq!(kinds.len(), BalloonKind::ALL.len() - 2);
        assert_eq!(rules.boss_interval, Some(10));
    }

    #[test]
    fn test_classic_rules() {
        let rules = GameMode::Classic.rules(&Tuning::default());
        assert_eq!(rules.time_limit_s, Some(90.0));
        assert_eq!(rules.lives, None);
        assert!(rules.spawnable_kinds().contains(&BalloonKind::Bomb));
    }
}
