//! Static progression tables: unlocks, shop, ranks, challenges, prestige,
//! album milestones, seasons and achievements.

use serde::{Deserialize, Serialize};

use crate::sim::{BalloonKind, PowerUpKind};

/// Equipment slot a cosmetic goes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemSlot {
    Theme,
    Cursor,
    Balloons,
    Sound,
    Trail,
}

/// Cosmetic earned for free at a star threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unlock {
    pub id: &'static str,
    pub slot: ItemSlot,
    pub name: &'static str,
    pub stars: u64,
}

pub const UNLOCKS: [Unlock; 7] = [
    Unlock { id: "sunset_bg", slot: ItemSlot::Theme, name: "Sunset Sky", stars: 50 },
    Unlock { id: "pink_balloons", slot: ItemSlot::Balloons, name: "Pink Dreams", stars: 100 },
    Unlock { id: "night_bg", slot: ItemSlot::Theme, name: "Night Sky", stars: 200 },
    Unlock { id: "rainbow_balloons", slot: ItemSlot::Balloons, name: "Rainbow Pop", stars: 350 },
    Unlock { id: "galaxy_bg", slot: ItemSlot::Theme, name: "Galaxy", stars: 500 },
    Unlock { id: "sparkle_trail", slot: ItemSlot::Trail, name: "Sparkle Trail", stars: 750 },
    Unlock { id: "neon_trail", slot: ItemSlot::Trail, name: "Neon Trail", stars: 1000 },
];

/// Cosmetic bought with coins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShopItem {
    pub id: &'static str,
    pub slot: ItemSlot,
    pub name: &'static str,
    pub price: u64,
}

pub const SHOP_ITEMS: [ShopItem; 23] = [
    ShopItem { id: "neon_theme", slot: ItemSlot::Theme, name: "Neon Nights", price: 350 },
    ShopItem { id: "ocean_theme", slot: ItemSlot::Theme, name: "Ocean Depths", price: 400 },
    ShopItem { id: "lava_theme", slot: ItemSlot::Theme, name: "Volcano", price: 500 },
    ShopItem { id: "sakura_theme", slot: ItemSlot::Theme, name: "Sakura", price: 450 },
    ShopItem { id: "aurora_theme", slot: ItemSlot::Theme, name: "Aurora", price: 550 },
    ShopItem { id: "candy_theme", slot: ItemSlot::Theme, name: "Candy Land", price: 600 },
    ShopItem { id: "winter_theme", slot: ItemSlot::Theme, name: "Winter", price: 500 },
    ShopItem { id: "halloween_theme", slot: ItemSlot::Theme, name: "Halloween", price: 550 },
    ShopItem { id: "pastel_balloons", slot: ItemSlot::Balloons, name: "Pastel", price: 250 },
    ShopItem { id: "neon_balloons", slot: ItemSlot::Balloons, name: "Neon Glow", price: 350 },
    ShopItem { id: "lava_balloons", slot: ItemSlot::Balloons, name: "Magma", price: 400 },
    ShopItem { id: "crystal_balloons", slot: ItemSlot::Balloons, name: "Crystal", price: 450 },
    ShopItem { id: "galaxy_balloons", slot: ItemSlot::Balloons, name: "Galaxy", price: 500 },
    ShopItem { id: "emoji_balloons", slot: ItemSlot::Balloons, name: "Emoji", price: 350 },
    ShopItem { id: "retro_sounds", slot: ItemSlot::Sound, name: "Retro Beeps", price: 175 },
    ShopItem { id: "magical_sounds", slot: ItemSlot::Sound, name: "Magical", price: 250 },
    ShopItem { id: "nature_sounds", slot: ItemSlot::Sound, name: "Nature", price: 200 },
    ShopItem { id: "arcade_sounds", slot: ItemSlot::Sound, name: "Arcade", price: 300 },
    ShopItem { id: "asmr_sounds", slot: ItemSlot::Sound, name: "ASMR", price: 350 },
    ShopItem { id: "rainbow_trail", slot: ItemSlot::Trail, name: "Rainbow", price: 400 },
    ShopItem { id: "fire_trail", slot: ItemSlot::Trail, name: "Fire", price: 450 },
    ShopItem { id: "ice_trail", slot: ItemSlot::Trail, name: "Ice", price: 450 },
    ShopItem { id: "hearts_trail", slot: ItemSlot::Trail, name: "Hearts", price: 500 },
];

pub fn shop_item(id: &str) -> Option<&'static ShopItem> {
    SHOP_ITEMS.iter().find(|item| item.id == id)
}

/// Shop price of one power-up charge
pub fn powerup_price(kind: PowerUpKind) -> u64 {
    match kind {
        PowerUpKind::Magnet => 50,
        PowerUpKind::DoubleScore => 75,
        PowerUpKind::Shield => 100,
        PowerUpKind::SlowMo => 60,
        PowerUpKind::AutoPopBonus => 80,
        PowerUpKind::CoinMagnet => 65,
    }
}

/// Reward for reaching a rank, claimable once per prestige cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankReward {
    pub coins: u64,
    pub gems: u64,
    pub powerup: Option<PowerUpKind>,
}

/// Rank ladder on current-cycle stars
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Rank {
    #[default]
    Beginner,
    Popper,
    Collector,
    Champion,
    Master,
    Grandmaster,
    Legend,
    Mythic,
}

impl Rank {
    pub const ALL: [Rank; 8] = [
        Rank::Beginner,
        Rank::Popper,
        Rank::Collector,
        Rank::Champion,
        Rank::Master,
        Rank::Grandmaster,
        Rank::Legend,
        Rank::Mythic,
    ];

    pub fn min_stars(self) -> u64 {
        match self {
            Rank::Beginner => 0,
            Rank::Popper => 100,
            Rank::Collector => 300,
            Rank::Champion => 750,
            Rank::Master => 1_500,
            Rank::Grandmaster => 3_000,
            Rank::Legend => 5_000,
            Rank::Mythic => 10_000,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rank::Beginner => "Beginner",
            Rank::Popper => "Popper",
            Rank::Collector => "Collector",
            Rank::Champion => "Champion",
            Rank::Master => "Pop Master",
            Rank::Grandmaster => "Grand Master",
            Rank::Legend => "Legend",
            Rank::Mythic => "Mythic",
        }
    }

    pub fn reward(self) -> RankReward {
        let (coins, gems, powerup) = match self {
            Rank::Beginner => (0, 0, None),
            Rank::Popper => (50, 0, Some(PowerUpKind::Magnet)),
            Rank::Collector => (100, 0, Some(PowerUpKind::DoubleScore)),
            Rank::Champion => (200, 0, Some(PowerUpKind::Shield)),
            Rank::Master => (400, 1, None),
            Rank::Grandmaster => (750, 2, None),
            Rank::Legend => (1_000, 3, None),
            Rank::Mythic => (2_000, 5, None),
        };
        RankReward { coins, gems, powerup }
    }

    /// Highest rank reached with `stars`
    pub fn for_stars(stars: u64) -> Rank {
        Rank::ALL
            .into_iter()
            .rev()
            .find(|r| stars >= r.min_stars())
            .unwrap_or_default()
    }

    pub fn next(self) -> Option<Rank> {
        Rank::ALL.get(self as usize + 1).copied()
    }
}

/// Session statistic a challenge tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChallengeStat {
    #[default]
    Pops,
    Score,
    TotalScore,
    MaxCombo,
    GlitterPops,
    RarePops,
    PowerupsUsed,
    NoBombGame,
    GamesPlayed,
    FrenzyCount,
    MegaPops,
    BossDefeated,
    ChainCombo,
    PerfectGames,
    ModesPlayed,
}

/// How a game's stat value folds into challenge progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulate {
    /// Added up across games
    Sum,
    /// Best single game
    Max,
    /// Replaced by the latest value
    Latest,
}

impl ChallengeStat {
    pub fn accumulate(self) -> Accumulate {
        match self {
            ChallengeStat::Score | ChallengeStat::MaxCombo | ChallengeStat::NoBombGame => {
                Accumulate::Max
            }
            ChallengeStat::ModesPlayed => Accumulate::Latest,
            _ => Accumulate::Sum,
        }
    }
}

/// Blueprint a challenge is rolled from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChallengeTemplate {
    pub id: &'static str,
    /// `{target}` is replaced with the rolled target
    pub desc: &'static str,
    pub stat: ChallengeStat,
    pub min: u64,
    pub max: u64,
    pub reward: u64,
}

const fn template(
    id: &'static str,
    desc: &'static str,
    stat: ChallengeStat,
    min: u64,
    max: u64,
    reward: u64,
) -> ChallengeTemplate {
    ChallengeTemplate { id, desc, stat, min, max, reward }
}

pub const DAILY_CHALLENGES_PER_DAY: usize = 3;

pub const DAILY_TEMPLATES: [ChallengeTemplate; 12] = [
    template("pop_balloons", "Pop {target} balloons", ChallengeStat::Pops, 30, 100, 15),
    template("get_combo", "Get a {target}x combo", ChallengeStat::MaxCombo, 3, 8, 20),
    template("score_points", "Score {target} points", ChallengeStat::Score, 50, 200, 15),
    template("pop_glitter", "Pop {target} glitter balloons", ChallengeStat::GlitterPops, 3, 8, 25),
    template("pop_rare", "Pop {target} rare balloon(s)", ChallengeStat::RarePops, 1, 3, 50),
    template("use_powerup", "Use {target} power-up(s)", ChallengeStat::PowerupsUsed, 1, 3, 20),
    template("no_bombs", "Complete without hitting a bomb", ChallengeStat::NoBombGame, 1, 1, 40),
    template("play_games", "Play {target} games", ChallengeStat::GamesPlayed, 2, 5, 15),
    template("frenzy_mode", "Trigger frenzy {target} time(s)", ChallengeStat::FrenzyCount, 1, 3, 30),
    template("mega_pop", "Pop {target} mega balloon(s)", ChallengeStat::MegaPops, 1, 3, 25),
    template("defeat_boss", "Defeat {target} boss balloon(s)", ChallengeStat::BossDefeated, 1, 2, 45),
    template("chain_combo", "Get a {target}+ color chain", ChallengeStat::ChainCombo, 3, 6, 35),
];

pub const WEEKLY_CHALLENGES_PER_WEEK: usize = 4;

pub const WEEKLY_TEMPLATES: [ChallengeTemplate; 8] = [
    template("weekly_pops", "Pop {target} balloons this week", ChallengeStat::Pops, 500, 1500, 150),
    template("weekly_score", "Earn {target} total points", ChallengeStat::TotalScore, 1000, 5000, 200),
    template("weekly_games", "Play {target} games", ChallengeStat::GamesPlayed, 10, 30, 100),
    template("weekly_combo", "Get a {target}x combo", ChallengeStat::MaxCombo, 10, 20, 250),
    template("weekly_boss", "Defeat {target} boss balloon(s)", ChallengeStat::BossDefeated, 3, 10, 300),
    template("weekly_rare", "Pop {target} rare balloons", ChallengeStat::RarePops, 5, 15, 350),
    template("weekly_perfect", "Complete {target} games without bombs", ChallengeStat::PerfectGames, 3, 8, 400),
    template("weekly_modes", "Play all game modes", ChallengeStat::ModesPlayed, 8, 8, 250),
];

/// One rung of the prestige ladder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrestigeTier {
    pub level: u32,
    /// Lifetime stars needed
    pub stars: u64,
    pub multiplier: f64,
    pub gems: u64,
    pub coins: u64,
}

pub const PRESTIGE_TIERS: [PrestigeTier; 6] = [
    PrestigeTier { level: 1, stars: 5_000, multiplier: 1.1, gems: 5, coins: 1_000 },
    PrestigeTier { level: 2, stars: 15_000, multiplier: 1.2, gems: 10, coins: 2_500 },
    PrestigeTier { level: 3, stars: 35_000, multiplier: 1.35, gems: 20, coins: 5_000 },
    PrestigeTier { level: 4, stars: 75_000, multiplier: 1.5, gems: 35, coins: 10_000 },
    PrestigeTier { level: 5, stars: 150_000, multiplier: 1.75, gems: 50, coins: 20_000 },
    PrestigeTier { level: 6, stars: 300_000, multiplier: 2.0, gems: 100, coins: 50_000 },
];

/// Collection album pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlbumCategory {
    Normal,
    Special,
    Rare,
    Boss,
}

impl AlbumCategory {
    pub const ALL: [AlbumCategory; 4] = [
        AlbumCategory::Normal,
        AlbumCategory::Special,
        AlbumCategory::Rare,
        AlbumCategory::Boss,
    ];

    /// Page a popped balloon is filed under
    pub fn of(kind: BalloonKind) -> AlbumCategory {
        match kind {
            BalloonKind::Normal => AlbumCategory::Normal,
            BalloonKind::Boss => AlbumCategory::Boss,
            k if k.is_rare() => AlbumCategory::Rare,
            _ => AlbumCategory::Special,
        }
    }

    pub fn milestones(self) -> [u64; 5] {
        match self {
            AlbumCategory::Normal => [100, 500, 1_000, 5_000, 10_000],
            AlbumCategory::Special => [50, 200, 500, 1_000, 2_500],
            AlbumCategory::Rare => [5, 25, 50, 100, 250],
            AlbumCategory::Boss => [1, 10, 25, 50, 100],
        }
    }

    pub fn rewards(self) -> [u64; 5] {
        match self {
            AlbumCategory::Normal => [25, 50, 100, 250, 500],
            AlbumCategory::Special => [50, 100, 200, 500, 1_000],
            AlbumCategory::Rare => [100, 250, 500, 1_000, 2_500],
            AlbumCategory::Boss => [100, 300, 750, 1_500, 3_000],
        }
    }
}

/// Seasonal event, picked from the calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    /// Season for a calendar month (1-12)
    pub fn for_month(month: u32) -> Season {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => Season::Winter,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Spring => "Spring Bloom",
            Season::Summer => "Summer Splash",
            Season::Fall => "Autumn Harvest",
            Season::Winter => "Winter Wonderland",
        }
    }

    /// Featured theme item for the season
    pub fn theme(self) -> &'static str {
        match self {
            Season::Spring => "sakura_theme",
            Season::Summer => "ocean_theme",
            Season::Fall => "sunset_bg",
            Season::Winter => "winter_theme",
        }
    }
}

/// Achievement table entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub desc: &'static str,
    /// Coins (and achievement points) on unlock
    pub reward: u64,
}

const fn achievement(
    id: &'static str,
    name: &'static str,
    desc: &'static str,
    reward: u64,
) -> Achievement {
    Achievement { id, name, desc, reward }
}

pub const ACHIEVEMENTS: [Achievement; 29] = [
    achievement("first_pop", "First Pop!", "Pop your first balloon", 10),
    achievement("pop_100", "Getting Started", "Pop 100 balloons", 25),
    achievement("pop_500", "Pop Machine", "Pop 500 balloons", 50),
    achievement("pop_1000", "Balloon Destroyer", "Pop 1000 balloons", 100),
    achievement("pop_5000", "Pop Legend", "Pop 5000 balloons", 250),
    achievement("pop_10000", "Pop God", "Pop 10000 balloons", 500),
    achievement("combo_5", "Combo Starter", "Get a 5x combo", 15),
    achievement("combo_10", "Combo Pro", "Get a 10x combo", 35),
    achievement("combo_20", "Combo Legend", "Get a 20x combo", 75),
    achievement("combo_50", "Combo God", "Get a 50x combo", 200),
    achievement("score_50", "Half Century", "Score 50 points", 20),
    achievement("score_100", "Century", "Score 100 points", 40),
    achievement("score_200", "High Scorer", "Score 200 points", 80),
    achievement("score_500", "Score Master", "Score 500 points", 150),
    achievement("score_1000", "Score Legend", "Score 1000 points", 300),
    achievement("zen_master", "Zen Master", "Pop 50 in Zen mode", 30),
    achievement("survivor", "Survivor", "Win Survival with 3 lives", 50),
    achievement("frenzy_king", "Frenzy King", "Score 75+ in Frenzy", 60),
    achievement("target_ace", "Target Ace", "Perfect Target mode", 75),
    achievement("boss_slayer", "Boss Slayer", "Defeat 10 bosses", 100),
    achievement("endless_warrior", "Endless Warrior", "Survive 5 min in Endless", 100),
    achievement("bomb_dodger", "Bomb Dodger", "Let 10 bombs pass", 40),
    achievement("coin_collector", "Coin Collector", "Earn 500 coins", 100),
    achievement("coin_hoarder", "Coin Hoarder", "Earn 5000 coins", 300),
    achievement("rare_hunter", "Rare Hunter", "Find all rare balloons", 500),
    achievement("prestige_1", "Prestige I", "Reach Prestige 1", 200),
    achievement("prestige_3", "Prestige III", "Reach Prestige 3", 500),
    achievement("weekly_streak_4", "Dedicated", "4 week challenge streak", 300),
    achievement("daily_streak_30", "Committed", "30 day login streak", 400),
];

pub fn find_achievement(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Lifetime pop thresholds
pub const POP_ACHIEVEMENTS: [(u64, &str); 6] = [
    (1, "first_pop"),
    (100, "pop_100"),
    (500, "pop_500"),
    (1_000, "pop_1000"),
    (5_000, "pop_5000"),
    (10_000, "pop_10000"),
];

/// Single-game combo thresholds
pub const COMBO_ACHIEVEMENTS: [(u32, &str); 4] =
    [(5, "combo_5"), (10, "combo_10"), (20, "combo_20"), (50, "combo_50")];

/// Single-game score thresholds
pub const SCORE_ACHIEVEMENTS: [(u64, &str); 5] = [
    (50, "score_50"),
    (100, "score_100"),
    (200, "score_200"),
    (500, "score_500"),
    (1_000, "score_1000"),
];

// Daily login bonus
pub const LOGIN_BASE_BONUS: u64 = 25;
pub const LOGIN_STREAK_BONUS: u64 = 5;
pub const LOGIN_STREAK_BONUS_CAP: u64 = 50;
/// A gem on every multiple of this streak length
pub const LOGIN_GEM_EVERY: u32 = 7;

pub const TUTORIAL_BONUS: u64 = 50;
/// Stars per point of final score
pub const SCORE_PER_STAR: u64 = 10;
/// Games kept in the score history
pub const SCORE_HISTORY_LEN: usize = 50;
