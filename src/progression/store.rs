//! Progression/economy store
//!
//! Owns the record and writes it through to storage after every mutating
//! call. Storage failures are logged and play continues on the in-memory
//! copy.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::calendar;
use super::catalog::{
    self, Achievement, AlbumCategory, ItemSlot, PrestigeTier, Rank, RankReward, Season, Unlock,
    COMBO_ACHIEVEMENTS, DAILY_CHALLENGES_PER_DAY, DAILY_TEMPLATES, LOGIN_BASE_BONUS,
    LOGIN_GEM_EVERY, LOGIN_STREAK_BONUS, LOGIN_STREAK_BONUS_CAP, POP_ACHIEVEMENTS,
    PRESTIGE_TIERS, SCORE_ACHIEVEMENTS, SCORE_HISTORY_LEN, TUTORIAL_BONUS, UNLOCKS,
    WEEKLY_CHALLENGES_PER_WEEK, WEEKLY_TEMPLATES,
};
use super::challenges::{self, ChallengeStats};
use super::record::{Challenge, ProgressionRecord, ScoreEntry, Statistics, DEFAULT_ITEM};
use crate::consts::PROGRESSION_KEY;
use crate::persistence::{Storage, StorageError};
use crate::settings::Settings;
use crate::sim::{BalloonKind, GameMode, PowerUpKind};

/// Result of `add_stars`
#[derive(Debug, Clone, PartialEq)]
pub struct StarGain {
    /// Stars credited after the prestige multiplier
    pub stars: u64,
    pub unlocks: Vec<&'static Unlock>,
    pub new_rank: Option<Rank>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyBonus {
    pub coins: u64,
    pub gems: u64,
    pub streak: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlbumMilestone {
    pub category: AlbumCategory,
    pub milestone: u64,
    pub reward: u64,
}

/// One album page as the collection screen shows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlbumSummary {
    pub count: u64,
    pub current_milestone: u64,
    pub next_milestone: Option<u64>,
    pub next_reward: Option<u64>,
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrestigeInfo {
    pub level: u32,
    pub multiplier: f64,
    pub lifetime_stars: u64,
    pub next: Option<PrestigeTier>,
}

/// Lifetime counters fed by one finished game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameTotals {
    pub pops: u64,
    pub combo: u32,
    pub score: u64,
    pub bombs_avoided: u64,
}

/// What the per-mode achievements look at
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModeResult {
    pub pops: u64,
    pub score: u64,
    pub lives: Option<u8>,
    pub won: bool,
    pub survival_time_s: f32,
    pub perfect: bool,
}

/// Dashboard view of the statistics plus headline counters
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsSnapshot {
    pub statistics: Statistics,
    pub total_pops: u64,
    pub high_score: u64,
    pub max_combo: u32,
    pub games_played: u64,
    pub total_play_time: u64,
    pub current_streak: u32,
    pub login_streak: u32,
    pub prestige_level: u32,
    pub achievement_points: u64,
    pub achievements_unlocked: usize,
    pub total_achievements: usize,
}

pub struct ProgressionStore<S: Storage> {
    storage: S,
    record: ProgressionRecord,
    /// Challenge rolls
    rng: Pcg32,
}

impl<S: Storage> ProgressionStore<S> {
    /// Load the record from `storage`, falling back to defaults
    pub fn load(storage: S, seed: u64) -> Self {
        let record = match storage.get_item(PROGRESSION_KEY) {
            Ok(Some(json)) => match ProgressionRecord::from_json(&json) {
                Ok(record) => {
                    log::info!(
                        "Loaded progression ({} games, {} coins)",
                        record.games_played,
                        record.coins
                    );
                    record
                }
                Err(err) => {
                    log::warn!("Failed to parse progression, starting fresh: {err}");
                    ProgressionRecord::default()
                }
            },
            Ok(None) => {
                log::info!("No saved progression, starting fresh");
                ProgressionRecord::default()
            }
            Err(err) => {
                log::warn!("Failed to load progression: {err}");
                ProgressionRecord::default()
            }
        };
        Self {
            storage,
            record,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Write the record to storage
    pub fn save(&mut self) -> Result<(), StorageError> {
        let json = self.record.to_json()?;
        self.storage.set_item(PROGRESSION_KEY, &json)
    }

    /// Save, logging instead of failing
    /// Write-through after a mutation, skipped while auto-save is off
    fn commit(&mut self) {
        if self.record.settings.auto_save {
            self.persist();
        }
    }

    fn persist(&mut self) {
        if let Err(err) = self.save() {
            log::warn!("Failed to save progression: {err}");
        }
    }

    pub fn record(&self) -> &ProgressionRecord {
        &self.record
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Shared backend for the other documents (leaderboard)
    pub(crate) fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    // ===== Currency =====

    fn multiplied(&self, amount: u64) -> u64 {
        (amount as f64 * self.record.prestige_multiplier).floor() as u64
    }

    fn credit_coins(&mut self, amount: u64) -> u64 {
        let gain = self.multiplied(amount);
        let r = &mut self.record;
        r.coins += gain;
        r.total_coins_earned += gain;
        r.lifetime_coins += gain;
        gain
    }

    /// Credit coins scaled by the prestige multiplier. Returns the amount credited.
    pub fn add_coins(&mut self, amount: u64) -> u64 {
        let gain = self.credit_coins(amount);
        self.commit();
        gain
    }

    fn debit_coins(&mut self, amount: u64) -> bool {
        match self.record.coins.checked_sub(amount) {
            Some(left) => {
                self.record.coins = left;
                true
            }
            None => false,
        }
    }

    /// All or nothing. False leaves the balance untouched.
    pub fn spend_coins(&mut self, amount: u64) -> bool {
        if !self.debit_coins(amount) {
            return false;
        }
        self.commit();
        true
    }

    pub fn add_gems(&mut self, amount: u64) -> u64 {
        self.record.gems += amount;
        self.commit();
        self.record.gems
    }

    pub fn spend_gems(&mut self, amount: u64) -> bool {
        let Some(left) = self.record.gems.checked_sub(amount) else {
            return false;
        };
        self.record.gems = left;
        self.commit();
        true
    }

    // ===== Stars and rank =====

    pub fn add_stars(&mut self, amount: u64) -> StarGain {
        let stars = self.multiplied(amount);
        self.record.total_stars += stars;
        self.record.lifetime_stars += stars;

        let total = self.record.total_stars;
        let mut unlocks = Vec::new();
        for unlock in UNLOCKS.iter().filter(|u| total >= u.stars) {
            if !self.record.unlocked_items.iter().any(|i| i == unlock.id) {
                self.record.unlocked_items.push(unlock.id.to_string());
                log::info!("Unlocked {}", unlock.id);
                unlocks.push(unlock);
            }
        }

        let reached = Rank::for_stars(total);
        let new_rank = (reached > self.record.rank).then(|| {
            log::info!("Rank up: {}", reached.name());
            self.record.rank = reached;
            reached
        });

        self.commit();
        StarGain {
            stars,
            unlocks,
            new_rank,
        }
    }

    pub fn current_rank(&self) -> Rank {
        self.record.rank
    }

    pub fn claim_rank_reward(&mut self, rank: Rank) -> Option<RankReward> {
        if rank > self.record.rank || self.record.rank_rewards_claimed.contains(&rank) {
            return None;
        }
        self.record.rank_rewards_claimed.push(rank);
        let reward = rank.reward();
        if reward.coins > 0 {
            self.credit_coins(reward.coins);
        }
        self.record.gems += reward.gems;
        if let Some(kind) = reward.powerup {
            self.record.powerups.add(kind, 1);
        }
        self.commit();
        Some(reward)
    }

    /// Reached ranks with an unclaimed, non-empty reward
    pub fn unclaimed_rank_rewards(&self) -> Vec<Rank> {
        Rank::ALL
            .into_iter()
            .filter(|r| *r <= self.record.rank)
            .filter(|r| r.reward().coins > 0)
            .filter(|r| !self.record.rank_rewards_claimed.contains(r))
            .collect()
    }

    // ===== Games =====

    pub fn update_high_score(&mut self, score: u64) -> bool {
        if score <= self.record.high_score {
            return false;
        }
        self.record.high_score = score;
        self.commit();
        true
    }

    /// Count a finished game toward play history, statistics and the season
    pub fn record_game_played(&mut self, mode: GameMode, score: u64, play_time_s: u64, day: i64) {
        let r = &mut self.record;
        r.games_played += 1;
        r.total_play_time += play_time_s;
        r.season_progress += score;

        let stats = &mut r.statistics;
        let entry = stats
            .mode_stats
            .entry(mode.as_str().to_string())
            .or_default();
        entry.played += 1;
        entry.total_score += score;
        entry.best_score = entry.best_score.max(score);

        let label = calendar::date_label(day);
        *stats.games_per_day.entry(label.clone()).or_insert(0) += 1;
        stats.score_history.push(ScoreEntry {
            date: label,
            score,
            mode: mode.as_str().to_string(),
        });
        if stats.score_history.len() > SCORE_HISTORY_LEN {
            let excess = stats.score_history.len() - SCORE_HISTORY_LEN;
            stats.score_history.drain(..excess);
        }
        let total: u64 = stats.score_history.iter().map(|s| s.score).sum();
        stats.average_score = total / stats.score_history.len() as u64;

        let mut most_played = 0;
        for m in GameMode::ALL {
            let played = stats.mode_stats.get(m.as_str()).map_or(0, |s| s.played);
            if played > most_played {
                most_played = played;
                stats.favorite_mode = m.as_str().to_string();
            }
        }
        stats.longest_game = stats.longest_game.max(play_time_s);

        r.current_streak = match r.last_play_day {
            Some(last) if last == day => r.current_streak,
            Some(last) if last == day - 1 => r.current_streak + 1,
            _ => 1,
        };
        r.last_play_day = Some(day);

        if !r.weekly_modes.iter().any(|m| m == mode.as_str()) {
            r.weekly_modes.push(mode.as_str().to_string());
        }

        self.commit();
    }

    /// Lifetime per-kind pop counts for the dashboard
    pub fn record_kind_pops(&mut self, pops: &BTreeMap<BalloonKind, u64>) {
        if pops.is_empty() {
            return;
        }
        for (kind, n) in pops {
            *self
                .record
                .statistics
                .balloon_type_stats
                .entry(kind.as_str().to_string())
                .or_insert(0) += n;
        }
        self.commit();
    }

    // ===== Achievements =====

    pub fn has_achievement(&self, id: &str) -> bool {
        self.record.achievements.iter().any(|a| a == id)
    }

    fn grant_achievement(&mut self, id: &str) -> Option<&'static Achievement> {
        if self.has_achievement(id) {
            return None;
        }
        let achievement = catalog::find_achievement(id)?;
        self.record.achievements.push(id.to_string());
        self.record.achievement_points += achievement.reward;
        self.credit_coins(achievement.reward);
        log::info!("Achievement unlocked: {}", achievement.name);
        Some(achievement)
    }

    /// Unlock once. Later calls (and unknown ids) return `None`.
    pub fn unlock_achievement(&mut self, id: &str) -> Option<&'static Achievement> {
        let achievement = self.grant_achievement(id)?;
        self.commit();
        Some(achievement)
    }

    /// Fold a game's totals into lifetime counters and check the threshold
    /// achievements
    pub fn update_stats(&mut self, game: &GameTotals) -> Vec<&'static Achievement> {
        let mut unlocked = Vec::new();
        let r = &mut self.record;

        r.total_pops += game.pops;
        r.bombs_avoided += game.bombs_avoided;
        if game.combo > r.max_combo {
            r.max_combo = game.combo;
            r.statistics.best_combo = game.combo;
        }

        let total_pops = r.total_pops;
        let bombs_avoided = r.bombs_avoided;
        let mut ids: Vec<&str> = Vec::new();
        ids.extend(POP_ACHIEVEMENTS.iter().filter(|(n, _)| total_pops >= *n).map(|(_, id)| *id));
        ids.extend(COMBO_ACHIEVEMENTS.iter().filter(|(n, _)| game.combo >= *n).map(|(_, id)| *id));
        ids.extend(SCORE_ACHIEVEMENTS.iter().filter(|(n, _)| game.score >= *n).map(|(_, id)| *id));
        if bombs_avoided >= 10 {
            ids.push("bomb_dodger");
        }
        if self.record.album_progress.boss_balloons.popped >= 10 {
            ids.push("boss_slayer");
        }
        unlocked.extend(ids.into_iter().filter_map(|id| self.grant_achievement(id)));
        unlocked.extend(self.check_standing_achievements());

        self.commit();
        unlocked
    }

    /// Achievements that depend on record-wide state rather than one game
    fn check_standing_achievements(&mut self) -> Vec<&'static Achievement> {
        let r = &self.record;
        let mut ids = Vec::new();
        if r.total_coins_earned >= 500 {
            ids.push("coin_collector");
        }
        if r.total_coins_earned >= 5_000 {
            ids.push("coin_hoarder");
        }
        if r.login_streak >= 30 {
            ids.push("daily_streak_30");
        }
        if r.weekly_streak >= 4 {
            ids.push("weekly_streak_4");
        }
        if r.prestige_level >= 1 {
            ids.push("prestige_1");
        }
        if r.prestige_level >= 3 {
            ids.push("prestige_3");
        }
        if r.rare_discovered.len() >= BalloonKind::RARE.len() {
            ids.push("rare_hunter");
        }
        ids.into_iter()
            .filter_map(|id| self.grant_achievement(id))
            .collect()
    }

    pub fn check_mode_achievement(
        &mut self,
        mode: GameMode,
        result: &ModeResult,
    ) -> Option<&'static Achievement> {
        let id = match mode {
            GameMode::Zen if result.pops >= 50 => "zen_master",
            GameMode::Survival if result.lives == Some(3) && result.won => "survivor",
            GameMode::Frenzy if result.score >= 75 => "frenzy_king",
            GameMode::Target if result.perfect => "target_ace",
            GameMode::Endless if result.survival_time_s >= 300.0 => "endless_warrior",
            _ => return None,
        };
        self.unlock_achievement(id)
    }

    // ===== Daily challenges =====

    /// Roll today's challenges on a new day, settling yesterday's streak
    pub fn check_daily_challenges(&mut self, day: i64) -> &[Challenge] {
        let r = &mut self.record;
        if r.last_challenge_day != Some(day) {
            let finished = challenges::all_completed(&r.daily_challenges);
            if finished && r.last_challenge_day == Some(day - 1) {
                r.challenge_streak += 1;
            } else if r.last_challenge_day.is_some() {
                r.challenge_streak = 0;
            }
            r.daily_challenges =
                challenges::generate(&DAILY_TEMPLATES, DAILY_CHALLENGES_PER_DAY, &mut self.rng);
            r.last_challenge_day = Some(day);
            log::debug!("New daily challenges (streak {})", r.challenge_streak);
            self.commit();
        }
        &self.record.daily_challenges
    }

    pub fn update_challenge_progress(&mut self, stats: &ChallengeStats) -> Vec<Challenge> {
        let done = challenges::apply(&mut self.record.daily_challenges, stats);
        self.commit();
        done
    }

    /// Claim a completed daily challenge. Returns the coins credited (0 if
    /// not claimable).
    pub fn claim_challenge_reward(&mut self, id: &str) -> u64 {
        let Some(base) = challenges::claim(&mut self.record.daily_challenges, id) else {
            return 0;
        };
        self.record.challenges_completed += 1;
        let reward = challenges::streak_reward(base, self.record.challenge_streak, 0.25, 1.0);
        let gain = self.credit_coins(reward);
        self.commit();
        gain
    }

    // ===== Weekly challenges =====

    pub fn check_weekly_challenges(&mut self, week: i64) -> &[Challenge] {
        let r = &mut self.record;
        if r.last_week != Some(week) {
            if challenges::all_completed(&r.weekly_challenges) {
                r.weekly_streak += 1;
            } else if r.last_week.is_some() {
                r.weekly_streak = 0;
            }
            r.weekly_challenges =
                challenges::generate(&WEEKLY_TEMPLATES, WEEKLY_CHALLENGES_PER_WEEK, &mut self.rng);
            r.weekly_modes.clear();
            r.last_week = Some(week);
            log::debug!("New weekly challenges (streak {})", r.weekly_streak);
            self.commit();
        }
        &self.record.weekly_challenges
    }

    pub fn update_weekly_challenge_progress(&mut self, stats: &ChallengeStats) -> Vec<Challenge> {
        let done = challenges::apply(&mut self.record.weekly_challenges, stats);
        self.commit();
        done
    }

    pub fn claim_weekly_challenge_reward(&mut self, id: &str) -> u64 {
        let Some(base) = challenges::claim(&mut self.record.weekly_challenges, id) else {
            return 0;
        };
        self.record.weekly_completed += 1;
        let reward = challenges::streak_reward(base, self.record.weekly_streak, 0.1, 0.5);
        let gain = self.credit_coins(reward);
        self.commit();
        gain
    }

    // ===== Prestige =====

    fn next_prestige(&self) -> Option<PrestigeTier> {
        PRESTIGE_TIERS.get(self.record.prestige_level as usize).copied()
    }

    pub fn can_prestige(&self) -> bool {
        self.next_prestige()
            .is_some_and(|tier| self.record.lifetime_stars >= tier.stars)
    }

    pub fn prestige_info(&self) -> PrestigeInfo {
        PrestigeInfo {
            level: self.record.prestige_level,
            multiplier: self.record.prestige_multiplier,
            lifetime_stars: self.record.lifetime_stars,
            next: self.next_prestige(),
        }
    }

    /// Trade the current cycle's stars and rank for a permanent multiplier
    pub fn perform_prestige(&mut self) -> Option<PrestigeTier> {
        if !self.can_prestige() {
            return None;
        }
        let tier = self.next_prestige()?;
        let r = &mut self.record;
        r.prestige_level += 1;
        r.prestige_multiplier = r.prestige_multiplier.max(tier.multiplier);
        r.gems += tier.gems;
        r.total_stars = 0;
        r.rank = Rank::Beginner;
        r.rank_rewards_claimed.clear();
        self.credit_coins(tier.coins);
        log::info!(
            "Prestige {} reached (x{:.2})",
            tier.level,
            self.record.prestige_multiplier
        );
        self.commit();
        Some(tier)
    }

    // ===== Shop and equipment =====

    pub fn is_unlocked(&self, id: &str) -> bool {
        let r = &self.record;
        r.unlocked_items.iter().any(|i| i == id) || r.purchased_items.iter().any(|i| i == id)
    }

    pub fn is_purchased(&self, id: &str) -> bool {
        self.record.purchased_items.iter().any(|i| i == id)
    }

    pub fn purchase_item(&mut self, id: &str) -> bool {
        let Some(item) = catalog::shop_item(id) else {
            return false;
        };
        if self.is_purchased(id) || !self.debit_coins(item.price) {
            return false;
        }
        self.record.purchased_items.push(id.to_string());
        log::info!("Purchased {}", item.name);
        self.commit();
        true
    }

    /// Equip an owned item. Catalog items only fit their own slot.
    pub fn equip_item(&mut self, slot: ItemSlot, id: &str) -> bool {
        if id != DEFAULT_ITEM {
            if !self.is_unlocked(id) {
                return false;
            }
            let item_slot = UNLOCKS
                .iter()
                .find(|u| u.id == id)
                .map(|u| u.slot)
                .or_else(|| catalog::shop_item(id).map(|i| i.slot));
            if item_slot.is_some_and(|s| s != slot) {
                return false;
            }
        }
        *self.record.equipped_mut(slot) = id.to_string();
        self.commit();
        true
    }

    // ===== Power-ups =====

    pub fn buy_powerup(&mut self, kind: PowerUpKind) -> bool {
        if !self.debit_coins(catalog::powerup_price(kind)) {
            return false;
        }
        self.record.powerups.add(kind, 1);
        self.commit();
        true
    }

    /// Consume one owned charge
    pub fn use_powerup(&mut self, kind: PowerUpKind) -> bool {
        if !self.record.powerups.take(kind) {
            return false;
        }
        self.commit();
        true
    }

    pub fn powerup_count(&self, kind: PowerUpKind) -> u32 {
        self.record.powerups.count(kind)
    }

    // ===== Collection =====

    /// Count a rare pop. True the first time this kind is found.
    pub fn record_rare_pop(&mut self, kind: BalloonKind) -> bool {
        let key = kind.as_str();
        *self
            .record
            .rare_collection
            .entry(key.to_string())
            .or_insert(0) += 1;
        let first = !self.record.rare_discovered.iter().any(|k| k == key);
        if first {
            self.record.rare_discovered.push(key.to_string());
            log::info!("Discovered {key} balloon");
        }
        self.commit();
        first
    }

    pub fn update_album_progress(
        &mut self,
        category: AlbumCategory,
        amount: u64,
    ) -> Vec<AlbumMilestone> {
        let milestones = category.milestones();
        let rewards = category.rewards();
        let mut reached = Vec::new();

        let entry = self.record.album_progress.entry_mut(category);
        entry.popped += amount;
        while let Some(&milestone) = milestones.get(entry.milestone) {
            if entry.popped < milestone {
                break;
            }
            reached.push(AlbumMilestone {
                category,
                milestone,
                reward: rewards[entry.milestone],
            });
            entry.milestone += 1;
        }
        for m in &reached {
            self.credit_coins(m.reward);
        }
        self.commit();
        reached
    }

    pub fn album_summary(&self, category: AlbumCategory) -> AlbumSummary {
        let entry = self.record.album_progress.entry(category);
        let milestones = category.milestones();
        let next = entry.milestone;
        AlbumSummary {
            count: entry.popped,
            current_milestone: next.checked_sub(1).and_then(|i| milestones.get(i)).copied().unwrap_or(0),
            next_milestone: milestones.get(next).copied(),
            next_reward: category.rewards().get(next).copied(),
            completed: next,
            total: milestones.len(),
        }
    }

    // ===== Login bonus =====

    /// Roll the login streak on a new day. True if today is new.
    pub fn check_daily_login(&mut self, day: i64) -> bool {
        let r = &mut self.record;
        if r.last_login_day == Some(day) {
            return false;
        }
        r.login_streak = match r.last_login_day {
            Some(last) if day - last == 1 => r.login_streak + 1,
            Some(last) if day - last > 1 => 1,
            // Clock went backwards: keep the streak
            Some(_) => r.login_streak.max(1),
            None => 1,
        };
        r.last_login_day = Some(day);
        r.daily_bonus_claimed = false;
        self.commit();
        true
    }

    pub fn can_claim_daily_bonus(&self) -> bool {
        !self.record.daily_bonus_claimed
    }

    pub fn claim_daily_bonus(&mut self) -> Option<DailyBonus> {
        if self.record.daily_bonus_claimed {
            return None;
        }
        self.record.daily_bonus_claimed = true;
        let streak = self.record.login_streak;
        let bonus =
            LOGIN_BASE_BONUS + (u64::from(streak) * LOGIN_STREAK_BONUS).min(LOGIN_STREAK_BONUS_CAP);
        let coins = self.credit_coins(bonus);
        let gems = u64::from(streak > 0 && streak % LOGIN_GEM_EVERY == 0);
        self.record.gems += gems;
        self.commit();
        Some(DailyBonus {
            coins,
            gems,
            streak,
        })
    }

    // ===== Season =====

    /// Switch to the season for `month` (1-12), resetting season progress on change
    pub fn check_season(&mut self, month: u32) -> Season {
        let season = Season::for_month(month);
        if self.record.current_season != Some(season) {
            log::info!("Season started: {}", season.name());
            self.record.current_season = Some(season);
            self.record.season_progress = 0;
            self.record.season_rewards_claimed.clear();
            self.commit();
        }
        season
    }

    // ===== Settings and tutorial =====

    pub fn settings(&self) -> &Settings {
        &self.record.settings
    }

    pub fn update_settings(&mut self, update: impl FnOnce(&mut Settings)) {
        update(&mut self.record.settings);
        self.record.settings.sanitize();
        // Always written, so turning auto-save off sticks
        self.persist();
    }

    pub fn complete_tutorial_step(&mut self, step: u32) {
        if step > self.record.tutorial_step {
            self.record.tutorial_step = step;
            self.commit();
        }
    }

    /// Finish the tutorial. The bonus is paid once.
    pub fn complete_tutorial(&mut self) {
        if self.record.tutorial_completed {
            return;
        }
        self.record.tutorial_completed = true;
        self.record.settings.show_tutorial = false;
        self.credit_coins(TUTORIAL_BONUS);
        self.commit();
    }

    pub fn should_show_tutorial(&self) -> bool {
        self.record.settings.show_tutorial && !self.record.tutorial_completed
    }

    pub fn statistics(&self) -> StatisticsSnapshot {
        let r = &self.record;
        StatisticsSnapshot {
            statistics: r.statistics.clone(),
            total_pops: r.total_pops,
            high_score: r.high_score,
            max_combo: r.max_combo,
            games_played: r.games_played,
            total_play_time: r.total_play_time,
            current_streak: r.current_streak,
            login_streak: r.login_streak,
            prestige_level: r.prestige_level,
            achievement_points: r.achievement_points,
            achievements_unlocked: r.achievements.len(),
            total_achievements: catalog::ACHIEVEMENTS.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    fn store() -> ProgressionStore<MemoryStorage> {
        ProgressionStore::load(MemoryStorage::new(), 5)
    }

    fn saved(store: &ProgressionStore<MemoryStorage>) -> ProgressionRecord {
        let json = store.storage().raw(PROGRESSION_KEY).unwrap();
        ProgressionRecord::from_json(&json).unwrap()
    }

    #[test]
    fn test_add_coins_applies_prestige_multiplier() {
        let mut s = store();
        s.record.prestige_multiplier = 1.5;
        assert_eq!(s.add_coins(100), 150);
        assert_eq!(s.record().coins, 150);
        assert_eq!(s.record().total_coins_earned, 150);
        assert_eq!(s.record().lifetime_coins, 150);
        assert_eq!(saved(&s).coins, 150);
    }

    #[test]
    fn test_spend_coins_all_or_nothing() {
        let mut s = store();
        s.add_coins(40);
        assert!(!s.spend_coins(41));
        assert_eq!(s.record().coins, 40);
        assert!(s.spend_coins(40));
        assert_eq!(s.record().coins, 0);
        assert!(!s.spend_gems(1));
    }

    #[test]
    fn test_achievement_unlocks_once() {
        let mut s = store();
        assert!(s.unlock_achievement("first_pop").is_some());
        assert!(s.unlock_achievement("first_pop").is_none());
        assert!(s.has_achievement("first_pop"));
        assert_eq!(s.record().coins, 10);
        assert_eq!(s.record().achievement_points, 10);
        assert!(s.unlock_achievement("no_such_thing").is_none());
    }

    #[test]
    fn test_update_stats_thresholds() {
        let mut s = store();
        let got = s.update_stats(&GameTotals {
            pops: 120,
            combo: 10,
            score: 210,
            bombs_avoided: 1,
        });
        let ids: Vec<_> = got.iter().map(|a| a.id).collect();
        for id in ["first_pop", "pop_100", "combo_5", "combo_10", "score_50", "score_100", "score_200"] {
            assert!(ids.contains(&id), "{id}");
        }
        assert!(!ids.contains(&"pop_500"));
        assert_eq!(s.record().total_pops, 120);
        assert_eq!(s.record().max_combo, 10);
        assert_eq!(s.record().statistics.best_combo, 10);
        // A second identical game unlocks nothing new
        assert!(s
            .update_stats(&GameTotals { pops: 1, combo: 3, score: 10, bombs_avoided: 0 })
            .is_empty());
    }

    #[test]
    fn test_stars_unlock_and_rank_up() {
        let mut s = store();
        let gain = s.add_stars(120);
        assert_eq!(gain.stars, 120);
        assert_eq!(gain.new_rank, Some(Rank::Popper));
        let ids: Vec<_> = gain.unlocks.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec!["sunset_bg", "pink_balloons"]);
        assert!(s.is_unlocked("pink_balloons"));
        assert_eq!(s.add_stars(10).new_rank, None);
    }

    #[test]
    fn test_rank_rewards_claim_once() {
        let mut s = store();
        s.add_stars(350);
        assert_eq!(s.unclaimed_rank_rewards(), vec![Rank::Popper, Rank::Collector]);
        assert_eq!(s.claim_rank_reward(Rank::Champion), None);
        let reward = s.claim_rank_reward(Rank::Popper).unwrap();
        assert_eq!(reward.coins, 50);
        assert_eq!(s.powerup_count(PowerUpKind::Magnet), 1);
        assert_eq!(s.claim_rank_reward(Rank::Popper), None);
        assert_eq!(s.unclaimed_rank_rewards(), vec![Rank::Collector]);
    }

    #[test]
    fn test_prestige_resets_cycle_keeps_lifetime() {
        let mut s = store();
        assert!(!s.can_prestige());
        assert_eq!(s.perform_prestige(), None);
        s.add_stars(5_200);
        s.claim_rank_reward(Rank::Popper);
        let tier = s.perform_prestige().unwrap();
        assert_eq!(tier.level, 1);
        let r = s.record();
        assert_eq!(r.prestige_level, 1);
        assert_eq!(r.prestige_multiplier, 1.1);
        assert_eq!(r.total_stars, 0);
        assert_eq!(r.lifetime_stars, 5_200);
        assert_eq!(r.rank, Rank::Beginner);
        assert!(r.rank_rewards_claimed.is_empty());
        assert_eq!(r.gems, 5);
        // Prestige coins use the new multiplier
        assert_eq!(r.coins, 50 + 1_100);
        assert!(!s.can_prestige());
        assert_eq!(s.add_stars(100).stars, 110);
    }

    #[test]
    fn test_daily_challenge_streak_rollover() {
        let mut s = store();
        assert_eq!(s.check_daily_challenges(100).len(), 3);
        // Same day: no reroll
        let first = s.record().daily_challenges.clone();
        s.check_daily_challenges(100);
        assert_eq!(s.record().daily_challenges, first);

        for c in &mut s.record.daily_challenges {
            c.completed = true;
        }
        s.check_daily_challenges(101);
        assert_eq!(s.record().challenge_streak, 1);

        for c in &mut s.record.daily_challenges {
            c.completed = true;
        }
        // Skipped a day
        s.check_daily_challenges(103);
        assert_eq!(s.record().challenge_streak, 0);

        s.check_daily_challenges(104);
        assert_eq!(s.record().challenge_streak, 0);
    }

    #[test]
    fn test_weekly_streak_rollover() {
        let mut s = store();
        s.check_weekly_challenges(10);
        assert_eq!(s.record().weekly_challenges.len(), 4);
        for c in &mut s.record.weekly_challenges {
            c.completed = true;
        }
        s.check_weekly_challenges(11);
        assert_eq!(s.record().weekly_streak, 1);
        s.check_weekly_challenges(12);
        assert_eq!(s.record().weekly_streak, 0);
    }

    #[test]
    fn test_challenge_claim_scales_with_streak() {
        let mut s = store();
        s.record.challenge_streak = 2;
        s.record.daily_challenges = vec![Challenge {
            id: "play_games".into(),
            stat: catalog::ChallengeStat::GamesPlayed,
            target: 1,
            reward: 20,
            ..Default::default()
        }];
        assert_eq!(s.claim_challenge_reward("play_games"), 0);
        let done = s.update_challenge_progress(&ChallengeStats {
            games_played: 1,
            ..Default::default()
        });
        assert_eq!(done.len(), 1);
        assert_eq!(s.claim_challenge_reward("play_games"), 30);
        assert_eq!(s.claim_challenge_reward("play_games"), 0);
        assert_eq!(s.record().challenges_completed, 1);
    }

    #[test]
    fn test_purchase_and_equip() {
        let mut s = store();
        assert!(!s.purchase_item("neon_theme"));
        s.add_coins(400);
        assert!(!s.equip_item(ItemSlot::Theme, "neon_theme"));
        assert!(s.purchase_item("neon_theme"));
        assert!(!s.purchase_item("neon_theme"));
        assert_eq!(s.record().coins, 50);
        assert!(!s.equip_item(ItemSlot::Trail, "neon_theme"));
        assert!(s.equip_item(ItemSlot::Theme, "neon_theme"));
        assert_eq!(s.record().equipped(ItemSlot::Theme), "neon_theme");
        assert!(s.equip_item(ItemSlot::Theme, "default"));
        assert!(!s.purchase_item("not_in_shop"));
    }

    #[test]
    fn test_powerup_inventory() {
        let mut s = store();
        assert!(!s.buy_powerup(PowerUpKind::Shield));
        s.add_coins(100);
        assert!(s.buy_powerup(PowerUpKind::Shield));
        assert_eq!(s.record().coins, 0);
        assert!(s.use_powerup(PowerUpKind::Shield));
        assert!(!s.use_powerup(PowerUpKind::Shield));
    }

    #[test]
    fn test_rare_discovery_and_album() {
        let mut s = store();
        assert!(s.record_rare_pop(BalloonKind::Alien));
        assert!(!s.record_rare_pop(BalloonKind::Alien));
        assert_eq!(s.record().rare_collection["alien"], 2);

        let reached = s.update_album_progress(AlbumCategory::Rare, 26);
        let values: Vec<_> = reached.iter().map(|m| m.milestone).collect();
        assert_eq!(values, vec![5, 25]);
        assert_eq!(s.record().coins, 350);
        let summary = s.album_summary(AlbumCategory::Rare);
        assert_eq!(summary.current_milestone, 25);
        assert_eq!(summary.next_milestone, Some(50));
        assert_eq!(summary.completed, 2);
        assert!(s.update_album_progress(AlbumCategory::Rare, 1).is_empty());
    }

    #[test]
    fn test_daily_login_streak_and_bonus() {
        let mut s = store();
        assert!(s.check_daily_login(10));
        assert!(!s.check_daily_login(10));
        let bonus = s.claim_daily_bonus().unwrap();
        assert_eq!(bonus.coins, 30);
        assert!(s.claim_daily_bonus().is_none());

        for day in 11..=16 {
            s.check_daily_login(day);
        }
        assert_eq!(s.record().login_streak, 7);
        let bonus = s.claim_daily_bonus().unwrap();
        assert_eq!(bonus.coins, 25 + 35);
        assert_eq!(bonus.gems, 1);

        s.check_daily_login(20);
        assert_eq!(s.record().login_streak, 1);
    }

    #[test]
    fn test_record_game_played() {
        let mut s = store();
        s.record_game_played(GameMode::Zen, 40, 60, 19_782);
        s.record_game_played(GameMode::Zen, 20, 90, 19_783);
        s.record_game_played(GameMode::Classic, 90, 30, 19_783);
        let r = s.record();
        assert_eq!(r.games_played, 3);
        assert_eq!(r.total_play_time, 180);
        assert_eq!(r.current_streak, 2);
        assert_eq!(r.season_progress, 150);
        assert_eq!(r.statistics.mode_stats["zen"].best_score, 40);
        assert_eq!(r.statistics.games_per_day["2024-03-01"], 2);
        assert_eq!(r.statistics.average_score, 50);
        assert_eq!(r.statistics.favorite_mode, "zen");
        assert_eq!(r.statistics.longest_game, 90);
        assert_eq!(r.weekly_modes, vec!["zen".to_string(), "classic".to_string()]);
    }

    #[test]
    fn test_mode_achievements() {
        let mut s = store();
        let result = ModeResult {
            pops: 60,
            ..Default::default()
        };
        assert_eq!(s.check_mode_achievement(GameMode::Zen, &result).map(|a| a.id), Some("zen_master"));
        assert!(s.check_mode_achievement(GameMode::Zen, &result).is_none());
        assert!(s.check_mode_achievement(GameMode::Classic, &result).is_none());
        let survived = ModeResult {
            lives: Some(3),
            won: true,
            ..Default::default()
        };
        assert!(s.check_mode_achievement(GameMode::Survival, &survived).is_some());
    }

    #[test]
    fn test_season_change_resets_progress() {
        let mut s = store();
        assert_eq!(s.check_season(4), Season::Spring);
        s.record.season_progress = 500;
        assert_eq!(s.check_season(5), Season::Spring);
        assert_eq!(s.record().season_progress, 500);
        assert_eq!(s.check_season(6), Season::Summer);
        assert_eq!(s.record().season_progress, 0);
    }

    #[test]
    fn test_tutorial_bonus_once() {
        let mut s = store();
        assert!(s.should_show_tutorial());
        s.complete_tutorial_step(2);
        s.complete_tutorial_step(1);
        assert_eq!(s.record().tutorial_step, 2);
        s.complete_tutorial();
        s.complete_tutorial();
        assert_eq!(s.record().coins, 50);
        assert!(!s.should_show_tutorial());
    }

    #[test]
    fn test_settings_update_is_saved() {
        let mut s = store();
        s.update_settings(|settings| settings.music_volume = 2.0);
        assert_eq!(s.settings().music_volume, 1.0);
        assert_eq!(saved(&s).settings.music_volume, 1.0);
    }

    #[test]
    fn test_auto_save_off_defers_writes_to_save() {
        let mut s = store();
        s.add_coins(10);
        s.update_settings(|settings| settings.auto_save = false);
        assert!(!saved(&s).settings.auto_save);

        s.add_coins(5);
        assert_eq!(s.record().coins, 15);
        assert_eq!(saved(&s).coins, 10);

        s.save().unwrap();
        assert_eq!(saved(&s).coins, 15);
    }

    #[test]
    fn test_failed_writes_keep_playing() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        let mut s = ProgressionStore::load(storage, 1);
        assert_eq!(s.add_coins(10), 10);
        assert_eq!(s.record().coins, 10);
        assert!(s.save().is_err());
        assert!(s.storage().raw(PROGRESSION_KEY).is_none());
    }

    #[test]
    fn test_load_existing_and_corrupt() {
        let storage = MemoryStorage::new().with_item(PROGRESSION_KEY, r#"{"coins": 77}"#);
        let s = ProgressionStore::load(storage, 1);
        assert_eq!(s.record().coins, 77);

        let storage = MemoryStorage::new().with_item(PROGRESSION_KEY, "{{{");
        let s = ProgressionStore::load(storage, 1);
        assert_eq!(s.record(), &ProgressionRecord::default());
    }

    #[test]
    fn test_statistics_snapshot() {
        let mut s = store();
        s.unlock_achievement("first_pop");
        let snap = s.statistics();
        assert_eq!(snap.achievements_unlocked, 1);
        assert_eq!(snap.total_achievements, 29);
    }
}
