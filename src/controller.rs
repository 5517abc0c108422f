//! Game controller
//!
//! Owns the progression store, the local leaderboard and at most one live
//! session. Session events are folded into progression as they arrive; a
//! finished session is folded into a `GameSummary` exactly once.

use glam::Vec2;

use crate::consts::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
use crate::leaderboard::{self, LocalLeaderboard, RemoteLeaderboard};
use crate::persistence::Storage;
use crate::progression::calendar;
use crate::progression::catalog::{AlbumCategory, Rank, Season, SCORE_PER_STAR};
use crate::progression::store::{GameTotals, ModeResult};
use crate::progression::{ChallengeStats, ProgressionStore};
use crate::render::{self, RenderSink};
use crate::sim::{
    EndReason, GameEvent, GameMode, ParticleSystem, PowerUpKind, SessionState, TickInput,
    WeatherKind, tick,
};
use crate::tuning::Tuning;

/// Everything the game-over screen shows
#[derive(Debug, Clone, PartialEq)]
pub struct GameSummary {
    pub mode: GameMode,
    pub end_reason: EndReason,
    pub score: u64,
    pub pops: u64,
    pub max_combo: u32,
    pub bosses_defeated: u64,
    pub play_time_s: u64,
    pub stars_earned: u64,
    pub coins_earned: u64,
    pub new_high_score: bool,
    pub high_score: u64,
    pub rank_up: Option<Rank>,
    pub unlocks: Vec<&'static str>,
    pub achievements: Vec<&'static str>,
    pub challenges_completed: Vec<String>,
    /// Local leaderboard rank the score would take
    pub leaderboard_rank: Option<usize>,
}

pub struct GameController<S: Storage> {
    store: ProgressionStore<S>,
    leaderboard: LocalLeaderboard,
    remote: Option<Box<dyn RemoteLeaderboard>>,
    session: Option<SessionState>,
    last_summary: Option<GameSummary>,
    tuning: Tuning,
    bounds: Vec2,
    next_seed: u64,
    clock: fn() -> i64,
}

impl<S: Storage> GameController<S> {
    pub fn new(storage: S, seed: u64) -> Self {
        let leaderboard = LocalLeaderboard::load(&storage);
        Self {
            store: ProgressionStore::load(storage, seed ^ 0x5eed_ba11),
            leaderboard,
            remote: None,
            session: None,
            last_summary: None,
            tuning: Tuning::default(),
            bounds: Vec2::new(PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT),
            next_seed: seed,
            clock: crate::platform::now_ms,
        }
    }

    /// Replace the wall clock (Unix ms)
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_remote(mut self, remote: Box<dyn RemoteLeaderboard>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn set_bounds(&mut self, bounds: Vec2) {
        self.bounds = bounds;
    }

    pub fn store(&self) -> &ProgressionStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ProgressionStore<S> {
        &mut self.store
    }

    pub fn leaderboard(&self) -> &LocalLeaderboard {
        &self.leaderboard
    }

    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut SessionState> {
        self.session.as_mut()
    }

    pub fn last_summary(&self) -> Option<&GameSummary> {
        self.last_summary.as_ref()
    }

    fn today(&self) -> i64 {
        calendar::day_index((self.clock)())
    }

    /// Run the calendar checks (login streak, challenge and season rollover)
    pub fn refresh_calendar(&mut self) -> Season {
        let day = self.today();
        self.store.check_daily_login(day);
        self.store.check_daily_challenges(day);
        self.store.check_weekly_challenges(calendar::week_index(day));
        self.store.check_season(calendar::month_of(day))
    }

    /// Start a new session, replacing any live one
    pub fn start_session(&mut self, mode: GameMode) -> &SessionState {
        if let Some(old) = self.session.as_mut().filter(|s| !s.is_over()) {
            old.end(EndReason::Quit);
            self.finish();
        }
        let season = self.refresh_calendar();

        let seed = self.next_seed;
        self.next_seed = self.next_seed.wrapping_add(1);
        let mut state = SessionState::with_tuning(mode, seed, self.bounds, self.tuning.clone());
        state.fx = ParticleSystem::with_cap(self.store.settings().max_particles());
        state.environment.set_weather(match season {
            Season::Winter => WeatherKind::Snow,
            Season::Spring => WeatherKind::Sakura,
            Season::Fall => WeatherKind::Leaves,
            Season::Summer => WeatherKind::None,
        });
        self.last_summary = None;
        self.session.insert(state)
    }

    /// Advance the live session and fold its events into progression.
    /// Returns the events for audio/haptic/UI hooks.
    pub fn tick(&mut self, input: &TickInput, dt_ms: f32) -> Vec<GameEvent> {
        let Some(state) = self.session.as_mut() else {
            return Vec::new();
        };
        tick(state, input, dt_ms);
        let events = state.drain_events();
        let over = state.is_over();

        for event in &events {
            match *event {
                GameEvent::Popped { kind, .. } => {
                    self.store.update_album_progress(AlbumCategory::of(kind), 1);
                }
                GameEvent::RareFound(kind) => {
                    self.store.record_rare_pop(kind);
                }
                _ => {}
            }
        }
        if over {
            self.finish();
        }
        events
    }

    /// Spend an owned power-up in the live session
    pub fn use_powerup(&mut self, kind: PowerUpKind) -> bool {
        let Some(state) = self.session.as_mut().filter(|s| s.is_playing()) else {
            return false;
        };
        if !self.store.use_powerup(kind) {
            return false;
        }
        state.use_powerup(kind)
    }

    /// Leave the live session early
    pub fn quit(&mut self) -> Option<&GameSummary> {
        self.session.as_mut()?.end(EndReason::Quit);
        self.finish();
        self.last_summary.as_ref()
    }

    /// Fold the finished session into progression
    fn finish(&mut self) {
        let Some(state) = self.session.take() else {
            return;
        };
        let stats = &state.stats;
        let score = state.score;
        let play_time_s = state.elapsed_s.max(0.0) as u64;
        let day = self.today();

        let stars = self.store.add_stars(score / SCORE_PER_STAR);
        let coins_earned = self.store.add_coins(state.coins);
        let new_high_score = self.store.update_high_score(score);
        self.store
            .record_game_played(state.mode, score, play_time_s, day);
        self.store.record_kind_pops(&stats.kind_pops);

        let challenge_stats = ChallengeStats {
            pops: stats.pops,
            score,
            max_combo: stats.max_combo,
            glitter_pops: stats.glitter_pops,
            rare_pops: stats.rare_pops,
            powerups_used: stats.powerups_used,
            no_bomb_game: !stats.hit_bomb,
            games_played: 1,
            frenzy_count: stats.frenzy_count,
            mega_pops: stats.mega_pops,
            boss_defeated: stats.bosses_defeated,
            chain_combo: stats.max_chain,
            modes_played: self.store.record().weekly_modes.len() as u64,
        };
        let mut challenges_completed: Vec<String> = self
            .store
            .update_challenge_progress(&challenge_stats)
            .into_iter()
            .map(|c| c.id)
            .collect();
        challenges_completed.extend(
            self.store
                .update_weekly_challenge_progress(&challenge_stats)
                .into_iter()
                .map(|c| c.id),
        );

        let mut achievements: Vec<&'static str> = self
            .store
            .update_stats(&GameTotals {
                pops: stats.pops,
                combo: stats.max_combo,
                score,
                bombs_avoided: u64::from(!stats.hit_bomb),
            })
            .into_iter()
            .map(|a| a.id)
            .collect();
        let mode_result = ModeResult {
            pops: stats.pops,
            score,
            lives: state.lives,
            won: state.lives.is_none_or(|l| l > 0),
            survival_time_s: state.elapsed_s,
            perfect: !stats.hit_bomb && stats.lives_lost == 0,
        };
        if let Some(a) = self.store.check_mode_achievement(state.mode, &mode_result) {
            achievements.push(a.id);
        }

        let end_reason = state.end_reason.unwrap_or(EndReason::Quit);
        log::info!(
            "Game folded: {} score {score}, {} stars, {coins_earned} coins",
            state.mode.as_str(),
            stars.stars
        );
        self.last_summary = Some(GameSummary {
            mode: state.mode,
            end_reason,
            score,
            pops: stats.pops,
            max_combo: stats.max_combo,
            bosses_defeated: stats.bosses_defeated,
            play_time_s,
            stars_earned: stars.stars,
            coins_earned,
            new_high_score,
            high_score: self.store.record().high_score,
            rank_up: stars.new_rank,
            unlocks: stars.unlocks.iter().map(|u| u.id).collect(),
            achievements,
            challenges_completed,
            leaderboard_rank: self.leaderboard.potential_rank(score),
        });
    }

    /// Put the last game on the leaderboards under `initials`.
    /// Returns the local rank if it qualified.
    pub fn submit_score(&mut self, initials: &str) -> Option<usize> {
        let score = self.last_summary.as_ref()?.score;
        let now = (self.clock)();
        if let Some(remote) = self.remote.as_deref_mut() {
            leaderboard::submit_quietly(remote, initials, score, now);
        }
        let date = calendar::date_label(calendar::day_index(now));
        let rank = self.leaderboard.add_score(initials, score, &date)?;
        if let Err(err) = self.leaderboard.save(self.store.storage_mut()) {
            log::warn!("Failed to save leaderboard: {err}");
        }
        Some(rank)
    }

    /// Describe the live session to a drawing backend
    pub fn render(&self, sink: &mut dyn RenderSink) {
        if let Some(state) = &self.session {
            render::render(state, self.store.settings(), sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{LEADERBOARD_KEY, PROGRESSION_KEY};
    use crate::leaderboard::InMemoryRemote;
    use crate::persistence::MemoryStorage;
    use crate::progression::ProgressionRecord;
    use crate::render::FrameStats;
    use crate::sim::{BalloonKind, spawn_balloon};

    const FRAME: f32 = 1000.0 / 60.0;

    /// 2024-03-01T12:00:00Z
    fn march_first() -> i64 {
        1_709_294_400_000
    }

    fn controller() -> (GameController<MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        (GameController::new(storage, 11).with_clock(march_first), handle)
    }

    fn pop_one(c: &mut GameController<MemoryStorage>, kind: BalloonKind) -> Vec<GameEvent> {
        let state = c.session_mut().unwrap();
        let id = spawn_balloon(state, Some(kind));
        let pos = state.balloon(id).unwrap().pos;
        c.tick(&TickInput::click(pos), FRAME)
    }

    #[test]
    fn test_start_session_runs_calendar_checks() {
        let (mut c, _) = controller();
        c.start_session(GameMode::Classic);
        let r = c.store().record();
        assert_eq!(r.login_streak, 1);
        assert_eq!(r.daily_challenges.len(), 3);
        assert_eq!(r.weekly_challenges.len(), 4);
        assert_eq!(r.current_season, Some(Season::Spring));
        assert_eq!(
            c.session().unwrap().environment.weather.kind,
            WeatherKind::Sakura
        );
    }

    #[test]
    fn test_pops_feed_album_and_summary() {
        let (mut c, storage) = controller();
        c.start_session(GameMode::Zen);
        let events = pop_one(&mut c, BalloonKind::Normal);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Popped { .. })));
        assert_eq!(c.store().record().album_progress.normal_balloons.popped, 1);

        let summary = c.quit().cloned().unwrap();
        assert_eq!(summary.end_reason, EndReason::Quit);
        assert_eq!(summary.pops, 1);
        assert_eq!(summary.score, 1);
        assert!(summary.achievements.contains(&"first_pop"));
        assert!(c.session().is_none());

        let saved = ProgressionRecord::from_json(&storage.raw(PROGRESSION_KEY).unwrap()).unwrap();
        assert_eq!(saved.games_played, 1);
        assert_eq!(saved.total_pops, 1);
        assert_eq!(saved.statistics.balloon_type_stats["normal"], 1);
        assert_eq!(saved.statistics.games_per_day["2024-03-01"], 1);
    }

    #[test]
    fn test_rare_pop_is_recorded() {
        let (mut c, _) = controller();
        c.start_session(GameMode::Classic);
        pop_one(&mut c, BalloonKind::Diamond);
        let r = c.store().record();
        assert_eq!(r.rare_discovered, vec!["diamond".to_string()]);
        assert_eq!(r.album_progress.rare_balloons.popped, 1);
    }

    #[test]
    fn test_bomb_ends_classic_and_folds_once() {
        let (mut c, _) = controller();
        c.start_session(GameMode::Classic);
        pop_one(&mut c, BalloonKind::Bomb);
        assert!(c.session().is_none());
        let summary = c.last_summary().unwrap();
        assert_eq!(summary.end_reason, EndReason::Bomb);
        assert_eq!(c.store().record().games_played, 1);
        assert!(c.tick(&TickInput::default(), FRAME).is_empty());
        assert!(c.quit().is_none());
        assert_eq!(c.store().record().games_played, 1);
    }

    #[test]
    fn test_use_powerup_needs_inventory() {
        let (mut c, _) = controller();
        assert!(!c.use_powerup(PowerUpKind::Magnet));
        c.start_session(GameMode::Classic);
        assert!(!c.use_powerup(PowerUpKind::Magnet));
        c.store_mut().add_coins(50);
        assert!(c.store_mut().buy_powerup(PowerUpKind::Magnet));
        assert!(c.use_powerup(PowerUpKind::Magnet));
        assert_eq!(c.store().powerup_count(PowerUpKind::Magnet), 0);
        let state = c.session().unwrap();
        assert!(state.powerups.magnet());
        assert_eq!(state.stats.powerups_used, 1);
    }

    #[test]
    fn test_restart_folds_the_abandoned_session() {
        let (mut c, _) = controller();
        c.start_session(GameMode::Classic);
        c.start_session(GameMode::Zen);
        assert_eq!(c.store().record().games_played, 1);
        assert_eq!(c.session().unwrap().mode, GameMode::Zen);
    }

    #[test]
    fn test_submit_score_local_and_remote() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        let mut c = GameController::new(storage, 3)
            .with_clock(march_first)
            .with_remote(Box::new(InMemoryRemote::new()));
        assert_eq!(c.submit_score("abc"), None);

        c.start_session(GameMode::Zen);
        pop_one(&mut c, BalloonKind::Normal);
        assert_eq!(c.quit().unwrap().leaderboard_rank, Some(1));
        assert_eq!(c.submit_score("abc"), Some(1));
        assert_eq!(c.leaderboard().entries[0].initials, "ABC");
        assert_eq!(c.leaderboard().entries[0].date, "2024-03-01");
        assert!(handle.raw(LEADERBOARD_KEY).is_some());

        let reloaded = GameController::new(handle, 4);
        assert_eq!(reloaded.leaderboard().top_score(), Some(1));
    }

    #[test]
    fn test_storage_failure_does_not_stop_play() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        let mut c = GameController::new(storage, 5).with_clock(march_first);
        c.start_session(GameMode::Zen);
        pop_one(&mut c, BalloonKind::Normal);
        assert_eq!(c.quit().unwrap().pops, 1);
        assert_eq!(c.store().record().games_played, 1);
    }

    #[test]
    fn test_render_only_with_live_session() {
        let (mut c, _) = controller();
        let mut frame = FrameStats::default();
        c.render(&mut frame);
        assert_eq!(frame, FrameStats::default());
        c.start_session(GameMode::Classic);
        c.render(&mut frame);
        assert!(frame.clouds > 0);
    }
}
