//! Daily and weekly challenge rolling and progress
//!
//! A challenge moves Generated -> InProgress -> Completed -> Claimed. The
//! last two steps are one-way.

use rand::Rng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;

use super::catalog::{Accumulate, ChallengeStat, ChallengeTemplate};
use super::record::Challenge;

/// One finished game's contribution to challenge progress
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChallengeStats {
    pub pops: u64,
    pub score: u64,
    pub max_combo: u32,
    pub glitter_pops: u64,
    pub rare_pops: u64,
    pub powerups_used: u64,
    pub no_bomb_game: bool,
    pub games_played: u64,
    pub frenzy_count: u64,
    pub mega_pops: u64,
    pub boss_defeated: u64,
    pub chain_combo: u32,
    /// Distinct modes played this week
    pub modes_played: u64,
}

impl ChallengeStats {
    pub fn value(&self, stat: ChallengeStat) -> u64 {
        match stat {
            ChallengeStat::Pops => self.pops,
            ChallengeStat::Score | ChallengeStat::TotalScore => self.score,
            ChallengeStat::MaxCombo => u64::from(self.max_combo),
            ChallengeStat::GlitterPops => self.glitter_pops,
            ChallengeStat::RarePops => self.rare_pops,
            ChallengeStat::PowerupsUsed => self.powerups_used,
            ChallengeStat::NoBombGame | ChallengeStat::PerfectGames => u64::from(self.no_bomb_game),
            ChallengeStat::GamesPlayed => self.games_played,
            ChallengeStat::FrenzyCount => self.frenzy_count,
            ChallengeStat::MegaPops => self.mega_pops,
            ChallengeStat::BossDefeated => self.boss_defeated,
            ChallengeStat::ChainCombo => u64::from(self.chain_combo),
            ChallengeStat::ModesPlayed => self.modes_played,
        }
    }
}

/// Roll `count` distinct challenges from `templates`
pub fn generate(templates: &[ChallengeTemplate], count: usize, rng: &mut Pcg32) -> Vec<Challenge> {
    templates
        .choose_multiple(rng, count)
        .map(|t| {
            let target = rng.random_range(t.min..=t.max);
            Challenge {
                id: t.id.to_string(),
                desc: t.desc.replace("{target}", &target.to_string()),
                stat: t.stat,
                target,
                progress: 0,
                completed: false,
                claimed: false,
                reward: t.reward,
            }
        })
        .collect()
}

/// Fold one game into the open challenges. Returns the ones just completed.
pub fn apply(challenges: &mut [Challenge], stats: &ChallengeStats) -> Vec<Challenge> {
    let mut completed = Vec::new();
    for challenge in challenges.iter_mut().filter(|c| !c.completed) {
        let value = stats.value(challenge.stat);
        challenge.progress = match challenge.stat.accumulate() {
            Accumulate::Sum => challenge.progress.saturating_add(value),
            Accumulate::Max => challenge.progress.max(value),
            Accumulate::Latest => value,
        };
        if challenge.progress >= challenge.target {
            challenge.completed = true;
            completed.push(challenge.clone());
        }
    }
    completed
}

/// Claim a completed challenge. Returns its base reward, or `None` if it
/// isn't complete, is already claimed, or doesn't exist.
pub fn claim(challenges: &mut [Challenge], id: &str) -> Option<u64> {
    let challenge = challenges.iter_mut().find(|c| c.id == id)?;
    if !challenge.completed || challenge.claimed {
        return None;
    }
    challenge.claimed = true;
    Some(challenge.reward)
}

/// Reward scaled by a capped streak bonus, floored
pub fn streak_reward(base: u64, streak: u32, step: f64, cap: f64) -> u64 {
    let bonus = (f64::from(streak) * step).min(cap);
    (base as f64 * (1.0 + bonus)).floor() as u64
}

pub fn all_completed(challenges: &[Challenge]) -> bool {
    !challenges.is_empty() && challenges.iter().all(|c| c.completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::catalog::{DAILY_TEMPLATES, WEEKLY_TEMPLATES};
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn challenge(stat: ChallengeStat, target: u64) -> Challenge {
        Challenge {
            id: format!("{stat:?}"),
            stat,
            target,
            reward: 20,
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_distinct_in_range() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..50 {
            let daily = generate(&DAILY_TEMPLATES, 3, &mut rng);
            assert_eq!(daily.len(), 3);
            let ids: HashSet<_> = daily.iter().map(|c| c.id.clone()).collect();
            assert_eq!(ids.len(), 3);
            for c in &daily {
                let t = DAILY_TEMPLATES.iter().find(|t| t.id == c.id).unwrap();
                assert!((t.min..=t.max).contains(&c.target));
                assert!(!c.desc.contains("{target}"));
            }
        }
        assert_eq!(generate(&WEEKLY_TEMPLATES, 4, &mut rng).len(), 4);
    }

    #[test]
    fn test_sum_and_max_accumulation() {
        let mut list = vec![
            challenge(ChallengeStat::Pops, 50),
            challenge(ChallengeStat::MaxCombo, 6),
        ];
        let game = ChallengeStats {
            pops: 30,
            max_combo: 5,
            ..Default::default()
        };
        assert!(apply(&mut list, &game).is_empty());
        let game = ChallengeStats {
            pops: 30,
            max_combo: 4,
            ..Default::default()
        };
        let done = apply(&mut list, &game);
        assert_eq!(done.len(), 1);
        assert_eq!(list[0].progress, 60);
        assert!(list[0].completed);
        assert_eq!(list[1].progress, 5);
    }

    #[test]
    fn test_completed_challenges_stop_moving() {
        let mut list = vec![challenge(ChallengeStat::GamesPlayed, 1)];
        let game = ChallengeStats {
            games_played: 1,
            ..Default::default()
        };
        assert_eq!(apply(&mut list, &game).len(), 1);
        assert!(apply(&mut list, &game).is_empty());
        assert_eq!(list[0].progress, 1);
    }

    #[test]
    fn test_claim_requires_completion_and_pays_once() {
        let mut list = vec![challenge(ChallengeStat::NoBombGame, 1)];
        assert_eq!(claim(&mut list, "NoBombGame"), None);
        apply(
            &mut list,
            &ChallengeStats {
                no_bomb_game: true,
                ..Default::default()
            },
        );
        assert_eq!(claim(&mut list, "NoBombGame"), Some(20));
        assert_eq!(claim(&mut list, "NoBombGame"), None);
        assert_eq!(claim(&mut list, "missing"), None);
    }

    #[test]
    fn test_streak_reward_caps() {
        assert_eq!(streak_reward(20, 0, 0.25, 1.0), 20);
        assert_eq!(streak_reward(20, 2, 0.25, 1.0), 30);
        assert_eq!(streak_reward(20, 9, 0.25, 1.0), 40);
        assert_eq!(streak_reward(150, 3, 0.1, 0.5), 195);
        assert_eq!(streak_reward(150, 8, 0.1, 0.5), 225);
    }
}
