//! Durable player progression and economy
//!
//! - `record`: the persisted JSON document and its migration
//! - `catalog`: static tables (ranks, shop, achievements, challenges)
//! - `calendar`: UTC day/week/month arithmetic for rollovers
//! - `challenges`: rolling and advancing daily/weekly challenges
//! - `store`: the write-through store every caller goes through

pub mod calendar;
pub mod catalog;
pub mod challenges;
pub mod record;
pub mod store;

pub use catalog::{AlbumCategory, ItemSlot, Rank, Season};
pub use challenges::ChallengeStats;
pub use record::{Challenge, ProgressionRecord};
pub use store::{
    AlbumMilestone, DailyBonus, GameTotals, ModeResult, ProgressionStore, StarGain,
    StatisticsSnapshot,
};
