//! Contact scoring and exact-match lookup

pub mod locator;
pub mod scorer;

pub use locator::{ExactMatch, ExactMatchLocator};
pub use scorer::{EXACT_SCORE, Resolution, SUBSTRING_SCORE, ScoredContact, rank_contacts, resolve, score_name};
