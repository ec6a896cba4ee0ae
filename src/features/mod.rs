//! Feature engineering for fixture prediction.

pub mod builder;
pub mod elo;
pub mod form;
pub mod strength;
pub mod vocab;

pub use builder::{build_features, feature_dim, BuildInput, ReasoningSnapshot};
pub use elo::{EloConfig, EloRatings, EloTable};
pub use form::{form_stats, head_to_head, FormStats, HeadToHead, Venue};
pub use strength::{compute_team_strengths, poisson_outcome_probs, StrengthTable, TeamStrength};
pub use vocab::{Resolution, TeamVocabulary};
