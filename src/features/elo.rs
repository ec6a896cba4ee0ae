//! Elo rating system for team strength estimation.
//!
//! Ratings are updated strictly in match order, so the same match set in a
//! different order yields different ratings. Callers feed chronological
//! order.

use std::collections::HashMap;

use crate::MatchRecord;

use super::vocab::TeamVocabulary;

/// Elo rating configuration.
#[derive(Debug, Clone)]
pub struct EloConfig {
    /// K-factor: how much ratings change per match.
    pub k_factor: f32,
    /// Starting rating for every team.
    pub initial_rating: f32,
}

impl Default for EloConfig {
    fn default() -> Self {
        EloConfig {
            k_factor: 32.0,
            initial_rating: 1500.0,
        }
    }
}

/// Sequential Elo rating updater.
#[derive(Debug, Clone)]
pub struct EloRatings {
    ratings: HashMap<String, f32>,
    config: EloConfig,
}

impl Default for EloRatings {
    fn default() -> Self {
        Self::new(EloConfig::default())
    }
}

impl EloRatings {
    pub fn new(config: EloConfig) -> Self {
        EloRatings {
            ratings: HashMap::new(),
            config,
        }
    }

    /// Current rating for a team (initial if never seen).
    pub fn get(&self, team: &str) -> f32 {
        self.ratings
            .get(team)
            .copied()
            .unwrap_or(self.config.initial_rating)
    }

    /// Expected score (0-1) for the home side.
    pub fn expected_score(&self, home: &str, away: &str) -> f32 {
        let diff = self.get(away) - self.get(home);
        1.0 / (1.0 + 10.0_f32.powf(diff / 400.0))
    }

    /// Paired update after a match. Matches naming a team outside the
    /// vocabulary are skipped entirely.
    pub fn update(&mut self, record: &MatchRecord, vocab: &TeamVocabulary) {
        if !vocab.contains(&record.home_team) || !vocab.contains(&record.away_team) {
            return;
        }

        let expected = self.expected_score(&record.home_team, &record.away_team);
        let actual = match record.result {
            crate::Outcome::Home => 1.0,
            crate::Outcome::Draw => 0.5,
            crate::Outcome::Away => 0.0,
        };

        let home = self.get(&record.home_team);
        let away = self.get(&record.away_team);
        let delta = self.config.k_factor * (actual - expected);

        self.ratings.insert(record.home_team.clone(), home + delta);
        self.ratings.insert(record.away_team.clone(), away - delta);
    }

    pub fn into_table(self, vocab: &TeamVocabulary) -> EloTable {
        EloTable::from_ratings(self.ratings, vocab, &self.config)
    }
}

/// Final ratings plus the running bounds used for display normalisation.
#[derive(Debug, Clone)]
pub struct EloTable {
    ratings: HashMap<String, f32>,
    pub min_rating: f32,
    pub max_rating: f32,
    initial_rating: f32,
}

impl EloTable {
    fn from_ratings(
        mut ratings: HashMap<String, f32>,
        vocab: &TeamVocabulary,
        config: &EloConfig,
    ) -> Self {
        // Teams that never had a rated match stay at the baseline.
        for name in vocab.names() {
            ratings.entry(name.clone()).or_insert(config.initial_rating);
        }

        let mut min_rating = config.initial_rating;
        let mut max_rating = config.initial_rating;
        for &r in ratings.values() {
            min_rating = min_rating.min(r);
            max_rating = max_rating.max(r);
        }

        EloTable {
            ratings,
            min_rating,
            max_rating,
            initial_rating: config.initial_rating,
        }
    }

    /// Compute ratings for an ordered match set. Empty input yields an
    /// empty table with baseline bounds.
    pub fn compute(matches: &[MatchRecord], vocab: &TeamVocabulary, config: EloConfig) -> Self {
        let mut elo = EloRatings::new(config);
        for m in matches {
            elo.update(m, vocab);
        }
        elo.into_table(vocab)
    }

    pub fn get(&self, team: &str) -> f32 {
        self.ratings.get(team).copied().unwrap_or(self.initial_rating)
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}
