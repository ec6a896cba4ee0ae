//! Causal training-set assembly.
//!
//! Walks matches in chronological order and featurises each one using only
//! strictly earlier matches. Building an example from anything dated on or
//! after the example's own match is a correctness bug, not a style choice.

use std::collections::HashMap;

use crate::features::builder::{build_features, BuildInput};
use crate::features::elo::{EloConfig, EloRatings};
use crate::features::form::FORM_WINDOW;
use crate::features::vocab::TeamVocabulary;
use crate::{FeatureToggles, MatchRecord};

/// The assembled (features, labels) pairs plus the artifacts pinned for
/// inference: the team vocabulary and the per-team histories.
#[derive(Debug, Default)]
pub struct TrainingSet {
    pub features: Vec<Vec<f32>>,
    pub labels: Vec<[f32; 3]>,
    pub vocab: TeamVocabulary,
    /// Chronological full history per team, shared with the predictor.
    pub histories: HashMap<String, Vec<MatchRecord>>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn input_dim(&self) -> usize {
        self.features.first().map(|f| f.len()).unwrap_or(0)
    }
}

/// Assemble training examples from a chronologically sorted, season-filtered
/// match set.
///
/// A match becomes an example only when both sides already have at least
/// `FORM_WINDOW` prior matches; earlier fixtures are still consumed into
/// histories and ratings. Elo features use the rating state as of the
/// example's date, never the final table.
pub fn assemble_training_set(
    matches: &[MatchRecord],
    toggles: &FeatureToggles,
    recency_weighting: f32,
) -> TrainingSet {
    let vocab = TeamVocabulary::from_matches(matches);

    let mut histories: HashMap<String, Vec<MatchRecord>> = HashMap::new();
    for m in matches {
        histories
            .entry(m.home_team.clone())
            .or_default()
            .push(m.clone());
        histories
            .entry(m.away_team.clone())
            .or_default()
            .push(m.clone());
    }

    let mut features = Vec::new();
    let mut labels = Vec::new();
    let mut elo = EloRatings::new(EloConfig::default());
    let mut skipped = 0usize;

    for (i, m) in matches.iter().enumerate() {
        let home_elo = elo.get(&m.home_team);
        let away_elo = elo.get(&m.away_team);
        // Ratings advance regardless of whether an example is emitted.
        elo.update(m, &vocab);

        let home_hist = history_before(&histories, &m.home_team, m);
        let away_hist = history_before(&histories, &m.away_team, m);

        if home_hist.len() < FORM_WINDOW || away_hist.len() < FORM_WINDOW {
            skipped += 1;
            continue;
        }

        let input = BuildInput {
            home: &m.home_team,
            away: &m.away_team,
            date: Some(m.date),
            home_history: home_hist,
            away_history: away_hist,
            earlier: &matches[..i],
            home_elo,
            away_elo,
        };

        match build_features(&input, &vocab, toggles, recency_weighting) {
            Ok((vector, _)) => {
                features.push(vector);
                labels.push(m.result.one_hot());
            }
            Err(e) => {
                // Vocabulary is built from the same match set, so this
                // branch only fires on data inconsistencies.
                log::warn!("skipping training example: {}", e);
                skipped += 1;
            }
        }
    }

    log::info!(
        "assembled {} training examples from {} matches ({} skipped)",
        features.len(),
        matches.len(),
        skipped
    );

    TrainingSet {
        features,
        labels,
        vocab,
        histories,
    }
}

/// Slice of a team's chronological history strictly before the match date.
fn history_before<'a>(
    histories: &'a HashMap<String, Vec<MatchRecord>>,
    team: &str,
    m: &MatchRecord,
) -> &'a [MatchRecord] {
    match histories.get(team) {
        Some(history) => {
            let cut = history.partition_point(|h| h.date < m.date);
            &history[..cut]
        }
        None => &[],
    }
}
