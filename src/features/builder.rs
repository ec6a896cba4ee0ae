//! Feature vector assembly.
//!
//! The vector is a concatenation of named feature blocks over a pair of
//! one-hot team encodings. Each block is computed unconditionally and
//! zeroed when its toggle is off, so train and predict walk the exact same
//! block list and cannot drift apart.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{EngineError, FeatureToggles, MatchRecord, Result};

use super::form::{form_stats, head_to_head, FormStats, HeadToHead, Venue};
use super::vocab::TeamVocabulary;

/// Rest period assumed for a team with no prior match in the window.
pub const DEFAULT_REST_DAYS: f32 = 14.0;

/// Rest days are capped here before normalisation.
pub const MAX_REST_DAYS: f32 = 21.0;

/// Elo ratings are scaled by this constant into roughly 0..1.
const ELO_SCALE: f32 = 2000.0;

/// Width of the non-one-hot tail of the feature vector.
const TAIL_DIM: usize = 19;

/// Total feature vector length for a given vocabulary size.
pub fn feature_dim(vocab_len: usize) -> usize {
    2 * vocab_len + TAIL_DIM
}

/// Everything needed to featurise one fixture. Histories and the earlier
/// match list must contain only matches strictly before the fixture date;
/// the builder trusts the caller on that.
pub struct BuildInput<'a> {
    /// Canonical (already resolved) team names.
    pub home: &'a str,
    pub away: &'a str,
    /// Fixture date; None falls back to the default rest period.
    pub date: Option<NaiveDate>,
    /// Chronological per-team histories, strictly earlier than the fixture.
    pub home_history: &'a [MatchRecord],
    pub away_history: &'a [MatchRecord],
    /// Chronological match list for head-to-head lookup, strictly earlier.
    pub earlier: &'a [MatchRecord],
    /// Pre-fixture Elo ratings.
    pub home_elo: f32,
    pub away_elo: f32,
}

/// Non-numeric companion to a feature vector, kept with predictions so a
/// result can be explained without re-deriving anything.
#[derive(Debug, Clone, Serialize)]
pub struct ReasoningSnapshot {
    /// Venue-split form, as used in the feature vector.
    pub home_form: FormStats,
    pub away_form: FormStats,
    /// Overall form across venues, for display only.
    pub home_overall: FormStats,
    pub away_overall: FormStats,
    pub h2h: HeadToHead,
    pub home_elo: f32,
    pub away_elo: f32,
    pub home_rest_days: f32,
    pub away_rest_days: f32,
}

fn rest_days(history: &[MatchRecord], fixture_date: Option<NaiveDate>) -> f32 {
    match (history.last(), fixture_date) {
        (Some(last), Some(date)) => date.signed_duration_since(last.date).num_days() as f32,
        _ => DEFAULT_REST_DAYS,
    }
}

fn congestion_feature(days: f32) -> f32 {
    days.min(MAX_REST_DAYS) / MAX_REST_DAYS
}

/// Build the feature vector and reasoning snapshot for one fixture.
///
/// Returns an error if either canonical name is missing from the pinned
/// vocabulary; the vocabulary is never grown here.
pub fn build_features(
    input: &BuildInput<'_>,
    vocab: &TeamVocabulary,
    toggles: &FeatureToggles,
    recency_weighting: f32,
) -> Result<(Vec<f32>, ReasoningSnapshot)> {
    let home_pos = vocab
        .position(input.home)
        .ok_or_else(|| EngineError::UnknownTeam(input.home.to_string()))?;
    let away_pos = vocab
        .position(input.away)
        .ok_or_else(|| EngineError::UnknownTeam(input.away.to_string()))?;

    let home_form = form_stats(input.home, input.home_history, recency_weighting, Venue::Home);
    let away_form = form_stats(input.away, input.away_history, recency_weighting, Venue::Away);
    let home_overall = form_stats(
        input.home,
        input.home_history,
        recency_weighting,
        Venue::Overall,
    );
    let away_overall = form_stats(
        input.away,
        input.away_history,
        recency_weighting,
        Venue::Overall,
    );
    let h2h = head_to_head(input.home, input.away, input.earlier);

    let home_rest = rest_days(input.home_history, input.date);
    let away_rest = rest_days(input.away_history, input.date);

    let mut vector = Vec::with_capacity(feature_dim(vocab.len()));

    // One-hot team identities, always on.
    for i in 0..vocab.len() {
        vector.push(if i == home_pos { 1.0 } else { 0.0 });
    }
    for i in 0..vocab.len() {
        vector.push(if i == away_pos { 1.0 } else { 0.0 });
    }

    // Named blocks in a fixed order. A disabled block keeps its slots as
    // zeros so the vector length never changes.
    let blocks: [(bool, Vec<f32>); 6] = [
        (
            toggles.elo,
            vec![input.home_elo / ELO_SCALE, input.away_elo / ELO_SCALE],
        ),
        (
            toggles.form,
            vec![
                home_form.form_points,
                away_form.form_points,
                home_form.avg_goals_scored,
                away_form.avg_goals_scored,
                home_form.avg_goals_conceded,
                away_form.avg_goals_conceded,
            ],
        ),
        (toggles.h2h, vec![h2h.p_home, h2h.p_draw, h2h.p_away]),
        (
            toggles.offense,
            vec![
                home_form.shooting_accuracy,
                away_form.shooting_accuracy,
                home_form.conversion_rate,
                away_form.conversion_rate,
            ],
        ),
        (
            toggles.defense,
            vec![home_form.avg_shots_against, away_form.avg_shots_against],
        ),
        (
            toggles.congestion,
            vec![congestion_feature(home_rest), congestion_feature(away_rest)],
        ),
    ];

    for (enabled, values) in blocks {
        if enabled {
            vector.extend(values);
        } else {
            vector.extend(std::iter::repeat(0.0).take(values.len()));
        }
    }

    debug_assert_eq!(vector.len(), feature_dim(vocab.len()));

    let snapshot = ReasoningSnapshot {
        home_form,
        away_form,
        home_overall,
        away_overall,
        h2h,
        home_elo: input.home_elo,
        away_elo: input.away_elo,
        home_rest_days: home_rest,
        away_rest_days: away_rest,
    };

    Ok((vector, snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Outcome;

    fn record(home: &str, away: &str, day: u32, hg: u32, ag: u32) -> MatchRecord {
        MatchRecord {
            home_team: home.to_string(),
            away_team: away.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            result: match hg.cmp(&ag) {
                std::cmp::Ordering::Greater => Outcome::Home,
                std::cmp::Ordering::Equal => Outcome::Draw,
                std::cmp::Ordering::Less => Outcome::Away,
            },
            home_goals: Some(hg),
            away_goals: Some(ag),
            home_shots: Some(12),
            away_shots: Some(6),
            home_shots_on_target: Some(6),
            away_shots_on_target: Some(3),
        }
    }

    fn fixture_input<'a>(
        matches: &'a [MatchRecord],
        home_history: &'a [MatchRecord],
        away_history: &'a [MatchRecord],
    ) -> BuildInput<'a> {
        BuildInput {
            home: "A",
            away: "B",
            date: NaiveDate::from_ymd_opt(2024, 2, 1),
            home_history,
            away_history,
            earlier: matches,
            home_elo: 1520.0,
            away_elo: 1480.0,
        }
    }

    fn sample() -> (Vec<MatchRecord>, TeamVocabulary) {
        let matches = vec![
            record("A", "B", 1, 2, 0),
            record("B", "A", 8, 1, 1),
            record("A", "B", 15, 0, 1),
        ];
        let vocab = TeamVocabulary::from_matches(&matches);
        (matches, vocab)
    }

    #[test]
    fn test_vector_length_and_one_hots() {
        let (matches, vocab) = sample();
        let input = fixture_input(&matches, &matches, &matches);
        let (vector, _) =
            build_features(&input, &vocab, &FeatureToggles::default(), 0.5).unwrap();
        assert_eq!(vector.len(), feature_dim(2));
        // A is position 0 at home, B position 1 away.
        assert_eq!(&vector[..4], &[1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unknown_team_rejected() {
        let (matches, vocab) = sample();
        let mut input = fixture_input(&matches, &matches, &matches);
        input.home = "Atlantis";
        let err = build_features(&input, &vocab, &FeatureToggles::default(), 0.5).unwrap_err();
        assert!(matches!(err, EngineError::UnknownTeam(name) if name == "Atlantis"));
    }

    #[test]
    fn test_each_toggle_zeroes_its_slice() {
        let (matches, vocab) = sample();
        let input = fixture_input(&matches, &matches, &matches);
        let base = 2 * vocab.len();
        // (field mutator, offset, width) per block, in vector order.
        let cases: [(fn(&mut FeatureToggles), usize, usize); 6] = [
            (|t| t.elo = false, 0, 2),
            (|t| t.form = false, 2, 6),
            (|t| t.h2h = false, 8, 3),
            (|t| t.offense = false, 11, 4),
            (|t| t.defense = false, 15, 2),
            (|t| t.congestion = false, 17, 2),
        ];

        for (disable, offset, width) in cases {
            let mut toggles = FeatureToggles::default();
            disable(&mut toggles);
            let (vector, _) = build_features(&input, &vocab, &toggles, 0.5).unwrap();
            let slice = &vector[base + offset..base + offset + width];
            assert!(
                slice.iter().all(|v| *v == 0.0),
                "expected zeroed slice at {}..{}, got {:?}",
                offset,
                offset + width,
                slice
            );
            // Everything else stays populated.
            assert_eq!(vector.len(), feature_dim(vocab.len()));
        }
    }

    #[test]
    fn test_congestion_cap_and_default() {
        assert!((congestion_feature(7.0) - 7.0 / 21.0).abs() < 1e-6);
        assert!((congestion_feature(40.0) - 1.0).abs() < 1e-6);
        assert_eq!(rest_days(&[], NaiveDate::from_ymd_opt(2024, 2, 1)), DEFAULT_REST_DAYS);
    }

    #[test]
    fn test_rest_days_from_last_match() {
        let history = vec![record("A", "B", 20, 1, 0)];
        let days = rest_days(&history, NaiveDate::from_ymd_opt(2024, 1, 25));
        assert_eq!(days, 5.0);
    }

    #[test]
    fn test_elo_scaling() {
        let (matches, vocab) = sample();
        let input = fixture_input(&matches, &matches, &matches);
        let (vector, snapshot) =
            build_features(&input, &vocab, &FeatureToggles::default(), 0.5).unwrap();
        let base = 2 * vocab.len();
        assert!((vector[base] - 1520.0 / 2000.0).abs() < 1e-6);
        assert!((vector[base + 1] - 1480.0 / 2000.0).abs() < 1e-6);
        assert_eq!(snapshot.home_elo, 1520.0);
    }
}
