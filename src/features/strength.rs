//! Poisson goal-rate model.
//!
//! Closed-form team strength estimation: per-team attack/defence
//! multipliers relative to league-average goals, recomputed from the full
//! match set rather than updated incrementally.

use std::collections::HashMap;

use crate::MatchRecord;

/// Scorelines are enumerated up to this many goals per side. Mass beyond
/// the cap is dropped and the triple renormalised over what was
/// enumerated, a small known bias inherited from the model definition.
const MAX_GOALS: u32 = 5;

/// Neutral triple used whenever the model cannot produce a finite answer.
const FALLBACK: [f32; 3] = [0.33, 0.34, 0.33];

/// Attack/defence multipliers for one team, split by venue. A multiplier
/// of zero means "no appearances at that venue", i.e. insufficient data,
/// not literal zero strength.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamStrength {
    pub home_attack: f32,
    pub home_defence: f32,
    pub away_attack: f32,
    pub away_defence: f32,
    pub home_games: u32,
    pub away_games: u32,
}

/// Strength multipliers for every team plus the league goal averages.
#[derive(Debug, Clone, Default)]
pub struct StrengthTable {
    strengths: HashMap<String, TeamStrength>,
    pub avg_home_goals: f32,
    pub avg_away_goals: f32,
}

impl StrengthTable {
    pub fn get(&self, team: &str) -> Option<&TeamStrength> {
        self.strengths.get(team)
    }

    pub fn len(&self) -> usize {
        self.strengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty()
    }
}

/// Accumulate per-team goal averages over the full match set. Matches with
/// unparsable goal counts are ignored.
pub fn compute_team_strengths(matches: &[MatchRecord]) -> StrengthTable {
    let mut strengths: HashMap<String, TeamStrength> = HashMap::new();
    let mut total_home_goals = 0u32;
    let mut total_away_goals = 0u32;
    let mut games = 0u32;

    for m in matches {
        let (home_goals, away_goals) = match (m.home_goals, m.away_goals) {
            (Some(h), Some(a)) => (h, a),
            _ => continue,
        };

        let home = strengths.entry(m.home_team.clone()).or_default();
        home.home_attack += home_goals as f32;
        home.home_defence += away_goals as f32;
        home.home_games += 1;

        let away = strengths.entry(m.away_team.clone()).or_default();
        away.away_attack += away_goals as f32;
        away.away_defence += home_goals as f32;
        away.away_games += 1;

        total_home_goals += home_goals;
        total_away_goals += away_goals;
        games += 1;
    }

    // A goalless league average would zero every multiplier, so it is
    // floored to one goal per game.
    let avg_home_goals = if games > 0 && total_home_goals > 0 {
        total_home_goals as f32 / games as f32
    } else {
        1.0
    };
    let avg_away_goals = if games > 0 && total_away_goals > 0 {
        total_away_goals as f32 / games as f32
    } else {
        1.0
    };

    for strength in strengths.values_mut() {
        if strength.home_games > 0 {
            let n = strength.home_games as f32;
            strength.home_attack = (strength.home_attack / n) / avg_home_goals;
            strength.home_defence = (strength.home_defence / n) / avg_away_goals;
        }
        if strength.away_games > 0 {
            let n = strength.away_games as f32;
            strength.away_attack = (strength.away_attack / n) / avg_away_goals;
            strength.away_defence = (strength.away_defence / n) / avg_home_goals;
        }
    }

    StrengthTable {
        strengths,
        avg_home_goals,
        avg_away_goals,
    }
}

/// Poisson mass P(k; λ). Zero for non-positive or non-finite λ.
fn poisson_pmf(k: u32, lambda: f32) -> f32 {
    if lambda <= 0.0 || !lambda.is_finite() {
        return 0.0;
    }
    const FACTORIALS: [f32; 6] = [1.0, 1.0, 2.0, 6.0, 24.0, 120.0];
    lambda.powi(k as i32) * (-lambda).exp() / FACTORIALS[k as usize]
}

/// Outcome probabilities [home, draw, away] by enumerating joint
/// scorelines. Falls back to a neutral triple when either team is unknown
/// or either λ is unusable.
pub fn poisson_outcome_probs(home: &str, away: &str, table: &StrengthTable) -> [f32; 3] {
    let (home_strength, away_strength) = match (table.get(home), table.get(away)) {
        (Some(h), Some(a)) => (h, a),
        _ => return FALLBACK,
    };

    let lambda_home = home_strength.home_attack * away_strength.away_defence * table.avg_home_goals;
    let lambda_away = away_strength.away_attack * home_strength.home_defence * table.avg_away_goals;

    let mut home_win = 0.0f32;
    let mut draw = 0.0f32;
    let mut away_win = 0.0f32;

    for i in 0..=MAX_GOALS {
        for j in 0..=MAX_GOALS {
            let p = poisson_pmf(i, lambda_home) * poisson_pmf(j, lambda_away);
            if i > j {
                home_win += p;
            } else if i < j {
                away_win += p;
            } else {
                draw += p;
            }
        }
    }

    let total = home_win + draw + away_win;
    if total <= 0.0 || !total.is_finite() {
        return FALLBACK;
    }
    [home_win / total, draw / total, away_win / total]
}
