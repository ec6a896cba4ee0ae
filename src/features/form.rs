//! Recent-form and head-to-head statistics.

use serde::Serialize;

use crate::MatchRecord;

/// Form window size: the most recent N matches feed the weighted averages.
pub const FORM_WINDOW: usize = 5;

/// Head-to-head window: the last N meetings between a pair.
pub const H2H_WINDOW: usize = 5;

/// Which of a team's past matches to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Venue {
    Overall,
    Home,
    Away,
}

/// Recency-weighted form over the last few matches of one team.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormStats {
    /// Matches available after venue filtering, including ones whose goal
    /// fields could not be parsed.
    pub games_played: usize,
    /// Weighted points per game, normalised to 0..1 (3 points = 1.0).
    pub form_points: f32,
    pub avg_goals_scored: f32,
    pub avg_goals_conceded: f32,
    pub avg_shots: f32,
    pub avg_shots_on_target: f32,
    pub avg_shots_against: f32,
    pub avg_shots_on_target_against: f32,
    /// Shots on target per shot.
    pub shooting_accuracy: f32,
    /// Goals per shot on target.
    pub conversion_rate: f32,
}

/// Linear recency weights, oldest to newest. At weighting 0.5 they are
/// uniform; above 0.5 newer matches dominate.
fn recency_weights(n: usize, weighting: f32) -> Vec<f32> {
    let span = (n.saturating_sub(1)).max(1) as f32;
    (0..n)
        .map(|i| (1.0 - weighting) + 2.0 * weighting * (i as f32 / span))
        .collect()
}

/// Weighted form over the team's most recent matches.
///
/// `past` must be the team's chronological history strictly before the
/// fixture being evaluated. Matches whose goal fields failed to parse keep
/// their weight in the denominator but contribute nothing to the sums.
pub fn form_stats(team: &str, past: &[MatchRecord], weighting: f32, venue: Venue) -> FormStats {
    let relevant: Vec<&MatchRecord> = past
        .iter()
        .filter(|m| match venue {
            Venue::Overall => m.involves(team),
            Venue::Home => m.home_team == team,
            Venue::Away => m.away_team == team,
        })
        .collect();

    let games_played = relevant.len();
    let window = &relevant[games_played.saturating_sub(FORM_WINDOW)..];
    if window.is_empty() {
        return FormStats {
            games_played,
            ..FormStats::default()
        };
    }

    let weights = recency_weights(window.len(), weighting);
    let total_weight: f32 = weights.iter().sum();
    if total_weight <= 0.0 {
        return FormStats {
            games_played,
            ..FormStats::default()
        };
    }

    let mut points = 0.0f32;
    let mut goals_scored = 0.0f32;
    let mut goals_conceded = 0.0f32;
    let mut shots = 0.0f32;
    let mut shots_on_target = 0.0f32;
    let mut shots_against = 0.0f32;
    let mut shots_on_target_against = 0.0f32;

    for (m, &w) in window.iter().zip(weights.iter()) {
        let is_home = m.home_team == team;
        let (scored, conceded) = if is_home {
            (m.home_goals, m.away_goals)
        } else {
            (m.away_goals, m.home_goals)
        };
        let Some(scored) = scored else { continue };

        if let Some(p) = m.points_for(team) {
            points += p as f32 * w;
        }
        goals_scored += scored as f32 * w;
        goals_conceded += conceded.unwrap_or(0) as f32 * w;

        let (sf, sot, sa, sota) = if is_home {
            (
                m.home_shots,
                m.home_shots_on_target,
                m.away_shots,
                m.away_shots_on_target,
            )
        } else {
            (
                m.away_shots,
                m.away_shots_on_target,
                m.home_shots,
                m.home_shots_on_target,
            )
        };
        shots += sf.unwrap_or(0) as f32 * w;
        shots_on_target += sot.unwrap_or(0) as f32 * w;
        shots_against += sa.unwrap_or(0) as f32 * w;
        shots_on_target_against += sota.unwrap_or(0) as f32 * w;
    }

    let avg_goals_scored = goals_scored / total_weight;
    let avg_shots = shots / total_weight;
    let avg_shots_on_target = shots_on_target / total_weight;

    FormStats {
        games_played,
        form_points: points / (total_weight * 3.0),
        avg_goals_scored,
        avg_goals_conceded: goals_conceded / total_weight,
        avg_shots,
        avg_shots_on_target,
        avg_shots_against: shots_against / total_weight,
        avg_shots_on_target_against: shots_on_target_against / total_weight,
        shooting_accuracy: if avg_shots > 0.0 {
            avg_shots_on_target / avg_shots
        } else {
            0.0
        },
        conversion_rate: if avg_shots_on_target > 0.0 {
            avg_goals_scored / avg_shots_on_target
        } else {
            0.0
        },
    }
}

/// Head-to-head record over the pair's last meetings, seen from the
/// current fixture's home side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HeadToHead {
    pub home_wins: usize,
    pub draws: usize,
    pub away_wins: usize,
    pub meetings: usize,
    /// Laplace-smoothed outcome ratios, robust to tiny samples.
    pub p_home: f32,
    pub p_draw: f32,
    pub p_away: f32,
}

/// Tally the last meetings between `home` and `away` (either venue order)
/// among matches strictly before the fixture.
pub fn head_to_head(home: &str, away: &str, earlier: &[MatchRecord]) -> HeadToHead {
    let meetings: Vec<&MatchRecord> = earlier
        .iter()
        .filter(|m| {
            (m.home_team == home && m.away_team == away)
                || (m.home_team == away && m.away_team == home)
        })
        .collect();
    let window = &meetings[meetings.len().saturating_sub(H2H_WINDOW)..];

    let mut tally = HeadToHead {
        meetings: window.len(),
        ..HeadToHead::default()
    };
    for m in window {
        match m.points_for(home) {
            Some(3) => tally.home_wins += 1,
            Some(1) => tally.draws += 1,
            _ => tally.away_wins += 1,
        }
    }

    // Add-one smoothing over the three outcome buckets.
    let denominator = (window.len() + 3) as f32;
    tally.p_home = (tally.home_wins + 1) as f32 / denominator;
    tally.p_draw = (tally.draws + 1) as f32 / denominator;
    tally.p_away = (tally.away_wins + 1) as f32 / denominator;
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Outcome;
    use chrono::NaiveDate;

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
            home_shots: Some(10),
            away_shots: Some(8),
            home_shots_on_target: Some(5),
            away_shots_on_target: Some(4),
        }
    }

    #[test]
    fn test_uniform_weights_at_half() {
        let weights = recency_weights(5, 0.5);
        assert!((weights[0] - 0.5).abs() < 1e-6);
        assert!((weights[4] - 1.5).abs() < 1e-6);
        // Linear ramp.
        assert!((weights[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_weighting_is_flat() {
        let weights = recency_weights(5, 0.0);
        assert!(weights.iter().all(|w| (w - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_perfect_form_is_one() {
        // Three home wins with flat weighting: 3 points per game.
        let past = vec![
            record("A", "B", 1, 2, 0),
            record("A", "C", 2, 1, 0),
            record("A", "D", 3, 3, 1),
        ];
        let stats = form_stats("A", &past, 0.0, Venue::Home);
        assert_eq!(stats.games_played, 3);
        assert!((stats.form_points - 1.0).abs() < 1e-6);
        assert!((stats.avg_goals_scored - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_venue_filter() {
        let past = vec![
            record("A", "B", 1, 2, 0), // home
            record("B", "A", 2, 0, 1), // away win for A
        ];
        let home_only = form_stats("A", &past, 0.5, Venue::Home);
        assert_eq!(home_only.games_played, 1);
        let away_only = form_stats("A", &past, 0.5, Venue::Away);
        assert_eq!(away_only.games_played, 1);
        let overall = form_stats("A", &past, 0.5, Venue::Overall);
        assert_eq!(overall.games_played, 2);
        assert!((overall.form_points - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_window_limits_to_recent_five() {
        let past: Vec<MatchRecord> = (1..=8).map(|d| record("A", "B", d, 1, 0)).collect();
        let stats = form_stats("A", &past, 0.5, Venue::Home);
        // All eight count as games played, only five feed the averages.
        assert_eq!(stats.games_played, 8);
        assert!((stats.form_points - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_unparsable_goals_keep_weight() {
        let mut missing = record("A", "B", 2, 0, 0);
        missing.home_goals = None;
        missing.away_goals = None;
        let past = vec![record("A", "C", 1, 3, 0), missing];
        let stats = form_stats("A", &past, 0.0, Venue::Home);
        assert_eq!(stats.games_played, 2);
        // One 3-goal match over two units of weight.
        assert!((stats.avg_goals_scored - 1.5).abs() < 1e-6);
        assert!((stats.form_points - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_efficiency_ratios() {
        let past = vec![record("A", "B", 1, 2, 0)];
        let stats = form_stats("A", &past, 0.5, Venue::Home);
        assert!((stats.shooting_accuracy - 0.5).abs() < 1e-6); // 5 / 10
        assert!((stats.conversion_rate - 0.4).abs() < 1e-6); // 2 / 5
    }

    #[test]
    fn test_empty_history() {
        let stats = form_stats("A", &[], 0.5, Venue::Overall);
        assert_eq!(stats.games_played, 0);
        assert_eq!(stats.form_points, 0.0);
    }

    #[test]
    fn test_h2h_perspective_and_smoothing() {
        let earlier = vec![
            record("A", "B", 1, 2, 0), // A wins at home
            record("B", "A", 2, 0, 1), // A wins away
            record("A", "B", 3, 1, 1), // draw
        ];
        let h2h = head_to_head("A", "B", &earlier);
        assert_eq!(h2h.home_wins, 2);
        assert_eq!(h2h.draws, 1);
        assert_eq!(h2h.away_wins, 0);
        // Smoothed: (2+1)/6, (1+1)/6, (0+1)/6.
        assert!((h2h.p_home - 0.5).abs() < 1e-6);
        assert!((h2h.p_draw - 1.0 / 3.0).abs() < 1e-6);
        assert!((h2h.p_away - 1.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_h2h_no_meetings_is_uniform() {
        let h2h = head_to_head("A", "B", &[]);
        assert_eq!(h2h.meetings, 0);
        assert!((h2h.p_home - 1.0 / 3.0).abs() < 1e-6);
        assert!((h2h.p_draw - 1.0 / 3.0).abs() < 1e-6);
        assert!((h2h.p_away - 1.0 / 3.0).abs() < 1e-6);
    }
}
