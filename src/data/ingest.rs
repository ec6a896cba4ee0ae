//! Raw match validation.
//!
//! The upstream feed is chronologically unordered and stringly typed; the
//! engine owns sorting, date parsing and field validation.

use chrono::{Datelike, NaiveDate};

use crate::{MatchRecord, Outcome, RawMatch, MAX_SEASON_RANGE};

/// Accepted date text forms, tried in order. Two-digit years map into the
/// 2000s via `%y`.
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d/%m/%y", "%Y-%m-%d"];

/// Parse a date in any of the accepted forms.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

fn parse_count(field: &Option<String>) -> Option<u32> {
    field.as_deref().and_then(|v| v.trim().parse().ok())
}

/// Validate one raw record. Returns None when the date or result code is
/// unusable; optional statistics stay optional.
fn parse_match(raw: &RawMatch) -> Option<MatchRecord> {
    if raw.home_team.is_empty() || raw.away_team.is_empty() {
        return None;
    }
    let date = parse_date(&raw.date)?;
    let result = Outcome::from_code(raw.full_time_result.as_deref()?)?;

    Some(MatchRecord {
        home_team: raw.home_team.clone(),
        away_team: raw.away_team.clone(),
        date,
        result,
        home_goals: parse_count(&raw.full_time_home_goals),
        away_goals: parse_count(&raw.full_time_away_goals),
        home_shots: parse_count(&raw.home_shots),
        away_shots: parse_count(&raw.away_shots),
        home_shots_on_target: parse_count(&raw.home_shots_on_target),
        away_shots_on_target: parse_count(&raw.away_shots_on_target),
    })
}

/// Parse and chronologically sort a batch of raw matches. Malformed records
/// are dropped with a log line rather than failing the whole run.
pub fn parse_matches(raw: &[RawMatch]) -> Vec<MatchRecord> {
    let mut records: Vec<MatchRecord> = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;

    for m in raw {
        match parse_match(m) {
            Some(record) => records.push(record),
            None => {
                dropped += 1;
                log::debug!(
                    "dropping malformed match record: {} vs {} on {:?}",
                    m.home_team,
                    m.away_team,
                    m.date
                );
            }
        }
    }

    if dropped > 0 {
        log::warn!("dropped {} malformed match records", dropped);
    }

    records.sort_by(|a, b| a.date.cmp(&b.date));
    records
}

/// Season end year for a date: the season rolls over in August, so an
/// August-or-later date belongs to the season ending the following year.
pub fn season_end_year(date: NaiveDate) -> i32 {
    if date.month() >= 8 {
        date.year() + 1
    } else {
        date.year()
    }
}

/// Keep only the `range` most recent seasons. `MAX_SEASON_RANGE` (or more)
/// keeps everything. Input must already be sorted chronologically.
pub fn filter_recent_seasons(records: Vec<MatchRecord>, range: usize) -> Vec<MatchRecord> {
    if range >= MAX_SEASON_RANGE || records.is_empty() {
        return records;
    }

    let mut seasons: Vec<i32> = records.iter().map(|m| season_end_year(m.date)).collect();
    seasons.sort_unstable();
    seasons.dedup();

    let keep: Vec<i32> = seasons.into_iter().rev().take(range).collect();
    records
        .into_iter()
        .filter(|m| keep.contains(&season_end_year(m.date)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(home: &str, away: &str, date: &str, result: &str) -> RawMatch {
        RawMatch {
            home_team: home.to_string(),
            away_team: away.to_string(),
            date: date.to_string(),
            full_time_home_goals: Some("2".to_string()),
            full_time_away_goals: Some("1".to_string()),
            full_time_result: Some(result.to_string()),
            home_shots: None,
            away_shots: None,
            home_shots_on_target: None,
            away_shots_on_target: None,
        }
    }

    #[test]
    fn test_parse_date_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 12, 26).unwrap();
        assert_eq!(parse_date("26/12/2024"), Some(expected));
        assert_eq!(parse_date("26/12/24"), Some(expected));
        assert_eq!(parse_date("2024-12-26"), Some(expected));
        assert_eq!(parse_date("tomorrow"), None);
    }

    #[test]
    fn test_malformed_records_dropped() {
        let batch = vec![
            raw("Arsenal", "Chelsea", "26/12/24", "H"),
            raw("Leeds", "Everton", "not a date", "A"),
            raw("Wolves", "Fulham", "27/12/24", "?"),
        ];
        let parsed = parse_matches(&batch);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].home_team, "Arsenal");
    }

    #[test]
    fn test_chronological_sort() {
        let batch = vec![
            raw("A", "B", "10/03/24", "H"),
            raw("C", "D", "01/09/23", "D"),
            raw("E", "F", "15/01/24", "A"),
        ];
        let parsed = parse_matches(&batch);
        let dates: Vec<_> = parsed.iter().map(|m| m.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
    }

    #[test]
    fn test_season_boundary_flips_in_august() {
        let july = NaiveDate::from_ymd_opt(2024, 7, 31).unwrap();
        let august = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        assert_eq!(season_end_year(july), 2024);
        assert_eq!(season_end_year(august), 2025);
    }

    #[test]
    fn test_season_window_keeps_most_recent() {
        let batch = vec![
            raw("A", "B", "01/09/21", "H"), // season 2022
            raw("A", "B", "01/09/22", "H"), // season 2023
            raw("A", "B", "01/09/23", "H"), // season 2024
        ];
        let parsed = parse_matches(&batch);
        let filtered = filter_recent_seasons(parsed, 2);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|m| season_end_year(m.date) >= 2023));
    }
}
