//! Canonical team vocabulary.
//!
//! The vocabulary pins every team name seen at training time to a one-hot
//! feature position. It is a versioned artifact of training-set assembly:
//! inference must reuse it unchanged, and a fixture naming a team outside
//! it is rejected rather than silently grown into the vocabulary.

use std::collections::HashMap;

use crate::MatchRecord;

/// Known name variants mapped to the canonical form used by the data feed.
const TEAM_NAME_ALIASES: &[(&str, &str)] = &[
    ("Wolverhampton Wanderers", "Wolves"),
    ("Man Utd", "Man United"),
    ("Manchester United", "Man United"),
    ("Tottenham Hotspur", "Tottenham"),
    ("West Bromwich Albion", "West Brom"),
    ("Nottingham Forest", "Nott'm Forest"),
    ("Sheffield Wednesday", "Sheff Wed"),
    ("Queens Park Rangers", "QPR"),
    ("Brighton & Hove Albion", "Brighton"),
];

/// Result of resolving an external team name against the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    Unresolved,
}

/// Fixed enumeration of team identities, in first-appearance order.
#[derive(Debug, Clone, Default)]
pub struct TeamVocabulary {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl TeamVocabulary {
    /// Build from a chronologically sorted match set. One-hot positions
    /// follow first appearance, so the same match set always produces the
    /// same vocabulary.
    pub fn from_matches(matches: &[MatchRecord]) -> Self {
        let mut vocab = TeamVocabulary::default();
        for m in matches {
            vocab.insert(&m.home_team);
            vocab.insert(&m.away_team);
        }
        vocab
    }

    fn insert(&mut self, name: &str) {
        if name.is_empty() || self.index.contains_key(name) {
            return;
        }
        self.index.insert(name.to_string(), self.names.len());
        self.names.push(name.to_string());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// One-hot position of a canonical name.
    pub fn position(&self, canonical: &str) -> Option<usize> {
        self.index.get(canonical).copied()
    }

    pub fn contains(&self, canonical: &str) -> bool {
        self.index.contains_key(canonical)
    }

    /// Resolve an external name to its canonical vocabulary entry: exact
    /// match first, then the alias table, then a case-insensitive
    /// substring fallback over canonical names.
    pub fn resolve(&self, name: &str) -> Resolution {
        if self.index.contains_key(name) {
            return Resolution::Resolved(name.to_string());
        }

        if let Some((_, canonical)) = TEAM_NAME_ALIASES.iter().find(|(alias, _)| *alias == name) {
            if self.index.contains_key(*canonical) {
                return Resolution::Resolved(canonical.to_string());
            }
        }

        let needle = name.to_lowercase();
        for canonical in &self.names {
            if canonical.to_lowercase().contains(&needle) {
                return Resolution::Resolved(canonical.clone());
            }
        }

        Resolution::Unresolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Outcome;
    use chrono::NaiveDate;

    fn record(home: &str, away: &str) -> MatchRecord {
        MatchRecord {
            home_team: home.to_string(),
            away_team: away.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            result: Outcome::Home,
            home_goals: Some(1),
            away_goals: Some(0),
            home_shots: None,
            away_shots: None,
            home_shots_on_target: None,
            away_shots_on_target: None,
        }
    }

    #[test]
    fn test_first_appearance_order() {
        let matches = vec![record("Wolves", "Brighton"), record("Brighton", "Man United")];
        let vocab = TeamVocabulary::from_matches(&matches);
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.position("Wolves"), Some(0));
        assert_eq!(vocab.position("Brighton"), Some(1));
        assert_eq!(vocab.position("Man United"), Some(2));
    }

    #[test]
    fn test_alias_resolution() {
        let vocab = TeamVocabulary::from_matches(&[record("Wolves", "Man United")]);
        assert_eq!(
            vocab.resolve("Wolverhampton Wanderers"),
            Resolution::Resolved("Wolves".to_string())
        );
        assert_eq!(
            vocab.resolve("Manchester United"),
            Resolution::Resolved("Man United".to_string())
        );
    }

    #[test]
    fn test_substring_fallback() {
        let vocab = TeamVocabulary::from_matches(&[record("Nott'm Forest", "Sheff Wed")]);
        assert_eq!(
            vocab.resolve("sheff"),
            Resolution::Resolved("Sheff Wed".to_string())
        );
    }

    #[test]
    fn test_unknown_name_is_unresolved() {
        let vocab = TeamVocabulary::from_matches(&[record("Wolves", "Brighton")]);
        assert_eq!(vocab.resolve("Atlantis FC"), Resolution::Unresolved);
    }
}
