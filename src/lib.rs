//! Football match outcome prediction from historical results.
//!
//! An ensemble of two trained classifiers (an MLP and a softmax regression)
//! and a closed-form Poisson goal model, blended with configurable weights.

pub mod data;
pub mod engine;
pub mod features;
pub mod model;
pub mod predict;
pub mod training;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Full-time result from the home side's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    /// Parse the `FTR` result code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "H" => Some(Outcome::Home),
            "D" => Some(Outcome::Draw),
            "A" => Some(Outcome::Away),
            _ => None,
        }
    }

    /// Position in the [home, draw, away] probability triple.
    pub fn index(&self) -> usize {
        match self {
            Outcome::Home => 0,
            Outcome::Draw => 1,
            Outcome::Away => 2,
        }
    }

    pub fn one_hot(&self) -> [f32; 3] {
        let mut label = [0.0; 3];
        label[self.index()] = 1.0;
        label
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Home => write!(f, "H"),
            Outcome::Draw => write!(f, "D"),
            Outcome::Away => write!(f, "A"),
        }
    }
}

/// A historical match as delivered by the data source. All fields are text;
/// the engine parses and validates them itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMatch {
    #[serde(rename = "HomeTeam")]
    pub home_team: String,
    #[serde(rename = "AwayTeam")]
    pub away_team: String,
    /// Day/month/year or ISO text form.
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "FTHG", default)]
    pub full_time_home_goals: Option<String>,
    #[serde(rename = "FTAG", default)]
    pub full_time_away_goals: Option<String>,
    #[serde(rename = "FTR", default)]
    pub full_time_result: Option<String>,
    #[serde(rename = "HS", default)]
    pub home_shots: Option<String>,
    #[serde(rename = "AS", default)]
    pub away_shots: Option<String>,
    #[serde(rename = "HST", default)]
    pub home_shots_on_target: Option<String>,
    #[serde(rename = "AST", default)]
    pub away_shots_on_target: Option<String>,
}

/// A validated, immutable historical match record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub home_team: String,
    pub away_team: String,
    pub date: chrono::NaiveDate,
    pub result: Outcome,
    /// Goals are optional: a record with an unparsable goal field still
    /// counts towards histories, just not towards goal averages.
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
    pub home_shots: Option<u32>,
    pub away_shots: Option<u32>,
    pub home_shots_on_target: Option<u32>,
    pub away_shots_on_target: Option<u32>,
}

impl MatchRecord {
    /// Check whether the given team played in this match.
    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }

    /// League points earned by the given team, if it played.
    pub fn points_for(&self, team: &str) -> Option<u32> {
        if self.home_team == team {
            Some(match self.result {
                Outcome::Home => 3,
                Outcome::Draw => 1,
                Outcome::Away => 0,
            })
        } else if self.away_team == team {
            Some(match self.result {
                Outcome::Away => 3,
                Outcome::Draw => 1,
                Outcome::Home => 0,
            })
        } else {
            None
        }
    }
}

/// An upcoming fixture to predict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(rename = "HomeTeam")]
    pub home_team: String,
    #[serde(rename = "AwayTeam")]
    pub away_team: String,
    /// Same text form as historical dates. An unparsable date falls back to
    /// the default rest period rather than failing the prediction.
    #[serde(rename = "MatchDate", default)]
    pub date: Option<String>,
}

/// Per-family feature toggles. Must be applied identically at train and
/// predict time; the predictor reuses the toggles it was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    pub form: bool,
    pub h2h: bool,
    pub elo: bool,
    pub offense: bool,
    pub defense: bool,
    pub congestion: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        FeatureToggles {
            form: true,
            h2h: true,
            elo: true,
            offense: true,
            defense: true,
            congestion: true,
        }
    }
}

/// Season-range sentinel meaning "use everything".
pub const MAX_SEASON_RANGE: usize = 6;

/// Engine settings. Toggles, season range and recency weighting bind at
/// train time; temperature and blend weights bind at predict time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Softmax temperature applied to both classifiers' logits.
    pub temperature: f32,
    /// Blend weight for the MLP classifier. Each weight is expected to lie
    /// in [0, 1]. Weights are NOT renormalised: weights that do not sum to
    /// 1 produce an ensemble triple that does not sum to 1 either.
    pub nn_weight: f32,
    pub lr_weight: f32,
    pub poisson_weight: f32,
    /// Number of most recent seasons to train on; `MAX_SEASON_RANGE` keeps
    /// the full history.
    pub training_data_range: usize,
    /// Recency weighting inside the form window, 0..1.
    pub recency_weighting: f32,
    pub features: FeatureToggles,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            temperature: 1.5,
            nn_weight: 0.40,
            lr_weight: 0.25,
            poisson_weight: 0.35,
            training_data_range: MAX_SEASON_RANGE,
            recency_weighting: 0.5,
            features: FeatureToggles::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("failed to read settings file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| EngineError::Config(format!("failed to parse settings: {}", e)))
    }
}

/// Application-wide errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Models not trained yet - send a train command first")]
    NotReady,

    #[error("Not enough historical matches: have {have}, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("No valid training examples could be generated")]
    EmptyTrainingSet,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Engine is gone: {0}")]
    Channel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
