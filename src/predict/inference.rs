//! Ensemble inference.
//!
//! Holds everything trained or derived during a training run: both
//! classifiers, the pinned vocabulary, histories, ratings and strengths.
//! Prediction reads this state; it never mutates it.

use std::collections::HashMap;

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::Serialize;

use crate::data::ingest::parse_date;
use crate::features::builder::{build_features, BuildInput, ReasoningSnapshot};
use crate::features::elo::EloTable;
use crate::features::strength::{poisson_outcome_probs, StrengthTable};
use crate::features::vocab::{Resolution, TeamVocabulary};
use crate::model::{OutcomeNet, SoftmaxRegression};
use crate::{EngineError, FeatureToggles, Fixture, MatchRecord, Result, Settings};

/// Softmax over three logits scaled by temperature. Non-positive or
/// non-finite temperatures degrade to 1.0 rather than poisoning the
/// distribution.
pub fn softmax_with_temperature(logits: &[f32; 3], temperature: f32) -> [f32; 3] {
    let t = if temperature > 0.0 && temperature.is_finite() {
        temperature
    } else {
        log::warn!("invalid temperature {}, using 1.0", temperature);
        1.0
    };

    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = logits.iter().map(|l| ((l - max) / t).exp()).collect();
    let sum: f32 = exp.iter().sum();
    [exp[0] / sum, exp[1] / sum, exp[2] / sum]
}

/// Weighted ensemble of the three probability triples. Weights are used
/// as given: callers supplying weights that do not sum to 1 get an
/// ensemble triple that does not sum to 1.
pub fn blend(weights: [f32; 3], nn: [f32; 3], lr: [f32; 3], poisson: [f32; 3]) -> [f32; 3] {
    let mut out = [0.0f32; 3];
    for i in 0..3 {
        out[i] = weights[0] * nn[i] + weights[1] * lr[i] + weights[2] * poisson[i];
    }
    out
}

/// Everything a caller needs to store, display and later replay one
/// prediction.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub nn_probs: [f32; 3],
    pub lr_probs: [f32; 3],
    pub poisson_probs: [f32; 3],
    pub ensemble_probs: [f32; 3],
    pub reasoning: ReasoningSnapshot,
    pub resolved_home_team: String,
    pub resolved_away_team: String,
    /// The complete effective settings: caller-supplied blend parameters
    /// plus the toggles and recency the resident models were trained with.
    pub settings_used: Settings,
}

/// Resident trained state plus the inference path over it.
pub struct Predictor<B: Backend> {
    nn: OutcomeNet<B>,
    lr: SoftmaxRegression<B>,
    vocab: TeamVocabulary,
    histories: HashMap<String, Vec<MatchRecord>>,
    matches: Vec<MatchRecord>,
    elo: EloTable,
    strengths: StrengthTable,
    toggles: FeatureToggles,
    recency_weighting: f32,
    training_data_range: usize,
    device: B::Device,
}

impl<B: Backend> Predictor<B> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        nn: OutcomeNet<B>,
        lr: SoftmaxRegression<B>,
        vocab: TeamVocabulary,
        histories: HashMap<String, Vec<MatchRecord>>,
        matches: Vec<MatchRecord>,
        elo: EloTable,
        strengths: StrengthTable,
        settings: &Settings,
        device: B::Device,
    ) -> Self {
        Predictor {
            nn,
            lr,
            vocab,
            histories,
            matches,
            elo,
            strengths,
            toggles: settings.features,
            recency_weighting: settings.recency_weighting,
            training_data_range: settings.training_data_range,
            device,
        }
    }

    pub fn vocab(&self) -> &TeamVocabulary {
        &self.vocab
    }

    fn resolve(&self, name: &str) -> Result<String> {
        match self.vocab.resolve(name) {
            Resolution::Resolved(canonical) => Ok(canonical),
            Resolution::Unresolved => Err(EngineError::UnknownTeam(name.to_string())),
        }
    }

    fn forward_logits(&self, vector: &[f32]) -> Result<([f32; 3], [f32; 3])> {
        let input = Tensor::<B, 1>::from_floats(vector, &self.device).reshape([1, vector.len()]);

        let nn = tensor_to_triple(self.nn.forward(input.clone()))?;
        let lr = tensor_to_triple(self.lr.forward(input))?;
        Ok((nn, lr))
    }

    /// Predict one fixture using the resident trained state and the
    /// caller's blend settings.
    pub fn predict(&self, fixture: &Fixture, settings: &Settings) -> Result<PredictionReport> {
        let home = self.resolve(&fixture.home_team)?;
        let away = self.resolve(&fixture.away_team)?;

        let date = fixture.date.as_deref().and_then(parse_date);
        let empty: &[MatchRecord] = &[];
        let home_history = self
            .histories
            .get(&home)
            .map(|h| h.as_slice())
            .unwrap_or(empty);
        let away_history = self
            .histories
            .get(&away)
            .map(|h| h.as_slice())
            .unwrap_or(empty);

        let input = BuildInput {
            home: &home,
            away: &away,
            date,
            home_history,
            away_history,
            earlier: &self.matches,
            home_elo: self.elo.get(&home),
            away_elo: self.elo.get(&away),
        };
        let (vector, reasoning) =
            build_features(&input, &self.vocab, &self.toggles, self.recency_weighting)?;

        let (nn_logits, lr_logits) = self.forward_logits(&vector)?;
        let nn_probs = softmax_with_temperature(&nn_logits, settings.temperature);
        let lr_probs = softmax_with_temperature(&lr_logits, settings.temperature);
        // The Poisson model is closed-form: recomputed here, never trained.
        let poisson_probs = poisson_outcome_probs(&home, &away, &self.strengths);

        let ensemble_probs = blend(
            [settings.nn_weight, settings.lr_weight, settings.poisson_weight],
            nn_probs,
            lr_probs,
            poisson_probs,
        );

        Ok(PredictionReport {
            nn_probs,
            lr_probs,
            poisson_probs,
            ensemble_probs,
            reasoning,
            resolved_home_team: home,
            resolved_away_team: away,
            settings_used: Settings {
                temperature: settings.temperature,
                nn_weight: settings.nn_weight,
                lr_weight: settings.lr_weight,
                poisson_weight: settings.poisson_weight,
                training_data_range: self.training_data_range,
                recency_weighting: self.recency_weighting,
                features: self.toggles,
            },
        })
    }
}

fn tensor_to_triple<B: Backend>(logits: Tensor<B, 2>) -> Result<[f32; 3]> {
    let data = logits.into_data();
    let values: Vec<f32> = data
        .to_vec()
        .map_err(|e| EngineError::Parse(format!("classifier output: {:?}", e)))?;
    if values.len() != 3 {
        return Err(EngineError::Parse(format!(
            "classifier produced {} outputs, expected 3",
            values.len()
        )));
    }
    Ok([values[0], values[1], values[2]])
}
