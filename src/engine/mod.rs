//! Engine coordinator.
//!
//! Runs the whole pipeline on a dedicated worker thread so callers never
//! block on training. Commands go in over one channel; progress and
//! completion events come back over another, and each prediction gets its
//! own reply channel so results never interleave.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::tensor::backend::Backend;

use crate::data::{filter_recent_seasons, parse_matches};
use crate::features::elo::{EloConfig, EloTable};
use crate::features::strength::compute_team_strengths;
use crate::model::{OutcomeNet, OutcomeNetConfig, SoftmaxRegression};
use crate::predict::{PredictionReport, Predictor};
use crate::training::{assemble_training_set, fit, FitConfig};
use crate::{EngineError, Fixture, RawMatch, Result, Settings};

/// Training runs with gradients; inference runs on the inner backend,
/// which also leaves dropout inert.
pub type TrainBackend = Autodiff<NdArray<f32>>;
pub type InferBackend = NdArray<f32>;

/// Minimum raw match count before training is attempted at all.
pub const MIN_TRAINING_MATCHES: usize = 50;

const NN_EARLY_STOPPING_PATIENCE: usize = 5;

enum Command {
    Train {
        matches: Vec<RawMatch>,
        settings: Settings,
    },
    Predict {
        fixture: Fixture,
        settings: Settings,
        reply: Sender<Result<PredictionReport>>,
    },
    Shutdown,
}

/// What a completed training run looked like.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub examples: usize,
    pub teams: usize,
    pub min_rating: f32,
    pub max_rating: f32,
    pub nn_epochs: usize,
    pub lr_epochs: usize,
}

/// Asynchronous notifications from the worker.
#[derive(Debug)]
pub enum Event {
    Progress(String),
    Trained(TrainingSummary),
    TrainingFailed(EngineError),
}

/// Handle to the worker thread. Dropping it shuts the worker down.
pub struct EngineHandle {
    commands: Sender<Command>,
    events: Receiver<Event>,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn spawn() -> Self {
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let worker = thread::spawn(move || run_worker(command_rx, event_tx));

        EngineHandle {
            commands: command_tx,
            events: event_rx,
            worker: Some(worker),
        }
    }

    /// Train on the given history, blocking until the run finishes.
    /// Progress events are logged as they arrive.
    pub fn train(&self, matches: Vec<RawMatch>, settings: Settings) -> Result<TrainingSummary> {
        self.commands
            .send(Command::Train { matches, settings })
            .map_err(|e| EngineError::Channel(e.to_string()))?;

        loop {
            match self
                .events
                .recv()
                .map_err(|e| EngineError::Channel(e.to_string()))?
            {
                Event::Progress(message) => log::info!("{}", message),
                Event::Trained(summary) => return Ok(summary),
                Event::TrainingFailed(error) => return Err(error),
            }
        }
    }

    /// Predict one fixture, blocking on the worker's reply.
    pub fn predict(&self, fixture: &Fixture, settings: &Settings) -> Result<PredictionReport> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.commands
            .send(Command::Predict {
                fixture: fixture.clone(),
                settings: settings.clone(),
                reply: reply_tx,
            })
            .map_err(|e| EngineError::Channel(e.to_string()))?;

        reply_rx
            .recv()
            .map_err(|e| EngineError::Channel(e.to_string()))?
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_worker(commands: Receiver<Command>, events: Sender<Event>) {
    let mut predictor: Option<Predictor<InferBackend>> = None;

    while let Ok(command) = commands.recv() {
        match command {
            Command::Train { matches, settings } => {
                // A retrain invalidates the resident model immediately, so a
                // failed run leaves the engine not-ready rather than serving
                // stale state.
                predictor = None;
                match train_models(&matches, &settings, &events) {
                    Ok((trained, summary)) => {
                        predictor = Some(trained);
                        let _ = events.send(Event::Trained(summary));
                    }
                    Err(error) => {
                        log::error!("training failed: {}", error);
                        let _ = events.send(Event::TrainingFailed(error));
                    }
                }
            }
            Command::Predict {
                fixture,
                settings,
                reply,
            } => {
                let result = match predictor.as_ref() {
                    Some(p) => p.predict(&fixture, &settings),
                    None => Err(EngineError::NotReady),
                };
                let _ = reply.send(result);
            }
            Command::Shutdown => break,
        }
    }
}

fn progress(events: &Sender<Event>, message: impl Into<String>) {
    let _ = events.send(Event::Progress(message.into()));
}

/// Full training pipeline: validate, parse, derive ratings and strengths,
/// assemble examples, fit both classifiers, and freeze everything into a
/// predictor on the inference backend.
fn train_models(
    raw: &[RawMatch],
    settings: &Settings,
    events: &Sender<Event>,
) -> Result<(Predictor<InferBackend>, TrainingSummary)> {
    if raw.len() < MIN_TRAINING_MATCHES {
        return Err(EngineError::InsufficientData {
            have: raw.len(),
            need: MIN_TRAINING_MATCHES,
        });
    }

    progress(events, "Processing match data");
    let records = parse_matches(raw);
    let records = filter_recent_seasons(records, settings.training_data_range);

    progress(events, "Assembling training examples");
    let set = assemble_training_set(&records, &settings.features, settings.recency_weighting);
    if set.is_empty() {
        return Err(EngineError::EmptyTrainingSet);
    }

    progress(events, "Calculating team ratings");
    let elo = EloTable::compute(&records, &set.vocab, EloConfig::default());
    let strengths = compute_team_strengths(&records);

    let device = <TrainBackend as Backend>::Device::default();

    progress(events, "Training neural network");
    let nn = OutcomeNet::<TrainBackend>::new(&device, &OutcomeNetConfig::new(set.input_dim()));
    let nn_config = FitConfig::with_early_stopping(NN_EARLY_STOPPING_PATIENCE);
    let (nn, nn_history) = fit(
        nn,
        |model, batch| model.forward(batch),
        &set.features,
        &set.labels,
        &nn_config,
        &device,
        |epoch, total| progress(events, format!("Training neural network: epoch {}/{}", epoch, total)),
    )?;

    progress(events, "Training logistic regression");
    let lr = SoftmaxRegression::<TrainBackend>::new(&device, set.input_dim());
    let lr_config = FitConfig::default();
    let (lr, lr_history) = fit(
        lr,
        |model, batch| model.forward(batch),
        &set.features,
        &set.labels,
        &lr_config,
        &device,
        |epoch, total| {
            progress(
                events,
                format!("Training logistic regression: epoch {}/{}", epoch, total),
            )
        },
    )?;

    let summary = TrainingSummary {
        examples: set.len(),
        teams: set.vocab.len(),
        min_rating: elo.min_rating,
        max_rating: elo.max_rating,
        nn_epochs: nn_history.epochs_run(),
        lr_epochs: lr_history.epochs_run(),
    };

    log::info!(
        "training complete: {} examples, {} teams, ratings {:.0}-{:.0}",
        summary.examples,
        summary.teams,
        summary.min_rating,
        summary.max_rating
    );

    let infer_device = <InferBackend as Backend>::Device::default();
    let predictor = Predictor::new(
        nn.valid(),
        lr.valid(),
        set.vocab,
        set.histories,
        records,
        elo,
        strengths,
        settings,
        infer_device,
    );

    Ok((predictor, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two-team weekly fixture list, home side always winning.
    fn synthetic_raw(n: usize) -> Vec<RawMatch> {
        let start = chrono::NaiveDate::from_ymd_opt(2023, 8, 5).unwrap();
        (0..n)
            .map(|i| {
                let (home, away) = if i % 2 == 0 { ("A", "B") } else { ("B", "A") };
                let date = start + chrono::Duration::days(7 * i as i64);
                RawMatch {
                    home_team: home.to_string(),
                    away_team: away.to_string(),
                    date: date.format("%d/%m/%Y").to_string(),
                    full_time_home_goals: Some("2".to_string()),
                    full_time_away_goals: Some("0".to_string()),
                    full_time_result: Some("H".to_string()),
                    home_shots: Some("10".to_string()),
                    away_shots: Some("5".to_string()),
                    home_shots_on_target: Some("4".to_string()),
                    away_shots_on_target: Some("2".to_string()),
                }
            })
            .collect()
    }

    #[test]
    fn test_progress_reported_for_both_classifiers() {
        let (tx, rx) = mpsc::channel();
        train_models(&synthetic_raw(60), &Settings::default(), &tx).unwrap();

        let messages: Vec<String> = rx
            .try_iter()
            .filter_map(|event| match event {
                Event::Progress(message) => Some(message),
                _ => None,
            })
            .collect();

        assert!(messages
            .iter()
            .any(|m| m.starts_with("Training neural network: epoch")));
        assert!(messages
            .iter()
            .any(|m| m.starts_with("Training logistic regression: epoch")));
    }

    #[test]
    fn test_predict_before_training_is_not_ready() {
        let engine = EngineHandle::spawn();
        let fixture = Fixture {
            home_team: "Arsenal".to_string(),
            away_team: "Chelsea".to_string(),
            date: None,
        };
        let err = engine.predict(&fixture, &Settings::default()).unwrap_err();
        assert!(matches!(err, EngineError::NotReady));
    }

    #[test]
    fn test_training_rejects_small_history() {
        let engine = EngineHandle::spawn();
        let err = engine.train(Vec::new(), Settings::default()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientData { have: 0, need: MIN_TRAINING_MATCHES }
        ));
    }
}
