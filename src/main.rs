//! Football Match Prediction CLI
//!
//! Trains an ensemble (MLP + logistic regression + Poisson goal model) on a
//! JSON match history and predicts fixture outcomes.

use clap::{Parser, Subcommand};
use matchcast::engine::EngineHandle;
use matchcast::predict::PredictionReport;
use matchcast::{EngineError, Fixture, RawMatch, Result, Settings};

#[derive(Parser)]
#[command(name = "matchcast")]
#[command(about = "Football match outcome prediction", long_about = None)]
struct Cli {
    /// Settings file path
    #[arg(short, long, default_value = "settings.toml")]
    settings: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the ensemble and report what it learned
    Train {
        /// JSON file holding an array of historical matches
        data: String,
    },
    /// Train on a history, then predict one fixture
    Predict {
        /// JSON file holding an array of historical matches
        data: String,
        /// Home team name
        home: String,
        /// Away team name
        away: String,
        /// Fixture date (e.g. 26/12/2024); omitted means a default rest period
        #[arg(long)]
        date: Option<String>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Write a default settings file
    Init,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create settings
    let settings = if std::path::Path::new(&cli.settings).exists() {
        match Settings::load(&cli.settings) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error loading settings: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Settings::default()
    };

    let result = match cli.command {
        Commands::Train { data } => commands::train(&settings, &data),
        Commands::Predict {
            data,
            home,
            away,
            date,
            format,
        } => commands::predict(&settings, &data, &home, &away, date, format),
        Commands::Init => commands::init(&cli.settings),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;

    pub fn init(settings_path: &str) -> Result<()> {
        let settings = Settings::default();
        let content = toml::to_string_pretty(&settings)
            .map_err(|e| EngineError::Config(format!("failed to serialise settings: {}", e)))?;
        std::fs::write(settings_path, content)?;
        println!("Created default settings at {}", settings_path);

        println!("\nNext steps:");
        println!("  1. Edit {} to tune blend weights and features", settings_path);
        println!("  2. Run 'matchcast train matches.json' to check the training run");
        println!("  3. Run 'matchcast predict matches.json \"Team A\" \"Team B\"'");

        Ok(())
    }

    fn load_matches(path: &str) -> Result<Vec<RawMatch>> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| EngineError::Parse(format!("failed to parse match data: {}", e)))
    }

    pub fn train(settings: &Settings, data_path: &str) -> Result<()> {
        let matches = load_matches(data_path)?;
        println!("Loaded {} raw matches from {}", matches.len(), data_path);

        let engine = EngineHandle::spawn();
        let summary = engine.train(matches, settings.clone())?;

        println!("\nTraining complete!");
        println!("  Examples:       {}", summary.examples);
        println!("  Teams:          {}", summary.teams);
        println!(
            "  Rating range:   {:.0} - {:.0}",
            summary.min_rating, summary.max_rating
        );
        println!("  MLP epochs:     {}", summary.nn_epochs);
        println!("  Logistic epochs:{}", summary.lr_epochs);

        Ok(())
    }

    pub fn predict(
        settings: &Settings,
        data_path: &str,
        home: &str,
        away: &str,
        date: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        let matches = load_matches(data_path)?;

        let engine = EngineHandle::spawn();
        engine.train(matches, settings.clone())?;

        let fixture = Fixture {
            home_team: home.to_string(),
            away_team: away.to_string(),
            date,
        };
        let report = engine.predict(&fixture, settings)?;

        match format {
            OutputFormat::Table => print_table(&report),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&report).map_err(|e| {
                    EngineError::Parse(format!("failed to serialise prediction: {}", e))
                })?;
                println!("{}", json);
            }
        }

        Ok(())
    }

    fn print_table(report: &PredictionReport) {
        println!(
            "\n{} vs {}",
            report.resolved_home_team, report.resolved_away_team
        );
        println!("───────────────────────────────────────────");
        println!("{:<22} {:>6} {:>6} {:>6}", "", "Home", "Draw", "Away");
        print_row("Neural network", &report.nn_probs);
        print_row("Logistic regression", &report.lr_probs);
        print_row("Poisson goals", &report.poisson_probs);
        println!("───────────────────────────────────────────");
        print_row("Ensemble", &report.ensemble_probs);

        let r = &report.reasoning;
        println!("\nReasoning:");
        println!(
            "  Elo:        {:.0} vs {:.0}",
            r.home_elo, r.away_elo
        );
        println!(
            "  Venue form: {:.2} vs {:.2}",
            r.home_form.form_points, r.away_form.form_points
        );
        println!(
            "  Head2head:  {} home wins, {} draws, {} away wins",
            r.h2h.home_wins, r.h2h.draws, r.h2h.away_wins
        );
        println!(
            "  Rest days:  {:.0} vs {:.0}",
            r.home_rest_days, r.away_rest_days
        );
    }

    fn print_row(label: &str, probs: &[f32; 3]) {
        println!(
            "{:<22} {:>5.1}% {:>5.1}% {:>5.1}%",
            label,
            probs[0] * 100.0,
            probs[1] * 100.0,
            probs[2] * 100.0
        );
    }
}
