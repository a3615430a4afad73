use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod chart;
mod config;
mod error;
mod models;
mod narrative;
mod report;
mod roster;
mod signal;
mod synth;

use app::{render, AppState};
use config::{Config, Preferences};
use models::{DisplayMetric, InterpretationMode, Theme};

#[derive(Parser)]
#[command(name = "grade-signal-explainer")]
#[command(about = "Explains a student's grade record under several interpretation modes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the demonstration roster
    Seed {
        #[arg(long, default_value = config::DEFAULT_ROSTER)]
        out: PathBuf,
    },
    /// Normalize a CSV roster into the JSON roster format
    Import {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = config::DEFAULT_ROSTER)]
        out: PathBuf,
    },
    /// Rank roster records by signal score
    Score {
        #[arg(long)]
        roster: Option<PathBuf>,
        #[arg(long, value_enum)]
        mode: Option<InterpretationMode>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Render the full explanation for one record
    Explain {
        #[arg(long)]
        roster: Option<PathBuf>,
        /// Record id; defaults to the first record
        #[arg(long)]
        id: Option<String>,
        #[arg(long, value_enum)]
        mode: Option<InterpretationMode>,
        #[arg(long, value_enum, default_value_t = DisplayMetric::Raw)]
        metric: DisplayMetric,
        #[arg(long)]
        seed: Option<u64>,
        /// Emit the render frame as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report for the whole roster
    Report {
        #[arg(long)]
        roster: Option<PathBuf>,
        #[arg(long, value_enum)]
        mode: Option<InterpretationMode>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Toggle the saved theme, or set it explicitly
    Theme {
        #[arg(long, value_enum)]
        set: Option<Theme>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

async fn load_state(path: &std::path::Path, prefs: &Preferences) -> anyhow::Result<AppState> {
    let records = roster::load_roster(path)
        .await
        .with_context(|| format!("could not load the roster from {}", path.display()))?;
    Ok(AppState::new(records)?.with_theme(prefs.theme))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::from_env()?;
    let prefs = Preferences::load(&config.prefs);

    match cli.command {
        Commands::Seed { out } => {
            let json = serde_json::to_string_pretty(&roster::demo_roster())?;
            std::fs::write(&out, json)?;
            println!("Demo roster written to {}.", out.display());
        }
        Commands::Import { csv, out } => {
            let file = std::fs::File::open(&csv)
                .with_context(|| format!("failed to open {}", csv.display()))?;
            let rows = roster::parse_csv(file)?;
            let records = roster::normalize_roster(rows)?;
            std::fs::write(&out, serde_json::to_string_pretty(&records)?)?;
            println!(
                "Imported {} records from {} into {}.",
                records.len(),
                csv.display(),
                out.display()
            );
        }
        Commands::Score {
            roster: path,
            mode,
            limit,
        } => {
            let path = path.unwrap_or(config.roster);
            let mode = mode.unwrap_or(config.mode);
            let state = load_state(&path, &prefs).await?;
            let ranked = signal::score_roster(state.roster(), mode);

            println!("Records by signal score ({mode} mode):");
            for (record, result) in ranked.iter().take(limit) {
                println!(
                    "- {} ({}, {}) signal {:.0}, deviation {}, reliability {}",
                    record.name,
                    record.id,
                    record.course,
                    result.score.round(),
                    narrative::fmt1(result.deviation),
                    result.reliability.tier
                );
            }
        }
        Commands::Explain {
            roster: path,
            id,
            mode,
            metric,
            seed,
            json,
        } => {
            let path = path.unwrap_or(config.roster);
            let mut state = load_state(&path, &prefs)
                .await?
                .with_mode(mode.unwrap_or(config.mode))
                .with_metric(metric);
            if let Some(id) = id {
                state = state.select(&id)?;
            }

            let mut rng = make_rng(seed.or(config.seed));
            let frame = render(&state, &mut rng);
            info!(id = %frame.record_id, mode = %frame.mode, "explained record");

            if json {
                println!("{}", serde_json::to_string_pretty(&frame)?);
            } else {
                print!("{}", report::render_text(&frame));
            }
        }
        Commands::Report {
            roster: path,
            mode,
            seed,
            out,
        } => {
            let path = path.unwrap_or(config.roster);
            let mode = mode.unwrap_or(config.mode);
            let state = load_state(&path, &prefs).await?.with_mode(mode);
            let mut rng = make_rng(seed.or(config.seed));

            let mut frames = Vec::with_capacity(state.roster().len());
            for record in state.roster() {
                frames.push(render(&state.select(&record.id)?, &mut rng));
            }
            let report = report::build_report(mode, chrono::Utc::now(), &frames);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Theme { set } => {
            let theme = set.unwrap_or_else(|| prefs.theme.toggled());
            Preferences { theme }.save(&config.prefs)?;
            println!("Theme set to {theme:?}.");
        }
    }

    Ok(())
}
