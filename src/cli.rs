//! Command-line surface: score one patient, inspect the loaded artifacts,
//! or serve the HTTP API.

use crate::config::RiskCalcConfig;
use crate::config_loader::load_config;
use crate::features::FEATURE_ORDER;
use crate::resources::LoadedResources;
use crate::scoring::{PredictionResult, RawInputs, ScoringService};
use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Top-level CLI interface
#[derive(Parser, Debug)]
#[command(
    name = "shockrisk",
    version,
    about = "One-year mortality risk for acute myocardial infarction with cardiogenic shock"
)]
pub struct Cli {
    /// Configuration file (defaults to riskcalc.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level override: error, warn, info, debug, trace
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a single patient
    Score {
        /// Lymphocyte count, 10^9/L
        #[arg(long)]
        lym: f64,
        /// Hemoglobin, g/L
        #[arg(long)]
        hb: f64,
        /// Albumin, g/L
        #[arg(long)]
        alb: f64,
        /// Reperfusion therapy given (0/1)
        #[arg(long, required = true, action = ArgAction::Set, value_parser = parse_flag)]
        reperfusion: bool,
        /// ECMO given (0/1)
        #[arg(long, required = true, action = ArgAction::Set, value_parser = parse_flag)]
        ecmo: bool,
        /// ACEI/ARB given (0/1)
        #[arg(long, required = true, action = ArgAction::Set, value_parser = parse_flag)]
        acei_arb: bool,
        /// Beta-blocker given (0/1); only affects advice
        #[arg(long, action = ArgAction::Set, value_parser = parse_flag)]
        beta_blocker: Option<bool>,
        /// Surgery performed (0/1); only affects advice
        #[arg(long, action = ArgAction::Set, value_parser = parse_flag)]
        surgery: Option<bool>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the loaded model, scaler and artifact digests
    Inspect,

    /// Serve the HTTP scoring API
    Serve {
        /// Host/IP to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Parse a yes/no flag given as 0/1, yes/no or true/false
pub fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "yes" | "y" | "true" => Ok(true),
        "0" | "no" | "n" | "false" => Ok(false),
        other => Err(format!("expected 0/1, yes/no or true/false, got '{other}'")),
    }
}

/// Load config, install logging, then run the chosen command
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    let level_name = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let level: tracing::Level = level_name
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown log level '{level_name}'"))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    dispatch(cli.command, &config)
}

/// Build the scoring service from configuration; any failure here is fatal
pub fn build_service(config: &RiskCalcConfig) -> anyhow::Result<ScoringService> {
    let resources = LoadedResources::load(&config.artifact_source())
        .context("Failed to load model artifacts")?;
    let classifier = config.classifier()?;
    let engine = config.recommendation_engine()?;
    info!(cutoff = classifier.cutoff(), "Scoring service ready");
    Ok(ScoringService::new(Arc::new(resources), classifier, engine))
}

pub fn dispatch(command: Commands, config: &RiskCalcConfig) -> anyhow::Result<()> {
    match command {
        Commands::Score {
            lym,
            hb,
            alb,
            reperfusion,
            ecmo,
            acei_arb,
            beta_blocker,
            surgery,
            json,
        } => {
            let service = build_service(config)?;
            let inputs = RawInputs {
                lym,
                hb,
                alb,
                reperfusion_therapy: reperfusion,
                ecmo,
                acei_arb,
                beta_blocker,
                surgery,
            };
            let result = service.score(&inputs)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", render_text(&result));
            }
        }
        Commands::Inspect => {
            let service = build_service(config)?;
            print!("{}", render_inspect(&service));
        }
        Commands::Serve { host, port } => {
            let service = Arc::new(build_service(config)?);
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to build Tokio runtime")?;
            rt.block_on(crate::web::serve(service, &host, port))?;
        }
    }
    Ok(())
}

/// Plain-text report in the calculator's layout
pub fn render_text(result: &PredictionResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Prediction Result:");
    let _ = writeln!(out, "Prediction: {}", result.probability_percent());
    let _ = writeln!(out, "{}", result.risk_tier.summary());
    if !result.recommendations.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Personalized Recommendations:");
        for rec in &result.recommendations {
            let marker = if rec.is_warning() { "[!]" } else { "-" };
            let _ = writeln!(out, "{marker} {}", rec.message);
        }
    }
    out
}

fn render_inspect(service: &ScoringService) -> String {
    let resources = service.resources();
    let model = resources.model();
    let scaler = resources.scaler();
    let mut out = String::new();

    let _ = writeln!(out, "Model:   {} ({})", model.model_id(), model.kind());
    if let Some(trained_at) = resources.metadata().trained_at {
        let _ = writeln!(out, "Trained: {}", trained_at.to_rfc3339());
    }
    if let Some(description) = &resources.metadata().description {
        let _ = writeln!(out, "About:   {description}");
    }
    let _ = writeln!(out, "Cutoff:  {}", service.classifier().cutoff());
    let _ = writeln!(out, "Features:");
    for (i, feature) in FEATURE_ORDER.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {i}. {:<20} mean={:<10} scale={}",
            feature.key(),
            scaler.mean[i],
            scaler.scale[i]
        );
    }
    let digests = resources.digests();
    let _ = writeln!(
        out,
        "Model sha256:  {}",
        digests.model_sha256.as_deref().unwrap_or("-")
    );
    let _ = writeln!(
        out,
        "Scaler sha256: {}",
        digests.scaler_sha256.as_deref().unwrap_or("-")
    );
    out
}
