//! Command-line surface of the `clustergate` operator tool.
//!
//! Argument parsing and command execution live here so they can be driven
//! from tests; `main.rs` only installs logging and prints the report.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clustergate_license::{
    Clock, LegacyLicenses, LicenseConfig, LicenseFormat, LicenseToken, Licensing,
    SignatureVerifier, SourceStatus, SystemClock,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "clustergate")]
#[command(about = "Inspect and activate ClusterGate licenses")]
pub struct Args {
    /// Path to a JSON license config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the config store directory
    #[arg(long)]
    pub store_dir: Option<PathBuf>,

    /// Override the legacy license database path
    #[arg(long)]
    pub legacy_db: Option<PathBuf>,

    /// Use a fixed cluster id instead of the host fingerprint
    #[arg(long)]
    pub cluster_id: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Show the current signed license
    Status,
    /// Verify and install a signed license
    Activate {
        /// Base64 license artifact
        #[arg(long)]
        code: String,
        /// Enterprise the license must be bound to
        #[arg(long)]
        enterprise: String,
    },
    /// Decode a license artifact and check its signature without installing it
    Inspect {
        /// Base64 license artifact
        artifact: String,
    },
    /// Legacy encrypted licenses
    #[command(subcommand)]
    Legacy(LegacyCommand),
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum LegacyCommand {
    /// Store a legacy ciphertext under its client token
    Store {
        #[arg(long)]
        token: String,
        #[arg(long)]
        license: String,
    },
    /// List every readable legacy license
    List,
    /// Print a fresh client token
    IssueToken,
}

/// What a command produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// False when a license was checked and rejected.
    pub ok: bool,
    pub body: Value,
}

impl Report {
    fn ok(body: Value) -> Self {
        Self { ok: true, body }
    }
}

/// Builds the effective config: file (or defaults), then flag overrides.
pub fn resolve_config(args: &Args) -> Result<LicenseConfig> {
    let mut config = match &args.config {
        Some(path) => LicenseConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => LicenseConfig::default(),
    };
    if let Some(dir) = &args.store_dir {
        config.store_dir = dir.clone();
    }
    if let Some(db) = &args.legacy_db {
        config.legacy_db = db.clone();
    }
    if let Some(id) = &args.cluster_id {
        config.cluster_id = Some(id.clone());
    }
    Ok(config)
}

/// Runs the parsed command.
pub fn execute(args: &Args) -> Result<Report> {
    match &args.command {
        Command::Inspect { artifact } => inspect(artifact),
        Command::Legacy(LegacyCommand::IssueToken) => {
            Ok(Report::ok(json!({ "token": LegacyLicenses::issue_token() })))
        }
        command => {
            let config = resolve_config(args)?;
            debug!("using config store at {}", config.store_dir.display());
            let licensing = config.open().context("Failed to open license stores")?;
            run(&licensing, command)
        }
    }
}

fn run(licensing: &Licensing, command: &Command) -> Result<Report> {
    let engine = licensing.signed();
    match command {
        Command::Status => {
            let status = engine.status().context("Failed to read license status")?;
            Ok(Report {
                ok: status.is_valid(),
                body: serde_json::to_value(status.summary(engine.now()))?,
            })
        }
        Command::Activate { code, enterprise } => {
            let status = engine
                .activate(code, enterprise)
                .context("Failed to activate license")?;
            if status.is_valid() {
                info!("license activated for enterprise {enterprise}");
            }
            Ok(Report {
                ok: status.is_valid(),
                body: serde_json::to_value(status.summary(engine.now()))?,
            })
        }
        Command::Legacy(LegacyCommand::Store { token, license }) => {
            licensing
                .legacy()
                .store_license(license, token)
                .context("Failed to store legacy license")?;
            Ok(Report::ok(json!({ "token": token })))
        }
        Command::Legacy(LegacyCommand::List) => {
            let SourceStatus::Legacy(licenses) = licensing.status(LicenseFormat::Legacy)? else {
                anyhow::bail!("legacy source returned a signed status");
            };
            Ok(Report::ok(serde_json::to_value(licenses)?))
        }
        Command::Inspect { .. } | Command::Legacy(LegacyCommand::IssueToken) => {
            anyhow::bail!("command does not use the license stores")
        }
    }
}

/// Decodes an artifact and reports its fields plus whether the embedded key
/// accepts its signature. Nothing is persisted.
fn inspect(artifact: &str) -> Result<Report> {
    let token = LicenseToken::decode(artifact).context("Failed to decode license artifact")?;
    let verifier = SignatureVerifier::embedded()?;
    let (verified, signature) = match verifier.verify(&token) {
        Ok(()) => (true, "valid".to_string()),
        Err(e) => (false, e.to_string()),
    };
    let now = SystemClock.now();
    Ok(Report {
        ok: verified,
        body: json!({
            "token": token,
            "signature": signature,
            "days_remaining": token.days_remaining(now),
        }),
    })
}
