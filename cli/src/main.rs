//! ClusterGate license operator tool.
//!
//! Usage:
//!   clustergate status
//!   clustergate activate --code <ARTIFACT> --enterprise <ID>
//!   clustergate inspect <ARTIFACT>
//!   clustergate legacy list
//!
//! Every command prints a JSON report on stdout. The exit status is 1 when a
//! checked license is rejected.

use anyhow::Result;
use clap::Parser;
use clustergate_cli::{execute, Args};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let report = execute(&args)?;
    println!("{}", serde_json::to_string_pretty(&report.body)?);
    if !report.ok {
        std::process::exit(1);
    }
    Ok(())
}
