//! Mason - masonry layout from the command line.

mod cli;
mod commands;
mod items;
mod logging;

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Args, Command};
use crate::logging::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match args.command {
        Command::Pack { input, constraint } => {
            let result = commands::pack(&input, constraint)?;
            serde_json::to_writer_pretty(&mut out, &result)?;
            writeln!(out)?;
        }
        Command::Replay {
            input,
            widths,
            interval_ms,
            settle_ms,
        } => {
            let commits = commands::replay(
                &input,
                &widths,
                Duration::from_millis(interval_ms),
                Duration::from_millis(settle_ms),
                &mut out,
            )
            .await?;
            tracing::info!(renders = widths.len(), commits, "replay finished");
        }
    }

    Ok(())
}
