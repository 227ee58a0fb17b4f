use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "mason", about = "Masonry flow layout for measured items", version)]
pub struct Args {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pack an item list once and print the layout as JSON
    Pack {
        #[command(flatten)]
        input: Input,

        /// Container extent, overriding the config
        #[arg(long)]
        constraint: Option<f32>,
    },

    /// Replay a resize burst through a coordinator and print every committed layout
    Replay {
        #[command(flatten)]
        input: Input,

        /// Container extents to render with, in order
        #[arg(long, value_delimiter = ',', required = true)]
        widths: Vec<f32>,

        /// Delay between renders
        #[arg(long, default_value_t = 50)]
        interval_ms: u64,

        /// How long to wait for background work after the last render
        #[arg(long, default_value_t = 2000)]
        settle_ms: u64,
    },
}

#[derive(clap::Args, Debug)]
pub struct Input {
    /// Grid config JSON
    #[arg(long)]
    pub config: PathBuf,

    /// Item list JSON: `[{"id": "...", "extent": 42.0}, ...]`
    #[arg(long)]
    pub items: PathBuf,
}
