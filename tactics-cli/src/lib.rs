//! # Tactics CLI
//!
//! Command-line host for the tactical board: renders stored or file-based
//! layouts to images and manages the layout store from a shell.
//!
//! ## Usage
//!
//! ```bash
//! tactics --data-dir ./layouts layouts import "4-4-2" lineup.json
//! tactics --players squad.json render --name "4-4-2" -o lineup.png
//! tactics render --file lineup.json -o lineup.pdf --width 1600 --height 1200
//! tactics formation formations.json "4-3-3" -o guides.png
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - Resolved settings for one invocation
//! - `commands::run` - Executes a command against the store and compositor

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod commands;

pub use commands::run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line arguments for tactics.
#[derive(Debug, Clone, Parser)]
#[command(name = "tactics")]
#[command(about = "Tactical board renderer and layout store")]
#[command(version)]
pub struct CliArgs {
    /// Directory holding stored layouts (in-memory store when absent)
    #[arg(long, global = true, env = "TACTICS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// JSON file with the player directory
    #[arg(long, global = true, env = "TACTICS_PLAYERS")]
    pub players: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Render a layout to PNG, JPEG, SVG or PDF
    Render(RenderArgs),

    /// Render a formation's guide circles on an empty pitch
    Formation(FormationArgs),

    /// Manage stored layouts
    #[command(subcommand)]
    Layouts(LayoutsCommand),
}

/// Appearance and output options shared by rendering commands.
#[derive(Debug, Clone, clap::Args)]
pub struct OutputArgs {
    /// Output file; the format follows its extension unless --format is given
    #[arg(short, long)]
    pub output: PathBuf,

    /// Output format (png, jpeg, svg, pdf)
    #[arg(long)]
    pub format: Option<String>,

    /// Output width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Output height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Directory with icon artwork (player_red_base.png, cone.png, ...)
    #[arg(long)]
    pub icons: Option<PathBuf>,

    /// JSON file with render settings
    #[arg(long)]
    pub render_config: Option<PathBuf>,
}

/// Arguments of `render`.
#[derive(Debug, Clone, clap::Args)]
pub struct RenderArgs {
    /// Layout JSON file
    #[arg(long, conflicts_with = "name", required_unless_present = "name")]
    pub file: Option<PathBuf>,

    /// Stored layout name
    #[arg(long)]
    pub name: Option<String>,

    /// Output options
    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments of `formation`.
#[derive(Debug, Clone, clap::Args)]
pub struct FormationArgs {
    /// Formation book JSON file
    pub book: PathBuf,

    /// Formation name
    pub name: String,

    /// Output options
    #[command(flatten)]
    pub output: OutputArgs,
}

/// Layout store commands.
#[derive(Debug, Clone, Subcommand)]
pub enum LayoutsCommand {
    /// List stored layouts
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print a stored layout as JSON
    Show {
        /// Layout name
        name: String,
    },

    /// Store a layout from a JSON file, replacing any with the same name
    Import {
        /// Layout name
        name: String,
        /// Layout JSON file
        file: PathBuf,
    },

    /// Delete a stored layout
    Delete {
        /// Layout name
        name: String,
    },

    /// Rename a stored layout
    Rename {
        /// Current name
        from: String,
        /// New name
        to: String,
    },
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Layout store directory.
    pub data_dir: Option<PathBuf>,
    /// Player directory file.
    pub players: Option<PathBuf>,
    /// Command to run.
    pub command: Command,
}

impl From<CliArgs> for CliConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            data_dir: args.data_dir,
            players: args.players,
            command: args.command,
        }
    }
}
