// Author: Dustin Pilgrim
// License: MIT

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "caravan", version, about = "Re-establish the previous trade route")]
pub struct Args {
    /// Log to stderr (in addition to the log file)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Override log file path (default: $XDG_STATE_HOME/caravan/caravan.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Override config path (default: $XDG_CONFIG_HOME/caravan/caravan.rune)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Drive this output (e.g. DP-1) instead of the focused one
    #[arg(long, short = 'o')]
    pub output: Option<String>,

    /// Reference image of the route entry
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Capture attempts before giving up
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    /// Don't require the game window to have focus
    #[arg(long)]
    pub skip_focus_check: bool,

    #[command(subcommand)]
    pub cmd: Option<Cmd>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Cmd {
    /// Re-establish the previous trade route (default)
    Run,

    /// List outputs as the compositor reports them
    Outputs,

    /// Capture the route list once and report where the template is
    Locate,
}
