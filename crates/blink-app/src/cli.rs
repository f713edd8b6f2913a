use std::path::PathBuf;

use clap::Parser;

/// blink: hosts a webview engine on a dedicated UI thread.
#[derive(Parser, Debug)]
#[command(name = "blink", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log filter directive override (e.g. `debug`, `blink_core=trace`).
    #[arg(long)]
    pub log_level: Option<String>,

    /// URL to open instead of the configured one.
    #[arg(long)]
    pub url: Option<String>,

    /// Window title override.
    #[arg(long)]
    pub title: Option<String>,

    /// Engine binary to stage into the work directory before start.
    #[arg(long)]
    pub payload: Option<PathBuf>,

    /// Close the window after this many seconds.
    #[arg(long)]
    pub close_after: Option<u64>,
}

pub fn parse() -> Args {
    Args::parse()
}
