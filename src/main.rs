use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::error;

use crate::engine::PatchEngine;
use crate::engine::state::RunOutcome;
use crate::env::PatchContext;

mod checksum;
mod engine;
mod env;
mod error;
mod networking;
mod progress;
mod storage;
#[cfg(test)]
mod testing;

#[derive(Parser, Debug)]
#[command(
    name = "pod-patcher",
    author,
    version,
    about = "Keeps a Path of Diablo install in sync with the published file list"
)]
struct Cli {
    /// Path to your pod folder, e.g. "/Users/user/.wine/games/Diablo II/Path Of Diablo".
    pod_dir: PathBuf,

    /// Re-download every installed file even when its checksum matches.
    #[arg(short, long)]
    force: bool,

    /// Log per-file decisions.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn parse_legacy() -> Self {
        Self::parse_from(std::env::args_os().map(normalize_legacy_flag))
    }
}

// Older releases took the flag as `-force`.
fn normalize_legacy_flag(arg: OsString) -> OsString {
    if arg == "-force" {
        OsString::from("--force")
    } else {
        arg
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_legacy();
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let ctx = PatchContext::new(cli.pod_dir, cli.force);
    match PatchEngine::new(ctx).run().await {
        Ok(outcome) => {
            println!("{}", outcome.summary());
            if let RunOutcome::Updated {
                skipped,
                restart_required,
                announced,
                ..
            } = &outcome
            {
                for name in announced {
                    println!("Updated {name}");
                }
                if !skipped.is_empty() {
                    println!("Skipped {} files without an https link", skipped.len());
                }
                if *restart_required {
                    println!("Restart Path of Diablo for the update to take effect");
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
