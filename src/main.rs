use clap::Parser;
use colored::Colorize;
use env_logger::Env;
use log::{debug, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

mod libquiz;
#[cfg(feature = "cli")]
mod cli;
#[cfg(feature = "gui")]
mod gui;

use crate::libquiz::flow::{QuizFlow, SharedSource};
use crate::libquiz::source::{ExtractionError, ExtractionService, FixtureSource, DEFAULT_ENDPOINT};

#[derive(Parser, Debug)]
#[command(name = "pdfquiz")]
#[command(version, about, long_about = None)]
struct Args {
    /// PDF to stage for upload right away
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
    #[arg(short, long, value_name = "URL", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
    /// Seconds to wait for the extraction service. Waits forever if unset.
    #[arg(short, long, value_name = "SECONDS")]
    timeout_secs: Option<u64>,
    /// Use the built-in sample questions instead of the extraction service
    #[arg(long, conflicts_with = "fixture")]
    sample: bool,
    /// Use questions from a JSON file instead of the extraction service
    #[arg(long, value_name = "JSON")]
    fixture: Option<PathBuf>,
    /// Run in the terminal instead of opening a window
    #[cfg(all(feature = "cli", feature = "gui"))]
    #[arg(long)]
    cli: bool,
    #[arg(short, long, default_value = "error")]
    log_level: String,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[cfg(feature = "gui")]
    #[error("window failed")]
    Gui(#[from] eframe::Error),
}

fn build_source(args: &Args) -> Result<SharedSource, ExtractionError> {
    if args.sample {
        debug!("[Setup] Using built-in sample questions");
        return Ok(Arc::new(FixtureSource::sample()));
    }
    if let Some(path) = &args.fixture {
        return Ok(Arc::new(FixtureSource::from_file(path)?));
    }
    let timeout = args.timeout_secs.map(Duration::from_secs);
    let service = ExtractionService::new(args.endpoint.as_str(), timeout)?;
    debug!("[Setup] Extraction service at {} (timeout {:?})", service.endpoint(), timeout);
    Ok(Arc::new(service))
}

cfg_if::cfg_if! {
    if #[cfg(all(feature = "cli", feature = "gui"))] {
        fn run(flow: QuizFlow, args: &Args) -> Result<(), Error> {
            if args.cli {
                cli::cli_loop(flow)
            } else {
                gui::init_gui(flow)
            }
        }
    } else if #[cfg(feature = "gui")] {
        fn run(flow: QuizFlow, _args: &Args) -> Result<(), Error> {
            gui::init_gui(flow)
        }
    } else if #[cfg(feature = "cli")] {
        fn run(flow: QuizFlow, _args: &Args) -> Result<(), Error> {
            cli::cli_loop(flow)
        }
    } else {
        compile_error!("enable the `cli` or `gui` feature");
    }
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level.as_str())).init();

    let mut flow = QuizFlow::new(build_source(&args)?);
    if let Some(file) = &args.file {
        if let Err(err) = flow.select_file(file) {
            warn!("[Setup] Cannot stage {:?}: {}", file, err);
            println!("{}", format!("Cannot use {:?}: {}", file, err).yellow());
        }
    }

    run(flow, &args)
}
