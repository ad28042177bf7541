use std::path::PathBuf;

use chrono::Local;
use clap::Parser;
use log::{debug, warn};
use snafu::ErrorCompat;

mod args;
mod pipeline;

use crate::pipeline::{run_course, RunOptions};

fn main() {
    let args = args::Args::parse();
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    );
    if args.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
    debug!("args: {:?}", args);

    let opts = RunOptions {
        config_path: PathBuf::from(&args.config),
        out: args.out.as_ref().map(PathBuf::from),
        skip_roster_build: args.skip_roster_build,
        now: Local::now().naive_local(),
    };

    if let Err(e) = run_course(&opts) {
        warn!("Error occurred {:?}", e);
        eprintln!("An error occurred: {}", e);
        for cause in ErrorCompat::iter_chain(&e).skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
