use std::process::ExitCode;

use clap::Parser;
use ringtail::cli::{self, Cli};

fn main() -> ExitCode {
    match cli::run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ringtail: {err}");
            ExitCode::FAILURE
        }
    }
}
