//! moredis binary entry point

use clap::Parser;
use moredis_cli::{run, telemetry, Args, RunSettings};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = telemetry::init_tracing() {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    let result = RunSettings::try_from(args)
        .map_err(Into::into)
        .and_then(|settings| run(&settings));

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "moredis failed");
            ExitCode::FAILURE
        }
    }
}
