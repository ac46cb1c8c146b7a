use clap::Parser;
use nelson::cli::{self, Args};
use nelson::error::LoadFailure;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_logging(debug: bool) {
    // RUST_LOG wins over --debug
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "nelson=debug" } else { "nelson=info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// The only place the process decides to fail
fn bail_out(err: &anyhow::Error) {
    if let Some(failure) = err.downcast_ref::<LoadFailure>() {
        eprintln!("🚫");
        eprint!("{}", failure);
    } else {
        eprintln!("Error: {:#}", err);
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logging(args.debug);

    match cli::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            bail_out(&err);
            ExitCode::FAILURE
        }
    }
}
