use clap::Parser;
use expense_categorizer::args::Args;
use expense_categorizer::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Settings live in the environment, a .env file in the working directory may provide them.
    let dotenv = dotenvy::dotenv();
    let args = Args::parse();
    let log_level = args.log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());
    match dotenv {
        Ok(path) => debug!("Loaded settings from {}", path.display()),
        Err(e) => trace!("No .env file was loaded: {e}"),
    }

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let config = Config::new(&args)?;

    // When EXPENSE_CATEGORIZER_IN_TEST_MODE is set and non-empty, the sheet is an in-memory copy
    // of a small sample month, questions are asked on the console and no webhook is called.
    let mode = Mode::from_env();
    debug!("Running in {mode:?} mode");

    commands::categorize(config, mode).await?.print();
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => {
            // Only this program's own crates log at the requested level.
            EnvFilter::new(format!(
                "expense_categorizer={},{}={}",
                level,
                env!("CARGO_CRATE_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
