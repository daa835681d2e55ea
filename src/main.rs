use clap::Parser;
use tracing_subscriber::EnvFilter;

use substitution_checker::cli::{run, Cli};

/// `RUST_LOG` wins when set; `--verbose` only raises the default.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("[ERROR] Check failed: {e:#}");
            std::process::exit(1);
        }
    }
}
