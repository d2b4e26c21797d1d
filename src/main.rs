//! nlquery command-line entry point
//!
//! ```bash
//! nlquery run --kind sql -q "How many orders are in the bike store?" \
//!     "SELECT COUNT(*) FROM orders"
//! nlquery run --kind mongo --database fifa "db.players.find().limit(3)"
//! ```

use nlquery::cli::CliInterface;
use nlquery::config::Config;
use nlquery::error::Result;

/// Application entry point
#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Parse arguments, load configuration, initialize logging, run the subcommand
async fn run() -> Result<bool> {
    let cli = CliInterface::new()?;
    initialize_logging(cli.config());
    cli.run().await
}

/// Initialize logging to stderr from the effective configuration
///
/// # Arguments
/// * `config` - Configuration with CLI verbosity already applied
fn initialize_logging(config: &Config) {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(config.logging.level.to_tracing_level())
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
