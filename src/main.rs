//! Cloak - an encrypted per-project secret manager with multi-device sync.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cloak::cli::output;
use cloak::cli::{execute, Cli};
use cloak::error::{ConfigError, Error, RemoteError, TokenError};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env("CLOAK_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("cloak=debug")
        } else {
            EnvFilter::new("cloak=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time())
        .init();

    if let Err(e) = execute(cli.command) {
        let suggestion = match &e {
            Error::Config(ConfigError::NotInitialized) => Some("run: cloak init"),
            Error::Remote(RemoteError::NotLinked) => Some("run: cloak link"),
            Error::Token(TokenError::NoToken) => Some("export GH_TOKEN=<token>"),
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
