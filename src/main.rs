//! update-helper-cli entry point
//!
//! The helper process of the update protocol: parses the flags written by the
//! caller's launcher, replaces the files, and exits with `0` on success or `1`
//! with a message on stderr on any failure.

use clap::Parser;
use clap::error::ErrorKind;
use tracing_subscriber::EnvFilter;
use update_helper::cli::HelperCli;
use update_helper::config::HelperConfig;
use update_helper::core::{UpdateError, user_friendly_error};

#[tokio::main]
async fn main() {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = match HelperCli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit();
        }
        Err(e) => {
            let rendered = e.render().to_string();
            let message = rendered.lines().next().unwrap_or_default();
            let message = message.strip_prefix("error: ").unwrap_or(message).to_string();
            user_friendly_error(
                UpdateError::Usage {
                    message,
                }
                .into(),
            )
            .display();
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_target(false)
        .init();

    let result = match HelperConfig::load().await {
        Ok(config) => cli.execute(&config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        user_friendly_error(e).display();
        std::process::exit(1);
    }
}
