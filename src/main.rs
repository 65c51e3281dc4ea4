//! rGeoAttend main entrypoint.

use rgeoattend::run;
use rgeoattend::ui::messages::error;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run() {
        tracing::debug!(category = ?e.category(), "command failed");
        error(format!("Error: {e}"));
        std::process::exit(1);
    }
}
