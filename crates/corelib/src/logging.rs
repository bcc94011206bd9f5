//! Logging setup
//!
//! Diagnostics go to stderr through `tracing`. Stdout is left to the coloured
//! progress lines of provisioning and harvesting runs, so the two can be
//! redirected separately.

use tracing::Level;
use tracing_subscriber::{
    fmt::{format::FmtSpan, time::UtcTime},
    FmtSubscriber,
};

/// Installs the global subscriber at the given level.
///
/// Events carry an RFC 3339 UTC timestamp plus file and line. Fails if a
/// subscriber is already installed.
pub fn setup_logging(level: Level) -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_timer(UtcTime::rfc_3339())
        .with_span_events(FmtSpan::CLOSE)
        .with_max_level(level)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Logging at the default level (info), used when no `--verbosity` is given
pub fn setup_default_logging() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging(Level::INFO)
}
