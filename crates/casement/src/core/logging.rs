//! Log output for hosts embedding the toolkit.

use std::io;

use tracing::Level;
use tracing_subscriber::fmt;

use crate::error::{Error, Result};

/// Install a global compact log subscriber writing to stderr at `level` and
/// above. Fails if a subscriber is already installed.
pub fn init(level: Level) -> Result<()> {
    let format = fmt::format()
        .with_level(true)
        .with_line_number(true)
        .with_ansi(false)
        .without_time()
        .compact();

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .event_format(format)
        .try_init()
        .map_err(|e| Error::Internal(format!("log init: {e}")))
}
