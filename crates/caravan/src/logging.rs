// Author: Dustin Pilgrim
// License: MIT

use std::path::{Path, PathBuf};

use eventline::runtime::{self, LogLevel};

use crate::paths::{default_log_path, ensure_parent_dir};

/// Start the eventline runtime and return the log file in use.
///
/// The file sink is always on. Console output (with colour) and debug level
/// only with `verbose`.
pub fn init_logging(log_file: Option<&Path>, verbose: bool) -> Result<PathBuf, String> {
    let log_path = log_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_log_path("caravan.log"));

    ensure_parent_dir(&log_path).map_err(|e| format!("create log dir: {e}"))?;

    // runtime::init is async; zbus already carries a blocking executor.
    zbus::block_on(runtime::init());

    runtime::enable_file_output(&log_path).map_err(|e| format!("enable file output: {e}"))?;
    runtime::enable_console_output(verbose);
    runtime::enable_console_color(verbose);
    runtime::set_log_level(if verbose { LogLevel::Debug } else { LogLevel::Info });

    Ok(log_path)
}
