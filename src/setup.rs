// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Program setup functions.

use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Sets up `env_logger` with the format "LEVEL\tmessage" (e.g. "WARN\tFile not
/// found.").
///
/// Log levels:
/// Error: Fatal errors.
/// Warn: Missing files, and target tags no file had.
/// Info: General program flow and progress.
/// Debug: Per-file results, and skipped tag values.
/// Trace: `ExifTool` commands and output.
pub fn configure_logging(verbosity: u8) {
  let level = match verbosity {
    0 => LevelFilter::Info,
    1 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  };

  Builder::new()
    .filter_level(level)
    .format(|buf, record| {
      let style = buf.default_level_style(record.level());
      writeln!(buf, "{style}{}{style:#}\t{}", record.level(), record.args())
    })
    .init();
}
