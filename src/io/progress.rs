// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Progress reporting for long-running tag reads.

use std::time::{Duration, Instant};

/// How many of the files being read have been read so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
  pub processed: usize,
  pub total:     usize,
}

impl Progress {
  pub fn is_complete(&self) -> bool {
    self.processed >= self.total
  }
}

/// Logs `Progress` events, at most once per `period`. Logs nothing without a
/// period.
pub struct ProgressLogger {
  period:  Option<Duration>,
  started: Instant,
  next:    Duration,
}

impl ProgressLogger {
  pub fn new(period: Option<Duration>) -> Self {
    Self {
      period,
      started: Instant::now(),
      next: period.unwrap_or_default(),
    }
  }

  pub fn report(&mut self, progress: Progress) {
    if self.period.is_none() {
      return;
    }

    if progress.is_complete() {
      log::info!(
        "ExifTool processing has been completed. [{}/{} valid files]",
        progress.processed,
        progress.total
      );
    } else if progress.processed == 0 || self.due(self.started.elapsed()) {
      log::info!(
        "ExifTool processing... [{}/{} valid files]",
        progress.processed,
        progress.total
      );
    }
  }

  /// Whether a line is due at `elapsed` since start, advancing the next
  /// deadline past `elapsed` if so.
  fn due(&mut self, elapsed: Duration) -> bool {
    let Some(period) = self.period else {
      return false;
    };

    if elapsed < self.next {
      return false;
    }
    if period.is_zero() {
      return true;
    }

    while self.next <= elapsed {
      self.next += period;
    }
    true
  }
}
