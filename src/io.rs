// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Reading tags from files, and reading & writing CSV tables.

mod exiftool;
mod progress;
mod table;

use std::path::PathBuf;

pub use exiftool::*;
pub use progress::*;
pub use table::*;

use crate::prim::FileTagSnapshot;

/// Source of per-file tag values.
pub trait TagProvider {
  /// Reads the tags of every file in `files`, returning exactly one snapshot
  /// per file, in the same order. Files that are missing or unreadable get an
  /// empty snapshot. Errors are reserved for failures of the provider itself.
  fn read_tags(
    &mut self,
    files: &[PathBuf],
    progress: &mut dyn FnMut(Progress),
  ) -> Result<Vec<FileTagSnapshot>, String>;
}
