// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Test-only utilities.

mod asserts;
mod dates;
mod test_dir;

use std::{collections::HashMap, path::PathBuf};

pub use dates::*;
pub use test_dir::*;

use crate::{
  io::{Progress, TagProvider},
  prim::FileTagSnapshot,
};
pub use crate::{assert_err, snapshot, test_dir};

pub fn type_of<T>(_: T) -> &'static str {
  std::any::type_name::<T>()
}

/// `TagProvider` serving canned snapshots. Unknown paths get an empty
/// snapshot, like missing files do with `ExifTool`.
#[derive(Default)]
pub struct FakeProvider {
  snapshots: HashMap<PathBuf, FileTagSnapshot>,
  /// Every batch of paths requested, in order.
  pub calls: Vec<Vec<PathBuf>>,
}

impl FakeProvider {
  pub fn with(mut self, path: impl Into<PathBuf>, snapshot: FileTagSnapshot) -> Self {
    self.snapshots.insert(path.into(), snapshot);
    self
  }
}

impl TagProvider for FakeProvider {
  fn read_tags(
    &mut self,
    files: &[PathBuf],
    progress: &mut dyn FnMut(Progress),
  ) -> Result<Vec<FileTagSnapshot>, String> {
    self.calls.push(files.to_vec());

    let total = files.len();
    progress(Progress { processed: 0, total });
    let snapshots = files
      .iter()
      .map(|f| self.snapshots.get(f).cloned().unwrap_or_default())
      .collect();
    progress(Progress { processed: total, total });

    Ok(snapshots)
  }
}

#[macro_export]
macro_rules! snapshot {
  ($($tag:literal: $value:literal),* $(,)?) => {
    <$crate::prim::FileTagSnapshot as std::iter::FromIterator<(&str, &str)>>::from_iter([
      $(($tag, $value)),*
    ])
  };
}
