// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Per-file tag values, as reported by `ExifTool`.

use std::collections::HashMap;

/// Every tag reported for a single file, mapped to its raw value, in the order
/// `ExifTool` reported them.
///
/// Tag names are `ExifTool`'s group-qualified names (e.g.
/// `EXIF:DateTimeOriginal`), see <https://exiftool.org/TagNames/>. An empty
/// snapshot is valid, and is what missing or unreadable files produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTagSnapshot {
  tags:  Vec<(String, String)>,
  index: HashMap<String, usize>,
}

impl FileTagSnapshot {
  /// Gets the raw value of `tag`, if reported.
  pub fn get(&self, tag: &str) -> Option<&str> {
    self.index.get(tag).map(|&i| self.tags[i].1.as_str())
  }

  pub fn is_empty(&self) -> bool {
    self.tags.is_empty()
  }

  /// Iterates over `(tag, value)` pairs in reported order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.tags.iter().map(|(t, v)| (t.as_str(), v.as_str()))
  }

  pub fn len(&self) -> usize {
    self.tags.len()
  }

  /// The file path as `ExifTool` echoed it back.
  pub fn source_file(&self) -> Option<&str> {
    self.get("SourceFile")
  }
}

/// Duplicate tags keep their first value.
impl<T: Into<String>, V: Into<String>> FromIterator<(T, V)> for FileTagSnapshot {
  fn from_iter<I: IntoIterator<Item = (T, V)>>(iter: I) -> Self {
    let mut snapshot = Self::default();

    for (tag, value) in iter {
      let tag = tag.into();
      if snapshot.index.contains_key(&tag) {
        continue;
      }
      snapshot.index.insert(tag.clone(), snapshot.tags.len());
      snapshot.tags.push((tag, value.into()));
    }

    snapshot
  }
}
