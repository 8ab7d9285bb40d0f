// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! CSV tables, read and written whole.

use std::{
  fmt::{self, Display, Formatter},
  fs::{self, File},
  io::Write,
  path::{Path, PathBuf},
  str::FromStr,
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Supported text encodings for CSV files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
  #[default]
  Utf8,
  /// UTF-8 with a byte order mark, as spreadsheet software often expects.
  Utf8Sig,
}

impl FromStr for TextEncoding {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
      "utf-8" | "utf8" => Ok(Self::Utf8),
      "utf-8-sig" | "utf8-sig" => Ok(Self::Utf8Sig),
      _ => Err(format!(
        "\"{s}\" is not supported as an encoding (expected \"utf-8\" or \"utf-8-sig\")."
      )),
    }
  }
}

impl Display for TextEncoding {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Utf8 => "utf-8",
      Self::Utf8Sig => "utf-8-sig",
    })
  }
}

/// A CSV file held in memory, every cell as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
  pub headers: Vec<String>,
  pub rows:    Vec<Vec<String>>,
}

impl Table {
  /// Reads `path`, which must have a header row. A byte order mark is ignored
  /// regardless of `encoding`.
  pub fn read_csv(path: impl AsRef<Path>, encoding: TextEncoding) -> Result<Self, String> {
    let path = path.as_ref();
    log::info!("Reading CSV file \"{}\" ({encoding}).", path.display());

    let bytes = fs::read(path).map_err(|e| format!("{}: Failed to read ({e}).", path.display()))?;
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes.as_slice());

    let mut reader = csv::ReaderBuilder::new()
      .has_headers(true)
      .from_reader(bytes);

    let headers = reader
      .headers()
      .map_err(|e| format!("{}: Failed to read CSV header ({e}).", path.display()))?
      .iter()
      .map(ToString::to_string)
      .collect::<Vec<_>>();

    let rows = reader
      .records()
      .map(|r| {
        r.map(|record| record.iter().map(ToString::to_string).collect())
          .map_err(|e| format!("{}: Failed to read CSV row ({e}).", path.display()))
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Self { headers, rows })
  }

  /// Index of the column named `name`.
  pub fn column(&self, name: &str) -> Option<usize> {
    self.headers.iter().position(|h| h == name)
  }

  /// Values of the column named `name`, top to bottom.
  pub fn column_values(&self, name: &str) -> Result<Vec<&str>, String> {
    let i = self
      .column(name)
      .ok_or_else(|| format!("Necessary column is missing in the CSV: \"{name}\"."))?;

    Ok(self.rows.iter().map(|r| r[i].as_str()).collect())
  }

  /// Appends a column. `values` must have one entry per row.
  pub fn push_column(&mut self, name: impl Into<String>, values: Vec<String>) -> Result<(), String> {
    let name = name.into();

    if values.len() != self.rows.len() {
      return Err(format!(
        "Column \"{name}\" has {} values for {} rows.",
        values.len(),
        self.rows.len()
      ));
    }

    self.headers.push(name);
    for (row, value) in self.rows.iter_mut().zip(values) {
      row.push(value);
    }

    Ok(())
  }

  /// Writes to `path`, which must not exist. The table is written beside it
  /// first, and only moved into place once complete.
  pub fn write_csv(&self, path: impl AsRef<Path>, encoding: TextEncoding) -> Result<(), String> {
    let path = path.as_ref();
    log::info!("Writing CSV file \"{}\" ({encoding}).", path.display());

    if path.exists() {
      return Err(format!("{}: Output file already exists.", path.display()));
    }

    let partial = partial_path(path);
    if let Err(e) = self.write_csv_to(&partial, encoding) {
      // Best effort: the error of interest is `e`.
      let _ = fs::remove_file(&partial);
      return Err(e);
    }

    fs::rename(&partial, path).map_err(|e| {
      format!(
        "{}: Failed to move into place from {} ({e}).",
        path.display(),
        partial.display()
      )
    })
  }

  fn write_csv_to(&self, path: &Path, encoding: TextEncoding) -> Result<(), String> {
    let fail = |e: &dyn Display| format!("{}: Failed to write ({e}).", path.display());

    let mut file = File::create_new(path).map_err(|e| fail(&e))?;
    if encoding == TextEncoding::Utf8Sig {
      file.write_all(UTF8_BOM).map_err(|e| fail(&e))?;
    }

    let mut writer = csv::WriterBuilder::new()
      .terminator(csv::Terminator::Any(b'\n'))
      .from_writer(file);
    writer.write_record(&self.headers).map_err(|e| fail(&e))?;
    for row in &self.rows {
      writer.write_record(row).map_err(|e| fail(&e))?;
    }
    writer.flush().map_err(|e| fail(&e))
  }
}

/// `out.csv` -> `out.csv.part`.
fn partial_path(path: &Path) -> PathBuf {
  let mut name = path.file_name().unwrap_or_default().to_os_string();
  name.push(".part");
  path.with_file_name(name)
}


#[cfg(test)]
mod test_read_csv {
  use super::*;
  use crate::testing::*;

  #[test]
  fn reads_headers_and_rows() {
    let d = test_dir!("in.csv": "file_paths,note\n/a.jpg,x\n/b.jpg,\n");

    let table = Table::read_csv(d.get_path("in.csv"), TextEncoding::Utf8).unwrap();

    assert_eq!(table.headers, ["file_paths", "note"]);
    assert_eq!(table.rows, [vec!["/a.jpg", "x"], vec!["/b.jpg", ""]]);
  }

  #[test]
  fn strips_byte_order_mark() {
    let d = test_dir!("in.csv": "\u{feff}file_paths\n/a.jpg\n");

    let table = Table::read_csv(d.get_path("in.csv"), TextEncoding::Utf8).unwrap();

    assert_eq!(table.headers, ["file_paths"]);
  }

  #[test]
  fn keeps_numeric_looking_text() {
    let d = test_dir!("in.csv": "file_paths,id\n/a.jpg,007\n");

    let table = Table::read_csv(d.get_path("in.csv"), TextEncoding::Utf8).unwrap();

    assert_eq!(table.rows[0][1], "007");
  }

  #[test]
  fn errors_on_ragged_rows() {
    let d = test_dir!("in.csv": "file_paths,note\n/a.jpg\n");

    assert_err!(
      Table::read_csv(d.get_path("in.csv"), TextEncoding::Utf8),
      "Failed to read CSV row"
    );
  }

  #[test]
  fn errors_if_missing() {
    let d = test_dir!();

    assert_err!(
      Table::read_csv(d.get_path("in.csv"), TextEncoding::Utf8),
      "Failed to read"
    );
  }
}
