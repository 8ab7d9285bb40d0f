// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! `ExifTool` invocation and output decoding.

use std::{
  collections::{HashMap, VecDeque},
  ffi::OsStr,
  fmt::{self, Formatter},
  io::Write,
  path::{Path, PathBuf},
  process::{Command, Output, Stdio},
  thread,
};

use serde::{
  Deserialize, Deserializer,
  de::{MapAccess, Visitor},
};
use serde_json::Value;

use super::{Progress, TagProvider};
use crate::prim::FileTagSnapshot;

/// Where to point users who do not have `ExifTool`.
pub const EXIFTOOL_URL: &str = "https://exiftool.org/";

/// Minimum supported version of `ExifTool`.
const EXIFTOOL_MIN_VERSION: (u32, u32) = (10, 0);

/// JSON output, tag names prefixed with their group (e.g. `EXIF:Make`), and
/// duplicate tags kept. File names are read as UTF-8 from an argument file on
/// stdin.
const READ_ARGS: [&str; 7] = ["-charset", "filename=utf8", "-json", "-G", "-a", "-@", "-"];

/// Reads tags from files by running `ExifTool` over batches of them.
pub struct ExifTool {
  program:     PathBuf,
  target_tags: Vec<String>,
  batch_size:  usize,
}

impl ExifTool {
  /// Checks that `program` runs and is new enough. If `target_tags` is empty,
  /// every tag is read.
  pub fn new(
    program: impl Into<PathBuf>,
    target_tags: Vec<String>,
    batch_size: usize,
  ) -> Result<Self, String> {
    let program = program.into();

    let version = run_exiftool(&program, ["-ver"]).map_err(|e| {
      format!("{e}\n\"exiftool\" is necessary, but could not be run. See {EXIFTOOL_URL}.")
    })?;
    version_check(&version, EXIFTOOL_MIN_VERSION)?;

    Ok(Self {
      program,
      target_tags,
      batch_size: batch_size.max(1),
    })
  }

  /// Arguments common to every batch.
  fn read_args(&self) -> Vec<String> {
    READ_ARGS
      .iter()
      .map(ToString::to_string)
      .chain(self.target_tags.iter().map(|t| format!("-{t}")))
      .collect()
  }

  /// Reads a single batch of existing files, returning snapshots in the order
  /// of `files`.
  fn read_batch(&self, files: &[&Path]) -> Result<Vec<FileTagSnapshot>, String> {
    let names = files.iter().map(|f| arg_file_name(f)).collect::<Vec<_>>();

    let mut stdin = names.join("\n");
    stdin.push('\n');

    let output = run_exiftool_with_stdin(&self.program, self.read_args(), stdin.as_bytes())?;

    // `ExifTool` exits with an error if any file failed, but still reports
    // the rest.
    if !output.status.success() {
      if output.stdout.is_empty() {
        return Err(format!(
          "ExifTool did not run successfully.\nstderr:\n{}",
          String::from_utf8_lossy(&output.stderr)
        ));
      }
      log::debug!(
        "ExifTool reported errors:\n{}",
        String::from_utf8_lossy(&output.stderr)
      );
    }

    Ok(match_to_files(&names, parse_snapshots(&output.stdout)?))
  }

  /// Warns about target tags that no file had.
  fn warn_missing_target_tags(&self, snapshots: &[FileTagSnapshot]) {
    for target in &self.target_tags {
      let found = snapshots
        .iter()
        .any(|s| s.iter().any(|(tag, _)| tag_matches(tag, target)));
      if !found {
        log::warn!("A target ExifTool tag was not found in any input file: \"{target}\".");
      }
    }
  }
}

impl TagProvider for ExifTool {
  fn read_tags(
    &mut self,
    files: &[PathBuf],
    progress: &mut dyn FnMut(Progress),
  ) -> Result<Vec<FileTagSnapshot>, String> {
    let existing = files
      .iter()
      .filter(|f| {
        let exists = f.exists();
        if !exists {
          log::warn!("{}: File not found.", f.display());
        }
        exists
      })
      .map(PathBuf::as_path)
      .collect::<Vec<_>>();

    let total = existing.len();
    let mut read = HashMap::<&Path, VecDeque<FileTagSnapshot>>::new();

    progress(Progress { processed: 0, total });
    for batch in existing.chunks(self.batch_size) {
      for (&file, snapshot) in batch.iter().zip(self.read_batch(batch)?) {
        read.entry(file).or_default().push_back(snapshot);
      }
      progress(Progress {
        processed: read.values().map(VecDeque::len).sum(),
        total,
      });
    }

    let snapshots = files
      .iter()
      .map(|f| {
        read
          .get_mut(f.as_path())
          .and_then(VecDeque::pop_front)
          .unwrap_or_default()
      })
      .collect::<Vec<_>>();

    self.warn_missing_target_tags(&snapshots);

    Ok(snapshots)
  }
}

/// Name for `file` within an argument file. Lines starting with `-` would be
/// read as options and lines starting with `#` as comments, so those are made
/// explicitly relative. Note `ExifTool` also trims whitespace around each line.
fn arg_file_name(file: &Path) -> String {
  let name = file.to_string_lossy();
  if name.starts_with(['-', '#']) {
    format!("./{name}")
  } else {
    name.into_owned()
  }
}

/// Pairs `snapshots` with `names` by `SourceFile`, since `ExifTool` may skip
/// files it cannot open. Files with no snapshot get an empty one.
fn match_to_files(names: &[String], snapshots: Vec<FileTagSnapshot>) -> Vec<FileTagSnapshot> {
  // `ExifTool` reports Windows paths with forward slashes.
  let key = |name: &str| name.replace('\\', "/");

  let mut by_source = HashMap::<String, VecDeque<FileTagSnapshot>>::new();
  for snapshot in snapshots {
    let source = key(snapshot.source_file().unwrap_or_default());
    by_source.entry(source).or_default().push_back(snapshot);
  }

  names
    .iter()
    .map(|name| {
      by_source
        .get_mut(&key(name))
        .and_then(VecDeque::pop_front)
        .unwrap_or_else(|| {
          log::warn!("{name}: ExifTool returned no tags.");
          FileTagSnapshot::default()
        })
    })
    .collect()
}

/// Whether reported tag `tag` satisfies requested tag `target`. A target
/// without a group (e.g. `DateTimeOriginal`) matches that tag in any group.
fn tag_matches(tag: &str, target: &str) -> bool {
  if tag.eq_ignore_ascii_case(target) {
    return true;
  }
  !target.contains(':')
    && tag
      .rsplit_once(':')
      .is_some_and(|(_, name)| name.eq_ignore_ascii_case(target))
}

/// One file's JSON object from `ExifTool`, as `(tag, value)` pairs in output
/// order. Repeated keys are all kept.
struct TagPairs(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for TagPairs {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
      type Value = TagPairs;

      fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object of tags")
      }

      fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<TagPairs, A::Error> {
        let mut pairs = Vec::new();
        while let Some(pair) = map.next_entry::<String, Value>()? {
          pairs.push(pair);
        }
        Ok(TagPairs(pairs))
      }
    }

    deserializer.deserialize_map(PairsVisitor)
  }
}

/// Parses `ExifTool`'s JSON-formatted output into snapshots, one per file.
pub fn parse_snapshots(stdout: impl AsRef<[u8]>) -> Result<Vec<FileTagSnapshot>, String> {
  // `serde_json` doesn't handle the empty case.
  if stdout.as_ref().iter().all(u8::is_ascii_whitespace) {
    return Ok(Vec::new());
  }

  let objects = serde_json::from_slice::<Vec<TagPairs>>(stdout.as_ref()).map_err(|e| {
    format!(
      "Failed to parse ExifTool output as JSON ({e}).\nstdout:\n{}",
      String::from_utf8_lossy(stdout.as_ref())
    )
  })?;

  Ok(
    objects
      .into_iter()
      .map(|TagPairs(pairs)| {
        pairs
          .into_iter()
          .map(|(tag, value)| (tag, value_to_string(value)))
          .collect()
      })
      .collect(),
  )
}

/// Renders a JSON value as text. Strings are taken verbatim.
fn value_to_string(value: Value) -> String {
  match value {
    Value::String(s) => s,
    Value::Null => String::new(),
    other => other.to_string(),
  }
}

/// Runs `ExifTool` with `args`, returning stdout. Fails if `ExifTool` fails.
pub fn run_exiftool<I: IntoIterator<Item = S>, S: AsRef<OsStr>>(
  program: &Path,
  args: I,
) -> Result<Vec<u8>, String> {
  let mut cmd = Command::new(program);
  cmd.args(args);

  let output = cmd.output().map_err(|e| {
    format!(
      "ExifTool failed to run.\nCommand: {} {}\nError: {e}",
      program.display(),
      display_args(&cmd)
    )
  })?;
  log::trace!("ExifTool output:\n{}", String::from_utf8_lossy(&output.stdout));

  if !output.status.success() {
    return Err(format!(
      "ExifTool did not run successfully.\nArgs: {}\nstderr:\n{}",
      display_args(&cmd),
      String::from_utf8_lossy(&output.stderr)
    ));
  }

  Ok(output.stdout)
}

/// Runs `ExifTool` with `args`, feeding `stdin` to it. The exit status is left
/// to the caller.
fn run_exiftool_with_stdin<I: IntoIterator<Item = S>, S: AsRef<OsStr>>(
  program: &Path,
  args: I,
  stdin: &[u8],
) -> Result<Output, String> {
  let mut cmd = Command::new(program);
  cmd
    .args(args)
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());
  log::trace!("Running ExifTool: {}", display_args(&cmd));

  let mut child = cmd
    .spawn()
    .map_err(|e| format!("ExifTool failed to run.\nArgs: {}\nError: {e}", display_args(&cmd)))?;
  let mut child_stdin = child
    .stdin
    .take()
    .ok_or("Could not open ExifTool's stdin.")?;

  // Written from another thread so a full stdout pipe can't deadlock us.
  let (written, output) = thread::scope(|s| {
    let writer = s.spawn(move || child_stdin.write_all(stdin));
    let output = child.wait_with_output();
    (writer.join(), output)
  });

  let output = output.map_err(|e| format!("ExifTool terminated unexpectedly ({e})."))?;
  log::trace!("ExifTool output:\n{}", String::from_utf8_lossy(&output.stdout));

  match written {
    Ok(Ok(())) => Ok(output),
    Ok(Err(e)) => Err(format!(
      "Failed to send file names to ExifTool ({e}).\nstderr:\n{}",
      String::from_utf8_lossy(&output.stderr)
    )),
    Err(_) => Err("Failed to send file names to ExifTool.".to_string()),
  }
}

fn display_args(cmd: &Command) -> String {
  cmd
    .get_args()
    .map(OsStr::to_string_lossy)
    .collect::<Vec<_>>()
    .join(" ")
}

/// Returns whether `version` is as new or newer than `version_required_min`,
/// where `version` is from `ExifTool`'s stdout.
fn version_check(version: &[u8], version_required_min: (u32, u32)) -> Result<(), String> {
  let version = String::from_utf8_lossy(version);
  let Some((major, minor)) = version.trim().split_once('.') else {
    return Err(format!("Unexpected ExifTool version string: \"{version}\""));
  };

  let major = major.parse::<u32>();
  let minor = minor.parse::<u32>();
  let (Ok(major), Ok(minor)) = (major, minor) else {
    return Err(format!("Unexpected ExifTool version: {version}"));
  };

  if major > version_required_min.0
    || (major == version_required_min.0 && minor >= version_required_min.1)
  {
    Ok(())
  } else {
    Err(format!(
      "ExifTool version {major}.{minor} is too old (needs {}.{} or newer).",
      version_required_min.0, version_required_min.1
    ))
  }
}


#[cfg(test)]
mod test_match_to_files {
  use super::*;
  use crate::testing::*;

  #[test]
  fn fills_gap_for_skipped_file() {
    let names = ["a.jpg", "b.jpg", "c.jpg"].map(String::from);
    let snapshots = vec![
      snapshot! { "SourceFile": "a.jpg", "EXIF:Make": "Canon" },
      snapshot! { "SourceFile": "c.jpg", "EXIF:Make": "Nikon" },
    ];

    let matched = match_to_files(&names, snapshots);

    assert_eq!(matched.len(), 3);
    assert_eq!(matched[0].get("EXIF:Make"), Some("Canon"));
    assert!(matched[1].is_empty());
    assert_eq!(matched[2].get("EXIF:Make"), Some("Nikon"));
  }

  #[test]
  fn matches_duplicates_in_order() {
    let names = ["a.jpg", "a.jpg"].map(String::from);
    let snapshots = vec![
      snapshot! { "SourceFile": "a.jpg", "EXIF:Make": "first" },
      snapshot! { "SourceFile": "a.jpg", "EXIF:Make": "second" },
    ];

    let matched = match_to_files(&names, snapshots);

    assert_eq!(matched[0].get("EXIF:Make"), Some("first"));
    assert_eq!(matched[1].get("EXIF:Make"), Some("second"));
  }

  #[test]
  fn matches_windows_separators() {
    let names = [r"C:\photos\a.jpg".to_string()];
    let snapshots = vec![snapshot! { "SourceFile": "C:/photos/a.jpg", "EXIF:Make": "Canon" }];

    let matched = match_to_files(&names, snapshots);

    assert_eq!(matched[0].get("EXIF:Make"), Some("Canon"));
  }
}


#[cfg(test)]
mod test_tag_matches {
  use super::*;

  #[test]
  fn matches_exact_tag() {
    assert!(tag_matches("EXIF:DateTimeOriginal", "EXIF:DateTimeOriginal"));
  }

  #[test]
  fn matches_ungrouped_target_in_any_group() {
    assert!(tag_matches("EXIF:DateTimeOriginal", "DateTimeOriginal"));
  }

  #[test]
  fn does_not_match_other_group() {
    assert!(!tag_matches("XMP:DateTimeOriginal", "EXIF:DateTimeOriginal"));
  }
}
