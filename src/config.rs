// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! YAML configuration for each subcommand.

use std::{
  fmt::Display,
  fs,
  path::{Path, PathBuf},
  str::FromStr,
  time::Duration,
};

use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, de, de::DeserializeOwned};

use crate::io::TextEncoding;

mod constants;

/// `INPUT` > `FILE_PATHS_LIST_CSV`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct InputCsvConfig {
  /// Must be an existing file.
  pub path:                   PathBuf,
  #[serde(default, deserialize_with = "from_str")]
  pub encoding:               TextEncoding,
  pub file_paths_list_column: String,
}

/// `INPUT`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct InputConfig {
  pub file_paths_list_csv: InputCsvConfig,
}

/// `PROCESS` for `extract`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct ExtractProcessConfig {
  /// Zone for values without an offset. The system's current offset if unset.
  #[serde(default, deserialize_with = "time_zone")]
  pub default_timezone_for_naive_datetime_value:               Option<Tz>,
  /// No progress is logged if unset.
  #[serde(default)]
  pub exiftool_progress_print_period_seconds:                  Option<f64>,
  #[serde(default = "exiftool_path")]
  pub exiftool_path:                                           PathBuf,
  #[serde(default = "exiftool_batch_size")]
  pub exiftool_batch_size:                                     usize,
  #[serde(alias = "TARGET_EXIFTOOL_TAGS")]
  pub exiftool_tags_of_image_taken_datetime_in_priority_order: Vec<String>,
}

/// `OUTPUT` > `FILE_PATHS_LIST_WITH_IMAGE_TAKEN_DATETIME_CSV`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct ExtractOutputCsvConfig {
  /// Must not exist, but its parent directory must.
  pub path:                                   PathBuf,
  #[serde(default, deserialize_with = "from_str")]
  pub encoding:                               TextEncoding,
  #[serde(default = "datetime_tag_by_exiftool_column")]
  pub datetime_tag_by_exiftool_column:        String,
  #[serde(default = "datetime_by_exiftool_column")]
  pub datetime_by_exiftool_column:            String,
  #[serde(default = "datetime_aware_iso8601_extended_column")]
  pub datetime_aware_iso8601_extended_column: String,
  #[serde(default = "datetime_local_unix_column")]
  pub datetime_local_unix_column:             String,
}

impl ExtractOutputCsvConfig {
  /// Names of the columns added to the input, in output order.
  pub fn new_columns(&self) -> [&str; 4] {
    [
      &self.datetime_tag_by_exiftool_column,
      &self.datetime_by_exiftool_column,
      &self.datetime_aware_iso8601_extended_column,
      &self.datetime_local_unix_column,
    ]
  }
}

/// `OUTPUT` for `extract`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct ExtractOutputConfig {
  pub file_paths_list_with_image_taken_datetime_csv: ExtractOutputCsvConfig,
}

/// Configuration for `extract`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct ExtractConfig {
  pub input:   InputConfig,
  pub process: ExtractProcessConfig,
  pub output:  ExtractOutputConfig,
}

impl ExtractConfig {
  /// Loads and validates `path`.
  pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self, String> {
    let config = read_yaml::<Self>(path.as_ref())?;
    config.validate()?;
    Ok(config)
  }

  pub fn progress_period(&self) -> Option<Duration> {
    progress_period(self.process.exiftool_progress_print_period_seconds)
  }

  fn validate(&self) -> Result<(), String> {
    self.input.file_paths_list_csv.validate()?;

    let process = &self.process;
    validate_period(process.exiftool_progress_print_period_seconds)?;
    validate_batch_size(process.exiftool_batch_size)?;
    if process
      .exiftool_tags_of_image_taken_datetime_in_priority_order
      .is_empty()
    {
      log::warn!("No tags are prioritized. No date & time will be found.");
    }

    let output = &self.output.file_paths_list_with_image_taken_datetime_csv;
    validate_new_path(&output.path)?;

    let columns = output.new_columns();
    for (key, column) in [
      "DATETIME_TAG_BY_EXIFTOOL_COLUMN",
      "DATETIME_BY_EXIFTOOL_COLUMN",
      "DATETIME_AWARE_ISO8601_EXTENDED_COLUMN",
      "DATETIME_LOCAL_UNIX_COLUMN",
    ]
    .into_iter()
    .zip(columns)
    {
      validate_non_empty(key, column)?;
    }
    for (i, column) in columns.iter().enumerate() {
      if columns[..i].contains(column) {
        return Err(format!("Output column \"{column}\" is configured twice."));
      }
    }

    Ok(())
  }
}

/// `PROCESS` for `tags`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct TagsProcessConfig {
  #[serde(default)]
  pub exiftool_progress_print_period_seconds: Option<f64>,
  #[serde(default = "exiftool_path")]
  pub exiftool_path:                          PathBuf,
  #[serde(default = "exiftool_batch_size")]
  pub exiftool_batch_size:                    usize,
  /// If empty, all tags are listed and masked.
  #[serde(default)]
  pub target_exiftool_tags:                   Vec<String>,
}

/// `OUTPUT` > `FILE_PATHS_LIST_WITH_EXIFTOOL_TAGS_CSV`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct TagsOutputCsvConfig {
  /// Must not exist, but its parent directory must.
  pub path:                    PathBuf,
  #[serde(default, deserialize_with = "from_str")]
  pub encoding:                TextEncoding,
  #[serde(default = "value_masking_string")]
  pub value_masking_string:    String,
  /// Appended to input columns sharing a name with a tag.
  #[serde(default = "original_columns_suffix")]
  pub original_columns_suffix: String,
}

/// `OUTPUT` for `tags`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct TagsOutputConfig {
  pub file_paths_list_with_exiftool_tags_csv: TagsOutputCsvConfig,
}

/// Configuration for `tags`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct TagsConfig {
  pub input:   InputConfig,
  pub process: TagsProcessConfig,
  pub output:  TagsOutputConfig,
}

impl TagsConfig {
  /// Loads and validates `path`.
  pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self, String> {
    let config = read_yaml::<Self>(path.as_ref())?;
    config.validate()?;
    Ok(config)
  }

  /// Whether values are listed unmasked, for configured tags only.
  pub fn is_specific_tags_mode(&self) -> bool {
    !self.process.target_exiftool_tags.is_empty()
  }

  pub fn progress_period(&self) -> Option<Duration> {
    progress_period(self.process.exiftool_progress_print_period_seconds)
  }

  fn validate(&self) -> Result<(), String> {
    self.input.file_paths_list_csv.validate()?;

    validate_period(self.process.exiftool_progress_print_period_seconds)?;
    validate_batch_size(self.process.exiftool_batch_size)?;

    let output = &self.output.file_paths_list_with_exiftool_tags_csv;
    validate_new_path(&output.path)?;
    validate_non_empty("VALUE_MASKING_STRING", &output.value_masking_string)?;
    validate_non_empty("ORIGINAL_COLUMNS_SUFFIX", &output.original_columns_suffix)
  }
}

impl InputCsvConfig {
  fn validate(&self) -> Result<(), String> {
    if !self.path.is_file() {
      return Err(format!("{}: Input CSV file does not exist.", self.path.display()));
    }
    validate_non_empty("FILE_PATHS_LIST_COLUMN", &self.file_paths_list_column)
  }
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
  log::info!("Reading config file \"{}\".", path.display());

  let text = fs::read_to_string(path)
    .map_err(|e| format!("{}: Failed to read the config file ({e}).", path.display()))?;

  serde_yaml::from_str(&text)
    .map_err(|e| format!("{}: Failed to parse the config file ({e}).", path.display()))
}

/// Converts a period in seconds to a `Duration`. Infinite, or too long for a
/// `Duration`, means never.
fn progress_period(seconds: Option<f64>) -> Option<Duration> {
  seconds.and_then(|s| Duration::try_from_secs_f64(s).ok())
}

fn validate_period(seconds: Option<f64>) -> Result<(), String> {
  match seconds {
    Some(s) if s.is_nan() || s < 0.0 => Err(format!(
      "\"EXIFTOOL_PROGRESS_PRINT_PERIOD_SECONDS\" must be zero or more, got {s}."
    )),
    _ => Ok(()),
  }
}

fn validate_batch_size(batch_size: usize) -> Result<(), String> {
  if batch_size == 0 {
    return Err("\"EXIFTOOL_BATCH_SIZE\" must be at least 1.".to_string());
  }
  Ok(())
}

fn validate_non_empty(key: &str, value: &str) -> Result<(), String> {
  if value.is_empty() {
    return Err(format!("\"{key}\" must not be empty."));
  }
  Ok(())
}

/// An output path must be new, and go in an existing directory.
fn validate_new_path(path: &Path) -> Result<(), String> {
  if path.exists() {
    return Err(format!("{}: Output file already exists.", path.display()));
  }

  let parent = match path.parent() {
    Some(p) if !p.as_os_str().is_empty() => p,
    _ => Path::new("."),
  };
  if !parent.is_dir() {
    return Err(format!(
      "{}: Output directory does not exist.",
      parent.display()
    ));
  }

  Ok(())
}

fn from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: FromStr,
  T::Err: Display,
{
  String::deserialize(deserializer)?
    .parse()
    .map_err(de::Error::custom)
}

fn time_zone<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Tz>, D::Error> {
  let Some(name) = Option::<String>::deserialize(deserializer)? else {
    return Ok(None);
  };

  name
    .trim()
    .parse::<Tz>()
    .map(Some)
    .map_err(|e| de::Error::custom(format!("\"{name}\" is not a supported time zone ({e}).")))
}

fn exiftool_path() -> PathBuf {
  PathBuf::from(constants::EXIFTOOL_PATH)
}

fn exiftool_batch_size() -> usize {
  constants::EXIFTOOL_BATCH_SIZE
}

fn datetime_tag_by_exiftool_column() -> String {
  constants::DATETIME_TAG_BY_EXIFTOOL_COLUMN.to_string()
}

fn datetime_by_exiftool_column() -> String {
  constants::DATETIME_BY_EXIFTOOL_COLUMN.to_string()
}

fn datetime_aware_iso8601_extended_column() -> String {
  constants::DATETIME_AWARE_ISO8601_EXTENDED_COLUMN.to_string()
}

fn datetime_local_unix_column() -> String {
  constants::DATETIME_LOCAL_UNIX_COLUMN.to_string()
}

fn value_masking_string() -> String {
  constants::VALUE_MASKING_STRING.to_string()
}

fn original_columns_suffix() -> String {
  constants::ORIGINAL_COLUMNS_SUFFIX.to_string()
}
