// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Program subcommands. Each reads the input CSV, reads tags for every listed
//! file, and writes the input back out with columns added.

use std::{collections::HashMap, path::PathBuf};

use crate::{
  config::{ExtractConfig, InputCsvConfig, TagsConfig},
  io::{Progress, ProgressLogger, TagProvider, Table},
  prim::{FileTagSnapshot, NormalizedOutput, Normalizer, resolve},
};

/// Adds the date & time each listed file was taken, resolved from the
/// configured tags in priority order. Files with no usable tag get empty
/// cells.
pub fn extract(
  config: &ExtractConfig,
  provider: &mut impl TagProvider,
  normalizer: &Normalizer,
) -> Result<(), String> {
  let input = &config.input.file_paths_list_csv;
  let output = &config.output.file_paths_list_with_image_taken_datetime_csv;
  let priority = &config
    .process
    .exiftool_tags_of_image_taken_datetime_in_priority_order;

  let mut table = read_input(input)?;
  for column in output.new_columns() {
    if table.column(column).is_some() {
      return Err(format!(
        "{}: Column \"{column}\" already exists in the input CSV.",
        input.path.display()
      ));
    }
  }

  let mut logger = ProgressLogger::new(config.progress_period());
  let snapshots = read_snapshots(&table, input, provider, &mut logger)?;

  log::info!("Searching image taken date & time.");
  let mut tags = Vec::with_capacity(snapshots.len());
  let mut raw_values = Vec::with_capacity(snapshots.len());
  let mut iso8601 = Vec::with_capacity(snapshots.len());
  let mut unix = Vec::with_capacity(snapshots.len());
  let mut resolved_count = 0_usize;

  for (file, snapshot) in table
    .column_values(&input.file_paths_list_column)?
    .into_iter()
    .zip(&snapshots)
  {
    let resolved = resolve(snapshot, priority);
    let normalized = normalizer.normalize_resolved(&resolved);

    match (resolved.tag(), &normalized) {
      (Some(tag), Some(n)) => {
        log::debug!(
          "{file}: {tag} -> {} ({:.6}).",
          n.iso8601_extended,
          n.local_unix_timestamp()
        );
        resolved_count += 1;
      }
      _ if snapshot.is_empty() => log::debug!("{file}: No tags."),
      _ => log::debug!("{file}: No date & time among {} tags.", snapshot.len()),
    }

    tags.push(resolved.tag().unwrap_or_default().to_string());
    raw_values.push(resolved.raw_value().unwrap_or_default().to_string());
    iso8601.push(
      normalized
        .as_ref()
        .map(|n| n.iso8601_extended.clone())
        .unwrap_or_default(),
    );
    unix.push(
      normalized
        .as_ref()
        .map(NormalizedOutput::local_unix_string)
        .unwrap_or_default(),
    );
  }

  log::info!(
    "Found image taken date & time for {resolved_count} of {} files.",
    snapshots.len()
  );

  let [tag_column, raw_column, iso_column, unix_column] = output.new_columns();
  table.push_column(tag_column, tags)?;
  table.push_column(raw_column, raw_values)?;
  table.push_column(iso_column, iso8601)?;
  table.push_column(unix_column, unix)?;

  table.write_csv(&output.path, output.encoding)
}

/// Adds a column per tag found in the listed files. Values are masked unless
/// specific tags are configured.
pub fn tags(config: &TagsConfig, provider: &mut impl TagProvider) -> Result<(), String> {
  let input = &config.input.file_paths_list_csv;
  let output = &config.output.file_paths_list_with_exiftool_tags_csv;

  if config.is_specific_tags_mode() {
    log::info!("Running in specific tags mode: Showing all values.");
  } else {
    log::info!("Running in all tags mode: Masking all values.");
  }

  let mut table = read_input(input)?;
  let mut logger = ProgressLogger::new(config.progress_period());
  let snapshots = read_snapshots(&table, input, provider, &mut logger)?;

  let mask = (!config.is_specific_tags_mode()).then_some(output.value_masking_string.as_str());
  let columns = tag_columns(&snapshots, mask);
  log::info!("Found {} distinct tags.", columns.len());

  for header in &mut table.headers {
    if columns.iter().any(|(tag, _)| tag == &*header) {
      let renamed = format!("{header}{}", output.original_columns_suffix);
      log::debug!("Renaming input column \"{header}\" to \"{renamed}\".");
      *header = renamed;
    }
  }
  for (tag, _) in &columns {
    if table.column(tag).is_some() {
      return Err(format!(
        "{}: Column \"{tag}\" collides with a tag column even after renaming.",
        input.path.display()
      ));
    }
  }

  for (tag, values) in columns {
    table.push_column(tag, values)?;
  }

  table.write_csv(&output.path, output.encoding)
}

/// Reads the input CSV, which must have at least one row.
fn read_input(input: &InputCsvConfig) -> Result<Table, String> {
  let table = Table::read_csv(&input.path, input.encoding)?;

  if table.rows.is_empty() {
    return Err(format!("{}: No rows in the input CSV.", input.path.display()));
  }

  Ok(table)
}

/// Reads one snapshot per row of `table`, in row order.
fn read_snapshots(
  table: &Table,
  input: &InputCsvConfig,
  provider: &mut impl TagProvider,
  logger: &mut ProgressLogger,
) -> Result<Vec<FileTagSnapshot>, String> {
  let files = table
    .column_values(&input.file_paths_list_column)?
    .into_iter()
    .map(PathBuf::from)
    .collect::<Vec<_>>();

  log::info!("Scanning tags of {} files.", files.len());
  let snapshots = provider.read_tags(&files, &mut |p: Progress| logger.report(p))?;

  if snapshots.len() != files.len() {
    return Err(format!(
      "Tags were read for {} files, but {} were requested.",
      snapshots.len(),
      files.len()
    ));
  }

  Ok(snapshots)
}

/// One `(tag, values)` column per distinct tag, most common first, ties in
/// order of first appearance. Values are replaced by `mask` if given. Cells
/// for files without the tag are empty.
fn tag_columns(snapshots: &[FileTagSnapshot], mask: Option<&str>) -> Vec<(String, Vec<String>)> {
  let mut index = HashMap::<&str, usize>::new();
  let mut columns = Vec::<(String, Vec<String>)>::new();
  let mut counts = Vec::<usize>::new();

  for (row, snapshot) in snapshots.iter().enumerate() {
    for (tag, value) in snapshot.iter() {
      let i = *index.entry(tag).or_insert_with(|| {
        columns.push((tag.to_string(), vec![String::new(); snapshots.len()]));
        counts.push(0);
        columns.len() - 1
      });

      columns[i].1[row] = mask.unwrap_or(value).to_string();
      counts[i] += 1;
    }
  }

  let mut order = (0..columns.len()).collect::<Vec<_>>();
  // Stable, so ties keep first-seen order.
  order.sort_by_key(|&i| std::cmp::Reverse(counts[i]));

  let mut columns = columns.into_iter().map(Some).collect::<Vec<_>>();
  order
    .into_iter()
    .filter_map(|i| columns[i].take())
    .collect()
}
