// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Picks the date & time tag to trust for a file, by priority.

use super::{FileTagSnapshot, ParsedInstant, parse_tag_value};

/// Outcome of resolving a file's date & time from its tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedDatetime {
  /// `tag` was the highest priority tag with a usable value.
  Resolved {
    tag:       String,
    raw_value: String,
    instant:   ParsedInstant,
  },
  /// No tag in the priority list had a usable value. Not an error.
  Undetermined,
}

impl ResolvedDatetime {
  pub fn instant(&self) -> Option<&ParsedInstant> {
    match self {
      Self::Resolved { instant, .. } => Some(instant),
      Self::Undetermined => None,
    }
  }

  pub fn raw_value(&self) -> Option<&str> {
    match self {
      Self::Resolved { raw_value, .. } => Some(raw_value),
      Self::Undetermined => None,
    }
  }

  pub fn tag(&self) -> Option<&str> {
    match self {
      Self::Resolved { tag, .. } => Some(tag),
      Self::Undetermined => None,
    }
  }
}

/// Walks `priority` in order and returns the first tag in `snapshot` whose
/// value parses. Absent tags and unparsable values are skipped alike, and
/// lower priority tags are never looked at once one succeeds.
pub fn resolve(snapshot: &FileTagSnapshot, priority: &[String]) -> ResolvedDatetime {
  let source = snapshot.source_file().unwrap_or("-");

  for tag in priority {
    let Some(raw_value) = snapshot.get(tag) else {
      continue;
    };

    match parse_tag_value(tag, raw_value) {
      Ok(instant) => {
        return ResolvedDatetime::Resolved {
          tag: tag.clone(),
          raw_value: raw_value.to_string(),
          instant,
        };
      }
      Err(failure) => log::debug!("{source}: Skipping {tag} `{raw_value}` ({failure})."),
    }
  }

  ResolvedDatetime::Undetermined
}
