// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Conversion of parsed dates & times into their output representations.

use chrono::{
  DateTime, FixedOffset, Local, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone,
};
use chrono_tz::Tz;

use super::{ParsedInstant, ResolvedDatetime};

/// ISO 8601 extended format, always with microseconds and a signed offset.
const ISO8601_EXTENDED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f%:z";

/// Where the UTC offset for a date & time without one comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaiveZone {
  /// The same offset for every value.
  Fixed(FixedOffset),
  /// The named zone's offset at each value's own date & time.
  Named(Tz),
}

impl NaiveZone {
  /// The computer's offset right now. Note this ignores whether daylight saving
  /// time applied at the date being converted.
  pub fn system_current() -> Self {
    Self::Fixed(Local::now().offset().fix())
  }

  fn offset_at(&self, date_time: &NaiveDateTime) -> FixedOffset {
    match self {
      Self::Fixed(offset) => *offset,
      Self::Named(time_zone) => get_offset_for_time_zone(date_time, time_zone),
    }
  }
}

/// Determines the time zone offset at a given date and time, within the named
/// time zone. Ambiguous times (clocks turned back) take the earlier offset, and
/// skipped times (clocks turned forward) take the offset after the change.
pub fn get_offset_for_time_zone(date_time: &NaiveDateTime, time_zone: &Tz) -> FixedOffset {
  match time_zone.offset_from_local_datetime(date_time) {
    LocalResult::Single(offset) | LocalResult::Ambiguous(offset, _) => offset.fix(),
    LocalResult::None => {
      let before = time_zone
        .offset_from_utc_datetime(&(*date_time - TimeDelta::days(1)))
        .fix();
      time_zone
        .offset_from_utc_datetime(&(*date_time - before))
        .fix()
    }
  }
}

/// A resolved date & time, in the forms written to output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedOutput {
  /// e.g. `2012-12-05T22:46:41.000000+09:00`.
  pub iso8601_extended: String,
  /// Microseconds since the UNIX epoch.
  pub unix_micros:      i64,
}

impl NormalizedOutput {
  /// Seconds since the UNIX epoch.
  #[allow(clippy::cast_precision_loss)]
  pub fn local_unix_timestamp(&self) -> f64 {
    self.unix_micros as f64 / 1_000_000.0
  }

  /// Seconds since the UNIX epoch, with exactly six decimals.
  pub fn local_unix_string(&self) -> String {
    let sign = if self.unix_micros < 0 { "-" } else { "" };
    let micros = self.unix_micros.unsigned_abs();
    format!("{sign}{}.{:06}", micros / 1_000_000, micros % 1_000_000)
  }
}

/// Converts parsed dates & times to output form, attaching offsets to naive
/// values from `naive_zone`.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
  naive_zone: NaiveZone,
}

impl Normalizer {
  pub fn new(naive_zone: NaiveZone) -> Self {
    Self { naive_zone }
  }

  /// Makes `instant` offset-aware, keeping an explicit offset if it has one.
  pub fn to_aware(&self, instant: &ParsedInstant) -> DateTime<FixedOffset> {
    let offset = instant
      .offset
      .unwrap_or_else(|| self.naive_zone.offset_at(&instant.date_time));

    DateTime::from_naive_utc_and_offset(instant.date_time - offset, offset)
  }

  pub fn normalize(&self, instant: &ParsedInstant) -> NormalizedOutput {
    let aware = self.to_aware(instant);

    NormalizedOutput {
      iso8601_extended: aware.format(ISO8601_EXTENDED_FORMAT).to_string(),
      unix_micros:      aware.timestamp_micros(),
    }
  }

  /// As `normalize`, or `None` if no date & time was resolved.
  pub fn normalize_resolved(&self, resolved: &ResolvedDatetime) -> Option<NormalizedOutput> {
    resolved.instant().map(|instant| self.normalize(instant))
  }
}


#[cfg(test)]
mod test_normalizer {
  use super::*;
  use crate::{prim::parse_tag_value, testing::*};

  fn fixed(hours: i32) -> Normalizer {
    Normalizer::new(NaiveZone::Fixed(FixedOffset::east_opt(hours * 3600).unwrap()))
  }

  #[test]
  fn keeps_explicit_offset() {
    let instant = parse_tag_value("-", "2012:12:05 22:46:41+09:00").unwrap();

    let normalized = fixed(-5).normalize(&instant);

    assert_eq!(normalized.iso8601_extended, "2012-12-05T22:46:41.000000+09:00");
    assert_eq!(normalized.local_unix_string(), "1354715201.000000");
  }

  #[test]
  fn attaches_naive_zone_offset() {
    let instant = parse_tag_value("-", "2012:12:05 22:46:41").unwrap();

    let normalized = fixed(9).normalize(&instant);

    assert_eq!(normalized.iso8601_extended, "2012-12-05T22:46:41.000000+09:00");
    assert_eq!(normalized.local_unix_string(), "1354715201.000000");
  }

  #[test]
  fn attaches_named_zone_offset_at_value_date() {
    let normalizer = Normalizer::new(NaiveZone::Named("America/Los_Angeles".parse().unwrap()));
    let summer = parse_tag_value("-", "2020:07:01 12:00:00").unwrap();
    let winter = parse_tag_value("-", "2020:01:01 12:00:00").unwrap();

    assert_eq!(
      normalizer.normalize(&summer).iso8601_extended,
      "2020-07-01T12:00:00.000000-07:00"
    );
    assert_eq!(
      normalizer.normalize(&winter).iso8601_extended,
      "2020-01-01T12:00:00.000000-08:00"
    );
  }

  #[test]
  fn writes_utc_as_signed_offset() {
    let instant = parse_tag_value("-", "2000:01:01 00:00:00Z").unwrap();

    let normalized = fixed(9).normalize(&instant);

    assert_eq!(normalized.iso8601_extended, "2000-01-01T00:00:00.000000+00:00");
    assert_eq!(normalized.local_unix_string(), "946684800.000000");
  }

  #[test]
  fn keeps_microseconds() {
    let instant = parse_tag_value("-", "2000:01:01 00:00:00.123456789+00:00").unwrap();

    let normalized = fixed(0).normalize(&instant);

    assert_eq!(normalized.iso8601_extended, "2000-01-01T00:00:00.123456+00:00");
    assert_eq!(normalized.local_unix_string(), "946684800.123456");
    assert!((normalized.local_unix_timestamp() - 946_684_800.123_456).abs() < 1e-6);
  }

  #[test]
  fn formats_negative_timestamp() {
    let instant = parse_tag_value("-", "1969:12:31 23:59:58.5+00:00").unwrap();

    let normalized = fixed(0).normalize(&instant);

    assert_eq!(normalized.local_unix_string(), "-1.500000");
  }

  #[test]
  fn is_idempotent() {
    let normalizer = fixed(2);
    let instant = ParsedInstant {
      date_time: make_date_naive(2012, 12, 5, 22, 46, 41, 5),
      offset:    None,
    };

    assert_eq!(normalizer.normalize(&instant), normalizer.normalize(&instant));
  }

  #[test]
  fn returns_none_for_undetermined() {
    assert!(fixed(0).normalize_resolved(&ResolvedDatetime::Undetermined).is_none());
  }

  #[test]
  fn to_aware_matches_make_date() {
    let instant = parse_tag_value("-", "2000:01:01 00:00:00.999-08:00").unwrap();

    assert_eq!(fixed(0).to_aware(&instant), make_date(2000, 1, 1, 0, 0, 0, 999, -8));
  }
}

#[cfg(test)]
mod test_naive_zone {
  use super::*;

  #[test]
  fn system_current_is_fixed_at_current_offset() {
    assert_eq!(
      NaiveZone::system_current(),
      NaiveZone::Fixed(Local::now().offset().fix())
    );
  }

  #[test]
  fn system_current_ignores_value_date() {
    let zone = NaiveZone::system_current();
    let NaiveZone::Fixed(offset) = zone else {
      panic!("Unexpected named zone.");
    };
    let winter = make_naive(2020, 1, 1);
    let summer = make_naive(2020, 7, 1);

    assert_eq!(zone.offset_at(&winter), offset);
    assert_eq!(zone.offset_at(&summer), offset);
  }

  fn make_naive(year: i32, month: u32, day: u32) -> NaiveDateTime {
    crate::testing::make_date_naive(year, month, day, 12, 0, 0, 0)
  }
}
