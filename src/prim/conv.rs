// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Conversion of raw `ExifTool` tag values into dates & times.

use std::{
  fmt::{self, Display, Formatter},
  sync::LazyLock,
};

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};

/// A civil date & time, along with its UTC offset if the tag value had one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedInstant {
  pub date_time: NaiveDateTime,
  pub offset:    Option<FixedOffset>,
}

/// Why a tag value was rejected as a date & time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailure {
  /// Blank, or a placeholder such as `0000:00:00 00:00:00`.
  EmptyOrPlaceholder,
  /// Did not match any known encoding.
  UnrecognizedFormat,
  /// Matched an encoding, but a field is out of range (e.g. month 13).
  InvalidCalendarValue,
}

impl Display for ParseFailure {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::EmptyOrPlaceholder => "empty or placeholder value",
      Self::UnrecognizedFormat => "unrecognized date & time format",
      Self::InvalidCalendarValue => "invalid calendar value",
    })
  }
}

// Date separators may be `:` (`ExifTool`'s canonical form) or `-` (ISO 8601).
const DATE: &str = r"(?P<year>\d{4})[:-](?P<month>\d{2})[:-](?P<day>\d{2})";
const TIME_SECONDS: &str =
  r"[ T](?P<hour>\d{2}):(?P<minute>\d{2}):(?P<second>\d{2})(?:\.(?P<frac>\d{1,9}))?";
const TIME_MINUTES: &str = r"[ T](?P<hour>\d{2}):(?P<minute>\d{2})";
const OFFSET: &str = r" ?(?P<offset>Z|[+-]\d{2}(?::?\d{2})?)";
// `ExifTool` flags some QuickTime values with a trailing ` DST`.
const DST: &str = r"(?: DST)?";

static WITH_OFFSET: LazyLock<Regex> = LazyLock::new(|| compile(&[DATE, TIME_SECONDS, OFFSET, DST]));
static NAIVE: LazyLock<Regex> = LazyLock::new(|| compile(&[DATE, TIME_SECONDS]));
static MINUTES_WITH_OFFSET: LazyLock<Regex> =
  LazyLock::new(|| compile(&[DATE, TIME_MINUTES, OFFSET, DST]));
static MINUTES_NAIVE: LazyLock<Regex> = LazyLock::new(|| compile(&[DATE, TIME_MINUTES]));
static DATE_ONLY: LazyLock<Regex> = LazyLock::new(|| compile(&[DATE]));

fn compile(parts: &[&str]) -> Regex {
  Regex::new(&format!("^{}$", parts.concat())).unwrap()
}

/// Encodings a date & time tag value may arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
  /// `YYYY:MM:DD HH:MM:SS[.f]±HH:MM`, or `Z`.
  WithOffset,
  /// `YYYY:MM:DD HH:MM:SS[.f]`.
  Naive,
  /// `YYYY:MM:DD HH:MM±HH:MM`.
  MinutesWithOffset,
  /// `YYYY:MM:DD HH:MM`.
  MinutesNaive,
  /// `YYYY:MM:DD`, taken as midnight.
  DateOnly,
}

impl Encoding {
  /// Offset-bearing encodings come first, so an offset is never dropped.
  const TRIAL_ORDER: [Self; 5] = [
    Self::WithOffset,
    Self::Naive,
    Self::MinutesWithOffset,
    Self::MinutesNaive,
    Self::DateOnly,
  ];

  fn regex(self) -> &'static Regex {
    match self {
      Self::WithOffset => &WITH_OFFSET,
      Self::Naive => &NAIVE,
      Self::MinutesWithOffset => &MINUTES_WITH_OFFSET,
      Self::MinutesNaive => &MINUTES_NAIVE,
      Self::DateOnly => &DATE_ONLY,
    }
  }
}

/// Parses the raw value of `tag` into a date & time. `tag` is only used for
/// diagnostics.
pub fn parse_tag_value(tag: &str, raw_value: &str) -> Result<ParsedInstant, ParseFailure> {
  let value = raw_value.trim();

  if !value.chars().any(|c| matches!(c, '1'..='9')) {
    return Err(ParseFailure::EmptyOrPlaceholder);
  }

  for encoding in Encoding::TRIAL_ORDER {
    if let Some(caps) = encoding.regex().captures(value) {
      log::trace!("{tag}: `{value}` matched {encoding:?}.");
      return to_instant(&caps);
    }
  }

  Err(ParseFailure::UnrecognizedFormat)
}

/// Builds a validated `ParsedInstant` from the named captures of any
/// `Encoding`. Missing time fields default to zero.
fn to_instant(caps: &Captures) -> Result<ParsedInstant, ParseFailure> {
  let field = |name: &str| -> Result<u32, ParseFailure> {
    caps
      .name(name)
      .map_or(Ok(0), |m| m.as_str().parse::<u32>())
      .map_err(|_| ParseFailure::InvalidCalendarValue)
  };

  let year = i32::try_from(field("year")?).map_err(|_| ParseFailure::InvalidCalendarValue)?;
  let date = NaiveDate::from_ymd_opt(year, field("month")?, field("day")?)
    .ok_or(ParseFailure::InvalidCalendarValue)?;

  // Leap seconds are clamped rather than rejected.
  let second = match field("second")? {
    60 => 59,
    s => s,
  };
  let nano = caps.name("frac").map_or(0, |m| to_nanoseconds(m.as_str()));
  let time = NaiveTime::from_hms_nano_opt(field("hour")?, field("minute")?, second, nano)
    .ok_or(ParseFailure::InvalidCalendarValue)?;

  let offset = caps
    .name("offset")
    .map(|m| parse_offset(m.as_str()))
    .transpose()?;

  Ok(ParsedInstant {
    date_time: date.and_time(time),
    offset,
  })
}

/// Converts 1-9 fractional digits into nanoseconds.
fn to_nanoseconds(digits: &str) -> u32 {
  digits
    .chars()
    .chain(std::iter::repeat('0'))
    .take(9)
    .fold(0, |acc, c| acc * 10 + c.to_digit(10).unwrap_or(0))
}

/// Parses `Z`, `±HH`, `±HHMM` or `±HH:MM`.
fn parse_offset(offset: &str) -> Result<FixedOffset, ParseFailure> {
  if offset == "Z" {
    return FixedOffset::east_opt(0).ok_or(ParseFailure::InvalidCalendarValue);
  }

  let (sign, digits) = offset.split_at(1);
  let digits = digits.replace(':', "");
  let hours = digits[..2]
    .parse::<i32>()
    .map_err(|_| ParseFailure::InvalidCalendarValue)?;
  let minutes = match digits.get(2..) {
    Some(m) if !m.is_empty() => m.parse::<i32>().map_err(|_| ParseFailure::InvalidCalendarValue)?,
    _ => 0,
  };

  if hours > 23 || minutes > 59 {
    return Err(ParseFailure::InvalidCalendarValue);
  }

  let seconds = (hours * 3600 + minutes * 60) * if sign == "-" { -1 } else { 1 };
  FixedOffset::east_opt(seconds).ok_or(ParseFailure::InvalidCalendarValue)
}
