// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Defaults for optional configuration values.

pub const EXIFTOOL_PATH: &str = "exiftool";

// Paths per `ExifTool` run. Bounds the size of each run's JSON output.
pub const EXIFTOOL_BATCH_SIZE: usize = 256;

// Columns added by `extract`.
pub const DATETIME_TAG_BY_EXIFTOOL_COLUMN: &str = "datetime_tag_by_exiftool";
pub const DATETIME_BY_EXIFTOOL_COLUMN: &str = "datetime_by_exiftool";
pub const DATETIME_AWARE_ISO8601_EXTENDED_COLUMN: &str = "datetime_aware_iso8601_extended";
pub const DATETIME_LOCAL_UNIX_COLUMN: &str = "datetime_local_unix";

// `tags` output.
pub const VALUE_MASKING_STRING: &str = "●";
pub const ORIGINAL_COLUMNS_SUFFIX: &str = "_ORG";
