// Copyright 2023-5 Seth Pendergrass. See LICENSE.

//! Primitive types for per-file tag values, and the date & time resolution
//! performed on them.

mod conv;
mod normalize;
mod resolve;
mod snapshot;

pub use conv::*;
pub use normalize::*;
pub use resolve::*;
pub use snapshot::*;
