//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod description;
mod period;
mod retention;
mod snapshot;

pub use description::{
    DESCRIPTION_MARKER, TIMESTAMP_FORMAT, classify_description, encode_description,
};
pub use period::Period;
pub use retention::{RetentionPolicy, calc_rotate};
pub use snapshot::{ResourceTag, Snapshot, Volume};
