//! Utility functions for UUID generation and timestamp handling.

pub mod timestamps;
mod uuid_utils;

pub use timestamps::{elapsed_ms, format_iso8601, iso_timestamp, now_utc, Timestamp};
pub use uuid_utils::{generate_uuid, generate_uuid_v7};
