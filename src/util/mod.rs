//! Shared formatting helpers.

pub mod hex;
