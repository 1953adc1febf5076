//! Shared value types used across the GymStack crates.

pub mod pagination;

pub use pagination::{PageRequest, PageResponse};
