//! Core trait definitions shared across the GymStack crates.

pub mod repository;

pub use repository::Repository;
