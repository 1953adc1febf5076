//! # gymstack-core
//!
//! Core crate for GymStack. Contains the generic repository contract,
//! configuration schemas, pagination types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other GymStack crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
