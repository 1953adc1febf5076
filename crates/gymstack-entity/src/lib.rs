//! # gymstack-entity
//!
//! Domain entity models for GymStack. Every struct in this crate
//! represents a database table row, a create/update payload, or a query
//! filter. All row entities derive `Debug`, `Clone`, `Serialize`,
//! `Deserialize`, and `sqlx::FromRow`.

pub mod academy;
pub mod attendance;
pub mod payment;
pub mod plan;
pub mod subscription;
pub mod token;
pub mod user;
