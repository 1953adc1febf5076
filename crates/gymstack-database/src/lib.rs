//! # gymstack-database
//!
//! PostgreSQL connection management, the transactional unit-of-work
//! coordinator, and concrete repository implementations for all GymStack
//! entities.
//!
//! The crate is layered bottom-up:
//!
//! - [`connection`] owns the process-wide pool lifecycle;
//! - [`scope`] defines the opaque [`scope::TransactionScope`] handle;
//! - [`store`] dispatches each statement to the pool or to a scope;
//! - [`repositories`] expose typed, scope-aware persistence per entity;
//! - [`unit_of_work`] groups repository calls into atomic transactions.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod scope;
pub mod store;
pub mod unit_of_work;

pub use connection::DatabasePool;
pub use scope::TransactionScope;
pub use store::StoreAdapter;
pub use unit_of_work::{IsolationLevel, TxOptions, UnitOfWork};
