//! Membership plan domain entities.

pub mod model;

pub use model::{CreatePlan, Plan, PlanFilter, UpdatePlan};
