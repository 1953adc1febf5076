//! Subscription domain entities.

pub mod model;
pub mod status;

pub use model::{CreateSubscription, Subscription, SubscriptionFilter, UpdateSubscription};
pub use status::SubscriptionStatus;
