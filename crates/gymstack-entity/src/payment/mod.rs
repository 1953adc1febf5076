//! Payment domain entities.

pub mod model;
pub mod status;

pub use model::{CreatePayment, Payment, PaymentFilter, UpdatePayment};
pub use status::{PaymentMethod, PaymentStatus};
