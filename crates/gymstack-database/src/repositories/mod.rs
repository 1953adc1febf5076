//! Repository implementations for all GymStack entities.
//!
//! Every repository is constructed once over a [`crate::StoreAdapter`]
//! and shared for the process lifetime. All operations, baseline and
//! domain-specific alike, accept an optional transaction scope as their
//! last parameter so they can participate in a unit of work or run
//! standalone.

pub mod academy;
pub mod attendance;
pub mod payment;
pub mod plan;
pub mod subscription;
pub mod token;
pub mod user;

pub use academy::AcademyRepository;
pub use attendance::AttendanceRepository;
pub use payment::PaymentRepository;
pub use plan::PlanRepository;
pub use subscription::SubscriptionRepository;
pub use token::RefreshTokenRepository;
pub use user::UserRepository;
