//! Academy domain entities.

pub mod model;

pub use model::{Academy, AcademyFilter, CreateAcademy, UpdateAcademy};
