//! Attendance domain entities.

pub mod model;

pub use model::{Attendance, AttendanceFilter, CheckIn, UpdateAttendance};
