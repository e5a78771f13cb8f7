//! Operational metrics for a course-management dashboard.
//!
//! [`metrics::compute`] turns course and enrollment records into the figures
//! the dashboard shows: running and upcoming courses, payment rate, revenue
//! from paid enrollments and enrollments per month.

pub mod calendar;
pub mod config;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod report;
pub mod sample;

pub use metrics::compute;
pub use models::{Course, CourseRefs, DashboardMetrics, Enrollment, RecordId, RosterCounts};
