//! Analytics module for careerscope
//!
//! Pure aggregation over rows that have already been fetched:
//! - Window arithmetic for the selectable ranges ([`window`])
//! - Category ranking, consistency and monthly progress ([`aggregate`])
//!
//! Fetching lives in [`crate::dashboard::DashboardService`]; everything here
//! is deterministic given the rows and a reference instant.

pub mod aggregate;
pub mod window;

pub use aggregate::{consistency_percent, monthly_progress, rank_categories, MONTH_NAMES};
pub use window::{monthly_window_start, Window};
