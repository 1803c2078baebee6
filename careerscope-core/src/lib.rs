//! # careerscope-core
//!
//! Core library for careerscope - a career analytics dashboard.
//!
//! This library provides:
//! - Domain types for achievements, daily wins and profiles
//! - Row-store clients (PostgREST over HTTP, local SQLite mirror)
//! - Aggregation of dashboard statistics
//! - Streaming career-insight generation
//! - The dashboard state machine and its view projection
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Data flow
//!
//! - **Collaborators:** auth provider, row store, text generator, notifier
//! - **State:** [`dashboard::DashboardState`] consumes events and emits commands
//! - **Service:** [`dashboard::DashboardService`] executes commands and turns
//!   their outcomes back into events
//! - **View:** [`view::project`] renders state into display-ready values
//!
//! ## Example
//!
//! ```rust,no_run
//! use careerscope_core::{Config, TimeRange};
//! use careerscope_core::dashboard::{DashboardEvent, DashboardService, DashboardState};
//!
//! # async fn run() -> careerscope_core::Result<()> {
//! let config = Config::load()?;
//! let service = DashboardService::from_config(&config)?;
//! let identity = careerscope_core::auth::from_config(&config)?.current_user().await?;
//!
//! let mut state = DashboardState::new(TimeRange::Last30Days, service.insights_enabled());
//! service.drive(&mut state, DashboardEvent::AuthResolved(identity)).await;
//! println!("{} achievements", state.summary.total_achievements);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod insights;
pub mod logging;
pub mod notify;
pub mod store;
pub mod types;
pub mod view;
