//! Dashboard orchestration
//!
//! - [`DashboardState`] holds the model and decides what should happen next
//! - [`DashboardService`] performs it against the store, generator and notifier
//!
//! Interactive front ends run each [`Command`] on their own executor and feed
//! the resulting events back in; batch callers use [`DashboardService::drive`].

mod service;
mod state;

pub use service::DashboardService;
pub use state::{
    AuthState, Command, DashboardEvent, DashboardState, InsightPhase, InsightTicket, LoadPhase,
    LoadTicket, INSIGHTS_DISABLED_MESSAGE,
};
