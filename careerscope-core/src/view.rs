//! Display projection of the dashboard state
//!
//! Turns a [`DashboardState`] and the local hour into ready-to-render values.
//! Front ends only lay these out.

use serde::Serialize;

use crate::dashboard::{DashboardState, InsightPhase, LoadPhase};
use crate::types::{CategoryCount, MonthCount, Profile};

pub const SUBTITLE: &str = "Here's what's happening today in your career analysis.";
pub const FALLBACK_NAME: &str = "User";
pub const NO_DATA: &str = "No data";

/// Time-of-day greeting for a 24-hour clock hour.
pub fn greeting(hour: u32) -> &'static str {
    if hour < 12 {
        "Good Morning"
    } else if hour < 18 {
        "Good Afternoon"
    } else {
        "Good Evening"
    }
}

/// First name, else the local part of the email, else [`FALLBACK_NAME`].
pub fn display_name(profile: &Profile, email: Option<&str>) -> String {
    let first_name = profile.first_name.as_deref().filter(|s| !s.is_empty());
    let local_part = email
        .and_then(|e| e.split('@').next())
        .filter(|s| !s.is_empty());

    first_name
        .or(local_part)
        .unwrap_or(FALLBACK_NAME)
        .to_string()
}

/// One headline metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatCard {
    pub title: &'static str,
    pub value: String,
}

/// What the insight panel should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "text", rename_all = "lowercase")]
pub enum InsightView {
    Disabled,
    Idle,
    Loading,
    Ready(String),
    Error(String),
}

/// Everything the dashboard screen renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub greeting: String,
    pub subtitle: &'static str,
    pub has_avatar: bool,
    pub range_label: &'static str,
    pub cards: [StatCard; 4],
    pub categories: Vec<CategoryCount>,
    pub monthly_progress: Vec<MonthCount>,
    pub insight: InsightView,
    /// Set when the latest load failed and older numbers are shown
    pub stale: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Dashboard(Box<DashboardView>),
}

/// Project the state for the given local hour (0-23).
pub fn project(state: &DashboardState, hour: u32) -> Screen {
    if state.is_loading() {
        return Screen::Loading;
    }

    let summary = &state.summary;
    let email = state.user().and_then(|u| u.email.as_deref());
    let name = display_name(&state.profile, email);

    let insight = match (&state.insight, state.insights_enabled) {
        (InsightPhase::Idle, false) => InsightView::Disabled,
        (InsightPhase::Idle, true) => InsightView::Idle,
        (InsightPhase::Loading, _) => InsightView::Loading,
        (InsightPhase::Ready(text), _) => InsightView::Ready(text.clone()),
        (InsightPhase::Error(message), _) => InsightView::Error(message.clone()),
    };

    Screen::Dashboard(Box::new(DashboardView {
        greeting: format!("{}, {}", greeting(hour), name),
        subtitle: SUBTITLE,
        has_avatar: state
            .profile
            .avatar_url
            .as_deref()
            .is_some_and(|url| !url.is_empty()),
        range_label: state.range.label(),
        cards: [
            StatCard {
                title: "Total Achievements",
                value: summary.total_achievements.to_string(),
            },
            StatCard {
                title: "Daily Wins",
                value: summary.total_daily_wins.to_string(),
            },
            StatCard {
                title: "Consistency Score",
                value: format!("{}%", summary.consistency),
            },
            StatCard {
                title: "Top Category",
                value: summary.top_category().unwrap_or(NO_DATA).to_string(),
            },
        ],
        categories: summary.achievements_by_category.clone(),
        monthly_progress: summary.monthly_progress.clone(),
        insight,
        stale: matches!(state.load, LoadPhase::Error(_)),
    }))
}
