//! Core domain types for careerscope
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Achievement** | A logged accomplishment with a category and a timestamp |
//! | **Daily win** | A logged per-day positive event, used for the consistency score |
//! | **Profile** | Display fields of the signed-in user |
//! | **Summary** | Aggregates derived from the rows of one time window |
//! | **Insight** | Short generated career recommendation derived from a summary |
//!
//! Records are owned by the row store; this crate only reads them. Summaries
//! are recomputed on every load and never written back.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label for achievements stored without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

// ============================================
// Identity
// ============================================

/// The signed-in user as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Row-store user id
    pub id: String,
    /// Email address, if known
    #[serde(default)]
    pub email: Option<String>,
}

/// Display fields from the `profiles` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

// ============================================
// Rows
// ============================================

/// Projection of `achievements.category`
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRow {
    #[serde(default)]
    pub category: Option<String>,
}

/// Projection of a `created_at` column
#[derive(Debug, Clone, Deserialize)]
pub struct TimestampRow {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Parse a store timestamp.
///
/// Accepts RFC 3339 and the Postgres text forms with or without an offset
/// (`2024-05-03 12:00:00+00`, `2024-05-03T12:00:00.123456`). Values without
/// an offset are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }

    let with_offset = ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];
    if let Some(ts) = with_offset
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
    {
        return Some(ts.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp '{}'", raw)))
}

// ============================================
// Time range
// ============================================

/// Selectable dashboard window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeRange {
    /// Last 30 calendar days
    #[default]
    #[serde(rename = "30days")]
    Last30Days,
    /// Last 90 calendar days
    #[serde(rename = "90days")]
    Last90Days,
    /// Last calendar year
    #[serde(rename = "year")]
    LastYear,
}

impl TimeRange {
    /// All ranges in selector order.
    pub const ALL: [TimeRange; 3] = [
        TimeRange::Last30Days,
        TimeRange::Last90Days,
        TimeRange::LastYear,
    ];

    /// Stable identifier used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Last30Days => "30days",
            TimeRange::Last90Days => "90days",
            TimeRange::LastYear => "year",
        }
    }

    /// Human-friendly selector label.
    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::Last30Days => "Last 30 days",
            TimeRange::Last90Days => "Last 90 days",
            TimeRange::LastYear => "Last year",
        }
    }

    /// The range after this one, wrapping around.
    pub fn next(&self) -> Self {
        match self {
            TimeRange::Last30Days => TimeRange::Last90Days,
            TimeRange::Last90Days => TimeRange::LastYear,
            TimeRange::LastYear => TimeRange::Last30Days,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "30days" | "30d" => Ok(TimeRange::Last30Days),
            "90days" | "90d" => Ok(TimeRange::Last90Days),
            "year" | "1y" | "365d" => Ok(TimeRange::LastYear),
            other => Err(format!(
                "unknown time range '{}'; use 30days, 90days or year",
                other
            )),
        }
    }
}

// ============================================
// Summary
// ============================================

/// Achievement count for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

/// Achievement count for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    /// Three-letter month name ("Jan".."Dec")
    pub month: String,
    pub count: u64,
}

/// Aggregated dashboard statistics for one window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalyticsSummary {
    /// Achievements created inside the window
    pub total_achievements: u64,
    /// Daily wins created inside the window
    pub total_daily_wins: u64,
    /// Percent of window days with at least one daily win (unclamped)
    pub consistency: u32,
    /// Categories sorted by count descending, ties in first-seen order
    pub achievements_by_category: Vec<CategoryCount>,
    /// Current month and the two before it, oldest first
    pub monthly_progress: Vec<MonthCount>,
}

impl AnalyticsSummary {
    /// Highest-ranked category, if any.
    pub fn top_category(&self) -> Option<&str> {
        self.achievements_by_category
            .first()
            .map(|c| c.category.as_str())
    }

    /// Names of the first `n` ranked categories.
    pub fn top_categories(&self, n: usize) -> Vec<&str> {
        self.achievements_by_category
            .iter()
            .take(n)
            .map(|c| c.category.as_str())
            .collect()
    }

    /// True when there is nothing to rank.
    pub fn has_categories(&self) -> bool {
        !self.achievements_by_category.is_empty()
    }
}
