//! Command execution against the dashboard collaborators

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};

use super::state::{Command, DashboardEvent, DashboardState, InsightTicket, LoadTicket};
use crate::analytics::{self, Window};
use crate::config::Config;
use crate::error::Result;
use crate::insights::{self, HttpChatClient, TextGenerator, INSIGHT_FAILED_MESSAGE};
use crate::notify::{LogNotifier, Notifier};
use crate::store::{self, Query, RowStore, Table};
use crate::types::{AnalyticsSummary, CategoryRow, Profile, TimeRange, TimestampRow};

/// Runs dashboard commands and reports their outcomes as events.
#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn RowStore>,
    generator: Option<Arc<dyn TextGenerator>>,
    notifier: Arc<dyn Notifier>,
}

impl DashboardService {
    pub fn new(
        store: Arc<dyn RowStore>,
        generator: Option<Arc<dyn TextGenerator>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            generator,
            notifier,
        }
    }

    /// Build the service from configuration, logging notifications.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = store::open(&config.store)?;

        let generator: Option<Arc<dyn TextGenerator>> = if config.insights.is_ready() {
            let client = HttpChatClient::new(&config.insights)?;
            tracing::info!(endpoint = %client.endpoint(), "Career insights enabled");
            Some(Arc::new(client))
        } else {
            tracing::info!("Career insights disabled");
            None
        };

        Ok(Self::new(store, generator, Arc::new(LogNotifier)))
    }

    /// Replace the notification sink.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Drop the text generator.
    pub fn without_insights(mut self) -> Self {
        self.generator = None;
        self
    }

    pub fn insights_enabled(&self) -> bool {
        self.generator.is_some()
    }

    /// Aggregate the dashboard statistics for one user and range.
    ///
    /// A missing or empty user id yields the default summary without touching
    /// the store. The five reads run concurrently; if any fails the first
    /// failure in query order is returned. Row reads carry an exact count so
    /// paged backends can fetch every row.
    pub async fn load_summary<Tz>(
        &self,
        user_id: Option<&str>,
        range: TimeRange,
        now: &DateTime<Tz>,
    ) -> Result<AnalyticsSummary>
    where
        Tz: TimeZone + Send + Sync,
        Tz::Offset: Send + Sync,
    {
        let Some(user_id) = user_id.filter(|id| !id.is_empty()) else {
            return Ok(AnalyticsSummary::default());
        };

        let window = Window::for_range(range, now);
        let monthly_start = analytics::monthly_window_start(now);
        tracing::debug!(
            user_id,
            range = %range,
            start = %window.start,
            days = window.days(),
            "Loading analytics"
        );

        let achievement_count = Query::table(Table::Achievements)
            .eq("user_id", user_id)
            .gte("created_at", window.start)
            .head();
        let daily_win_count = Query::table(Table::DailyWins)
            .eq("user_id", user_id)
            .gte("created_at", window.start)
            .head();
        let categories = Query::table(Table::Achievements)
            .select("category")
            .eq("user_id", user_id)
            .gte("created_at", window.start)
            .count_exact();
        let daily_win_times = Query::table(Table::DailyWins)
            .select("created_at")
            .eq("user_id", user_id)
            .gte("created_at", window.start)
            .count_exact();
        let monthly = Query::table(Table::Achievements)
            .select("created_at")
            .eq("user_id", user_id)
            .gte("created_at", monthly_start)
            .count_exact();

        let (achievement_count, daily_win_count, categories, daily_win_times, monthly) =
            futures::join!(
                self.store.fetch(&achievement_count),
                self.store.fetch(&daily_win_count),
                self.store.fetch(&categories),
                self.store.fetch(&daily_win_times),
                self.store.fetch(&monthly),
            );

        let total_achievements = achievement_count?.count_or_zero();
        let total_daily_wins = daily_win_count?.count_or_zero();
        let categories: Vec<CategoryRow> = categories?.decode()?;
        let daily_win_times: Vec<TimestampRow> = daily_win_times?.decode()?;
        let monthly: Vec<TimestampRow> = monthly?.decode()?;

        let win_times: Vec<DateTime<chrono::Utc>> =
            daily_win_times.into_iter().map(|r| r.created_at).collect();
        let monthly_times: Vec<DateTime<chrono::Utc>> =
            monthly.into_iter().map(|r| r.created_at).collect();

        let summary = AnalyticsSummary {
            total_achievements,
            total_daily_wins,
            consistency: analytics::consistency_percent(
                &win_times,
                &now.timezone(),
                window.days(),
            ),
            achievements_by_category: analytics::rank_categories(
                categories.into_iter().map(|r| r.category),
            ),
            monthly_progress: analytics::monthly_progress(&monthly_times, now),
        };

        tracing::info!(
            user_id,
            range = %range,
            achievements = summary.total_achievements,
            daily_wins = summary.total_daily_wins,
            consistency = summary.consistency,
            categories = summary.achievements_by_category.len(),
            "Analytics loaded"
        );
        Ok(summary)
    }

    /// Look up the profile row, degrading to `None` on any failure.
    pub async fn load_profile(&self, user_id: &str) -> Option<Profile> {
        let query = Query::table(Table::Profiles)
            .select("first_name, last_name, avatar_url")
            .eq("id", user_id);

        let row = match self.store.fetch_single(&query).await {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Profile lookup failed");
                return None;
            }
        };
        match serde_json::from_value(row) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Profile row did not parse");
                None
            }
        }
    }

    /// Generate an insight, mapping any failure to the user-facing message.
    pub async fn generate_insight(&self, ticket: &InsightTicket) -> DashboardEvent {
        let generation = ticket.generation;
        let failed = || DashboardEvent::InsightFailed {
            generation,
            message: INSIGHT_FAILED_MESSAGE.to_string(),
        };
        let Some(generator) = &self.generator else {
            return failed();
        };

        let request = &ticket.request;
        tracing::info!(
            generation,
            categories = %request.top_categories,
            "Generating career insights"
        );
        match insights::generate_insight(generator.as_ref(), request).await {
            Ok(text) => {
                tracing::info!(chars = text.chars().count(), "Career insights generated");
                DashboardEvent::InsightSucceeded { generation, text }
            }
            Err(e) => {
                tracing::error!(error = %e, "Career insight generation failed");
                failed()
            }
        }
    }

    async fn run_load(&self, ticket: LoadTicket) -> DashboardEvent {
        let now = Local::now();
        match self
            .load_summary(Some(&ticket.user_id), ticket.range, &now)
            .await
        {
            Ok(summary) => DashboardEvent::LoadSucceeded {
                generation: ticket.generation,
                summary,
            },
            Err(e) => {
                tracing::error!(
                    generation = ticket.generation,
                    range = %ticket.range,
                    error = %e,
                    "Analytics load failed"
                );
                DashboardEvent::LoadFailed {
                    generation: ticket.generation,
                    message: e.to_string(),
                }
            }
        }
    }

    /// Execute one command, returning the event it produced, if any.
    pub async fn execute(&self, command: Command) -> Option<DashboardEvent> {
        match command {
            Command::Load(ticket) => Some(self.run_load(ticket).await),
            Command::LoadProfile(user_id) => {
                let profile = self.load_profile(&user_id).await;
                Some(DashboardEvent::ProfileLoaded { user_id, profile })
            }
            Command::GenerateInsight(ticket) => Some(self.generate_insight(&ticket).await),
            Command::Notify(notification) => {
                self.notifier.notify(notification);
                None
            }
        }
    }

    /// Apply `event` and run every resulting command until none remain.
    pub async fn drive(&self, state: &mut DashboardState, event: DashboardEvent) {
        let mut events = VecDeque::from([event]);
        while let Some(event) = events.pop_front() {
            for command in state.apply(event) {
                if let Some(next) = self.execute(command).await {
                    events.push_back(next);
                }
            }
        }
    }
}
