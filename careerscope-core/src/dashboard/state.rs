//! Dashboard state machine
//!
//! [`DashboardState::apply`] is the only way state changes. It never performs
//! I/O; side effects come back as [`Command`]s for the caller to run, and
//! their outcomes re-enter as [`DashboardEvent`]s.

use crate::insights::{InsightRequest, INSUFFICIENT_DATA_MESSAGE};
use crate::notify::Notification;
use crate::types::{AnalyticsSummary, Profile, TimeRange, UserIdentity};

/// Shown when an insight is requested but no generator is configured
pub const INSIGHTS_DISABLED_MESSAGE: &str = "Insight generation is not configured";

/// Authentication phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Loading,
    SignedOut,
    SignedIn(UserIdentity),
}

/// Aggregation phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    /// A load is in flight; only its generation may complete it
    Loading { generation: u64 },
    Ready,
    Error(String),
}

/// Insight phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightPhase {
    Idle,
    Loading,
    Ready(String),
    Error(String),
}

/// Everything needed to run one aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub user_id: String,
    pub range: TimeRange,
}

/// One insight request, tagged so that late replies can be recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightTicket {
    pub generation: u64,
    pub request: InsightRequest,
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    /// The auth provider answered (`None` = signed out)
    AuthResolved(Option<UserIdentity>),
    RangeChanged(TimeRange),
    RefreshRequested,
    LoadSucceeded {
        generation: u64,
        summary: AnalyticsSummary,
    },
    LoadFailed {
        generation: u64,
        message: String,
    },
    /// Profile lookup finished; `None` means missing or failed
    ProfileLoaded {
        user_id: String,
        profile: Option<Profile>,
    },
    InsightRequested,
    InsightSucceeded {
        generation: u64,
        text: String,
    },
    InsightFailed {
        generation: u64,
        message: String,
    },
}

/// Side effects requested by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load(LoadTicket),
    LoadProfile(String),
    GenerateInsight(InsightTicket),
    Notify(Notification),
}

/// The whole dashboard model.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub auth: AuthState,
    pub range: TimeRange,
    pub load: LoadPhase,
    /// Last successfully loaded summary
    pub summary: AnalyticsSummary,
    pub profile: Profile,
    pub insight: InsightPhase,
    /// Whether a text generator is available
    pub insights_enabled: bool,
    generation: u64,
    insight_generation: u64,
}

impl DashboardState {
    pub fn new(range: TimeRange, insights_enabled: bool) -> Self {
        Self {
            auth: AuthState::Loading,
            range,
            load: LoadPhase::Idle,
            summary: AnalyticsSummary::default(),
            profile: Profile::default(),
            insight: InsightPhase::Idle,
            insights_enabled,
            generation: 0,
            insight_generation: 0,
        }
    }

    /// Generation of the most recently started load.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        match &self.auth {
            AuthState::SignedIn(user) => Some(user),
            _ => None,
        }
    }

    /// True while authentication or aggregation is pending.
    pub fn is_loading(&self) -> bool {
        matches!(self.auth, AuthState::Loading)
            || matches!(self.load, LoadPhase::Idle | LoadPhase::Loading { .. })
    }

    pub fn apply(&mut self, event: DashboardEvent) -> Vec<Command> {
        match event {
            DashboardEvent::AuthResolved(identity) => self.on_auth(identity),
            DashboardEvent::RangeChanged(range) => {
                if range == self.range && !matches!(self.load, LoadPhase::Idle) {
                    return Vec::new();
                }
                self.range = range;
                self.start_load()
            }
            DashboardEvent::RefreshRequested => self.start_load(),
            DashboardEvent::LoadSucceeded {
                generation,
                summary,
            } => {
                if !self.is_current(generation) {
                    tracing::debug!(generation, current = self.generation, "Discarding stale load");
                    return Vec::new();
                }
                self.summary = summary;
                self.load = LoadPhase::Ready;
                if matches!(self.insight, InsightPhase::Error(_)) {
                    self.insight = InsightPhase::Idle;
                }
                self.auto_insight()
            }
            DashboardEvent::LoadFailed {
                generation,
                message,
            } => {
                if !self.is_current(generation) {
                    tracing::debug!(
                        generation,
                        current = self.generation,
                        "Discarding stale failure"
                    );
                    return Vec::new();
                }
                self.load = LoadPhase::Error(message);
                vec![Command::Notify(Notification::load_failed())]
            }
            DashboardEvent::ProfileLoaded { user_id, profile } => {
                if self.user().map(|u| u.id.as_str()) == Some(user_id.as_str()) {
                    self.profile = profile.unwrap_or_default();
                }
                Vec::new()
            }
            DashboardEvent::InsightRequested => self.request_insight(),
            DashboardEvent::InsightSucceeded { generation, text } => {
                if self.is_current_insight(generation) {
                    self.insight = InsightPhase::Ready(text);
                }
                Vec::new()
            }
            DashboardEvent::InsightFailed {
                generation,
                message,
            } => {
                if self.is_current_insight(generation) {
                    self.insight = InsightPhase::Error(message);
                }
                Vec::new()
            }
        }
    }

    fn on_auth(&mut self, identity: Option<UserIdentity>) -> Vec<Command> {
        let identity = identity.filter(|user| !user.id.is_empty());
        let changed_user = self.user().map(|u| &u.id) != identity.as_ref().map(|u| &u.id);
        if changed_user {
            self.profile = Profile::default();
            self.insight = InsightPhase::Idle;
        }

        match identity {
            Some(user) => {
                let user_id = user.id.clone();
                self.auth = AuthState::SignedIn(user);
                let mut commands = self.start_load();
                commands.push(Command::LoadProfile(user_id));
                commands
            }
            None => {
                self.auth = AuthState::SignedOut;
                self.start_load()
            }
        }
    }

    /// Begin a new aggregation for the current user and range.
    fn start_load(&mut self) -> Vec<Command> {
        let user_id = match &self.auth {
            // Range changes before auth resolves are picked up by the first load
            AuthState::Loading => return Vec::new(),
            AuthState::SignedOut => {
                self.generation += 1;
                self.summary = AnalyticsSummary::default();
                self.load = LoadPhase::Ready;
                return Vec::new();
            }
            AuthState::SignedIn(user) => user.id.clone(),
        };

        self.generation += 1;
        self.load = LoadPhase::Loading {
            generation: self.generation,
        };
        vec![Command::Load(LoadTicket {
            generation: self.generation,
            user_id,
            range: self.range,
        })]
    }

    fn is_current(&self, generation: u64) -> bool {
        self.load == LoadPhase::Loading { generation }
    }

    fn is_current_insight(&self, generation: u64) -> bool {
        if self.insight == InsightPhase::Loading && generation == self.insight_generation {
            return true;
        }
        tracing::debug!(
            generation,
            current = self.insight_generation,
            "Discarding stale insight"
        );
        false
    }

    fn start_insight(&mut self, request: InsightRequest) -> Vec<Command> {
        self.insight_generation += 1;
        self.insight = InsightPhase::Loading;
        vec![Command::GenerateInsight(InsightTicket {
            generation: self.insight_generation,
            request,
        })]
    }

    fn auto_insight(&mut self) -> Vec<Command> {
        if !self.insights_enabled || self.insight != InsightPhase::Idle {
            return Vec::new();
        }
        match InsightRequest::from_summary(&self.summary) {
            Some(request) => self.start_insight(request),
            None => Vec::new(),
        }
    }

    fn request_insight(&mut self) -> Vec<Command> {
        if self.insight == InsightPhase::Loading {
            return Vec::new();
        }
        let request = match (self.user(), InsightRequest::from_summary(&self.summary)) {
            (Some(_), Some(request)) => request,
            _ => {
                self.insight = InsightPhase::Error(INSUFFICIENT_DATA_MESSAGE.to_string());
                return Vec::new();
            }
        };
        if !self.insights_enabled {
            self.insight = InsightPhase::Error(INSIGHTS_DISABLED_MESSAGE.to_string());
            return Vec::new();
        }
        self.start_insight(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Severity;
    use crate::types::CategoryCount;

    fn user(id: &str) -> UserIdentity {
        UserIdentity {
            id: id.to_string(),
            email: None,
        }
    }

    fn summary_with(categories: &[(&str, u64)]) -> AnalyticsSummary {
        AnalyticsSummary {
            total_achievements: categories.iter().map(|(_, n)| n).sum(),
            achievements_by_category: categories
                .iter()
                .map(|(c, n)| CategoryCount {
                    category: c.to_string(),
                    count: *n,
                })
                .collect(),
            ..Default::default()
        }
    }

    fn signed_in(insights: bool) -> (DashboardState, LoadTicket) {
        let mut state = DashboardState::new(TimeRange::Last30Days, insights);
        let commands = state.apply(DashboardEvent::AuthResolved(Some(user("u1"))));
        let ticket = match &commands[0] {
            Command::Load(ticket) => ticket.clone(),
            other => panic!("expected load, got {:?}", other),
        };
        assert_eq!(commands[1], Command::LoadProfile("u1".to_string()));
        (state, ticket)
    }

    fn insight_ticket(commands: &[Command]) -> InsightTicket {
        match commands {
            [Command::GenerateInsight(ticket)] => ticket.clone(),
            other => panic!("expected insight request, got {:?}", other),
        }
    }

    #[test]
    fn test_loading_until_auth_resolves() {
        let mut state = DashboardState::new(TimeRange::Last30Days, true);
        assert!(state.is_loading());
        assert!(state.apply(DashboardEvent::RangeChanged(TimeRange::LastYear)).is_empty());
        assert_eq!(state.range, TimeRange::LastYear);
        assert!(state.is_loading());
    }

    #[test]
    fn test_signed_out_gets_default_summary_without_commands() {
        let mut state = DashboardState::new(TimeRange::Last30Days, true);
        let commands = state.apply(DashboardEvent::AuthResolved(None));
        assert!(commands.is_empty());
        assert_eq!(state.auth, AuthState::SignedOut);
        assert_eq!(state.load, LoadPhase::Ready);
        assert_eq!(state.summary, AnalyticsSummary::default());

        assert!(state.apply(DashboardEvent::RefreshRequested).is_empty());
        assert!(state.apply(DashboardEvent::RangeChanged(TimeRange::Last90Days)).is_empty());
    }

    #[test]
    fn test_empty_user_id_counts_as_signed_out() {
        let mut state = DashboardState::new(TimeRange::Last30Days, true);
        assert!(state.apply(DashboardEvent::AuthResolved(Some(user("")))).is_empty());
        assert_eq!(state.auth, AuthState::SignedOut);
    }

    #[test]
    fn test_success_publishes_and_triggers_insight_once() {
        let (mut state, ticket) = signed_in(true);
        assert_eq!(ticket.range, TimeRange::Last30Days);

        let commands = state.apply(DashboardEvent::LoadSucceeded {
            generation: ticket.generation,
            summary: summary_with(&[("Ops", 2)]),
        });
        let insight = insight_ticket(&commands);
        assert_eq!(insight.request.top_categories, "Ops");
        assert_eq!(state.insight, InsightPhase::Loading);
        assert_eq!(state.summary.total_achievements, 2);

        // A second load while the insight is in flight must not start another
        let reload = state.apply(DashboardEvent::RefreshRequested);
        let Command::Load(next) = &reload[0] else {
            panic!("expected load");
        };
        let commands = state.apply(DashboardEvent::LoadSucceeded {
            generation: next.generation,
            summary: summary_with(&[("Ops", 3)]),
        });
        assert!(commands.is_empty());

        state.apply(DashboardEvent::InsightSucceeded {
            generation: insight.generation,
            text: "- Keep going".to_string(),
        });
        assert_eq!(state.insight, InsightPhase::Ready("- Keep going".to_string()));

        // Ready content is kept across loads
        let reload = state.apply(DashboardEvent::RefreshRequested);
        let Command::Load(next) = &reload[0] else {
            panic!("expected load");
        };
        let commands = state.apply(DashboardEvent::LoadSucceeded {
            generation: next.generation,
            summary: summary_with(&[("Ops", 4)]),
        });
        assert!(commands.is_empty());
        assert_eq!(state.insight, InsightPhase::Ready("- Keep going".to_string()));
    }

    #[test]
    fn test_no_insight_without_categories() {
        let (mut state, ticket) = signed_in(true);
        let commands = state.apply(DashboardEvent::LoadSucceeded {
            generation: ticket.generation,
            summary: AnalyticsSummary::default(),
        });
        assert!(commands.is_empty());
        assert_eq!(state.insight, InsightPhase::Idle);
    }

    #[test]
    fn test_no_insight_when_disabled() {
        let (mut state, ticket) = signed_in(false);
        let commands = state.apply(DashboardEvent::LoadSucceeded {
            generation: ticket.generation,
            summary: summary_with(&[("Ops", 1)]),
        });
        assert!(commands.is_empty());

        assert!(state.apply(DashboardEvent::InsightRequested).is_empty());
        assert_eq!(
            state.insight,
            InsightPhase::Error(INSIGHTS_DISABLED_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_failure_keeps_summary_and_notifies_once() {
        let (mut state, ticket) = signed_in(true);
        state.apply(DashboardEvent::LoadSucceeded {
            generation: ticket.generation,
            summary: summary_with(&[("Ops", 2)]),
        });
        let before = state.summary.clone();

        let reload = state.apply(DashboardEvent::RangeChanged(TimeRange::Last90Days));
        let Command::Load(next) = &reload[0] else {
            panic!("expected load");
        };
        assert_eq!(next.range, TimeRange::Last90Days);

        let commands = state.apply(DashboardEvent::LoadFailed {
            generation: next.generation,
            message: "boom".to_string(),
        });
        assert_eq!(commands.len(), 1);
        let Command::Notify(notification) = &commands[0] else {
            panic!("expected notification");
        };
        assert_eq!(notification.title, "Error");
        assert_eq!(notification.severity, Severity::Destructive);
        assert_eq!(state.summary, before);
        assert_eq!(state.load, LoadPhase::Error("boom".to_string()));
        assert!(!state.is_loading());
    }

    #[test]
    fn test_stale_results_are_discarded() {
        let (mut state, first) = signed_in(true);
        let reload = state.apply(DashboardEvent::RangeChanged(TimeRange::LastYear));
        let Command::Load(second) = &reload[0] else {
            panic!("expected load");
        };
        assert!(second.generation > first.generation);
        assert_eq!(state.generation(), second.generation);

        // The older load finishes last and must not overwrite anything
        let stale = state.apply(DashboardEvent::LoadSucceeded {
            generation: first.generation,
            summary: summary_with(&[("Stale", 9)]),
        });
        assert!(stale.is_empty());
        assert!(state.is_loading());

        let stale_failure = state.apply(DashboardEvent::LoadFailed {
            generation: first.generation,
            message: "late".to_string(),
        });
        assert!(stale_failure.is_empty());

        state.apply(DashboardEvent::LoadSucceeded {
            generation: second.generation,
            summary: summary_with(&[("Fresh", 1)]),
        });
        assert_eq!(state.summary.top_category(), Some("Fresh"));
    }

    #[test]
    fn test_same_range_is_ignored() {
        let (mut state, _) = signed_in(true);
        assert!(state.apply(DashboardEvent::RangeChanged(TimeRange::Last30Days)).is_empty());
    }

    #[test]
    fn test_successful_load_clears_insight_error() {
        let (mut state, ticket) = signed_in(true);
        let commands = state.apply(DashboardEvent::LoadSucceeded {
            generation: ticket.generation,
            summary: summary_with(&[("Ops", 1)]),
        });
        let insight = insight_ticket(&commands);
        state.apply(DashboardEvent::InsightFailed {
            generation: insight.generation,
            message: "nope".to_string(),
        });
        assert_eq!(state.insight, InsightPhase::Error("nope".to_string()));

        let reload = state.apply(DashboardEvent::RefreshRequested);
        let Command::Load(next) = &reload[0] else {
            panic!("expected load");
        };
        let commands = state.apply(DashboardEvent::LoadSucceeded {
            generation: next.generation,
            summary: summary_with(&[("Ops", 2)]),
        });
        assert!(insight_ticket(&commands).generation > insight.generation);
    }

    #[test]
    fn test_manual_request_without_data() {
        let (mut state, ticket) = signed_in(true);
        state.apply(DashboardEvent::LoadSucceeded {
            generation: ticket.generation,
            summary: AnalyticsSummary::default(),
        });
        assert!(state.apply(DashboardEvent::InsightRequested).is_empty());
        assert_eq!(
            state.insight,
            InsightPhase::Error(INSUFFICIENT_DATA_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_manual_request_is_single_flight() {
        let (mut state, ticket) = signed_in(true);
        let commands = state.apply(DashboardEvent::LoadSucceeded {
            generation: ticket.generation,
            summary: summary_with(&[("Ops", 1)]),
        });
        let insight = insight_ticket(&commands);
        assert_eq!(state.insight, InsightPhase::Loading);
        assert!(state.apply(DashboardEvent::InsightRequested).is_empty());

        state.apply(DashboardEvent::InsightSucceeded {
            generation: insight.generation,
            text: "- a".to_string(),
        });
        let commands = state.apply(DashboardEvent::InsightRequested);
        assert_eq!(insight_ticket(&commands).generation, insight.generation + 1);
    }

    #[test]
    fn test_insight_reply_for_previous_user_is_discarded() {
        let (mut state, ticket) = signed_in(true);
        let commands = state.apply(DashboardEvent::LoadSucceeded {
            generation: ticket.generation,
            summary: summary_with(&[("Ops", 1)]),
        });
        let first = insight_ticket(&commands);

        // Another user signs in while the first request is still running
        let commands = state.apply(DashboardEvent::AuthResolved(Some(user("u2"))));
        let Command::Load(load) = &commands[0] else {
            panic!("expected load");
        };
        let commands = state.apply(DashboardEvent::LoadSucceeded {
            generation: load.generation,
            summary: summary_with(&[("Sales", 3)]),
        });
        let second = insight_ticket(&commands);
        assert_eq!(second.request.top_categories, "Sales");

        state.apply(DashboardEvent::InsightSucceeded {
            generation: first.generation,
            text: "- for u1".to_string(),
        });
        assert_eq!(state.insight, InsightPhase::Loading);
        state.apply(DashboardEvent::InsightFailed {
            generation: first.generation,
            message: "late".to_string(),
        });
        assert_eq!(state.insight, InsightPhase::Loading);

        state.apply(DashboardEvent::InsightSucceeded {
            generation: second.generation,
            text: "- for u2".to_string(),
        });
        assert_eq!(state.insight, InsightPhase::Ready("- for u2".to_string()));
    }

    #[test]
    fn test_profile_for_other_user_is_ignored() {
        let (mut state, _) = signed_in(true);
        state.apply(DashboardEvent::ProfileLoaded {
            user_id: "someone-else".to_string(),
            profile: Some(Profile {
                first_name: Some("Eve".to_string()),
                ..Default::default()
            }),
        });
        assert_eq!(state.profile, Profile::default());

        state.apply(DashboardEvent::ProfileLoaded {
            user_id: "u1".to_string(),
            profile: Some(Profile {
                first_name: Some("Ada".to_string()),
                ..Default::default()
            }),
        });
        assert_eq!(state.profile.first_name.as_deref(), Some("Ada"));
    }
}
