//! Application state for the TUI.

use std::sync::Arc;
use std::time::{Duration, Instant};

use careerscope_core::auth::AuthProvider;
use careerscope_core::dashboard::{Command, DashboardEvent, DashboardService, DashboardState};
use careerscope_core::notify::{Notification, NotificationQueue};
use careerscope_core::TimeRange;
use crossterm::event::{KeyCode, KeyEvent};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// How long a toast stays on screen
const TOAST_TTL: Duration = Duration::from_secs(5);

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SelectRange(TimeRange),
    NextRange,
    Refresh,
    RequestInsight,
    Quit,
}

/// Map a key to a dashboard action.
pub fn key_action(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Char('1') => Some(Action::SelectRange(TimeRange::Last30Days)),
        KeyCode::Char('2') => Some(Action::SelectRange(TimeRange::Last90Days)),
        KeyCode::Char('3') => Some(Action::SelectRange(TimeRange::LastYear)),
        KeyCode::Tab => Some(Action::NextRange),
        KeyCode::Char('r') => Some(Action::Refresh),
        KeyCode::Char('i') => Some(Action::RequestInsight),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        _ => None,
    }
}

/// A notification being displayed.
#[derive(Debug, Clone)]
pub struct Toast {
    pub notification: Notification,
    shown_at: Instant,
}

/// Main application state.
pub struct App {
    /// Dashboard model; only changed through `dispatch`
    pub state: DashboardState,
    /// Toasts currently visible, oldest first
    pub toasts: Vec<Toast>,
    /// Frame counter for the loading spinner
    pub animation_frame: u64,
    /// Should the app quit?
    pub should_quit: bool,
    service: Arc<DashboardService>,
    notifications: NotificationQueue,
    runtime: Handle,
    events_tx: UnboundedSender<DashboardEvent>,
    events_rx: UnboundedReceiver<DashboardEvent>,
}

impl App {
    pub fn new(
        runtime: Handle,
        service: DashboardService,
        notifications: NotificationQueue,
        range: TimeRange,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            state: DashboardState::new(range, service.insights_enabled()),
            toasts: Vec::new(),
            animation_frame: 0,
            should_quit: false,
            service: Arc::new(service),
            notifications,
            runtime,
            events_tx,
            events_rx,
        }
    }

    /// Ask the auth provider who is signed in; the answer arrives as an event.
    pub fn resolve_auth(&self, auth: Box<dyn AuthProvider>) {
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let identity = match auth.current_user().await {
                Ok(identity) => identity,
                Err(e) => {
                    tracing::warn!(error = %e, "Auth lookup failed; continuing signed out");
                    None
                }
            };
            let _ = tx.send(DashboardEvent::AuthResolved(identity));
        });
    }

    /// Apply an event and start every command it produces.
    pub fn dispatch(&mut self, event: DashboardEvent) {
        for command in self.state.apply(event) {
            self.spawn(command);
        }
    }

    fn spawn(&self, command: Command) {
        let service = Arc::clone(&self.service);
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            if let Some(event) = service.execute(command).await {
                // Receiver is gone only after the UI exits
                let _ = tx.send(event);
            }
        });
    }

    /// Apply finished work and collect new notifications.
    pub fn pump(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(event);
        }

        let now = Instant::now();
        self.toasts
            .extend(self.notifications.drain().into_iter().map(|notification| Toast {
                notification,
                shown_at: now,
            }));
        self.toasts
            .retain(|toast| now.duration_since(toast.shown_at) < TOAST_TTL);
    }

    pub fn tick(&mut self) {
        self.animation_frame = self.animation_frame.wrapping_add(1);
    }

    /// Handle keyboard input.
    pub fn handle_key(&mut self, key: KeyEvent) {
        let Some(action) = key_action(key.code) else {
            return;
        };
        tracing::debug!(?action, "Key action");

        match action {
            Action::SelectRange(range) => self.dispatch(DashboardEvent::RangeChanged(range)),
            Action::NextRange => {
                let next = self.state.range.next();
                self.dispatch(DashboardEvent::RangeChanged(next));
            }
            Action::Refresh => self.dispatch(DashboardEvent::RefreshRequested),
            Action::RequestInsight => self.dispatch(DashboardEvent::InsightRequested),
            Action::Quit => self.should_quit = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_keys() {
        assert_eq!(
            key_action(KeyCode::Char('1')),
            Some(Action::SelectRange(TimeRange::Last30Days))
        );
        assert_eq!(
            key_action(KeyCode::Char('3')),
            Some(Action::SelectRange(TimeRange::LastYear))
        );
        assert_eq!(key_action(KeyCode::Tab), Some(Action::NextRange));
    }

    #[test]
    fn test_quit_and_unbound_keys() {
        assert_eq!(key_action(KeyCode::Char('q')), Some(Action::Quit));
        assert_eq!(key_action(KeyCode::Esc), Some(Action::Quit));
        assert_eq!(key_action(KeyCode::Char('x')), None);
    }
}
