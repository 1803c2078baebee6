//! careerscope - Career analytics dashboard
//!
//! Terminal UI showing achievements, daily wins, consistency and
//! generated career insights for the signed-in user.

mod app;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use careerscope_core::dashboard::DashboardService;
use careerscope_core::notify::NotificationQueue;
use careerscope_core::{auth, Config, TimeRange};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::App;

/// Interactive career analytics dashboard
#[derive(Parser, Debug)]
#[command(name = "careerscope")]
#[command(about = "Career analytics dashboard")]
struct Args {
    /// Time range to open with: 30days, 90days or year
    #[arg(short, long)]
    range: Option<TimeRange>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file, not stdout since we have a TUI)
    let _log_guard =
        careerscope_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("careerscope TUI starting up");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let notifications = NotificationQueue::new();
    let service = DashboardService::from_config(&config)
        .context("failed to set up dashboard")?
        .with_notifier(Arc::new(notifications.clone()));
    let auth = auth::from_config(&config).context("failed to set up authentication")?;

    let range = args.range.unwrap_or(config.dashboard.default_range);
    let mut app = App::new(runtime.handle().clone(), service, notifications, range);
    app.resolve_auth(auth);

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    tracing::info!("careerscope TUI shutting down");
    runtime.shutdown_timeout(Duration::from_millis(500));

    if result.is_err() {
        eprintln!("Logs: {}", Config::state_dir().display());
    }

    result
}

/// Run the main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Apply finished work before drawing
        app.pump();
        app.tick();

        // Render
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
