//! careerscope-report - One-shot career analytics report
//!
//! Loads the dashboard once for the configured user and prints it to the
//! terminal, as Markdown or as JSON.

use anyhow::{Context, Result};
use careerscope_core::dashboard::{DashboardEvent, DashboardService, DashboardState, LoadPhase};
use careerscope_core::view::{self, DashboardView, InsightView, Screen};
use careerscope_core::{auth, Config, TimeRange};
use chrono::{Local, Timelike};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "careerscope-report")]
#[command(about = "Career analytics report for the signed-in user")]
#[command(version)]
struct Args {
    /// Time range: 30days, 90days or year (default: from config)
    #[arg(long)]
    range: Option<TimeRange>,

    /// Export format (md = markdown, json = JSON)
    #[arg(long)]
    export: Option<String>,

    /// Skip career insight generation
    #[arg(long)]
    no_insights: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(format) = args.export.as_deref() {
        if format != "json" && format != "md" {
            anyhow::bail!("Unknown export format: {}. Use 'md' or 'json'", format);
        }
    }

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = careerscope_core::logging::init(&config.logging).ok();

    let range = args.range.unwrap_or(config.dashboard.default_range);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let state = runtime.block_on(load_dashboard(&config, range, args.no_insights))?;

    let dashboard = match view::project(&state, Local::now().hour()) {
        Screen::Dashboard(dashboard) => dashboard,
        Screen::Loading => anyhow::bail!("dashboard did not finish loading"),
    };

    // Output based on export format
    match args.export.as_deref() {
        Some("json") => print_json(&state, &dashboard)?,
        Some("md") => print_markdown(&dashboard),
        _ => print_terminal(&dashboard),
    }

    Ok(())
}

/// Resolve the user and run the dashboard to completion.
async fn load_dashboard(
    config: &Config,
    range: TimeRange,
    no_insights: bool,
) -> Result<DashboardState> {
    let mut service =
        DashboardService::from_config(config).context("failed to set up dashboard")?;
    if no_insights {
        service = service.without_insights();
    }

    let identity = auth::from_config(config)
        .context("failed to set up authentication")?
        .current_user()
        .await
        .context("failed to resolve current user")?;
    if identity.is_none() {
        tracing::info!("No signed-in user; report will show empty totals");
    }

    let mut state = DashboardState::new(range, service.insights_enabled());
    service
        .drive(&mut state, DashboardEvent::AuthResolved(identity))
        .await;

    if let LoadPhase::Error(message) = &state.load {
        anyhow::bail!("Failed to load analytics data: {}", message);
    }
    Ok(state)
}

fn percent_bar(count: u64, max: u64, width: usize) -> String {
    let filled = if max == 0 {
        0
    } else {
        ((count as f64 / max as f64) * width as f64).round() as usize
    };
    let filled = filled.min(width);
    "█".repeat(filled) + &"░".repeat(width - filled)
}

fn print_terminal(dashboard: &DashboardView) {
    // Header
    println!();
    println!("╭{}╮", "─".repeat(60));
    println!("│{:^60}│", dashboard.greeting);
    println!("╰{}╯", "─".repeat(60));
    println!("  {}", dashboard.subtitle);
    println!();

    println!("OVERVIEW ({})", dashboard.range_label);
    for card in &dashboard.cards {
        println!("   {:<20} {}", format!("{}:", card.title), card.value);
    }
    println!();

    println!("ACHIEVEMENTS BY CATEGORY");
    if dashboard.categories.is_empty() {
        println!("   No achievements in this range.");
    }
    let max = dashboard.categories.first().map(|c| c.count).unwrap_or(0);
    for (i, category) in dashboard.categories.iter().enumerate() {
        println!(
            "   {:>2}. {:<20} {} {:>4}",
            i + 1,
            category.category,
            percent_bar(category.count, max, 16),
            category.count
        );
    }
    println!();

    if !dashboard.monthly_progress.is_empty() {
        println!("3-MONTH PROGRESS");
        let max = dashboard
            .monthly_progress
            .iter()
            .map(|m| m.count)
            .max()
            .unwrap_or(0);
        for month in &dashboard.monthly_progress {
            println!(
                "   {}  {} {:>4}",
                month.month,
                percent_bar(month.count, max, 16),
                month.count
            );
        }
        println!();
    }

    match &dashboard.insight {
        InsightView::Ready(text) => {
            println!("CAREER INSIGHTS");
            for line in text.lines().filter(|l| !l.trim().is_empty()) {
                println!("   {}", line.trim());
            }
            println!();
        }
        InsightView::Error(message) => {
            println!("CAREER INSIGHTS");
            println!("   {}", message);
            println!();
        }
        InsightView::Disabled | InsightView::Idle | InsightView::Loading => {}
    }
}

fn print_markdown(dashboard: &DashboardView) {
    println!("# Career Analytics: {}", dashboard.range_label);
    println!();
    println!("**{}**", dashboard.greeting);
    println!();
    println!("{}", dashboard.subtitle);
    println!();

    // Summary table
    println!("## Overview");
    println!();
    println!("| Metric | Value |");
    println!("|--------|-------|");
    for card in &dashboard.cards {
        println!("| {} | {} |", card.title, card.value);
    }
    println!();

    println!("## Achievements by Category");
    println!();
    if dashboard.categories.is_empty() {
        println!("*No achievements in this range.*");
    } else {
        println!("| Rank | Category | Count |");
        println!("|------|----------|-------|");
        for (i, category) in dashboard.categories.iter().enumerate() {
            println!("| {} | {} | {} |", i + 1, category.category, category.count);
        }
    }
    println!();

    if !dashboard.monthly_progress.is_empty() {
        println!("## 3-Month Progress");
        println!();
        println!("| Month | Achievements |");
        println!("|-------|--------------|");
        for month in &dashboard.monthly_progress {
            println!("| {} | {} |", month.month, month.count);
        }
        println!();
    }

    match &dashboard.insight {
        InsightView::Ready(text) => {
            println!("## Career Insights");
            println!();
            println!("{}", text.trim());
            println!();
        }
        InsightView::Error(message) => {
            println!("## Career Insights");
            println!();
            println!("*{}*", message);
            println!();
        }
        InsightView::Disabled | InsightView::Idle | InsightView::Loading => {}
    }
}

fn print_json(state: &DashboardState, dashboard: &DashboardView) -> Result<()> {
    let report = serde_json::json!({
        "range": state.range,
        "user_id": state.user().map(|u| u.id.as_str()),
        "generated_at": Local::now().to_rfc3339(),
        "summary": &state.summary,
        "view": dashboard,
    });
    let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    println!("{}", json);
    Ok(())
}
