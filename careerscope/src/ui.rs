//! UI rendering for the TUI.

use careerscope_core::notify::Severity;
use careerscope_core::view::{self, DashboardView, InsightView, Screen, StatCard};
use careerscope_core::{CategoryCount, MonthCount, TimeRange};
use chrono::{Local, Timelike};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;

// ========== Dashboard Colors ==========

/// Brand green for accents and metric values
const ACCENT: Color = Color::Rgb(116, 224, 67);
/// Muted gray for secondary text
const MUTED: Color = Color::Rgb(188, 188, 188);
/// Border color for metric cards
const BORDER_CARD: Color = Color::Rgb(70, 70, 70);
/// Gold for the category breakdown
const CATEGORY_GOLD: Color = Color::Rgb(255, 215, 0);
/// Cyan for monthly progress
const PROGRESS_CYAN: Color = Color::Rgb(0, 200, 200);
/// Purple for the insight panel
const INSIGHT_PURPLE: Color = Color::Rgb(170, 120, 255);
/// Red for destructive toasts
const TOAST_RED: Color = Color::Rgb(220, 70, 70);

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Render the application UI.
pub fn render(frame: &mut Frame, app: &App) {
    match view::project(&app.state, Local::now().hour()) {
        Screen::Loading => render_loading(frame, app),
        Screen::Dashboard(dashboard) => render_dashboard(frame, app, &dashboard),
    }
    render_toasts(frame, app);
}

/// Render the centered loading spinner.
fn render_loading(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let spinner = SPINNER[(app.animation_frame as usize) % SPINNER.len()];

    let chunks = Layout::vertical([
        Constraint::Percentage(45),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .split(area);

    let text = Line::from(vec![
        Span::styled(format!("{} ", spinner), Style::default().fg(ACCENT).bold()),
        Span::styled("Loading analytics...", Style::default().fg(MUTED)),
    ]);
    frame.render_widget(
        Paragraph::new(text).alignment(Alignment::Center),
        chunks[1],
    );
}

fn render_dashboard(frame: &mut Frame, app: &App, dashboard: &DashboardView) {
    let area = frame.area();

    // Layout: greeting, range selector, cards, panels, insight, footer
    let chunks = Layout::vertical([
        Constraint::Length(3), // Greeting
        Constraint::Length(1), // Range selector
        Constraint::Length(4), // Metric cards
        Constraint::Min(6),    // Breakdown and progress
        Constraint::Length(8), // Insight
        Constraint::Length(1), // Footer
    ])
    .split(area);

    render_greeting(frame, dashboard, chunks[0]);
    render_range_selector(frame, app.state.range, dashboard.stale, chunks[1]);
    render_cards(frame, &dashboard.cards, chunks[2]);

    let panels = Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[3]);
    render_categories(frame, &dashboard.categories, panels[0]);
    render_monthly_progress(frame, &dashboard.monthly_progress, panels[1]);

    render_insight(frame, app, &dashboard.insight, chunks[4]);
    render_footer(frame, chunks[5]);
}

/// Render the personalized greeting and avatar indicator.
fn render_greeting(frame: &mut Frame, dashboard: &DashboardView, area: Rect) {
    let chunks = Layout::horizontal([Constraint::Min(10), Constraint::Length(6)]).split(area);

    let lines = vec![
        Line::from(Span::styled(
            format!(" {}", dashboard.greeting),
            Style::default().fg(Color::White).bold(),
        )),
        Line::from(Span::styled(
            format!(" {}", dashboard.subtitle),
            Style::default().fg(MUTED),
        )),
    ];
    let greeting = Paragraph::new(lines).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(greeting, chunks[0]);

    let (avatar, color) = if dashboard.has_avatar {
        ("◉", ACCENT)
    } else {
        ("○", MUTED)
    };
    let avatar = Paragraph::new(avatar)
        .style(Style::default().fg(color).bold())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(avatar, chunks[1]);
}

/// Render the time range selector.
fn render_range_selector(frame: &mut Frame, selected: TimeRange, stale: bool, area: Rect) {
    let active_style = Style::default()
        .fg(ACCENT)
        .bold()
        .add_modifier(Modifier::UNDERLINED);
    let inactive_style = Style::default().fg(Color::DarkGray);

    let mut spans = vec![Span::raw(" ")];
    for (i, range) in TimeRange::ALL.iter().enumerate() {
        let style = if *range == selected {
            active_style
        } else {
            inactive_style
        };
        spans.push(Span::styled(
            format!("{}", i + 1),
            Style::default().fg(Color::Yellow),
        ));
        spans.push(Span::styled(format!(" {} ", range.label()), style));
        spans.push(Span::raw("  "));
    }
    if stale {
        spans.push(Span::raw("│ "));
        spans.push(Span::styled(
            "showing last loaded data",
            Style::default().fg(TOAST_RED),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the four headline metric cards.
fn render_cards(frame: &mut Frame, cards: &[StatCard; 4], area: Rect) {
    let columns = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);

    for (card, column) in cards.iter().zip(columns.iter()) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_CARD))
            .title(format!(" {} ", card.title))
            .title_style(Style::default().fg(MUTED));

        let value = Paragraph::new(Line::from(Span::styled(
            card.value.clone(),
            Style::default().fg(ACCENT).bold(),
        )))
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(value, *column);
    }
}

/// A proportional bar of `width` cells, at least one cell when `count > 0`.
fn proportional_bar(count: u64, max: u64, width: usize) -> String {
    let filled = if max == 0 || count == 0 {
        0
    } else {
        (((count as f64 / max as f64) * width as f64) as usize).clamp(1, width)
    };
    "█".repeat(filled) + &"░".repeat(width - filled)
}

/// Truncate to `max_chars` characters, marking the cut with "...".
fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let kept: String = label.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Render the ranked category breakdown.
fn render_categories(frame: &mut Frame, categories: &[CategoryCount], area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(CATEGORY_GOLD))
        .title(" Achievements by Category ")
        .title_style(Style::default().fg(CATEGORY_GOLD).bold());

    let rows = area.height.saturating_sub(2) as usize;
    let max = categories.iter().map(|c| c.count).max().unwrap_or(0);

    let lines: Vec<Line> = if categories.is_empty() {
        vec![Line::from(Span::styled(
            " No achievements in this range",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        categories
            .iter()
            .take(rows)
            .map(|c| {
                Line::from(vec![
                    Span::styled(
                        format!(" {:<18}", truncate_label(&c.category, 18)),
                        Style::default().fg(Color::White),
                    ),
                    Span::styled(
                        proportional_bar(c.count, max, 16),
                        Style::default().fg(CATEGORY_GOLD),
                    ),
                    Span::styled(
                        format!(" {:>4}", c.count),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            })
            .collect()
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Render the three-month progress bars.
fn render_monthly_progress(frame: &mut Frame, months: &[MonthCount], area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(PROGRESS_CYAN))
        .title(" 3-Month Progress ")
        .title_style(Style::default().fg(PROGRESS_CYAN).bold());

    let max = months.iter().map(|m| m.count).max().unwrap_or(0);
    let lines: Vec<Line> = months
        .iter()
        .map(|m| {
            Line::from(vec![
                Span::styled(format!(" {} ", m.month), Style::default().fg(Color::White)),
                Span::styled(
                    proportional_bar(m.count, max, 14),
                    Style::default().fg(PROGRESS_CYAN),
                ),
                Span::styled(
                    format!(" {:>4}", m.count),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Render the career insight panel.
fn render_insight(frame: &mut Frame, app: &App, insight: &InsightView, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(INSIGHT_PURPLE))
        .title(" Career Insights ")
        .title_style(Style::default().fg(INSIGHT_PURPLE).bold());

    let dim = Style::default().fg(Color::DarkGray);
    let lines: Vec<Line> = match insight {
        InsightView::Disabled => vec![Line::from(Span::styled(
            " Insight generation is not configured",
            dim,
        ))],
        InsightView::Idle => vec![Line::from(vec![
            Span::styled(" Press ", dim),
            Span::styled("i", Style::default().fg(Color::Yellow)),
            Span::styled(" to generate career insights", dim),
        ])],
        InsightView::Loading => {
            let spinner = SPINNER[(app.animation_frame as usize) % SPINNER.len()];
            vec![Line::from(vec![
                Span::styled(
                    format!(" {} ", spinner),
                    Style::default().fg(INSIGHT_PURPLE),
                ),
                Span::styled("Generating insights...", Style::default().fg(MUTED)),
            ])]
        }
        InsightView::Ready(text) => text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| {
                Line::from(Span::styled(
                    format!(" {}", l.trim()),
                    Style::default().fg(Color::White),
                ))
            })
            .collect(),
        InsightView::Error(message) => vec![Line::from(Span::styled(
            format!(" {}", message),
            Style::default().fg(TOAST_RED),
        ))],
    };

    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
        area,
    );
}

/// Render the key help footer.
fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Line::from(vec![
        Span::styled(" 1/2/3", Style::default().fg(Color::Yellow)),
        Span::raw(" range  "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" next range  "),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" refresh  "),
        Span::styled("i", Style::default().fg(Color::Yellow)),
        Span::raw(" insights  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ]);
    frame.render_widget(Paragraph::new(footer), area);
}

/// Render pending toasts stacked in the top-right corner.
fn render_toasts(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let width = 44.min(area.width);

    for (i, toast) in app.toasts.iter().rev().take(3).enumerate() {
        let y = area.y + 1 + (i as u16) * 4;
        if y + 4 > area.bottom() {
            break;
        }
        let toast_area = Rect::new(area.right().saturating_sub(width + 1), y, width, 4);

        let color = match toast.notification.severity {
            Severity::Destructive => TOAST_RED,
            Severity::Success => ACCENT,
            Severity::Info => MUTED,
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(color))
            .title(format!(" {} ", toast.notification.title))
            .title_style(Style::default().fg(color).bold());
        let body = Paragraph::new(toast.notification.description.as_str())
            .wrap(Wrap { trim: true })
            .block(block);

        frame.render_widget(Clear, toast_area);
        frame.render_widget(body, toast_area);
    }
}
