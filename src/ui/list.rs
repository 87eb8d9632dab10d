// Favorites list rendering.
// Draws the jobs and builds sections with status glyphs, plus loading and empty states.

use chrono::{DateTime, Utc};
use ratatui::{prelude::*, widgets::*};

use crate::app::App;
use crate::jenkins::{BuildResult, JobColor};
use crate::state::Section;

/// Format a timestamp as relative time (e.g., "2h ago").
pub fn format_relative_time(dt: &DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(*dt);

    if duration.num_days() > 0 {
        format!("{}d ago", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m ago", duration.num_minutes())
    } else {
        "just now".to_string()
    }
}

/// Get color for a job's ball.
pub fn job_color(color: Option<JobColor>) -> Color {
    match color {
        Some(JobColor::Blue | JobColor::BlueAnime) => Color::Green,
        Some(JobColor::Red | JobColor::RedAnime) => Color::Red,
        Some(JobColor::Yellow | JobColor::YellowAnime) => Color::Yellow,
        Some(JobColor::Aborted | JobColor::AbortedAnime) => Color::Gray,
        Some(_) | None => Color::DarkGray,
    }
}

/// Get color for a build result.
pub fn build_color(result: Option<BuildResult>) -> Color {
    match result {
        Some(BuildResult::Success) => Color::Green,
        Some(BuildResult::Failure) => Color::Red,
        Some(BuildResult::Unstable) => Color::Yellow,
        Some(BuildResult::Aborted) => Color::Gray,
        Some(BuildResult::NotBuilt | BuildResult::Unknown) => Color::DarkGray,
        None => Color::Cyan, // In progress
    }
}

/// Glyph for a job: hollow while a build is running.
fn job_glyph(color: Option<JobColor>) -> &'static str {
    if color.is_some_and(|c| c.is_building()) {
        "◌"
    } else {
        "●"
    }
}

/// Render a loading indicator.
pub fn render_loading(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(format!("⏳ {}...", message))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(text, area);
}

/// Render an empty state message.
pub fn render_empty(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(text, area);
}

fn section_list<'a>(items: Vec<ListItem<'a>>, title: Option<&'static str>) -> List<'a> {
    let mut block = Block::default().borders(Borders::ALL);
    if let Some(title) = title {
        block = block.title(format!(" {} ", title));
    }
    List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ")
}

/// Render the two favorites sections.
pub fn render_favorites(frame: &mut Frame, app: &mut App, area: Rect) {
    let jobs = app.aggregator.jobs();
    let builds = app.aggregator.builds();

    if app.store.favorites().is_empty() {
        render_empty(
            frame,
            area,
            "No favorites yet. Add one with `butler favorite add job <url> --account <name>`",
        );
        return;
    }
    if jobs.is_empty() && builds.is_empty() {
        if app.is_loading() {
            render_loading(frame, area, "Loading favorites");
        } else {
            render_empty(frame, area, "No favorites could be loaded. See the Console tab");
        }
        return;
    }

    let job_items: Vec<ListItem> = jobs
        .iter()
        .map(|resolved| {
            let job = &resolved.entity;
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", job_glyph(job.color)),
                    Style::default().fg(job_color(job.color)),
                ),
                Span::styled(job.title().to_string(), Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!("  {}", resolved.account.name),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let build_items: Vec<ListItem> = builds
        .iter()
        .map(|resolved| {
            let build = &resolved.entity;
            let mut spans = vec![
                Span::styled("● ", Style::default().fg(build_color(build.result))),
                Span::styled(build.title(), Style::default().fg(Color::Cyan)),
            ];
            if let Some(started) = build.started_at() {
                spans.push(Span::styled(
                    format!("  {}", format_relative_time(&started)),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let jobs_title = Section::Jobs.title(job_items.len());
    let builds_title = Section::Builds.title(build_items.len());

    // Hide a section entirely when it has no rows
    let constraints = match (job_items.is_empty(), build_items.is_empty()) {
        (false, false) => vec![
            Constraint::Length(
                u16::try_from(job_items.len())
                    .unwrap_or(u16::MAX)
                    .saturating_add(2),
            ),
            Constraint::Min(3),
        ],
        (false, true) => vec![Constraint::Min(3), Constraint::Length(0)],
        (true, _) => vec![Constraint::Length(0), Constraint::Min(3)],
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    if !job_items.is_empty() {
        frame.render_stateful_widget(
            section_list(job_items, jobs_title),
            chunks[0],
            &mut app.favorites.jobs_list,
        );
    }
    if !build_items.is_empty() {
        frame.render_stateful_widget(
            section_list(build_items, builds_title),
            chunks[1],
            &mut app.favorites.builds_list,
        );
    }
}
