// Detail views for a selected favorite job or build.

use std::time::Duration;

use ratatui::{prelude::*, widgets::*};

use crate::jenkins::{Build, BuildRef, Job};
use crate::store::Account;

use super::list::{build_color, format_relative_time, job_color};

/// Format a build duration as "1h 2m", "3m 4s" or "5s".
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

fn field<'a>(label: &'a str, value: impl Into<Span<'a>>) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:<16}", label), Style::default().fg(Color::DarkGray)),
        value.into(),
    ])
}

fn build_ref(build: &Option<BuildRef>) -> String {
    build
        .as_ref()
        .map(|b| format!("#{}", b.number))
        .unwrap_or_else(|| "-".to_string())
}

/// Render the detail view for a job.
pub fn render_job(frame: &mut Frame, job: &Job, account: &Account, area: Rect) {
    let status = match job.color {
        Some(color) if color.is_building() => format!("{} (building)", color.label()),
        Some(color) => color.label().to_string(),
        None => "Unknown".to_string(),
    };

    let mut lines = vec![
        field(
            "Status",
            Span::styled(status, Style::default().fg(job_color(job.color))),
        ),
        field("Account", account.name.clone()),
        field("URL", job.url.clone()),
        field("Last build", build_ref(&job.last_build)),
        field("Last success", build_ref(&job.last_successful_build)),
        field("Last failure", build_ref(&job.last_failed_build)),
        field("Last completed", build_ref(&job.last_completed_build)),
        field("Buildable", if job.buildable { "yes" } else { "no" }),
        field("In queue", if job.in_queue { "yes" } else { "no" }),
    ];

    if !job.health_report.is_empty() {
        lines.push(Line::from(""));
        for report in &job.health_report {
            lines.push(field(
                "Health",
                format!("{:>3}%  {}", report.score, report.description),
            ));
        }
    }

    if let Some(description) = job.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(Line::from(""));
        lines.push(Line::from(description.to_string()));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", job.title()));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

/// Render the detail view for a build.
pub fn render_build(frame: &mut Frame, build: &Build, account: &Account, area: Rect) {
    let result = if build.building {
        "Building".to_string()
    } else {
        build
            .result
            .map(|r| r.label().to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    };

    let started = build
        .started_at()
        .map(|dt| {
            format!(
                "{}  ({})",
                dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"),
                format_relative_time(&dt)
            )
        })
        .unwrap_or_else(|| "-".to_string());

    let duration = if build.building {
        format!(
            "running, estimated {}",
            format_duration(Duration::from_millis(build.estimated_duration))
        )
    } else {
        format_duration(build.duration())
    };

    let mut lines = vec![
        field(
            "Result",
            Span::styled(result, Style::default().fg(build_color(build.result))),
        ),
        field("Number", format!("#{}", build.number)),
        field("Account", account.name.clone()),
        field("URL", build.url.clone()),
        field("Started", started),
        field("Duration", duration),
    ];

    if let Some(description) = build.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(Line::from(""));
        lines.push(Line::from(description.to_string()));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", build.title()));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}
