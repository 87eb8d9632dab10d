// Favorites tab state.
// Maps the aggregator's two result lists onto two list sections with a single cursor.

use ratatui::widgets::ListState;

use super::aggregator::Aggregator;
use super::navigation::DetailRequest;

/// Section of the favorites list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Jobs,
    Builds,
}

impl Section {
    /// Header for the section, hidden when the section is empty.
    pub fn title(&self, rows: usize) -> Option<&'static str> {
        if rows == 0 {
            return None;
        }
        match self {
            Section::Jobs => Some("Jobs"),
            Section::Builds => Some("Builds"),
        }
    }
}

/// Cursor over jobs followed by builds.
///
/// The selection follows its favorite URL, so rows arriving or leaving
/// above it never move it onto another entity.
#[derive(Debug, Default)]
pub struct FavoritesTabState {
    /// Index into the concatenation of jobs then builds.
    cursor: Option<usize>,
    /// Favorite URL of the row under the cursor.
    selected_favorite: Option<String>,
    pub jobs_list: ListState,
    pub builds_list: ListState,
}

/// Favorite URLs in display order: jobs, then builds.
fn row_urls(aggregator: &Aggregator) -> impl Iterator<Item = &str> {
    aggregator
        .jobs()
        .iter()
        .map(|r| r.url.as_str())
        .chain(aggregator.builds().iter().map(|r| r.url.as_str()))
}

impl FavoritesTabState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Section and row of the cursor.
    pub fn selected(&self, jobs: usize, builds: usize) -> Option<(Section, usize)> {
        let i = self.cursor?;
        if i < jobs {
            Some((Section::Jobs, i))
        } else if i < jobs + builds {
            Some((Section::Builds, i - jobs))
        } else {
            None
        }
    }

    /// Move the cursor down, crossing from jobs into builds.
    pub fn select_next(&mut self, aggregator: &Aggregator) {
        let total = aggregator.jobs().len() + aggregator.builds().len();
        if total == 0 {
            return;
        }
        let i = match self.cursor {
            Some(i) => (i + 1).min(total - 1),
            None => 0,
        };
        self.set_cursor(Some(i), aggregator);
    }

    /// Move the cursor up, crossing from builds into jobs.
    pub fn select_prev(&mut self, aggregator: &Aggregator) {
        if aggregator.jobs().is_empty() && aggregator.builds().is_empty() {
            return;
        }
        let i = self.cursor.unwrap_or(0).saturating_sub(1);
        self.set_cursor(Some(i), aggregator);
    }

    /// Re-find the selected favorite after the lists change.
    /// Falls back to the nearest row when it is gone.
    pub fn clamp(&mut self, aggregator: &Aggregator) {
        let total = aggregator.jobs().len() + aggregator.builds().len();
        let moved = self
            .selected_favorite
            .as_deref()
            .and_then(|url| row_urls(aggregator).position(|u| u == url));
        let cursor = match (moved, self.cursor) {
            _ if total == 0 => None,
            (Some(i), _) => Some(i),
            (None, Some(i)) => Some(i.min(total - 1)),
            (None, None) => Some(0),
        };
        self.set_cursor(cursor, aggregator);
    }

    /// Drop the selection (on refresh).
    pub fn reset(&mut self) {
        self.cursor = None;
        self.selected_favorite = None;
        self.jobs_list.select(None);
        self.builds_list.select(None);
    }

    fn set_cursor(&mut self, cursor: Option<usize>, aggregator: &Aggregator) {
        let jobs = aggregator.jobs().len();
        self.cursor = cursor;
        self.selected_favorite =
            cursor.and_then(|i| row_urls(aggregator).nth(i).map(str::to_string));
        match cursor {
            Some(i) if i < jobs => {
                self.jobs_list.select(Some(i));
                self.builds_list.select(None);
            }
            Some(i) => {
                self.jobs_list.select(None);
                self.builds_list.select(Some(i - jobs));
            }
            None => {
                self.jobs_list.select(None);
                self.builds_list.select(None);
            }
        }
    }

    /// Entity and account of the selected row, for the detail view.
    pub fn detail_request(&self, aggregator: &Aggregator) -> Option<DetailRequest> {
        let jobs = aggregator.jobs();
        let builds = aggregator.builds();
        match self.selected(jobs.len(), builds.len())? {
            (Section::Jobs, i) => jobs.get(i).map(|r| DetailRequest::Job {
                job: r.entity.clone(),
                account: r.account.clone(),
            }),
            (Section::Builds, i) => builds.get(i).map(|r| DetailRequest::Build {
                build: r.entity.clone(),
                account: r.account.clone(),
            }),
        }
    }

    /// Favorite URL of the selected row.
    pub fn selected_url<'a>(&self, aggregator: &'a Aggregator) -> Option<&'a str> {
        let jobs = aggregator.jobs();
        let builds = aggregator.builds();
        match self.selected(jobs.len(), builds.len())? {
            (Section::Jobs, i) => jobs.get(i).map(|r| r.url.as_str()),
            (Section::Builds, i) => builds.get(i).map(|r| r.url.as_str()),
        }
    }
}
