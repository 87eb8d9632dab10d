// Navigation state management.
// Handles the navigation stack and breadcrumb trail for detail views.

use crate::jenkins::{Build, Job};
use crate::store::Account;

/// A node in the navigation breadcrumb trail.
#[derive(Debug, Clone)]
pub struct BreadcrumbNode {
    /// Display label for the breadcrumb.
    pub label: String,
}

/// Hand-off from the favorites list to a detail view.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailRequest {
    Job { job: Job, account: Account },
    Build { build: Build, account: Account },
}

/// The current view level in the navigation hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewLevel {
    /// Top level: favorite jobs and builds
    Favorites,
    /// Detail for a favorite job
    Job { job: Box<Job>, account: Account },
    /// Detail for a favorite build
    Build { build: Box<Build>, account: Account },
}

impl From<DetailRequest> for ViewLevel {
    fn from(request: DetailRequest) -> Self {
        match request {
            DetailRequest::Job { job, account } => ViewLevel::Job {
                job: Box::new(job),
                account,
            },
            DetailRequest::Build { build, account } => ViewLevel::Build {
                build: Box::new(build),
                account,
            },
        }
    }
}

impl ViewLevel {
    /// Create a breadcrumb node for this view level.
    pub fn to_breadcrumb(&self) -> BreadcrumbNode {
        let label = match self {
            ViewLevel::Favorites => "Favorites".to_string(),
            ViewLevel::Job { job, account } => format!("{} ({})", job.title(), account.name),
            ViewLevel::Build { build, account } => format!("{} ({})", build.title(), account.name),
        };
        BreadcrumbNode { label }
    }
}

/// Navigation stack for the favorites tab.
#[derive(Debug, Clone)]
pub struct NavigationStack {
    /// Stack of view levels (bottom = root, top = current)
    stack: Vec<ViewLevel>,
}

impl NavigationStack {
    pub fn new(root: ViewLevel) -> Self {
        Self { stack: vec![root] }
    }

    /// Get the current view level.
    pub fn current(&self) -> &ViewLevel {
        // The root is never popped
        &self.stack[self.stack.len() - 1]
    }

    /// Push a new view level onto the stack (drill down).
    pub fn push(&mut self, level: ViewLevel) {
        self.stack.push(level);
    }

    /// Pop the current view level (go back). Returns false if at root.
    pub fn pop(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    pub fn at_root(&self) -> bool {
        self.stack.len() == 1
    }

    /// Get the breadcrumb trail.
    pub fn breadcrumbs(&self) -> Vec<BreadcrumbNode> {
        self.stack
            .iter()
            .map(|level| level.to_breadcrumb())
            .collect()
    }

    /// Reset to root level.
    pub fn reset(&mut self) {
        self.stack.truncate(1);
    }
}

impl Default for NavigationStack {
    fn default() -> Self {
        Self::new(ViewLevel::Favorites)
    }
}
