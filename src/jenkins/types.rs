// Jenkins JSON API response types.
// Defines structs for deserializing `<url>/api/json` payloads for jobs and builds.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ball colour Jenkins reports for a job. `*Anime` variants mean a build is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobColor {
    Blue,
    BlueAnime,
    Red,
    RedAnime,
    Yellow,
    YellowAnime,
    Grey,
    GreyAnime,
    Disabled,
    DisabledAnime,
    Aborted,
    AbortedAnime,
    Notbuilt,
    NotbuiltAnime,
    #[serde(other)]
    Unknown,
}

impl JobColor {
    /// Whether a build of the job is in progress.
    pub fn is_building(&self) -> bool {
        matches!(
            self,
            JobColor::BlueAnime
                | JobColor::RedAnime
                | JobColor::YellowAnime
                | JobColor::GreyAnime
                | JobColor::DisabledAnime
                | JobColor::AbortedAnime
                | JobColor::NotbuiltAnime
        )
    }

    /// Human-readable status of the last completed build.
    pub fn label(&self) -> &'static str {
        match self {
            JobColor::Blue | JobColor::BlueAnime => "Success",
            JobColor::Red | JobColor::RedAnime => "Failing",
            JobColor::Yellow | JobColor::YellowAnime => "Unstable",
            JobColor::Grey | JobColor::GreyAnime => "Pending",
            JobColor::Disabled | JobColor::DisabledAnime => "Disabled",
            JobColor::Aborted | JobColor::AbortedAnime => "Aborted",
            JobColor::Notbuilt | JobColor::NotbuiltAnime => "Not built",
            JobColor::Unknown => "Unknown",
        }
    }
}

/// Result of a finished build. Absent while the build is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
    #[serde(other)]
    Unknown,
}

impl BuildResult {
    pub fn label(&self) -> &'static str {
        match self {
            BuildResult::Success => "Success",
            BuildResult::Unstable => "Unstable",
            BuildResult::Failure => "Failure",
            BuildResult::NotBuilt => "Not built",
            BuildResult::Aborted => "Aborted",
            BuildResult::Unknown => "Unknown",
        }
    }
}

/// Short reference to a build, as embedded in a job payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRef {
    pub number: u64,
    pub url: String,
}

/// Health summary for a job (weather icon in the Jenkins UI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub score: u32,
    pub description: String,
}

/// Jenkins job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub name: String,
    pub url: String,
    pub display_name: Option<String>,
    pub full_name: Option<String>,
    pub description: Option<String>,
    pub color: Option<JobColor>,
    #[serde(default)]
    pub buildable: bool,
    #[serde(default)]
    pub in_queue: bool,
    #[serde(default)]
    pub health_report: Vec<HealthReport>,
    pub last_build: Option<BuildRef>,
    pub last_completed_build: Option<BuildRef>,
    pub last_successful_build: Option<BuildRef>,
    pub last_failed_build: Option<BuildRef>,
}

impl Job {
    /// Name to show in lists: the display name when set, else the raw name.
    pub fn title(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Jenkins build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub number: u64,
    pub url: String,
    pub display_name: Option<String>,
    pub full_display_name: Option<String>,
    pub description: Option<String>,
    pub result: Option<BuildResult>,
    #[serde(default)]
    pub building: bool,
    /// Milliseconds.
    #[serde(default)]
    pub duration: u64,
    /// Milliseconds.
    #[serde(default)]
    pub estimated_duration: u64,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: i64,
}

impl Build {
    /// Name to show in lists.
    pub fn title(&self) -> String {
        self.full_display_name
            .clone()
            .or_else(|| self.display_name.clone())
            .unwrap_or_else(|| format!("Build #{}", self.number))
    }

    /// When the build started, if Jenkins reported it.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        if self.timestamp <= 0 {
            return None;
        }
        DateTime::from_timestamp_millis(self.timestamp)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration)
    }
}
