// Jenkins API module.
// Provides the client and types for the Jenkins JSON API.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::JenkinsClient;
pub use types::*;
