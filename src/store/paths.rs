// Filesystem locations for the user profile and debug log.

use std::path::PathBuf;

use directories::ProjectDirs;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "butler")
}

/// Get the config directory (~/.config/butler on Linux).
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Path to the persisted user profile (accounts and favorites).
pub fn user_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("user.json"))
}

/// Directory for the verbose debug log (~/.cache/butler on Linux).
pub fn log_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}
