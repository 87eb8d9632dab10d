// User profile store.
// Loads and atomically saves accounts and favorites as JSON.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{ButlerError, Result};

/// Credentials and server for authenticating fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique name favorites refer to.
    pub name: String,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

/// What a favorite points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteKind {
    Job,
    Build,
}

impl fmt::Display for FavoriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FavoriteKind::Job => write!(f, "job"),
            FavoriteKind::Build => write!(f, "build"),
        }
    }
}

impl FromStr for FavoriteKind {
    type Err = ButlerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "job" => Ok(FavoriteKind::Job),
            "build" => Ok(FavoriteKind::Build),
            other => Err(ButlerError::Other(format!(
                "unknown favorite kind {other:?}, expected job or build"
            ))),
        }
    }
}

/// A followed job or build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub kind: FavoriteKind,
    pub url: String,
    /// Name of the owning account.
    pub account: String,
}

#[cfg(test)]
impl Favorite {
    pub fn job(url: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            kind: FavoriteKind::Job,
            url: url.into(),
            account: account.into(),
        }
    }

    pub fn build(url: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            kind: FavoriteKind::Build,
            url: url.into(),
            account: account.into(),
        }
    }
}

/// Serialized profile contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub favorites: Vec<Favorite>,
}

/// The profile bound to the file it was loaded from.
#[derive(Debug)]
pub struct UserStore {
    path: PathBuf,
    profile: UserProfile,
}

impl UserStore {
    /// Load the profile at `path`. A missing file yields an empty profile.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let profile = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            UserProfile::default()
        };
        Ok(Self { path, profile })
    }

    /// Write the profile back to its file.
    pub fn save(&self) -> Result<()> {
        write_atomic(&self.path, &serde_json::to_string_pretty(&self.profile)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn favorites(&self) -> &[Favorite] {
        &self.profile.favorites
    }

    pub fn accounts(&self) -> &[Account] {
        &self.profile.accounts
    }

    pub fn account(&self, name: &str) -> Option<&Account> {
        self.profile.accounts.iter().find(|a| a.name == name)
    }

    pub fn is_favorite(&self, url: &str) -> bool {
        self.profile.favorites.iter().any(|f| f.url == url)
    }

    /// Add an account. Names must be unique.
    pub fn add_account(&mut self, account: Account) -> Result<()> {
        validate_url(&account.base_url)?;
        if self.account(&account.name).is_some() {
            return Err(ButlerError::DuplicateAccount(account.name));
        }
        self.profile.accounts.push(account);
        Ok(())
    }

    /// Remove an account and every favorite that belongs to it.
    /// Returns the number of favorites removed.
    pub fn remove_account(&mut self, name: &str) -> Result<usize> {
        if self.account(name).is_none() {
            return Err(ButlerError::UnknownAccount(name.to_string()));
        }
        self.profile.accounts.retain(|a| a.name != name);
        let before = self.profile.favorites.len();
        self.profile.favorites.retain(|f| f.account != name);
        Ok(before - self.profile.favorites.len())
    }

    /// Add a favorite. Returns false if the URL is already a favorite.
    pub fn add_favorite(&mut self, favorite: Favorite) -> Result<bool> {
        validate_url(&favorite.url)?;
        if self.account(&favorite.account).is_none() {
            return Err(ButlerError::UnknownAccount(favorite.account));
        }
        if self.is_favorite(&favorite.url) {
            return Ok(false);
        }
        self.profile.favorites.push(favorite);
        Ok(true)
    }

    /// Remove a favorite by URL. Returns whether anything was removed.
    pub fn remove_favorite(&mut self, url: &str) -> bool {
        let before = self.profile.favorites.len();
        self.profile.favorites.retain(|f| f.url != url);
        before != self.profile.favorites.len()
    }
}

/// Accept only absolute http(s) URLs.
fn validate_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url).map_err(|e| ButlerError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ButlerError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {scheme}"),
        }),
    }
}

/// Write text to `path` via a temp file and rename.
fn write_atomic(path: &Path, text: &str) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(text.as_bytes())?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;

    Ok(())
}
