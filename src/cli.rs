// Command-line interface.
// Profile subcommands for accounts and favorites; no subcommand opens the TUI.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::store::{Account, Favorite, FavoriteKind, UserStore};

/// butler: follow favorite Jenkins jobs and builds.
#[derive(Debug, Parser)]
#[command(name = "butler", version)]
pub struct Cli {
    /// Profile file to use instead of the default location.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Write a debug log to the cache directory.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage Jenkins accounts.
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },

    /// Manage favorite jobs and builds.
    Favorite {
        #[command(subcommand)]
        command: FavoriteCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// Add a Jenkins server.
    Add {
        /// Name favorites refer to.
        name: String,
        /// Server URL, e.g. https://ci.example.com
        base_url: String,
        #[arg(long)]
        username: Option<String>,
        /// API token (Jenkins > User > Configure > API Token).
        #[arg(long)]
        token: Option<String>,
    },

    /// List accounts.
    List,

    /// Remove an account and its favorites.
    Remove { name: String },
}

#[derive(Debug, Subcommand)]
pub enum FavoriteCommand {
    /// Follow a job or build by URL.
    Add {
        /// `job` or `build`.
        kind: FavoriteKind,
        url: String,
        /// Account to fetch it with.
        #[arg(long)]
        account: String,
    },

    /// List favorites.
    List,

    /// Stop following a URL.
    Remove { url: String },
}

/// Run a profile subcommand and save the result.
pub fn run(command: Command, store: &mut UserStore) -> Result<()> {
    match command {
        Command::Account { command } => run_account(command, store)?,
        Command::Favorite { command } => run_favorite(command, store)?,
    }
    store.save()
}

fn run_account(command: AccountCommand, store: &mut UserStore) -> Result<()> {
    match command {
        AccountCommand::Add {
            name,
            base_url,
            username,
            token,
        } => {
            store.add_account(Account {
                name: name.clone(),
                base_url,
                username,
                api_token: token,
            })?;
            println!("Added account {}", name);
        }
        AccountCommand::List => {
            for account in store.accounts() {
                let user = account.username.as_deref().unwrap_or("anonymous");
                println!("{}\t{}\t{}", account.name, account.base_url, user);
            }
        }
        AccountCommand::Remove { name } => {
            let removed = store.remove_account(&name)?;
            println!("Removed account {} and {} favorites", name, removed);
        }
    }
    Ok(())
}

fn run_favorite(command: FavoriteCommand, store: &mut UserStore) -> Result<()> {
    match command {
        FavoriteCommand::Add { kind, url, account } => {
            let favorite = Favorite { kind, url, account };
            let url = favorite.url.clone();
            if store.add_favorite(favorite)? {
                println!("Added {} favorite {}", kind, url);
            } else {
                println!("Already a favorite: {}", url);
            }
        }
        FavoriteCommand::List => {
            for favorite in store.favorites() {
                println!("{}\t{}\t{}", favorite.kind, favorite.account, favorite.url);
            }
        }
        FavoriteCommand::Remove { url } => {
            if store.remove_favorite(&url) {
                println!("Removed favorite {}", url);
            } else {
                println!("Not a favorite: {}", url);
            }
        }
    }
    Ok(())
}
