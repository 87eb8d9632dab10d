// Favorite store module.
// Persists the user's accounts and favorites across sessions.

pub mod paths;
pub mod user;

pub use user::{Account, Favorite, FavoriteKind, UserProfile, UserStore};
