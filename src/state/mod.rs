// State management module.
// Favorites aggregation, navigation, and per-tab UI state.

pub mod aggregator;
pub mod console;
pub mod favorites;
pub mod fetch;
pub mod navigation;

pub use aggregator::{Aggregator, Completion, Signal};
pub use console::{ConsoleLevel, ConsoleLog};
pub use favorites::{FavoritesTabState, Section};
pub use fetch::{FetchClient, spawn_fetches};
pub use navigation::{BreadcrumbNode, DetailRequest, NavigationStack, ViewLevel};
