// App state and main event loop.
// Owns the favorites session, applies fetch completions, and handles keyboard input.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::prelude::*;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::Result;
use crate::jenkins::JenkinsClient;
use crate::state::{
    Aggregator, Completion, ConsoleLog, DetailRequest, FavoritesTabState, NavigationStack, Signal,
    ViewLevel, spawn_fetches,
};
use crate::store::UserStore;
use crate::ui;

/// Active tab in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Favorites,
    Console,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Favorites => "Favorites",
            Tab::Console => "Console",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Favorites => Tab::Console,
            Tab::Console => Tab::Favorites,
        }
    }
}

/// Main application state.
pub struct App {
    /// Currently active tab.
    pub active_tab: Tab,
    /// Whether the app should exit.
    pub should_quit: bool,
    /// Whether the help overlay is shown.
    pub show_help: bool,
    /// Persisted accounts and favorites.
    pub store: UserStore,
    /// Current favorites session.
    pub aggregator: Aggregator,
    pub favorites: FavoritesTabState,
    pub nav: NavigationStack,
    pub console: ConsoleLog,
    /// Advances every tick while loading.
    pub spinner_frame: usize,
    client: JenkinsClient,
    runtime: Handle,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
}

impl App {
    pub fn new(store: UserStore, client: JenkinsClient, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            active_tab: Tab::default(),
            should_quit: false,
            show_help: false,
            store,
            aggregator: Aggregator::new(),
            favorites: FavoritesTabState::new(),
            nav: NavigationStack::default(),
            console: ConsoleLog::new(),
            spinner_frame: 0,
            client,
            runtime,
            tx,
            rx,
        }
    }

    /// Main event loop. The profile is saved as it changes, never on exit,
    /// so edits made from another terminal survive.
    pub fn run(&mut self, terminal: &mut Terminal<impl Backend>) -> Result<()> {
        self.refresh();
        while !self.should_quit {
            self.drain_completions();
            terminal.draw(|frame| ui::draw(frame, self))?;
            self.handle_events()?;
            if self.is_loading() {
                self.spinner_frame = self.spinner_frame.wrapping_add(1);
            }
        }
        Ok(())
    }

    /// Whether the loading indicator should be shown.
    pub fn is_loading(&self) -> bool {
        !self.aggregator.is_settled()
    }

    /// Start a fresh session over every favorite.
    pub fn refresh(&mut self) {
        self.favorites.reset();
        self.nav.reset();
        let dispatch = self
            .aggregator
            .begin(self.store.favorites(), self.store.accounts());
        self.console.log_info(format!(
            "Loading {} favorites",
            self.aggregator.target()
        ));
        self.report_unknown_accounts();
        tracing::debug!(
            session = self.aggregator.session_id(),
            requests = dispatch.requests.len(),
            "dispatching favorite fetches"
        );
        spawn_fetches(&self.runtime, &self.client, dispatch.requests, &self.tx);
        self.handle_signals(dispatch.signals);
    }

    /// Re-read the profile from disk and fetch favorites added since.
    pub fn reload_favorites(&mut self) {
        let store = match UserStore::load(self.store.path()) {
            Ok(store) => store,
            Err(e) => {
                self.console.log_error(format!("Failed to reload favorites: {}", e));
                return;
            }
        };
        self.store = store;

        // Includes favorites whose fetch is still in flight
        let removed: Vec<String> = self
            .aggregator
            .requested()
            .filter(|url| !self.store.is_favorite(url))
            .map(str::to_string)
            .collect();
        for url in removed {
            let signals = self.aggregator.forget(&url);
            self.handle_signals(signals);
        }

        let dispatch = self
            .aggregator
            .extend(self.store.favorites(), self.store.accounts());
        if !dispatch.requests.is_empty() {
            self.console
                .log_info(format!("Loading {} new favorites", dispatch.requests.len()));
        }
        spawn_fetches(&self.runtime, &self.client, dispatch.requests, &self.tx);
        self.handle_signals(dispatch.signals);
    }

    /// Remove the selected favorite from the profile and the session.
    pub fn unfavorite_selected(&mut self) {
        let Some(url) = self
            .favorites
            .selected_url(&self.aggregator)
            .map(str::to_string)
        else {
            return;
        };

        // Edit the profile as it is on disk, not the copy loaded at startup
        let mut store = match UserStore::load(self.store.path()) {
            Ok(store) => store,
            Err(e) => {
                self.console.log_error(format!("Failed to reload favorites: {}", e));
                return;
            }
        };
        store.remove_favorite(&url);
        if let Err(e) = store.save() {
            self.console.log_error(format!("Failed to save favorites: {}", e));
            return;
        }
        self.store = store;
        self.console.log_info(format!("Removed favorite {}", url));
        let signals = self.aggregator.forget(&url);
        self.handle_signals(signals);
    }

    /// Apply every completion that has arrived since the last tick.
    pub fn drain_completions(&mut self) {
        while let Ok(completion) = self.rx.try_recv() {
            self.handle_completion(completion);
        }
    }

    #[allow(clippy::collapsible_if)]
    pub fn handle_completion(&mut self, completion: Completion) {
        if self.aggregator.accepts(&completion) {
            if let Some(e) = completion.error() {
                self.console
                    .log_warn(format!("Failed to load {}: {}", completion.favorite.url, e));
            }
        }
        let signals = self.aggregator.apply(completion);
        self.handle_signals(signals);
    }

    fn handle_signals(&mut self, signals: Vec<Signal>) {
        for signal in signals {
            match signal {
                Signal::ListsChanged => self.favorites.clamp(&self.aggregator),
                Signal::Settled => {
                    self.spinner_frame = 0;
                    self.console.log_info(format!(
                        "Loaded {} jobs and {} builds ({} failed)",
                        self.aggregator.jobs().len(),
                        self.aggregator.builds().len(),
                        self.aggregator.failed().len()
                    ));
                }
            }
        }
    }

    fn report_unknown_accounts(&mut self) {
        let unknown: Vec<String> = self
            .aggregator
            .failed()
            .iter()
            .map(|f| format!("{} refers to unknown account {}", f.url, f.account))
            .collect();
        for message in unknown {
            self.console.log_warn(message);
        }
    }

    /// Push the detail view for a selected favorite.
    pub fn open_detail(&mut self, request: DetailRequest) {
        self.nav.push(ViewLevel::from(request));
    }

    /// Handle keyboard and other events.
    #[allow(clippy::collapsible_if)]
    fn handle_events(&mut self) -> Result<()> {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return;
        }

        let on_list = self.active_tab == Tab::Favorites && self.nav.at_root();

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab | KeyCode::BackTab => {
                self.active_tab = self.active_tab.next();
                if self.active_tab == Tab::Console {
                    self.console.mark_read();
                }
            }
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('l') => self.reload_favorites(),
            KeyCode::Esc => {
                self.nav.pop();
            }
            KeyCode::Up | KeyCode::Char('k') => match self.active_tab {
                Tab::Favorites if on_list => self.favorites.select_prev(&self.aggregator),
                Tab::Console => self.console.select_prev(),
                _ => {}
            },
            KeyCode::Down | KeyCode::Char('j') => match self.active_tab {
                Tab::Favorites if on_list => self.favorites.select_next(&self.aggregator),
                Tab::Console => self.console.select_next(),
                _ => {}
            },
            KeyCode::Enter if on_list => {
                if let Some(request) = self.favorites.detail_request(&self.aggregator) {
                    self.open_detail(request);
                }
            }
            KeyCode::Char('d') if on_list => self.unfavorite_selected(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;
    use tempfile::TempDir;

    use super::*;
    use crate::jenkins::Job;
    use crate::store::{Account, Favorite};

    const JOB_URL: &str = "https://ci.example.com/job/a/";

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn app_with_favorite(temp_dir: &TempDir) -> App {
        let mut store = UserStore::load(temp_dir.path().join("user.json")).unwrap();
        store
            .add_account(Account {
                name: "work".to_string(),
                base_url: "https://ci.example.com".to_string(),
                username: None,
                api_token: None,
            })
            .unwrap();
        store.add_favorite(Favorite::job(JOB_URL, "work")).unwrap();
        store.save().unwrap();
        App::new(store, JenkinsClient::new().unwrap(), Handle::current())
    }

    /// Start a session without spawning network fetches and resolve its job.
    fn resolve_job(app: &mut App) {
        let dispatch = app
            .aggregator
            .begin(app.store.favorites(), app.store.accounts());
        let job: Job =
            serde_json::from_value(serde_json::json!({ "name": "a", "url": JOB_URL })).unwrap();
        let request = dispatch.requests.into_iter().next().unwrap();
        app.handle_completion(Completion::job(request, Ok(job)));
    }

    #[tokio::test]
    async fn test_refresh_with_no_favorites_settles() {
        let temp_dir = TempDir::new().unwrap();
        let store = UserStore::load(temp_dir.path().join("user.json")).unwrap();
        let mut app = App::new(store, JenkinsClient::new().unwrap(), Handle::current());

        app.refresh();
        assert!(!app.is_loading());
    }

    #[tokio::test]
    async fn test_enter_opens_detail_and_esc_returns() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app_with_favorite(&temp_dir);
        resolve_job(&mut app);
        assert!(!app.is_loading());

        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.nav.current(), ViewLevel::Job { .. }));

        press(&mut app, KeyCode::Esc);
        assert!(app.nav.at_root());
    }

    #[tokio::test]
    async fn test_unfavorite_removes_from_store_and_session() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app_with_favorite(&temp_dir);
        resolve_job(&mut app);

        press(&mut app, KeyCode::Char('d'));
        assert!(app.aggregator.jobs().is_empty());
        assert!(app.store.favorites().is_empty());

        let reloaded = UserStore::load(app.store.path()).unwrap();
        assert!(reloaded.favorites().is_empty());
    }

    fn add_on_disk(app: &App, url: &str) {
        let mut other = UserStore::load(app.store.path()).unwrap();
        other.add_favorite(Favorite::job(url, "work")).unwrap();
        other.save().unwrap();
    }

    #[tokio::test]
    async fn test_unfavorite_keeps_favorites_added_elsewhere() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app_with_favorite(&temp_dir);
        resolve_job(&mut app);
        add_on_disk(&app, "https://ci.example.com/job/b/");

        press(&mut app, KeyCode::Char('d'));

        let reloaded = UserStore::load(app.store.path()).unwrap();
        assert_eq!(reloaded.favorites().len(), 1);
        assert_eq!(reloaded.favorites()[0].url, "https://ci.example.com/job/b/");
    }

    #[tokio::test]
    async fn test_quit_does_not_overwrite_profile() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app_with_favorite(&temp_dir);
        add_on_disk(&app, "https://ci.example.com/job/b/");

        app.should_quit = true;
        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(80, 20)).unwrap();
        app.run(&mut terminal).unwrap();

        let reloaded = UserStore::load(app.store.path()).unwrap();
        assert_eq!(reloaded.favorites().len(), 2);
    }

    #[tokio::test]
    async fn test_reload_forgets_removed_in_flight_favorite() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app_with_favorite(&temp_dir);
        let dispatch = app
            .aggregator
            .begin(app.store.favorites(), app.store.accounts());
        let request = dispatch.requests.into_iter().next().unwrap();

        let mut other = UserStore::load(app.store.path()).unwrap();
        other.remove_favorite(JOB_URL);
        other.save().unwrap();
        app.reload_favorites();
        assert_eq!(app.aggregator.target(), 0);
        assert!(!app.is_loading());

        let job: Job =
            serde_json::from_value(serde_json::json!({ "name": "a", "url": JOB_URL })).unwrap();
        app.handle_completion(Completion::job(request, Ok(job)));
        assert!(app.aggregator.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_unfavorite_keeps_entry_when_save_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app_with_favorite(&temp_dir);
        resolve_job(&mut app);

        // A directory where the temp file goes makes the atomic write fail
        std::fs::create_dir(app.store.path().with_extension("tmp")).unwrap();
        press(&mut app, KeyCode::Char('d'));

        assert_eq!(app.aggregator.jobs().len(), 1);
        assert!(app.store.is_favorite(JOB_URL));
        assert!(UserStore::load(app.store.path()).unwrap().is_favorite(JOB_URL));
        assert_eq!(app.console.unread, 1);
        assert!(
            app.console
                .messages
                .iter()
                .all(|m| !m.message.starts_with("Removed favorite"))
        );
    }

    #[tokio::test]
    async fn test_refresh_drops_completions_from_previous_session() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app_with_favorite(&temp_dir);
        let dispatch = app
            .aggregator
            .begin(app.store.favorites(), app.store.accounts());
        let old = dispatch.requests.into_iter().next().unwrap();

        // Fetches spawned by the refresh never run: the test never yields
        press(&mut app, KeyCode::Char('r'));
        assert!(app.is_loading());

        let job: Job =
            serde_json::from_value(serde_json::json!({ "name": "a", "url": JOB_URL })).unwrap();
        app.tx.send(Completion::job(old.clone(), Ok(job))).unwrap();
        app.tx
            .send(Completion::job(
                old,
                Err(crate::error::ButlerError::NotFound(JOB_URL.to_string())),
            ))
            .unwrap();
        app.drain_completions();

        assert!(app.aggregator.jobs().is_empty());
        assert!(app.aggregator.failed().is_empty());
        assert!(app.is_loading());
        assert_eq!(app.console.unread, 0);
        assert!(app.console.messages.iter().all(|m| !m.message.contains("Failed")));
    }

    #[tokio::test]
    async fn test_forgotten_failure_is_not_logged() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app_with_favorite(&temp_dir);
        let dispatch = app
            .aggregator
            .begin(app.store.favorites(), app.store.accounts());
        let request = dispatch.requests.into_iter().next().unwrap();
        app.aggregator.forget(JOB_URL);

        app.handle_completion(Completion::job(
            request,
            Err(crate::error::ButlerError::NotFound(JOB_URL.to_string())),
        ));

        assert_eq!(app.console.unread, 0);
        assert!(app.aggregator.failed().is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_logs_warning() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app_with_favorite(&temp_dir);
        let dispatch = app
            .aggregator
            .begin(app.store.favorites(), app.store.accounts());
        let request = dispatch.requests.into_iter().next().unwrap();

        app.handle_completion(Completion::job(
            request,
            Err(crate::error::ButlerError::NotFound(JOB_URL.to_string())),
        ));

        assert!(!app.is_loading());
        assert_eq!(app.aggregator.failed().len(), 1);
        assert_eq!(app.console.unread, 1);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.active_tab, Tab::Console);
        assert_eq!(app.console.unread, 0);
    }

    #[tokio::test]
    async fn test_help_swallows_keys() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app_with_favorite(&temp_dir);

        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Esc);
        assert!(!app.show_help);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
