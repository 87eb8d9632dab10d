mod app;
mod cli;
mod error;
mod jenkins;
mod state;
mod store;
mod ui;

use std::fs::{self, OpenOptions};
use std::io;
use std::process;
use std::sync::Mutex;

use clap::Parser;
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

use app::App;
use cli::Cli;
use error::{ButlerError, Result};
use jenkins::JenkinsClient;
use store::UserStore;

/// Send tracing output to a log file; the terminal belongs to the TUI.
fn setup_verbose_logging() -> Result<()> {
    let log_dir = store::paths::log_dir().ok_or(ButlerError::NoConfigDir)?;
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("debug.log");
    let file = OpenOptions::new().create(true).append(true).open(&log_path)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("butler=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    tracing::info!("butler v{} starting", env!("CARGO_PKG_VERSION"));
    Ok(())
}

fn run_tui(store: UserStore) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let client = JenkinsClient::new()?;
    let mut app = App::new(store, client, runtime.handle().clone());

    // Restore the terminal before the panic message is printed
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Failed to disable raw mode during panic: {e}");
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen) {
            eprintln!("Failed to leave alternate screen during panic: {e}");
        }
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;

    let result = app.run(&mut terminal);

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // In-flight fetches are abandoned, not awaited
    runtime.shutdown_background();
    result
}

fn main() {
    let args = Cli::parse();

    if args.verbose {
        if let Err(e) = setup_verbose_logging() {
            eprintln!("Failed to set up logging: {e}");
            process::exit(1);
        }
    }

    let path = match args.config.or_else(store::paths::user_path) {
        Some(path) => path,
        None => {
            eprintln!("Error: {}", ButlerError::NoConfigDir);
            process::exit(1);
        }
    };

    let result = UserStore::load(path).and_then(|mut store| match args.command {
        Some(command) => cli::run(command, &mut store),
        None => run_tui(store),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
