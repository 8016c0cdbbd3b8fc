//! `GemChat`: terminal messenger with simulated contacts and a streaming
//! Gemini assistant.
//!
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/gemchat/config.toml`).
//!
//! ```bash
//! # Offline demo mode (scripted assistant)
//! cargo run --bin gemchat -- --offline
//!
//! # Live assistant
//! GEMINI_API_KEY=... cargo run --bin gemchat
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing_appender::non_blocking::WorkerGuard;

use gemchat::app::App;
use gemchat::completion::CompletionAdapter;
use gemchat::completion::gemini::GeminiAdapter;
use gemchat::completion::scripted::ScriptedAdapter;
use gemchat::config::{CliArgs, ClientConfig};
use gemchat::seed;
use gemchat::simulator::Simulator;
use gemchat::store::ConversationStore;
use gemchat::ui;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > env > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Initialize logging before terminal setup (logs go to file, not stdout).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(
        model = %config.model,
        streaming = config.simulation.streaming,
        offline = config.gemini_settings().is_none(),
        "gemchat starting"
    );

    let store = Arc::new(ConversationStore::new(seed::initial_state()));

    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app with the live adapter if one can be built.
    let live = config.gemini_settings().and_then(|settings| {
        GeminiAdapter::new(settings)
            .inspect_err(|e| tracing::warn!(error = %e, "gemini adapter unavailable, using offline assistant"))
            .ok()
    });
    let result = match live {
        Some(adapter) => {
            let label = format!("Gemini {}", config.model);
            run_app(&mut terminal, &store, adapter, &config, label)
        }
        None => run_app(
            &mut terminal,
            &store,
            ScriptedAdapter::offline_demo(),
            &config,
            "Offline assistant".to_string(),
        ),
    };

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("gemchat exiting");
    result
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, since ratatui owns the terminal).
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("gemchat.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Main application loop.
///
/// Lifecycle tasks run on the runtime's worker threads and mutate the store;
/// every iteration redraws from the store's current state.
fn run_app<A: CompletionAdapter>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    store: &Arc<ConversationStore>,
    adapter: A,
    config: &ClientConfig,
    backend_label: String,
) -> io::Result<()> {
    let simulator = Simulator::new(Arc::clone(store), Arc::new(adapter), config.simulator_config());
    let mut app = App::new(Arc::clone(store))
        .with_timestamp_format(config.timestamp_format.clone())
        .with_backend_label(backend_label);

    loop {
        terminal.draw(|frame| ui::draw(frame, &app))?;

        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            if let Some(outgoing) = app.handle_key_event(key) {
                // The lifecycle runs detached; nothing waits on it.
                if let Err(e) = simulator.send(&outgoing.contact_id, &outgoing.text) {
                    tracing::warn!(contact_id = %outgoing.contact_id, error = %e, "send rejected");
                    app.notify(format!("Not sent: {e}"));
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
