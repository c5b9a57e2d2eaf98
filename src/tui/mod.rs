mod app;
mod ui;

pub use app::{App, nav_command};

use crate::config::SearchConfig;
use crate::profile::ProfileSnapshot;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fs::{self, OpenOptions};
use std::io;
use std::time::Duration;

/// How long to wait for a key before running the next frame of scan work
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub fn run_tui(
    snapshot: ProfileSnapshot,
    config: SearchConfig,
    profile_path: Option<String>,
) -> io::Result<()> {
    // Log to a file only if RUST_LOG is set, stderr belongs to the terminal
    if std::env::var("RUST_LOG").is_ok() {
        init_file_logging()?;
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(snapshot, config, profile_path);

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn init_file_logging() -> io::Result<()> {
    let log_dir = dirs::cache_dir()
        .or_else(dirs::state_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("flame-search");
    fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join("flame-search.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    env_logger::Builder::new()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .parse_default_env()
        .init();

    log::info!("Starting flame-search - log file: {}", log_path.display());
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), B::Error>
where
    B::Error: From<io::Error>,
{
    loop {
        let app_ref = &mut *app;
        terminal.draw(move |f| ui::draw(f, app_ref))?;

        if let Some(event) = get_event()? {
            app.handle_event(event);
        }

        if app.should_quit {
            return Ok(());
        }

        app.tick();
    }
}

fn get_event() -> io::Result<Option<KeyEvent>> {
    if event::poll(FRAME_INTERVAL)?
        && let Event::Key(key) = event::read()?
    {
        // Only process key press events, not release
        if key.kind == KeyEventKind::Press {
            return Ok(Some(key));
        }
    }
    Ok(None)
}
