use clap::{Parser as ClapParser, Subcommand};
use flame_search::{
    EventChannel, FrameScheduler, HIGHLIGHT_EVENT, MatchEntry, NavigationEvent, ProfileSnapshot,
    SearchConfig, SearchSession, SystemClock, ZOOM_EVENT, load_profile,
};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

/// Frames to run before giving up on a scan that never finishes
const MAX_FRAMES: usize = 1_000_000;

#[derive(ClapParser)]
#[command(name = "flame-search")]
#[command(about = "Incremental search over flame graph frames and trace spans", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a profile once and print the ordered matches as JSON
    Search {
        /// Profile JSON file with "frames" and "spans"
        #[arg(value_name = "PROFILE")]
        profile: String,

        /// Fuzzy query, or /pattern/flags for a regular expression
        #[arg(value_name = "QUERY")]
        query: String,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<String>,

        /// Pretty print JSON output
        #[arg(short, long)]
        pretty: bool,

        /// Time budget per scan tick in milliseconds
        #[arg(long, value_name = "MS")]
        budget_ms: Option<u64>,

        /// Select the N-th match (0-based) and record the navigation events
        #[arg(long, value_name = "N")]
        select: Option<usize>,
    },

    /// Browse and search a profile interactively
    Tui {
        /// Profile JSON file with "frames" and "spans"
        #[arg(value_name = "PROFILE")]
        profile: String,

        /// Time budget per scan tick in milliseconds
        #[arg(long, value_name = "MS")]
        budget_ms: Option<u64>,

        /// Select the first match as soon as a search finishes
        #[arg(long)]
        auto_select: bool,
    },
}

#[derive(Serialize)]
struct SearchOutput {
    query: String,
    generation: u64,
    frames_scanned: usize,
    spans_scanned: usize,
    total: usize,
    ticks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    matches: Vec<MatchEntry>,
    events: Vec<RecordedEvent>,
}

#[derive(Serialize)]
struct RecordedEvent {
    name: &'static str,
    event: NavigationEvent,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            profile,
            query,
            output,
            pretty,
            budget_ms,
            select,
        } => {
            env_logger::init();
            let config = build_config(budget_ms, false);
            let snapshot = load_or_exit(&profile);
            let result = run_search(snapshot, config, &query, select);
            write_output(&result, output, pretty);
        }
        Commands::Tui {
            profile,
            budget_ms,
            auto_select,
        } => {
            let config = build_config(budget_ms, auto_select);
            let snapshot = load_or_exit(&profile);
            if let Err(err) = flame_search::tui::run_tui(snapshot, config, Some(profile)) {
                eprintln!("Error running TUI: {}", err);
                std::process::exit(1);
            }
        }
    }
}

fn build_config(budget_ms: Option<u64>, auto_select: bool) -> SearchConfig {
    let config = SearchConfig::default().with_auto_select(auto_select);
    match budget_ms {
        Some(ms) => config.with_budget_ms(ms),
        None => config,
    }
}

fn load_or_exit(path: &str) -> ProfileSnapshot {
    match load_profile(path) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            eprintln!("Error loading profile {}: {}", path, err);
            std::process::exit(1);
        }
    }
}

fn run_search(
    snapshot: ProfileSnapshot,
    config: SearchConfig,
    query: &str,
    select: Option<usize>,
) -> SearchOutput {
    let scheduler = Rc::new(FrameScheduler::new());
    let channel = EventChannel::new();

    let recorded = Rc::new(RefCell::new(Vec::new()));
    for name in [ZOOM_EVENT, HIGHLIGHT_EVENT] {
        let sink = recorded.clone();
        channel.subscribe(
            name,
            Rc::new(move |event: &NavigationEvent| {
                sink.borrow_mut().push(RecordedEvent {
                    name: event.name(),
                    event: event.clone(),
                });
            }),
        );
    }

    let mut session = SearchSession::new(
        config,
        scheduler.clone(),
        Rc::new(SystemClock::new()),
        channel,
    );
    session.set_data(snapshot.frames, snapshot.spans);
    session.set_query(query);

    let frames = scheduler.run_until_idle(MAX_FRAMES);
    log::debug!("Search settled after {} frames", frames);

    if let Some(index) = select
        && session.select(index).is_none()
    {
        eprintln!(
            "Warning: no match at index {} ({} matches)",
            index,
            session.results().len()
        );
    }

    let results = session.results();
    let progress = session.scan_progress().unwrap_or_default();
    let matches = session
        .ordered()
        .iter()
        .filter_map(|key| results.get(*key).cloned())
        .collect();

    SearchOutput {
        query: session.query(),
        generation: results.generation(),
        frames_scanned: progress.processed_frames,
        spans_scanned: progress.processed_spans,
        total: results.len(),
        ticks: progress.ticks,
        error: session.query_error().map(ToString::to_string),
        matches,
        events: recorded.take(),
    }
}

fn write_output(output: &SearchOutput, output_file: Option<String>, pretty: bool) {
    let json = if pretty {
        serde_json::to_string_pretty(output)
    } else {
        serde_json::to_string(output)
    };

    let json = match json {
        Ok(j) => j,
        Err(err) => {
            eprintln!("Error serializing to JSON: {}", err);
            std::process::exit(1);
        }
    };

    if let Some(output_path) = output_file {
        if let Err(err) = std::fs::write(&output_path, json) {
            eprintln!("Error writing to {}: {}", output_path, err);
            std::process::exit(1);
        }
        eprintln!("Output written to {}", output_path);
    } else {
        println!("{}", json);
    }
}
