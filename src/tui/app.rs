use crate::config::SearchConfig;
use crate::navigation::{EventChannel, NavCommand, NavigationEvent, ZOOM_EVENT};
use crate::profile::{ProfileSnapshot, Subject};
use crate::scan::{FrameScheduler, SystemClock};
use crate::session::SearchSession;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::cell::RefCell;
use std::rc::Rc;

/// Keyboard contract for match navigation: Down is next, Up is previous
pub fn nav_command(event: &KeyEvent) -> Option<NavCommand> {
    match event.code {
        KeyCode::Down => Some(NavCommand::Next),
        KeyCode::Up => Some(NavCommand::Previous),
        _ => None,
    }
}

pub struct App {
    // Search
    pub session: SearchSession,
    pub scheduler: Rc<FrameScheduler>,
    pub channel: EventChannel,

    // Data
    pub profile_path: Option<String>,
    pub frame_count: usize,
    pub span_count: usize,

    /// Last target the view was asked to zoom to
    pub zoom_target: Rc<RefCell<Option<Subject>>>,

    // UI State
    pub search_active: bool,
    pub input: String,
    pub scroll_offset: usize,
    pub last_visible_height: usize,

    // Flags
    pub should_quit: bool,
    pub show_help: bool,
}

impl App {
    pub fn new(
        snapshot: ProfileSnapshot,
        config: SearchConfig,
        profile_path: Option<String>,
    ) -> Self {
        let scheduler = Rc::new(FrameScheduler::new());
        let channel = EventChannel::new();

        let zoom_target = Rc::new(RefCell::new(None));
        let sink = zoom_target.clone();
        channel.subscribe(
            ZOOM_EVENT,
            Rc::new(move |event: &NavigationEvent| {
                *sink.borrow_mut() = Some(event.target().clone());
            }),
        );

        let frame_count = snapshot.frames.len();
        let span_count = snapshot.spans.len();

        let mut session = SearchSession::new(
            config,
            scheduler.clone(),
            Rc::new(SystemClock::new()),
            channel.clone(),
        );
        session.set_data(snapshot.frames, snapshot.spans);

        Self {
            session,
            scheduler,
            channel,
            profile_path,
            frame_count,
            span_count,
            zoom_target,
            search_active: false,
            input: String::new(),
            scroll_offset: 0,
            last_visible_height: 20, // Updated on first draw
            should_quit: false,
            show_help: false,
        }
    }

    /// One frame of background work: advance any running scan
    pub fn tick(&mut self) {
        self.scheduler.run_frame();
    }

    pub fn update_visible_height(&mut self, height: usize) {
        self.last_visible_height = height;
    }

    pub fn handle_event(&mut self, event: KeyEvent) {
        if event.code == KeyCode::Char('c') && event.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if let Some(command) = nav_command(&event) {
            self.navigate(command);
            return;
        }

        if self.show_help {
            if matches!(event.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.show_help = false;
            }
            return;
        }

        if self.search_active {
            self.handle_search_event(event);
            return;
        }

        match event.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('/') => self.search_active = true,
            KeyCode::Char('n') | KeyCode::Char('j') => self.navigate(NavCommand::Next),
            KeyCode::Char('N') | KeyCode::Char('k') => self.navigate(NavCommand::Previous),
            KeyCode::Esc => self.clear_search(),
            _ => {}
        }
    }

    fn handle_search_event(&mut self, event: KeyEvent) {
        match event.code {
            KeyCode::Char('n') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                self.navigate(NavCommand::Next);
            }
            KeyCode::Char('p') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                self.navigate(NavCommand::Previous);
            }
            KeyCode::Char(c) if !event.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
                self.session.set_query(&self.input);
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.session.set_query(&self.input);
            }
            KeyCode::Enter => {
                // Keep the results, leave the input
                self.search_active = false;
            }
            KeyCode::Esc => {
                self.search_active = false;
                self.clear_search();
            }
            _ => {}
        }
    }

    fn clear_search(&mut self) {
        self.input.clear();
        self.session.clear();
        self.scroll_offset = 0;
    }

    fn navigate(&mut self, command: NavCommand) {
        if self.session.apply(command).is_some() {
            self.ensure_visible();
        }
    }

    fn ensure_visible(&mut self) {
        let Some(selected) = self.session.selected_index() else {
            return;
        };
        if selected < self.scroll_offset {
            self.scroll_offset = selected;
        } else if selected >= self.scroll_offset + self.last_visible_height {
            self.scroll_offset = selected.saturating_sub(self.last_visible_height) + 1;
        }
    }
}
