//! Core TUI application state and event loop.

use std::io;
use std::sync::mpsc;
use std::time::Duration;

use color_eyre::eyre::{Result, eyre};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{error, info};

use towermap_core::{
    PipelineController, PipelineState, PlacedMarker, ProgressReporter, RunConfig, RunSummary,
    SkippedRecord,
};
use towermap_resolver::HttpResolver;
use towermap_shared::{AppConfig, LookupSettings, MapSettings};

use crate::screens::{MarkersScreen, RunRequest, RunScreen, ScreenId};
use crate::surface::TuiSurface;
use crate::widgets::status_bar;

type Controller = PipelineController<HttpResolver, TuiSurface>;
type RunOutcome = (Controller, towermap_shared::Result<RunSummary>);

/// Application state.
pub(crate) struct App {
    /// Currently active screen tab.
    pub active_tab: usize,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Status message shown in bottom bar.
    pub status: String,
    /// Whether help overlay is visible.
    pub show_help: bool,
    run: RunScreen,
    markers: MarkersScreen,
    runner: Runner,
}

impl App {
    pub(crate) fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            active_tab: 0,
            should_quit: false,
            status: "Ready — press ? for help".to_string(),
            show_help: false,
            run: RunScreen::new(&config.defaults),
            markers: MarkersScreen::new(),
            runner: Runner::new(config)?,
        })
    }

    fn current_screen(&self) -> ScreenId {
        ScreenId::ALL[self.active_tab]
    }

    fn is_editing(&self) -> bool {
        self.current_screen() == ScreenId::Run && self.run.is_editing()
    }

    /// Feed progress from a running pipeline into the screens.
    fn poll_runner(&mut self) {
        // Check completion first: once the task is done every event is already queued.
        let finished = self.runner.try_finish();

        for event in self.runner.drain_events() {
            match event {
                ProgressEvent::State(state) => {
                    self.status = state.to_string();
                    self.run.on_state(state);
                }
                ProgressEvent::Resolved(marker) => self.run.on_resolved(&marker),
                ProgressEvent::Skipped(skipped) => self.run.on_skipped(&skipped),
            }
        }

        match finished {
            None => {}
            Some(Ok(summary)) => {
                self.status = format!(
                    "Map written: {} markers, {} skipped",
                    summary.markers.len(),
                    summary.skipped.len()
                );
                self.run.on_finished(Ok(&summary));
                self.markers.show_run(&summary, self.runner.surface.snapshot());
            }
            Some(Err(message)) => {
                self.status = format!("Run failed: {message}");
                self.run.on_finished(Err(message));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Background runs
// ---------------------------------------------------------------------------

/// Progress events forwarded from the pipeline task to the UI thread.
enum ProgressEvent {
    State(PipelineState),
    Resolved(PlacedMarker),
    Skipped(SkippedRecord),
}

/// Forwards progress over a channel; the UI drains it between frames.
struct ChannelProgress {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ProgressReporter for ChannelProgress {
    fn state(&self, state: PipelineState) {
        let _ = self.tx.send(ProgressEvent::State(state));
    }

    fn record_resolved(&self, marker: &PlacedMarker) {
        let _ = self.tx.send(ProgressEvent::Resolved(marker.clone()));
    }

    fn record_skipped(&self, skipped: &SkippedRecord) {
        let _ = self.tx.send(ProgressEvent::Skipped(skipped.clone()));
    }

    fn done(&self, _summary: &RunSummary) {}
}

/// Owns the pipeline controller and runs it on a tokio runtime, one run at a time.
///
/// The controller moves into the task for the duration of a run and comes back
/// with the result, so the surface keeps track of the page across runs.
struct Runner {
    runtime: Runtime,
    controller: Option<Controller>,
    task: Option<JoinHandle<RunOutcome>>,
    events: Option<mpsc::Receiver<ProgressEvent>>,
    lookup: LookupSettings,
    map: MapSettings,
    surface: TuiSurface,
}

impl Runner {
    fn new(config: &AppConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;
        let lookup = LookupSettings::from_config(config)?;
        let surface = TuiSurface::default();
        let controller = PipelineController::new(HttpResolver::new(&lookup)?, surface.clone());

        Ok(Self {
            runtime,
            controller: Some(controller),
            task: None,
            events: None,
            lookup,
            map: MapSettings::from(config),
            surface,
        })
    }

    fn start(&mut self, request: RunRequest) -> Result<()> {
        let mut controller = self
            .controller
            .take()
            .ok_or_else(|| eyre!("a run is already in progress"))?;

        let config = RunConfig {
            input: request.input,
            operator: request.operator,
            output: request.output,
            map: self.map.clone(),
        };
        info!(input = %config.input.display(), operator = %config.operator, "starting run");

        let (tx, rx) = mpsc::channel();
        self.events = Some(rx);
        self.task = Some(self.runtime.spawn(async move {
            let progress = ChannelProgress { tx };
            let result = controller.run(&config, &progress).await;
            (controller, result)
        }));
        Ok(())
    }

    fn drain_events(&self) -> Vec<ProgressEvent> {
        self.events
            .as_ref()
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default()
    }

    /// Collect the finished run, if any. Errors are returned as display text.
    fn try_finish(&mut self) -> Option<std::result::Result<RunSummary, String>> {
        if !self.task.as_ref().is_some_and(|t| t.is_finished()) {
            return None;
        }
        let task = self.task.take()?;

        match self.runtime.block_on(task) {
            Ok((controller, result)) => {
                self.controller = Some(controller);
                Some(result.map_err(|e| e.to_string()))
            }
            Err(join_err) => {
                error!(error = %join_err, "pipeline task aborted");
                // The controller went down with the task; start over with a fresh one.
                let rebuilt = HttpResolver::new(&self.lookup)
                    .map(|resolver| PipelineController::new(resolver, self.surface.clone()));
                match rebuilt {
                    Ok(controller) => self.controller = Some(controller),
                    Err(e) => error!(error = %e, "failed to rebuild pipeline"),
                }
                Some(Err(format!("pipeline task aborted: {join_err}")))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Terminal lifecycle and event loop
// ---------------------------------------------------------------------------

/// Entry point — sets up terminal, runs event loop, restores terminal.
pub(crate) fn run(config: &AppConfig) -> Result<()> {
    let mut app = App::new(config)?;

    // Setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.poll_runner();
        terminal.draw(|f| draw(f, app))?;

        // Poll for events with 100ms timeout for responsive UI
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key.code, key.modifiers);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    // Global keybindings (always active)
    match code {
        KeyCode::Char('q') | KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('q') if !app.is_editing() => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('?') if !app.is_editing() => {
            app.show_help = !app.show_help;
            return;
        }
        KeyCode::Esc if app.show_help => {
            app.show_help = false;
            return;
        }
        // Tab navigation with number keys
        KeyCode::Char(c @ '1'..='2') if !app.is_editing() => {
            app.active_tab = (c as usize) - ('1' as usize);
            app.status = app.current_screen().to_string();
            return;
        }
        KeyCode::Tab | KeyCode::BackTab if !app.is_editing() => {
            // Two tabs: forward and back land on the same screen.
            app.active_tab = (app.active_tab + 1) % ScreenId::ALL.len();
            app.status = app.current_screen().to_string();
            return;
        }
        _ => {}
    }

    // If help is showing, consume any key to dismiss
    if app.show_help {
        app.show_help = false;
        return;
    }

    // Delegate to current screen
    match app.current_screen() {
        ScreenId::Run => {
            if let Some(request) = app.run.handle_key(code, modifiers) {
                if let Err(e) = app.runner.start(request) {
                    app.status = format!("Cannot start run: {e}");
                    app.run.on_finished(Err(e.to_string()));
                }
            }
        }
        ScreenId::Markers => app.markers.handle_key(code, modifiers),
    }
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    // Tab bar
    let tab_titles: Vec<Line> = ScreenId::ALL
        .iter()
        .map(|s| Line::from(s.to_string()))
        .collect();

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(" towermap "))
        .select(app.active_tab)
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .divider(" │ ");

    f.render_widget(tabs, chunks[0]);

    // Content area — delegate to screen
    match app.current_screen() {
        ScreenId::Run => app.run.draw(f, chunks[1]),
        ScreenId::Markers => app.markers.draw(f, chunks[1]),
    }

    // Status bar
    let bar = status_bar(&app.status, app.run.is_running());
    f.render_widget(bar, chunks[2]);

    // Help overlay
    if app.show_help {
        draw_help_overlay(f);
    }
}

fn draw_help_overlay(f: &mut Frame) {
    let area = centered_rect(60, 60, f.area());

    let help_text = vec![
        Line::from("Keybindings").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from("  1-2          Switch to screen"),
        Line::from("  Tab          Next screen"),
        Line::from("  ?            Toggle this help"),
        Line::from("  q / Ctrl-C   Quit"),
        Line::from(""),
        Line::from("Run:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  ↑/↓          Move between fields"),
        Line::from("  Enter        Edit field / next operator"),
        Line::from("  ←/→          Change operator"),
        Line::from("  r / Ctrl-R   Resolve towers and write the map"),
        Line::from(""),
        Line::from("Markers:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  ↑/↓          Scroll towers"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help — press any key to close ")
                .style(Style::default().bg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));

    // Clear background
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(help, area);
}

/// Create a centered rectangle with percentage width and height.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
