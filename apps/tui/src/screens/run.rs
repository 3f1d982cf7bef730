//! "Run" screen: spreadsheet path, operator, output path, and run progress.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph};

use towermap_core::{PipelineState, PlacedMarker, RunSummary, SkippedRecord};
use towermap_shared::{DefaultsConfig, Operator};

use super::RunRequest;

/// Lines kept in the activity log.
const LOG_LIMIT: usize = 200;

/// Which input field is focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Input,
    Operator,
    Output,
}

pub(crate) struct RunScreen {
    input: String,
    operator: Operator,
    output: String,
    focused: Field,
    editing: bool,
    running: bool,
    state: PipelineState,
    log: Vec<String>,
}

impl RunScreen {
    pub(crate) fn new(defaults: &DefaultsConfig) -> Self {
        Self {
            input: String::new(),
            operator: defaults.operator,
            output: defaults.output.to_string_lossy().into_owned(),
            focused: Field::Input,
            editing: false,
            running: false,
            state: PipelineState::Idle,
            log: vec![
                "Enter a spreadsheet path, pick an operator, and press 'r' (or Ctrl-R) to run."
                    .into(),
            ],
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.editing
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Input
                Constraint::Length(3), // Operator
                Constraint::Length(3), // Output
                Constraint::Length(1), // Action hint
                Constraint::Length(3), // Progress
                Constraint::Min(1),    // Activity log
            ])
            .split(area);

        let input = Paragraph::new(self.input.as_str())
            .block(self.field_block(Field::Input, " Spreadsheet (CID, LAC) "));
        f.render_widget(input, chunks[0]);

        let operator = Paragraph::new(format!(
            "< {} >  MNC {}  (← → to change)",
            self.operator,
            self.operator.mnc()
        ))
        .block(self.field_block(Field::Operator, " Operator "));
        f.render_widget(operator, chunks[1]);

        let output = Paragraph::new(self.output.as_str())
            .block(self.field_block(Field::Output, " Output page "));
        f.render_widget(output, chunks[2]);

        let hint = if self.editing {
            "Type to edit · Enter/Esc to stop editing"
        } else if self.running {
            "Running…"
        } else {
            "Enter to edit · ↑/↓ to move · r to run"
        };
        let hint_p = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(hint_p, chunks[3]);

        let (ratio, label) = match self.state {
            PipelineState::Resolving { current, total } if total > 0 => {
                (current as f64 / total as f64, self.state.to_string())
            }
            PipelineState::Rendering | PipelineState::Done => (1.0, self.state.to_string()),
            other => (0.0, other.to_string()),
        };
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" Progress "))
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(ratio.clamp(0.0, 1.0))
            .label(label);
        f.render_widget(gauge, chunks[4]);

        // Newest lines at the bottom; show as many as fit.
        let visible = chunks[5].height.saturating_sub(2) as usize;
        let items: Vec<ListItem> = self
            .log
            .iter()
            .skip(self.log.len().saturating_sub(visible))
            .map(|line| ListItem::new(line.as_str()))
            .collect();
        let log =
            List::new(items).block(Block::default().borders(Borders::ALL).title(" Activity "));
        f.render_widget(log, chunks[5]);
    }

    /// Handle a key; returns a run request when the user starts a run.
    pub(crate) fn handle_key(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
    ) -> Option<RunRequest> {
        if code == KeyCode::Char('r') && modifiers.contains(KeyModifiers::CONTROL) {
            self.editing = false;
            return self.start();
        }

        if self.editing {
            match code {
                KeyCode::Esc | KeyCode::Enter => self.editing = false,
                KeyCode::Backspace => {
                    if let Some(field) = self.current_text_mut() {
                        field.pop();
                    }
                }
                KeyCode::Char(c) => {
                    if let Some(field) = self.current_text_mut() {
                        field.push(c);
                    }
                }
                _ => {}
            }
            return None;
        }

        match code {
            KeyCode::Char('r') => return self.start(),
            KeyCode::Enter => {
                if self.focused == Field::Operator {
                    self.operator = self.operator.next();
                } else if !self.running {
                    self.editing = true;
                }
            }
            KeyCode::Left if self.focused == Field::Operator => {
                self.operator = self.operator.prev();
            }
            KeyCode::Right if self.focused == Field::Operator => {
                self.operator = self.operator.next();
            }
            KeyCode::Up | KeyCode::Char('k') => self.prev_field(),
            KeyCode::Down | KeyCode::Char('j') => self.next_field(),
            _ => {}
        }
        None
    }

    pub(crate) fn on_state(&mut self, state: PipelineState) {
        self.state = state;
    }

    pub(crate) fn on_resolved(&mut self, marker: &PlacedMarker) {
        self.push_log(format!(
            "marker {}  {}  at {},{}",
            marker.id, marker.location.record, marker.location.latitude, marker.location.longitude
        ));
    }

    pub(crate) fn on_skipped(&mut self, skipped: &SkippedRecord) {
        self.push_log(format!("skipped {}: {}", skipped.record, skipped.reason));
    }

    pub(crate) fn on_finished(&mut self, outcome: Result<&RunSummary, String>) {
        self.running = false;
        match outcome {
            Ok(summary) => self.push_log(format!(
                "done: {} of {} towers placed on {} in {:.1}s",
                summary.markers.len(),
                summary.total_records,
                summary.output.display(),
                summary.elapsed.as_secs_f64()
            )),
            Err(message) => {
                self.state = PipelineState::Idle;
                self.push_log(format!("run failed: {message}"));
            }
        }
    }

    fn start(&mut self) -> Option<RunRequest> {
        if self.running {
            return None;
        }
        let input = self.input.trim().to_string();
        if input.is_empty() {
            self.push_log("no spreadsheet selected".into());
            return None;
        }
        let output = match self.output.trim() {
            "" => PathBuf::from("mymap.html"),
            path => PathBuf::from(path),
        };

        self.running = true;
        self.push_log(format!("running {input} for {}", self.operator));
        Some(RunRequest {
            input: PathBuf::from(input),
            operator: self.operator,
            output,
        })
    }

    fn push_log(&mut self, line: String) {
        self.log.push(line);
        if self.log.len() > LOG_LIMIT {
            let excess = self.log.len() - LOG_LIMIT;
            self.log.drain(..excess);
        }
    }

    fn field_block(&self, field: Field, title: &'static str) -> Block<'static> {
        let style = if self.focused == field && self.editing {
            Style::default().fg(Color::Yellow)
        } else if self.focused == field {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(style)
    }

    fn current_text_mut(&mut self) -> Option<&mut String> {
        match self.focused {
            Field::Input => Some(&mut self.input),
            Field::Output => Some(&mut self.output),
            Field::Operator => None,
        }
    }

    fn next_field(&mut self) {
        self.focused = match self.focused {
            Field::Input => Field::Operator,
            Field::Operator => Field::Output,
            Field::Output => Field::Input,
        };
    }

    fn prev_field(&mut self) {
        self.focused = match self.focused {
            Field::Input => Field::Output,
            Field::Operator => Field::Input,
            Field::Output => Field::Operator,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(screen: &mut RunScreen, text: &str) {
        for c in text.chars() {
            screen.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[test]
    fn run_requires_input_path() {
        let mut screen = RunScreen::new(&DefaultsConfig::default());
        assert!(screen.handle_key(KeyCode::Char('r'), KeyModifiers::NONE).is_none());
        assert!(!screen.is_running());
    }

    #[test]
    fn builds_request_from_fields() {
        let mut screen = RunScreen::new(&DefaultsConfig::default());

        screen.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        assert!(screen.is_editing());
        type_text(&mut screen, "towers.xlsx");
        screen.handle_key(KeyCode::Esc, KeyModifiers::NONE);

        screen.handle_key(KeyCode::Down, KeyModifiers::NONE);
        screen.handle_key(KeyCode::Right, KeyModifiers::NONE);
        screen.handle_key(KeyCode::Right, KeyModifiers::NONE);

        let request = screen
            .handle_key(KeyCode::Char('r'), KeyModifiers::NONE)
            .unwrap();
        assert_eq!(request.input, PathBuf::from("towers.xlsx"));
        assert_eq!(request.operator, Operator::Mtce);
        assert_eq!(request.output, PathBuf::from("mymap.html"));
        assert!(screen.is_running());

        // A second run can't start until the first finishes.
        assert!(screen.handle_key(KeyCode::Char('r'), KeyModifiers::NONE).is_none());
        screen.on_finished(Err("boom".into()));
        assert!(!screen.is_running());
        assert_eq!(screen.state, PipelineState::Idle);
    }

    #[test]
    fn operator_selector_wraps() {
        let mut screen = RunScreen::new(&DefaultsConfig::default());
        screen.handle_key(KeyCode::Down, KeyModifiers::NONE);
        screen.handle_key(KeyCode::Left, KeyModifiers::NONE);
        assert_eq!(screen.operator, Operator::Iraphone);
    }

    #[test]
    fn log_is_bounded() {
        let mut screen = RunScreen::new(&DefaultsConfig::default());
        for i in 0..(LOG_LIMIT + 50) {
            screen.push_log(format!("line {i}"));
        }
        assert_eq!(screen.log.len(), LOG_LIMIT);
        assert_eq!(screen.log.last().unwrap(), &format!("line {}", LOG_LIMIT + 49));
    }
}
