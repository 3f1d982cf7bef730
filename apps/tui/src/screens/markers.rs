//! "Markers" screen — towers placed on the map by the last run, and the ones skipped.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use towermap_core::{RunSummary, SkipReason};

use crate::surface::DocumentInfo;

pub(crate) struct MarkersScreen {
    rows: Vec<Row>,
    selected: usize,
    document: Option<DocumentInfo>,
}

/// One list line, pre-rendered when a run finishes.
struct Row {
    text: String,
    skipped: bool,
}

impl MarkersScreen {
    pub(crate) fn new() -> Self {
        Self {
            rows: Vec::new(),
            selected: 0,
            document: None,
        }
    }

    pub(crate) fn show_run(&mut self, summary: &RunSummary, document: Option<DocumentInfo>) {
        self.rows = summary
            .markers
            .iter()
            .map(|m| Row {
                text: format!(
                    "#{:<4} LAC {:<7} CID {:<10} {}, {}",
                    m.id,
                    m.location.record.lac,
                    m.location.record.cid,
                    m.location.latitude,
                    m.location.longitude
                ),
                skipped: false,
            })
            .chain(summary.skipped.iter().map(|s| Row {
                text: format!(
                    "  -   LAC {:<7} CID {:<10} {}",
                    s.record.lac,
                    s.record.cid,
                    match &s.reason {
                        SkipReason::NotFound => "not found".to_string(),
                        SkipReason::LookupFailed(msg) => format!("lookup failed: {msg}"),
                    }
                ),
                skipped: true,
            }))
            .collect();
        self.selected = 0;
        self.document = document;
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Document
                Constraint::Min(1),    // List
            ])
            .split(area);

        let doc_line = match &self.document {
            Some(doc) => format!(
                "{}  ·  {} bytes  ·  {} markers  ·  loaded {}×",
                doc.path.display(),
                doc.bytes,
                doc.markers,
                doc.loads
            ),
            None => "No map page shown yet.".to_string(),
        };
        let doc = Paragraph::new(doc_line)
            .block(Block::default().borders(Borders::ALL).title(" Map page "));
        f.render_widget(doc, chunks[0]);

        if self.rows.is_empty() {
            let empty = Paragraph::new("No towers yet.\n\nRun a spreadsheet from the 'Run' tab.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(" Towers "));
            f.render_widget(empty, chunks[1]);
            return;
        }

        let items: Vec<ListItem> = self
            .rows
            .iter()
            .map(|row| {
                let style = if row.skipped {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                ListItem::new(row.text.as_str()).style(style)
            })
            .collect();

        let placed = self.rows.iter().filter(|r| !r.skipped).count();
        let skipped = self.rows.len() - placed;
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Towers ({placed} placed, {skipped} skipped) ")),
            )
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .highlight_symbol("▸ ");

        let mut state = ListState::default().with_selected(Some(self.selected));
        f.render_stateful_widget(list, chunks[1], &mut state);
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, _modifiers: KeyModifiers) {
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.rows.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.rows.len().saturating_sub(1),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;
    use std::time::Duration;

    use towermap_core::{PlacedMarker, SkippedRecord};
    use towermap_shared::{Operator, ResolvedLocation, TowerRecord};

    fn summary() -> RunSummary {
        let record = TowerRecord::new(1001, 2002);
        RunSummary {
            operator: Operator::IrMci,
            total_records: 2,
            markers: vec![PlacedMarker {
                id: 1,
                location: ResolvedLocation {
                    record,
                    operator: Operator::IrMci,
                    latitude: "35.70".into(),
                    longitude: "51.40".into(),
                },
            }],
            skipped: vec![SkippedRecord {
                record: TowerRecord::new(9, 9),
                reason: SkipReason::NotFound,
            }],
            output: PathBuf::from("mymap.html"),
            elapsed: Duration::from_millis(10),
        }
    }

    #[test]
    fn lists_placed_then_skipped() {
        let mut screen = MarkersScreen::new();
        screen.show_run(&summary(), None);

        assert_eq!(screen.rows.len(), 2);
        assert!(screen.rows[0].text.starts_with("#1"));
        assert!(screen.rows[0].text.contains("35.70, 51.40"));
        assert!(screen.rows[1].skipped);
        assert!(screen.rows[1].text.ends_with("not found"));
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut screen = MarkersScreen::new();
        screen.show_run(&summary(), None);

        for _ in 0..5 {
            screen.handle_key(KeyCode::Down, KeyModifiers::NONE);
        }
        assert_eq!(screen.selected, 1);
        screen.handle_key(KeyCode::Home, KeyModifiers::NONE);
        screen.handle_key(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(screen.selected, 0);
    }
}
