use super::View;
use crate::app::AppCommand;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use replay::{ReplayReader, ReplaySession};
use std::cell::Cell;
use std::path::PathBuf;
use std::time::SystemTime;

pub struct ReplaySelectorState {
    replay_files: Vec<PathBuf>,
    selected_index: usize,
    scroll_offset: Cell<usize>,
    api_url: Option<String>,
}

impl ReplaySelectorState {
    pub fn new(replay_dir: PathBuf, api_url: Option<String>) -> Result<Self> {
        let replay_files = ReplayReader::list_replays(&replay_dir)?;
        Ok(Self {
            replay_files,
            selected_index: 0,
            scroll_offset: Cell::new(0),
            api_url,
        })
    }

    pub fn replay_files(&self) -> &[PathBuf] {
        &self.replay_files
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    fn move_selection_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    fn move_selection_down(&mut self) {
        if self.selected_index < self.replay_files.len().saturating_sub(1) {
            self.selected_index += 1;
        }
    }
}

fn describe_size(size: u64) -> String {
    if size < 1024 {
        format!("{} B", size)
    } else if size < 1024 * 1024 {
        format!("{:.1} KB", size as f64 / 1024.0)
    } else {
        format!("{:.1} MB", size as f64 / (1024.0 * 1024.0))
    }
}

fn describe_age(modified: SystemTime) -> String {
    let now = SystemTime::now();
    let age = now.duration_since(modified).unwrap_or_default().as_secs();
    if age < 60 {
        "just now".to_string()
    } else if age < 3600 {
        format!("{}m ago", age / 60)
    } else if age < 86400 {
        format!("{}h ago", age / 3600)
    } else {
        format!("{}d ago", age / 86400)
    }
}

impl View for ReplaySelectorState {
    fn handle_input(&mut self, key: KeyEvent, _session: &mut ReplaySession) -> Option<AppCommand> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(AppCommand::Quit),
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection_down();
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection_up();
                None
            }
            KeyCode::Enter => self
                .replay_files
                .get(self.selected_index)
                .cloned()
                .map(AppCommand::OpenReplay),
            _ => None,
        }
    }

    fn render(&self, frame: &mut Frame, _session: &mut ReplaySession) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(frame.area());

        let title = Paragraph::new("CS2 Round Replay Viewer")
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, chunks[0]);

        let list_area = chunks[1];
        let visible_height = (list_area.height.saturating_sub(2) as usize).max(1);

        // Keep the selection inside the visible window
        let mut scroll_offset = self.scroll_offset.get();
        if self.selected_index >= scroll_offset + visible_height {
            scroll_offset = self.selected_index + 1 - visible_height;
        } else if self.selected_index < scroll_offset {
            scroll_offset = self.selected_index;
        }
        self.scroll_offset.set(scroll_offset);

        let items: Vec<ListItem> = self
            .replay_files
            .iter()
            .enumerate()
            .skip(scroll_offset)
            .take(visible_height)
            .map(|(i, path)| {
                let filename = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("Unknown");

                let metadata_info = match path.metadata() {
                    Ok(metadata) => {
                        let modified = metadata
                            .modified()
                            .map(describe_age)
                            .unwrap_or_else(|_| "unknown".to_string());
                        format!(" ({}, {})", describe_size(metadata.len()), modified)
                    }
                    Err(_) => String::new(),
                };

                let style = if i == self.selected_index {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };

                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:>3} ", i + 1), Style::default().fg(Color::DarkGray)),
                    Span::styled(filename.to_string(), style),
                    Span::styled(metadata_info, Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .title(format!("Select Replay ({})", self.replay_files.len()))
                .borders(Borders::ALL),
        );
        frame.render_widget(list, list_area);

        let help_text = match (&self.api_url, self.replay_files.is_empty()) {
            (Some(url), true) => format!("No local replays. API: {} (use --demo) | q: Quit", url),
            (None, true) => "No replay files found. Press 'q' to quit.".to_string(),
            _ => "↑/k: Up | ↓/j: Down | Enter: Open | q: Quit".to_string(),
        };

        let help = Paragraph::new(help_text)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, chunks[2]);
    }
}

