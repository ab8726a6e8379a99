use super::View;
use crate::app::AppCommand;
use crate::render::radar::{RadarBounds, RadarRenderer};
use crate::render::standard_renderer::{team_color, StandardRenderer};
use crate::render::timeline_bar::{marker_color, render_timeline_bar};
use crate::render::types::{CharDimensions, RenderConfig};
use common::{PlayerState, ReplayEvent, Team};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use replay::markers::normalized_position;
use replay::{PlaybackState, ReplaySession, RoundRequest, ViewLayout};
use std::cell::RefCell;

/// How long an event stays drawn on the radar, in seconds of round time.
const EVENT_LINGER_SECS: u32 = 2;
const RECENT_EVENTS: usize = 8;

pub struct ReplayViewerState {
    /// Set when the round came from the API, so neighbouring rounds can be opened.
    round: Option<RoundRequest>,
    last_jump: Option<String>,
    bounds_cache: RefCell<Option<((u64, usize), RadarBounds)>>,
}

impl ReplayViewerState {
    pub fn new(round: Option<RoundRequest>) -> Self {
        Self {
            round,
            last_jump: None,
            bounds_cache: RefCell::new(None),
        }
    }

    pub fn round(&self) -> Option<&RoundRequest> {
        self.round.as_ref()
    }

    fn neighbour_round(&self, forward: bool) -> Option<AppCommand> {
        let current = self.round.as_ref()?;
        let round = if forward {
            current.round + 1
        } else {
            current.round.checked_sub(1).filter(|r| *r > 0)?
        };
        let mut request = current.clone();
        request.round = round;
        Some(AppCommand::StreamRound(request))
    }

    fn bounds(&self, session: &ReplaySession) -> Option<RadarBounds> {
        let key = (session.epoch(), session.timeline().frames().len());
        let mut cache = self.bounds_cache.borrow_mut();
        match *cache {
            Some((cached_key, bounds)) if cached_key == key => Some(bounds),
            _ => {
                let bounds = RadarBounds::from_frames(session.timeline().frames())?;
                *cache = Some((key, bounds));
                Some(bounds)
            }
        }
    }
}

fn state_label(state: PlaybackState) -> (&'static str, Color) {
    match state {
        PlaybackState::Idle => ("Idle", Color::DarkGray),
        PlaybackState::Loading => ("Loading", Color::Yellow),
        PlaybackState::Ready => ("Ready", Color::White),
        PlaybackState::Playing => ("▶ Playing", Color::Green),
        PlaybackState::Paused => ("⏸ Paused", Color::Yellow),
        PlaybackState::Ended => ("■ Ended", Color::Magenta),
    }
}

fn round_clock(tick: u32, start_tick: u32, tick_rate: u32) -> String {
    let secs = tick.saturating_sub(start_tick) / tick_rate.max(1);
    format!("{}:{:02}", secs / 60, secs % 60)
}

impl View for ReplayViewerState {
    fn handle_input(&mut self, key: KeyEvent, session: &mut ReplaySession) -> Option<AppCommand> {
        match key.code {
            KeyCode::Char(' ') => session.toggle_play(),
            KeyCode::Char('l') | KeyCode::Right => session.step(1),
            KeyCode::Char('h') | KeyCode::Left => session.step(-1),
            KeyCode::Char('L') => session.step(10),
            KeyCode::Char('H') => session.step(-10),
            KeyCode::Home => session.seek(0),
            KeyCode::End => {
                let last = session.timeline().frames().len().saturating_sub(1);
                session.seek(last);
            }
            KeyCode::Char(']') => {
                let speed = session.config().speed.faster();
                session.set_speed(speed);
            }
            KeyCode::Char('[') => {
                let speed = session.config().speed.slower();
                session.set_speed(speed);
            }
            KeyCode::Char('n') => {
                self.last_jump = session.jump_to_next_event().map(|m| m.label);
            }
            KeyCode::Char('p') => {
                self.last_jump = session.jump_to_previous_event().map(|m| m.label);
            }
            KeyCode::Char(c @ ('1' | '2' | '3')) => {
                let mut preferences = session.timeline().preferences();
                let filter = &mut preferences.events;
                match c {
                    '1' => filter.kills = !filter.kills,
                    '2' => filter.bomb = !filter.bomb,
                    _ => filter.grenades = !filter.grenades,
                }
                session.set_preferences(preferences);
            }
            KeyCode::Char('v') => {
                let mut preferences = session.timeline().preferences();
                preferences.layout = match preferences.layout {
                    ViewLayout::RadarWithRoster => ViewLayout::RadarOnly,
                    ViewLayout::RadarOnly => ViewLayout::RadarWithRoster,
                };
                session.set_preferences(preferences);
            }
            KeyCode::Char('>') => return self.neighbour_round(true),
            KeyCode::Char('<') => return self.neighbour_round(false),
            KeyCode::Char('q') | KeyCode::Esc => return Some(AppCommand::BackToSelector),
            _ => {}
        }
        None
    }

    fn render(&self, frame: &mut Frame, session: &mut ReplaySession) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(10),   // Radar and side panel
                Constraint::Length(3), // Timeline
                Constraint::Length(3), // Controls
            ])
            .split(frame.area());

        frame.render_widget(self.render_header(session), chunks[0]);

        if session.timeline().frames().is_empty() {
            frame.render_widget(self.render_placeholder(session), chunks[1]);
        } else {
            match session.timeline().preferences().layout {
                ViewLayout::RadarWithRoster => {
                    let columns = Layout::default()
                        .direction(Direction::Horizontal)
                        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
                        .split(chunks[1]);
                    self.render_radar(frame, columns[0], session);

                    let side = Layout::default()
                        .direction(Direction::Vertical)
                        .constraints([Constraint::Min(8), Constraint::Length(RECENT_EVENTS as u16 + 2)])
                        .split(columns[1]);
                    frame.render_widget(self.render_roster(session), side[0]);
                    frame.render_widget(self.render_event_feed(session), side[1]);
                }
                ViewLayout::RadarOnly => self.render_radar(frame, chunks[1], session),
            }
        }

        self.render_timeline(frame, chunks[2], session);
        frame.render_widget(self.render_controls(), chunks[3]);
    }
}

impl ReplayViewerState {
    fn render_header(&self, session: &ReplaySession) -> Paragraph<'static> {
        let timeline = session.timeline();
        let (state, state_color) = state_label(timeline.state());
        let progress = timeline.progress();

        let mut spans = Vec::new();
        if let Some(meta) = timeline.metadata() {
            spans.push(Span::styled(
                format!(
                    "{} · Round {} · ",
                    meta.map_name.as_deref().unwrap_or("unknown map"),
                    meta.round_number
                ),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                format!("CT {}", meta.ct_score),
                Style::default().fg(team_color(Team::CounterTerrorist)),
            ));
            spans.push(Span::raw(" - "));
            spans.push(Span::styled(
                format!("{} T", meta.t_score),
                Style::default().fg(team_color(Team::Terrorist)),
            ));
            spans.push(Span::raw(" · "));
        } else if let Some(id) = timeline.replay_id() {
            spans.push(Span::raw(format!("{} · ", id)));
        }

        spans.push(Span::styled(state, Style::default().fg(state_color).add_modifier(Modifier::BOLD)));
        spans.push(Span::raw(format!(
            " · {} · tick {} · frame {}/{} ({:.0}%)",
            session.config().speed,
            timeline.current_tick(),
            (progress.current + 1).min(progress.total),
            progress.total,
            progress.percentage
        )));
        if timeline.state() == PlaybackState::Loading || !session.is_stream_finished() {
            spans.push(Span::styled(" · streaming", Style::default().fg(Color::DarkGray)));
        }

        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
    }

    fn render_placeholder(&self, session: &ReplaySession) -> Paragraph<'static> {
        let timeline = session.timeline();
        let (text, style) = match (timeline.state(), timeline.error()) {
            (_, Some(error)) => (format!("Error: {}", error), Style::default().fg(Color::Red)),
            (PlaybackState::Loading, _) => (
                format!("Loading {}…", timeline.replay_id().unwrap_or("replay")),
                Style::default().fg(Color::Yellow),
            ),
            _ => ("No replay loaded".to_string(), Style::default().fg(Color::DarkGray)),
        };
        Paragraph::new(text)
            .style(style)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Radar").borders(Borders::ALL))
    }

    fn render_radar(&self, frame: &mut Frame, area: Rect, session: &ReplaySession) {
        let block = Block::default().title("Radar").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(bounds) = self.bounds(session) else {
            return;
        };

        let char_dims = CharDimensions::new(2, 1);
        let config = RenderConfig { chars_per_point: char_dims };
        let width = inner.width as usize / char_dims.horizontal;
        let height = inner.height as usize / char_dims.vertical;

        let timeline = session.timeline();
        let filter = timeline.preferences().events;
        let now = timeline.current_tick();
        let linger = EVENT_LINGER_SECS * session.config().tick_rate;
        let events: Vec<&ReplayEvent> = timeline
            .events()
            .iter()
            .filter(|e| e.tick() <= now && e.tick() + linger >= now)
            .filter(|e| filter.includes(e.category()))
            .collect();

        let poses = session.poses();
        let radar = RadarRenderer::new(StandardRenderer::new(char_dims));
        let grid = radar.render(&poses, &events, &bounds, width, height, &config);
        frame.render_widget(Paragraph::new(grid.into_text_lines()), inner);
    }

    fn render_roster(&self, session: &ReplaySession) -> Paragraph<'static> {
        let mut players: Vec<&PlayerState> = session
            .timeline()
            .current_frame()
            .map(|f| f.players.iter().collect())
            .unwrap_or_default();
        players.sort_by(|a, b| {
            (u8::from(b.team), b.is_alive, &a.name).cmp(&(u8::from(a.team), a.is_alive, &b.name))
        });

        let lines: Vec<Line> = players
            .into_iter()
            .map(|p| {
                let color = if p.is_alive { team_color(p.team) } else { Color::DarkGray };
                let weapon = p.active_weapon.as_deref().unwrap_or("-");
                let mut flags = String::new();
                if p.has_bomb {
                    flags.push_str(" [C4]");
                }
                if p.has_defuser {
                    flags.push_str(" [kit]");
                }
                if p.is_flashed() {
                    flags.push_str(" [flashed]");
                }
                Line::from(vec![
                    Span::styled(
                        format!("{:<3}", p.team.short_name()),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(format!("{:<14.14}", p.name), Style::default().fg(color)),
                    Span::raw(format!(
                        " {:>3}hp {:>3}ar ${:<5} {}{}",
                        p.health, p.armor, p.money, weapon, flags
                    )),
                ])
            })
            .collect();

        Paragraph::new(lines).block(Block::default().title("Players").borders(Borders::ALL))
    }

    fn render_event_feed(&self, session: &ReplaySession) -> Paragraph<'static> {
        let timeline = session.timeline();
        let filter = timeline.preferences().events;
        let now = timeline.current_tick();
        let start = timeline.tick_range().map(|(start, _)| start).unwrap_or(0);
        let tick_rate = session.config().tick_rate;

        let lines: Vec<Line> = timeline
            .events()
            .iter()
            .filter(|e| e.tick() <= now && filter.includes(e.category()))
            .rev()
            .take(RECENT_EVENTS)
            .map(|e| {
                Line::from(vec![
                    Span::styled(
                        format!("{:>5} ", round_clock(e.tick(), start, tick_rate)),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(e.label(), Style::default().fg(marker_color(e.category()))),
                ])
            })
            .collect();

        Paragraph::new(lines).block(Block::default().title("Events").borders(Borders::ALL))
    }

    fn render_timeline(&self, frame: &mut Frame, area: Rect, session: &mut ReplaySession) {
        let head = session
            .timeline()
            .tick_range()
            .map(|(start, end)| normalized_position(session.timeline().current_tick(), start, end))
            .unwrap_or(0.0);
        let markers = session.markers().to_vec();

        let filter = session.timeline().preferences().events;
        let mut title = format!(
            "Timeline [1]kills:{} [2]bomb:{} [3]grenades:{}",
            if filter.kills { "on" } else { "off" },
            if filter.bomb { "on" } else { "off" },
            if filter.grenades { "on" } else { "off" },
        );
        if let Some(label) = &self.last_jump {
            title.push_str(&format!(" · {}", label));
        }

        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let bar = render_timeline_bar(&markers, head, inner.width as usize);
        frame.render_widget(Paragraph::new(bar.into_text_lines()), inner);
    }

    fn render_controls(&self) -> Paragraph<'static> {
        let mut text = String::from(
            "Space: Play/Pause | h/l: ±1 | H/L: ±10 | [/]: Speed | n/p: Events | v: Layout | q: Back",
        );
        if self.round.is_some() {
            text.push_str(" | </>: Round");
        }
        Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
    }
}
