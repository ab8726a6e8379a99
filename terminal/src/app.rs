use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use replay::{
    PlaybackConfig, PlaybackState, PlaybackStatus, ReplayClient, ReplayReader, ReplaySession,
    RoundRequest,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::Args;
use crate::views::{ReplaySelectorState, ReplayViewerState, View};

#[derive(Debug)]
pub enum AppCommand {
    Quit,
    BackToSelector,
    OpenReplay(PathBuf),
    StreamRound(RoundRequest),
}

pub enum AppState {
    ReplaySelector(Box<ReplaySelectorState>),
    ReplayViewer(Box<ReplayViewerState>),
}

pub struct App {
    pub state: AppState,
    pub replay_dir: PathBuf,
    session: ReplaySession,
    runtime: Handle,
    client: Option<ReplayClient>,
    fetch_whole_rounds: bool,
    status_rx: watch::Receiver<PlaybackStatus>,
    last_state: PlaybackState,
}

impl App {
    pub fn new(args: &Args, config: PlaybackConfig, runtime: Handle) -> Result<Self> {
        let session = ReplaySession::new(config)?;
        let client = args.api_url.as_deref().map(ReplayClient::new).transpose()?;
        let status_rx = session.timeline().subscribe();
        let selector = ReplaySelectorState::new(args.replay_dir.clone(), args.api_url.clone())?;

        Ok(Self {
            state: AppState::ReplaySelector(Box::new(selector)),
            replay_dir: args.replay_dir.clone(),
            session,
            runtime,
            client,
            fetch_whole_rounds: args.batch,
            status_rx,
            last_state: PlaybackState::Idle,
        })
    }

    pub fn session(&self) -> &ReplaySession {
        &self.session
    }

    pub fn handle_input(&mut self, key: KeyEvent) -> Option<AppCommand> {
        match &mut self.state {
            AppState::ReplaySelector(selector) => selector.handle_input(key, &mut self.session),
            AppState::ReplayViewer(viewer) => viewer.handle_input(key, &mut self.session),
        }
    }

    /// One render-clock tick for the engine.
    pub fn update(&mut self, now: Instant) {
        self.session.on_render(now);

        if self.status_rx.has_changed().unwrap_or(false) {
            let status = self.status_rx.borrow_and_update().clone();
            if status.state != self.last_state {
                match &status.error {
                    Some(error) => warn!("Playback {:?}: {}", status.state, error),
                    None => info!(
                        "Playback {:?} at frame {}/{}",
                        status.state, status.current_index, status.total_frames
                    ),
                }
                self.last_state = status.state;
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        match &self.state {
            AppState::ReplaySelector(selector) => selector.render(frame, &mut self.session),
            AppState::ReplayViewer(viewer) => viewer.render(frame, &mut self.session),
        }
    }

    pub fn handle_command(&mut self, command: AppCommand) -> Result<()> {
        match command {
            AppCommand::OpenReplay(path) => {
                self.open_file(&path);
                self.state = AppState::ReplayViewer(Box::new(ReplayViewerState::new(None)));
            }
            AppCommand::StreamRound(request) => {
                let Some(client) = self.client.clone() else {
                    warn!("No API url configured, cannot open {}", request.replay_id());
                    return Ok(());
                };
                if self.fetch_whole_rounds {
                    self.session.fetch_round(&self.runtime, client, request.clone());
                } else {
                    self.session.stream_round(&self.runtime, client, request.clone());
                }
                self.state = AppState::ReplayViewer(Box::new(ReplayViewerState::new(Some(request))));
            }
            AppCommand::BackToSelector => {
                self.session.reset();
                let api_url = self.client.as_ref().map(|c| c.base_url().to_string());
                let selector = ReplaySelectorState::new(self.replay_dir.clone(), api_url)?;
                self.state = AppState::ReplaySelector(Box::new(selector));
            }
            AppCommand::Quit => {
                // Handled in main loop
            }
        }
        Ok(())
    }

    /// Parse the file off the draw thread and hand the result to the session.
    fn open_file(&mut self, path: &Path) {
        let replay_id = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("replay")
            .to_string();
        let ingest = self.session.begin_load(replay_id);
        let path = path.to_path_buf();

        self.runtime.spawn_blocking(move || match ReplayReader::load_replay(&path) {
            Ok(batch) => {
                info!("Loaded {:?}: {} frames", path, batch.frames.len());
                ingest.send_batch(batch);
            }
            Err(e) => {
                ingest.fail(format!("{:#}", e));
            }
        });
    }
}
