//! Wires the timeline, scheduler, interpolator and correlator to a replay
//! source.
//!
//! Ingestion runs on a tokio task and talks to the session only through an
//! unbounded channel of epoch-tagged envelopes. Loading a new round bumps the
//! epoch, so anything a stale stream still manages to send is discarded in
//! [`ReplaySession::pump`] instead of landing in the new round.

use std::fmt::Display;
use std::time::Instant;

use common::{BatchReplay, PlayerState};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{PlaybackConfig, PlaybackSpeed};
use crate::error::ReplayResult;
use crate::interpolator::FrameInterpolator;
use crate::markers::{EventCorrelator, TimelineMarker};
use crate::protocol::{ChunkSource, MessageReader, StreamMessage};
use crate::scheduler::{LoopToken, PlaybackScheduler};
use crate::source::{ReplayClient, RoundRequest};
use crate::timeline::{DisplayPreferences, PlaybackState, ReplayTimeline};

#[derive(Debug)]
pub enum IngestPayload {
    Message(StreamMessage),
    Batch(Box<BatchReplay>),
    Failed(String),
}

#[derive(Debug)]
struct Envelope {
    epoch: u64,
    payload: IngestPayload,
}

/// Write end of the ingest channel, bound to the load that created it.
#[derive(Debug, Clone)]
pub struct IngestHandle {
    epoch: u64,
    tx: UnboundedSender<Envelope>,
}

impl IngestHandle {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Returns false once the session is gone.
    pub fn send(&self, message: StreamMessage) -> bool {
        self.deliver(IngestPayload::Message(message))
    }

    pub fn send_batch(&self, batch: BatchReplay) -> bool {
        self.deliver(IngestPayload::Batch(Box::new(batch)))
    }

    pub fn fail(&self, error: impl Display) -> bool {
        self.deliver(IngestPayload::Failed(error.to_string()))
    }

    fn deliver(&self, payload: IngestPayload) -> bool {
        self.tx
            .send(Envelope {
                epoch: self.epoch,
                payload,
            })
            .is_ok()
    }
}

/// Pump every message of `source` into `ingest`. Transport failures are
/// forwarded as a failure; decode problems were already skipped by the reader.
pub async fn forward_stream<S: ChunkSource>(source: S, ingest: IngestHandle) {
    let mut reader = MessageReader::new(source);
    let mut forwarded = 0usize;
    while let Some(item) = reader.next().await {
        match item {
            Ok(message) => {
                if !ingest.send(message) {
                    debug!("Session dropped; stopping stream after {} messages", forwarded);
                    return;
                }
                forwarded += 1;
            }
            Err(e) => {
                warn!("Replay stream failed after {} messages: {}", forwarded, e);
                ingest.fail(e);
                return;
            }
        }
    }
    info!(
        "Replay stream closed after {} messages ({} skipped)",
        forwarded,
        reader.skipped()
    );
}

pub struct ReplaySession {
    config: PlaybackConfig,
    /// Tick rate from the caller's config; a round's metadata only overrides
    /// it until the next load.
    base_tick_rate: u32,
    timeline: ReplayTimeline,
    scheduler: PlaybackScheduler,
    loop_token: Option<LoopToken>,
    interpolator: FrameInterpolator,
    correlator: EventCorrelator,

    epoch: u64,
    ingest_tx: UnboundedSender<Envelope>,
    ingest_rx: UnboundedReceiver<Envelope>,
    stream_task: Option<JoinHandle<()>>,
    stream_finished: bool,
}

impl ReplaySession {
    pub fn new(config: PlaybackConfig) -> ReplayResult<Self> {
        config.validate()?;
        let (ingest_tx, ingest_rx) = mpsc::unbounded_channel();
        Ok(Self {
            base_tick_rate: config.tick_rate,
            config,
            timeline: ReplayTimeline::new(),
            scheduler: PlaybackScheduler::new(&config),
            loop_token: None,
            interpolator: FrameInterpolator::new(&config),
            correlator: EventCorrelator::new(),
            epoch: 0,
            ingest_tx,
            ingest_rx,
            stream_task: None,
            stream_finished: false,
        })
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn timeline(&self) -> &ReplayTimeline {
        &self.timeline
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True once the current round's stream sent `end`.
    pub fn is_stream_finished(&self) -> bool {
        self.stream_finished
    }

    // --- Loading ---

    /// Tear down whatever is loaded and prepare for a new round. Returns the
    /// handle the new round's data must be delivered through.
    pub fn begin_load(&mut self, replay_id: impl Into<String>) -> IngestHandle {
        self.stop_ingest();
        self.timeline.load_replay(replay_id);
        IngestHandle {
            epoch: self.epoch,
            tx: self.ingest_tx.clone(),
        }
    }

    /// Install a complete round in one go.
    pub fn load_batch(&mut self, replay_id: impl Into<String>, batch: BatchReplay) {
        self.begin_load(replay_id);
        self.install_batch(batch);
        self.stream_finished = true;
    }

    /// Stream a round from any chunk source on the given runtime.
    pub fn stream_from<S>(&mut self, runtime: &Handle, replay_id: impl Into<String>, source: S)
    where
        S: ChunkSource + Send + 'static,
    {
        let ingest = self.begin_load(replay_id);
        self.stream_task = Some(runtime.spawn(forward_stream(source, ingest)));
    }

    /// Stream a round from the API, applying frames as they arrive.
    pub fn stream_round(&mut self, runtime: &Handle, client: ReplayClient, request: RoundRequest) {
        let ingest = self.begin_load(request.replay_id());
        self.stream_task = Some(runtime.spawn(async move {
            match client.open_stream(&request).await {
                Ok(source) => forward_stream(source, ingest).await,
                Err(e) => {
                    ingest.fail(e);
                }
            }
        }));
    }

    /// Fetch a round from the API as one document.
    pub fn fetch_round(&mut self, runtime: &Handle, client: ReplayClient, request: RoundRequest) {
        let ingest = self.begin_load(request.replay_id());
        self.stream_task = Some(runtime.spawn(async move {
            match client.fetch_round(&request).await {
                Ok(batch) => {
                    ingest.send_batch(batch);
                }
                Err(e) => {
                    ingest.fail(e);
                }
            }
        }));
    }

    /// Drop the loaded round. Display preferences survive.
    pub fn reset(&mut self) {
        self.stop_ingest();
        self.timeline.reset();
    }

    /// Apply everything the current load has delivered so far. Returns the
    /// number of envelopes applied (stale ones are not counted).
    pub fn pump(&mut self) -> usize {
        let mut frames = Vec::new();
        let mut events = Vec::new();
        let mut applied = 0;
        // Checked before draining so every message the task sent is seen.
        let source_closed = self
            .stream_task
            .as_ref()
            .is_some_and(|task| task.is_finished());

        while let Ok(envelope) = self.ingest_rx.try_recv() {
            if envelope.epoch != self.epoch {
                debug!(
                    "Discarding data from stale load {} (current {})",
                    envelope.epoch, self.epoch
                );
                continue;
            }
            applied += 1;

            match envelope.payload {
                IngestPayload::Message(StreamMessage::Metadata(metadata)) => {
                    if let Some(rate) = metadata.tick_rate.filter(|r| *r > 0) {
                        self.set_tick_rate(rate);
                    }
                    self.timeline.set_metadata(metadata);
                }
                IngestPayload::Message(StreamMessage::Frame(frame)) => frames.push(frame),
                IngestPayload::Message(StreamMessage::Event(event)) => events.push(event),
                IngestPayload::Message(StreamMessage::End) => {
                    self.stream_finished = true;
                }
                IngestPayload::Message(StreamMessage::Error { message })
                | IngestPayload::Failed(message) => {
                    frames.clear();
                    events.clear();
                    self.fail(message);
                }
                IngestPayload::Batch(batch) => {
                    self.install_batch(*batch);
                    self.stream_finished = true;
                }
            }
        }

        if !frames.is_empty() {
            self.timeline.append_frames(frames);
        }
        if !events.is_empty() {
            let mut all = self.timeline.events().to_vec();
            all.extend(events);
            self.timeline.set_events(all);
        }
        if self.stream_finished || source_closed {
            self.timeline.finish_loading();
        }
        applied
    }

    /// One render-clock callback: ingest, advance, smooth.
    pub fn on_render(&mut self, now: Instant) {
        self.pump();

        if let Some(token) = self.loop_token {
            self.scheduler.on_callback(token, now, &mut self.timeline);
            if !self.scheduler.is_running() {
                self.loop_token = None;
            }
        }
        self.interpolator.on_callback(now, &self.timeline);
    }

    // --- Playback control ---

    pub fn play(&mut self) {
        if self.timeline.state() == PlaybackState::Playing && self.loop_token.is_some() {
            return;
        }
        self.timeline.play();
        if self.timeline.state() == PlaybackState::Playing {
            self.loop_token = Some(self.scheduler.start());
        }
    }

    pub fn pause(&mut self) {
        self.timeline.pause();
        self.stop_loop();
    }

    pub fn toggle_play(&mut self) {
        if self.timeline.state() == PlaybackState::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Pause and move by `delta` frames.
    pub fn step(&mut self, delta: isize) {
        self.pause();
        if delta == 1 {
            self.timeline.next_frame();
        } else if delta == -1 {
            self.timeline.previous_frame();
        } else {
            self.timeline.skip(delta);
        }
    }

    pub fn seek(&mut self, index: usize) {
        self.timeline.seek(index);
    }

    pub fn seek_to_tick(&mut self, tick: u32) {
        self.timeline.seek_to_tick(tick);
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.config.speed = speed;
        self.apply_frame_duration();
    }

    pub fn set_preferences(&mut self, preferences: DisplayPreferences) {
        self.timeline.set_preferences(preferences);
    }

    // --- Render outputs ---

    pub fn poses(&self) -> Vec<PlayerState> {
        self.interpolator.poses(&self.timeline)
    }

    pub fn interpolation_factor(&self) -> f32 {
        self.interpolator.factor()
    }

    /// Markers for the events the preferences ask for.
    pub fn markers(&mut self) -> &[TimelineMarker] {
        let filter = self.timeline.preferences().events;
        self.correlator.markers(&self.timeline, filter)
    }

    /// Seek to the first marker that lands on a later frame.
    pub fn jump_to_next_event(&mut self) -> Option<TimelineMarker> {
        let filter = self.timeline.preferences().events;
        let current = self.timeline.current_index();
        let timeline = &self.timeline;
        let marker = self
            .correlator
            .markers(timeline, filter)
            .iter()
            .find(|m| timeline.index_for_tick(m.tick) > current)
            .cloned()?;
        self.timeline.seek_to_tick(marker.tick);
        Some(marker)
    }

    /// Seek to the last marker that lands on an earlier frame.
    pub fn jump_to_previous_event(&mut self) -> Option<TimelineMarker> {
        let filter = self.timeline.preferences().events;
        let current = self.timeline.current_index();
        let timeline = &self.timeline;
        let marker = self
            .correlator
            .markers(timeline, filter)
            .iter()
            .rev()
            .find(|m| timeline.index_for_tick(m.tick) < current)
            .cloned()?;
        self.timeline.seek_to_tick(marker.tick);
        Some(marker)
    }

    // --- Internals ---

    fn install_batch(&mut self, batch: BatchReplay) {
        let BatchReplay {
            metadata,
            frames,
            events,
        } = batch;
        if let Some(rate) = metadata.tick_rate.filter(|r| *r > 0) {
            self.set_tick_rate(rate);
        }
        self.timeline.set_metadata(metadata);
        self.timeline.set_frames(frames);
        self.timeline.set_events(events);
    }

    fn fail(&mut self, message: String) {
        self.stop_ingest();
        self.timeline.set_error(message);
    }

    fn stop_ingest(&mut self) {
        if let Some(task) = self.stream_task.take() {
            task.abort();
        }
        self.stop_loop();
        self.interpolator.reset();
        self.epoch += 1;
        self.stream_finished = false;
        self.set_tick_rate(self.base_tick_rate);
    }

    fn stop_loop(&mut self) {
        self.scheduler.cancel();
        self.loop_token = None;
    }

    fn set_tick_rate(&mut self, tick_rate: u32) {
        if tick_rate != self.config.tick_rate {
            info!("Tick rate {} -> {}", self.config.tick_rate, tick_rate);
            self.config.tick_rate = tick_rate;
            self.apply_frame_duration();
        }
    }

    fn apply_frame_duration(&mut self) {
        let duration = self.config.frame_duration();
        self.scheduler.set_frame_duration(duration);
        self.interpolator.set_frame_duration(duration);
    }
}

impl Drop for ReplaySession {
    fn drop(&mut self) {
        if let Some(task) = self.stream_task.take() {
            task.abort();
        }
    }
}
