//! Client-side playback engine for CS2 round replays.
//!
//! Frames and events arrive from a [`protocol`] stream (or a batch document),
//! are installed into the [`timeline`], advanced by the [`scheduler`] at a
//! rate derived from the source tick rate, smoothed by the [`interpolator`]
//! and mapped onto timeline markers by [`markers`]. [`session`] ties them
//! together for a host that calls it once per render pass.

pub mod config;
pub mod error;
pub mod interpolator;
pub mod markers;
pub mod protocol;
pub mod reader;
pub mod scheduler;
pub mod session;
pub mod source;
pub mod timeline;

pub use config::{PlaybackConfig, PlaybackSpeed};
pub use error::{ReplayError, ReplayResult};
pub use interpolator::{FrameInterpolator, interpolate_angle};
pub use markers::{EventCorrelator, TimelineMarker};
pub use protocol::{ChunkSource, LineDecoder, MemorySource, MessageReader, StreamMessage};
pub use reader::ReplayReader;
pub use scheduler::{CallbackOutcome, LoopToken, PlaybackScheduler};
pub use session::{IngestHandle, ReplaySession};
pub use source::{ReplayClient, RoundRequest};
pub use timeline::{
    DisplayPreferences, EventFilter, PlaybackState, PlaybackStatus, Progress, ReplayTimeline,
    ViewLayout,
};
