use anyhow::{Context, Result, bail};
use common::BatchReplay;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use crate::protocol::{LineDecoder, StreamMessage};

const REPLAY_EXTENSIONS: [&str; 4] = [".ndjson", ".ndjson.gz", ".json", ".json.gz"];

/// Folds a message sequence into a batch document. A missing `end` is
/// tolerated; an `error` message aborts.
pub fn assemble<I>(messages: I) -> Result<BatchReplay>
where
    I: IntoIterator<Item = StreamMessage>,
{
    let mut replay = BatchReplay::default();
    let mut saw_metadata = false;

    for message in messages {
        match message {
            StreamMessage::Metadata(metadata) => {
                replay.metadata = metadata;
                saw_metadata = true;
            }
            StreamMessage::Frame(frame) => replay.frames.push(frame),
            StreamMessage::Event(event) => replay.events.push(event),
            StreamMessage::End => break,
            StreamMessage::Error { message } => bail!("Replay stream reported an error: {}", message),
        }
    }

    if !saw_metadata {
        // Fall back to the frame range so the round can still be scrubbed.
        if let (Some(first), Some(last)) = (replay.frames.first(), replay.frames.last()) {
            replay.metadata.start_tick = first.tick;
            replay.metadata.end_tick = last.tick;
        }
    }
    Ok(replay)
}

pub struct ReplayReader;

impl ReplayReader {
    pub fn is_replay_file(path: &Path) -> bool {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        REPLAY_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
    }

    pub fn load_replay(path: &Path) -> Result<BatchReplay> {
        let file =
            File::open(path).with_context(|| format!("Failed to open replay file: {:?}", path))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        let mut reader: Box<dyn Read> = if name.ends_with(".gz") {
            Box::new(GzDecoder::new(BufReader::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        let mut content = Vec::new();
        reader
            .read_to_end(&mut content)
            .with_context(|| format!("Failed to read replay file: {:?}", path))?;

        let stem = name.trim_end_matches(".gz");
        if stem.ends_with(".json") {
            serde_json::from_slice(&content)
                .with_context(|| format!("Failed to parse replay document: {:?}", path))
        } else {
            Self::parse_ndjson(&content)
                .with_context(|| format!("Failed to parse replay stream: {:?}", path))
        }
    }

    pub fn parse_ndjson(content: &[u8]) -> Result<BatchReplay> {
        let mut decoder = LineDecoder::new();
        let mut messages = decoder.push(content);
        messages.extend(decoder.finish());
        if decoder.skipped() > 0 {
            debug!("Skipped {} malformed lines", decoder.skipped());
        }
        assemble(messages)
    }

    pub fn list_replays(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut replays = Vec::new();

        fn find_replay_files(dir: &Path, replays: &mut Vec<PathBuf>) -> Result<()> {
            for entry in fs::read_dir(dir)? {
                let entry = entry?;
                let path = entry.path();

                if path.is_dir() {
                    // Demos are often grouped one directory per match
                    find_replay_files(&path, replays).ok();
                } else if ReplayReader::is_replay_file(&path) {
                    replays.push(path);
                }
            }
            Ok(())
        }

        find_replay_files(dir, &mut replays)?;

        // Newest first
        replays.sort_by(|a, b| {
            let a_time = a
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            let b_time = b
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            b_time.cmp(&a_time)
        });

        Ok(replays)
    }
}
