use common::{BatchReplay, DEFAULT_SAMPLE_INTERVAL};
use reqwest::{Client, Response};
use tracing::info;
use url::Url;

use crate::error::{ReplayError, ReplayResult};
use crate::protocol::ChunkSource;

/// Which round of which demo to replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundRequest {
    pub demo_id: String,
    pub round: u32,
    pub sample_interval: u32,
}

impl RoundRequest {
    pub fn new(demo_id: impl Into<String>, round: u32) -> Self {
        Self {
            demo_id: demo_id.into(),
            round,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }

    /// Stable id used when loading the round into a timeline.
    pub fn replay_id(&self) -> String {
        format!("{}/round-{}", self.demo_id, self.round)
    }
}

/// HTTP access to the analytics API's replay endpoints.
#[derive(Debug, Clone)]
pub struct ReplayClient {
    http: Client,
    base_url: Url,
}

impl ReplayClient {
    pub fn new(base_url: &str) -> ReplayResult<Self> {
        let base_url = if base_url.contains("://") {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("http://{base_url}"))?
        };
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/api/demos/{id}/rounds/{n}/replay[/stream]?sampleInterval=N`
    pub fn round_url(&self, request: &RoundRequest, streaming: bool) -> ReplayResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ReplayError::config(format!("{} cannot be a base url", self.base_url)))?;
            segments
                .pop_if_empty()
                .extend(["api", "demos", request.demo_id.as_str(), "rounds"])
                .push(&request.round.to_string())
                .push("replay");
            if streaming {
                segments.push("stream");
            }
        }
        url.query_pairs_mut()
            .append_pair("sampleInterval", &request.sample_interval.to_string());
        Ok(url)
    }

    /// Open the line-delimited stream for a round.
    pub async fn open_stream(&self, request: &RoundRequest) -> ReplayResult<HttpChunkSource> {
        let url = self.round_url(request, true)?;
        info!("Opening replay stream {}", url);
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(HttpChunkSource { response })
    }

    /// Fetch the whole round as one JSON document.
    pub async fn fetch_round(&self, request: &RoundRequest) -> ReplayResult<BatchReplay> {
        let url = self.round_url(request, false)?;
        info!("Fetching replay {}", url);
        let replay = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<BatchReplay>()
            .await?;
        Ok(replay)
    }
}

/// Chunked HTTP response body.
pub struct HttpChunkSource {
    response: Response,
}

impl ChunkSource for HttpChunkSource {
    async fn next_chunk(&mut self) -> ReplayResult<Option<Vec<u8>>> {
        let chunk = self.response.chunk().await?;
        Ok(chunk.map(|bytes| bytes.to_vec()))
    }
}
