use thiserror::Error;

pub type ReplayResult<T> = Result<T, ReplayError>;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("replay stream reported an error: {0}")]
    Stream(String),

    #[error("malformed record on line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown message type `{0}`")]
    UnknownMessage(String),

    #[error("invalid playback config: {0}")]
    Config(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ReplayError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Errors that end a stream, as opposed to a single skipped record.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            ReplayError::Decode { .. } | ReplayError::UnknownMessage(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_are_not_terminal() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!ReplayError::Decode { line: 3, source }.is_terminal());
        assert!(!ReplayError::UnknownMessage("ticks".into()).is_terminal());
        assert!(ReplayError::Stream("boom".into()).is_terminal());
    }

    #[test]
    fn display_prefixes_are_stable() {
        assert!(ReplayError::config("x").to_string().contains("invalid playback config:"));
        assert!(
            ReplayError::UnknownMessage("ticks".into())
                .to_string()
                .contains("`ticks`")
        );
    }
}
