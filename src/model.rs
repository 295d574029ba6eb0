// Core types: Record, RunSummary and the error enums
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

pub const TITLE_FIELD: &str = "Title";
pub const IMAGE_URL_FIELD: &str = "image_url";

/// One catalog row. Field order follows the input header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Product title, empty when the column is missing or null.
    pub fn title(&self) -> &str {
        self.fields
            .get(TITLE_FIELD)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Attaches the lookup result. A duplicate `image_url` input column keeps its position.
    pub fn set_image_url(&mut self, url: Option<&str>) {
        self.fields.insert(
            IMAGE_URL_FIELD.to_string(),
            Value::String(url.unwrap_or_default().to_string()),
        );
    }
}

/// Which query produced the image for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Direct,
    Fallback,
    Miss,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub records: usize,
    pub direct_hits: usize,
    pub fallback_hits: usize,
    pub misses: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn start() -> Self {
        let now = Utc::now();
        Self {
            records: 0,
            direct_hits: 0,
            fallback_hits: 0,
            misses: 0,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn record(&mut self, outcome: LookupOutcome) {
        self.records += 1;
        match outcome {
            LookupOutcome::Direct => self.direct_hits += 1,
            LookupOutcome::Fallback => self.fallback_hits += 1,
            LookupOutcome::Miss => self.misses += 1,
        }
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot open input {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("cannot read header of {path}: {source}")]
    Header {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("unreadable row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("cannot create output {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write record: {0}")]
    Write(#[from] std::io::Error),
}

/// Provider call failures. Only `Transport` and `Timeout` are retried.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("unusable payload: {0}")]
    Payload(String),
}

impl LookupError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LookupError::Transport(_) | LookupError::Timeout)
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LookupError::Timeout
        } else {
            LookupError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value: {0}")]
    Invalid(String),
    #[error("bad pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("cannot build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => Record::new(map),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn title_defaults_to_empty() {
        assert_eq!(record(json!({"Price": "3.99"})).title(), "");
        assert_eq!(record(json!({"Title": null})).title(), "");
        assert_eq!(record(json!({"Title": "Milk"})).title(), "Milk");
    }

    #[test]
    fn image_url_is_appended_last() {
        let mut r = record(json!({"Title": "Milk", "Price": "3.99"}));
        r.set_image_url(Some("https://img/1.jpg"));
        let keys: Vec<_> = r.fields.keys().cloned().collect();
        assert_eq!(keys, vec!["Title", "Price", "image_url"]);

        r.set_image_url(None);
        assert_eq!(r.fields["image_url"], json!(""));
    }

    #[test]
    fn only_transport_failures_retry() {
        assert!(LookupError::Timeout.is_retryable());
        assert!(LookupError::Transport("reset".into()).is_retryable());
        assert!(!LookupError::Payload("<html>".into()).is_retryable());
    }

    #[test]
    fn summary_counts_outcomes() {
        let mut s = RunSummary::start();
        s.record(LookupOutcome::Direct);
        s.record(LookupOutcome::Fallback);
        s.record(LookupOutcome::Miss);
        s.record(LookupOutcome::Direct);
        let s = s.finish();
        assert_eq!(s.records, 4);
        assert_eq!(s.direct_hits, 2);
        assert_eq!(s.fallback_hits, 1);
        assert_eq!(s.misses, 1);
        assert!(s.finished_at >= s.started_at);
    }
}
