//! nginx `stub_status` scraper.
//!
//! Expects the page nginx serves for a location with `stub_status on;`:
//!
//! ```text
//! Active connections: 5
//! server accepts handled requests
//!  10 10 20
//! Reading: 1 Writing: 1 Waiting: 3
//! ```
//!
//! Numbers are assigned to [`METRICS`] by position, not by label: the Nth
//! number on the page is the Nth descriptor.

use crate::transport::{HttpFetcher, StatusFetcher};
use crate::{retain_watched, MetricSource, SourceError};
use async_trait::async_trait;
use oxwatch_common::types::{Descriptor, MetricMap};
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, LazyLock};

pub const NAME: &str = "nginx";

pub static METRICS: [Descriptor; 7] = [
    Descriptor::gauge("Active_connections"),
    Descriptor::counter("accepts"),
    Descriptor::counter("handled"),
    Descriptor::counter("requests"),
    Descriptor::gauge("Reading"),
    Descriptor::gauge("Writing"),
    Descriptor::gauge("Waiting"),
];

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("static regex"));

pub struct NginxSource {
    hostname: String,
    port: String,
    endpoint: String,
    watched: BTreeSet<String>,
    fetcher: Arc<dyn StatusFetcher>,
}

impl NginxSource {
    /// Reads `hostname`, `port` and `endpoint`; other keys are ignored.
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self, SourceError> {
        let mut source = Self {
            hostname: "localhost".to_string(),
            port: "80".to_string(),
            endpoint: "/status".to_string(),
            watched: BTreeSet::new(),
            fetcher: Arc::new(HttpFetcher::new(HttpFetcher::DEFAULT_TIMEOUT)?),
        };

        for (key, value) in options {
            match key.as_str() {
                "hostname" => source.hostname = value.clone(),
                "endpoint" => source.endpoint = value.clone(),
                "port" => {
                    value.parse::<u32>().map_err(|e| {
                        SourceError::InvalidConfig(format!("nginx port '{value}': {e}"))
                    })?;
                    source.port = value.clone();
                }
                _ => {}
            }
        }

        Ok(source)
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn StatusFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Extracts every descriptor's value from a status page body.
    pub fn parse(body: &[u8]) -> Result<MetricMap, SourceError> {
        // first char should be 'A'
        if body.first() != Some(&b'A') {
            tracing::warn!(payload = %String::from_utf8_lossy(body), "Unknown nginx status output");
            return Err(SourceError::Parse("unknown nginx status output".into()));
        }

        let text = String::from_utf8_lossy(body);
        let tokens: Vec<&str> = DIGITS.find_iter(&text).map(|m| m.as_str()).collect();
        if tokens.len() != METRICS.len() {
            return Err(SourceError::Parse(format!(
                "expected {} numbers in nginx status output, found {}",
                METRICS.len(),
                tokens.len()
            )));
        }

        let mut values = MetricMap::with_capacity(METRICS.len());
        for (desc, token) in METRICS.iter().zip(tokens) {
            let value: i64 = token
                .parse()
                .map_err(|e| SourceError::Parse(format!("{}: {e}", desc.name)))?;
            values.insert(desc.name.to_string(), value as f64);
        }
        Ok(values)
    }
}

#[async_trait]
impl MetricSource for NginxSource {
    fn name(&self) -> &str {
        NAME
    }

    fn valid_metrics(&self) -> &'static [Descriptor] {
        &METRICS
    }

    fn watch(&mut self, metric: &str) {
        self.watched.insert(metric.to_string());
    }

    async fn capture(&mut self) -> Result<MetricMap, SourceError> {
        let body = self
            .fetcher
            .fetch(&self.hostname, &self.port, &self.endpoint)
            .await?;
        let all = Self::parse(&body)?;
        Ok(retain_watched(NAME, &self.watched, all))
    }
}

pub fn build(options: &HashMap<String, String>) -> Result<Box<dyn MetricSource>, SourceError> {
    Ok(Box::new(NginxSource::from_options(options)?))
}
