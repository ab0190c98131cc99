use crate::registry::SourceRegistry;
use crate::sources::load::LoadSource;
use crate::sources::nginx::{NginxSource, METRICS};
use crate::transport::{HttpFetcher, StatusFetcher};
use crate::{missing_watched, MetricSource, SourceError};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const STATUS_PAGE: &str = "Active connections: 5 \nserver accepts handled requests\n 10 10 20 \nReading: 1 Writing: 1 Waiting: 3";

struct StaticFetcher {
    body: Result<Vec<u8>, String>,
    calls: Mutex<Vec<String>>,
}

impl StaticFetcher {
    fn ok(body: &str) -> Arc<Self> {
        Arc::new(Self {
            body: Ok(body.as_bytes().to_vec()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing(msg: &str) -> Arc<Self> {
        Arc::new(Self {
            body: Err(msg.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl StatusFetcher for StaticFetcher {
    async fn fetch(&self, host: &str, port: &str, path: &str) -> Result<Vec<u8>, SourceError> {
        self.calls.lock().unwrap().push(format!("{host}:{port}{path}"));
        self.body.clone().map_err(SourceError::Transport)
    }
}

fn nginx_with(fetcher: Arc<StaticFetcher>, watch: &[&str]) -> NginxSource {
    let mut source = NginxSource::from_options(&HashMap::new())
        .unwrap()
        .with_fetcher(fetcher);
    for name in watch {
        source.watch(name);
    }
    source
}

#[test]
fn nginx_parse_maps_numbers_by_position() {
    let values = NginxSource::parse(STATUS_PAGE.as_bytes()).unwrap();
    let extracted: Vec<f64> = METRICS.iter().map(|d| values[d.name]).collect();
    assert_eq!(extracted, vec![5.0, 10.0, 10.0, 20.0, 1.0, 1.0, 3.0]);
}

#[test]
fn nginx_parse_rejects_missing_marker() {
    let err = NginxSource::parse(b"<html>502 Bad Gateway</html>").unwrap_err();
    assert!(matches!(err, SourceError::Parse(_)));

    let err = NginxSource::parse(b"").unwrap_err();
    assert!(matches!(err, SourceError::Parse(_)));
}

#[test]
fn nginx_parse_rejects_wrong_number_count() {
    let six = "Active connections: 5 \nserver accepts handled requests\n 10 10 20 \nReading: 1 Writing: 1";
    assert!(matches!(
        NginxSource::parse(six.as_bytes()),
        Err(SourceError::Parse(_))
    ));

    let eight = format!("{STATUS_PAGE} Extra: 9");
    assert!(matches!(
        NginxSource::parse(eight.as_bytes()),
        Err(SourceError::Parse(_))
    ));
}

#[tokio::test]
async fn nginx_capture_returns_only_watched_metrics() {
    let fetcher = StaticFetcher::ok(STATUS_PAGE);
    let mut source = nginx_with(fetcher.clone(), &["requests", "Waiting"]);

    let values = source.capture().await.unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values["requests"], 20.0);
    assert_eq!(values["Waiting"], 3.0);
    assert_eq!(fetcher.calls.lock().unwrap()[0], "localhost:80/status");
}

#[tokio::test]
async fn nginx_unknown_metric_is_diagnosed_not_fatal() {
    let mut source = nginx_with(StaticFetcher::ok(STATUS_PAGE), &["requets", "accepts"]);

    let values = source.capture().await.unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(values["accepts"], 10.0);
    assert!(!values.contains_key("requets"));

    let parsed = NginxSource::parse(STATUS_PAGE.as_bytes()).unwrap();
    let watched = BTreeSet::from(["requets".to_string(), "accepts".to_string()]);
    assert_eq!(missing_watched(&watched, &parsed), vec!["requets"]);
}

#[tokio::test]
async fn nginx_transport_failure_is_capture_error() {
    let mut source = nginx_with(StaticFetcher::failing("connection refused"), &["requests"]);
    let err = source.capture().await.unwrap_err();
    assert!(matches!(err, SourceError::Transport(_)));
}

#[tokio::test]
async fn nginx_capture_with_wrong_count_fails() {
    let mut source = nginx_with(StaticFetcher::ok("Active connections: 5"), &["Active_connections"]);
    assert!(matches!(source.capture().await, Err(SourceError::Parse(_))));
}

#[test]
fn nginx_options() {
    let options = HashMap::from([
        ("hostname".to_string(), "10.0.0.7".to_string()),
        ("port".to_string(), "8080".to_string()),
        ("endpoint".to_string(), "/nginx_status".to_string()),
        ("colour".to_string(), "blue".to_string()),
    ]);
    let source = NginxSource::from_options(&options).unwrap();
    assert_eq!(source.hostname(), "10.0.0.7");
    assert_eq!(source.port(), "8080");
    assert_eq!(source.endpoint(), "/nginx_status");
}

#[test]
fn nginx_rejects_bad_port() {
    let options = HashMap::from([("port".to_string(), "eighty".to_string())]);
    assert!(matches!(
        NginxSource::from_options(&options),
        Err(SourceError::InvalidConfig(_))
    ));

    let options = HashMap::from([("port".to_string(), "-1".to_string())]);
    assert!(NginxSource::from_options(&options).is_err());
}

#[test]
fn registry_builds_known_sources() {
    let registry = SourceRegistry::default();
    let source = registry.build("nginx", &HashMap::new()).unwrap();
    assert_eq!(source.name(), "nginx");
    assert_eq!(source.valid_metrics().len(), 7);

    let mut names = registry.source_names();
    names.sort();
    assert_eq!(names, vec!["cpu", "load", "memory", "nginx"]);
}

#[test]
fn registry_rejects_unknown_source() {
    let registry = SourceRegistry::default();
    assert!(matches!(
        registry.build("memcached", &HashMap::new()),
        Err(SourceError::UnknownSource(name)) if name == "memcached"
    ));
    assert!(registry.valid_metrics("memcached").is_none());
}

#[tokio::test]
async fn load_source_reports_watched_averages() {
    let mut source = LoadSource::new();
    source.watch("5");
    source.prepare().await.unwrap();
    let values = source.capture().await.unwrap();
    assert_eq!(values.len(), 1);
    assert!(values["5"] >= 0.0);
}

#[tokio::test]
async fn http_fetcher_reports_unreachable_endpoint() {
    let fetcher = HttpFetcher::new(Duration::from_millis(500)).unwrap();
    let err = fetcher.fetch("127.0.0.1", "1", "/status").await.unwrap_err();
    assert!(matches!(err, SourceError::Http(_)));
}
