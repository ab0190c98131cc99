//! Metric sources for the oxwatch agent.
//!
//! A [`MetricSource`] is built from string-keyed options through the
//! [`registry::SourceRegistry`], told which metrics to [`watch`], and
//! captured once per sampling cycle. Built-in sources are the nginx
//! status page scraper and the host-wide `cpu`, `memory` and `load`
//! sources.
//!
//! [`watch`]: MetricSource::watch

pub mod error;
pub mod registry;
pub mod sources;
pub mod transport;

#[cfg(test)]
mod tests;

pub use error::SourceError;

use async_trait::async_trait;
use oxwatch_common::types::{Descriptor, MetricMap};
use std::collections::BTreeSet;

/// A pluggable metric-collecting backend.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Stable identifier of the backend type (e.g. `"nginx"`), also used
    /// as the metric family of everything it captures.
    fn name(&self) -> &str;

    /// Every metric this backend can ever produce.
    fn valid_metrics(&self) -> &'static [Descriptor];

    /// Registers interest in `metric`.
    ///
    /// Names outside [`valid_metrics`](Self::valid_metrics) are accepted
    /// here and diagnosed at capture time.
    fn watch(&mut self, metric: &str);

    /// One-time setup before the first capture. Must be idempotent.
    async fn prepare(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    /// Returns the freshest value of every watched metric the backend
    /// could determine this cycle. Unresolvable metrics are omitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload could not be fetched or parsed.
    async fn capture(&mut self) -> Result<MetricMap, SourceError>;
}

/// Watched names with no entry in `found`.
pub fn missing_watched<'a>(watched: &'a BTreeSet<String>, found: &MetricMap) -> Vec<&'a str> {
    watched
        .iter()
        .filter(|name| !found.contains_key(*name))
        .map(String::as_str)
        .collect()
}

/// Keeps only the watched entries of `all` and logs every watched name
/// that was not found.
pub(crate) fn retain_watched(source: &str, watched: &BTreeSet<String>, mut all: MetricMap) -> MetricMap {
    for name in missing_watched(watched, &all) {
        tracing::info!(
            source,
            metric = %name,
            "Could not find metric {source}({name}), did you spell it right?"
        );
    }
    all.retain(|name, _| watched.contains(name));
    all
}
