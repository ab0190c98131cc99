use crate::{retain_watched, MetricSource, SourceError};
use async_trait::async_trait;
use oxwatch_common::types::{Descriptor, MetricMap};
use std::collections::{BTreeSet, HashMap};
use sysinfo::System;

pub const NAME: &str = "load";

pub static METRICS: [Descriptor; 3] = [
    Descriptor::gauge("1"),
    Descriptor::gauge("5"),
    Descriptor::gauge("15"),
];

#[derive(Default)]
pub struct LoadSource {
    watched: BTreeSet<String>,
}

impl LoadSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetricSource for LoadSource {
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
        let load_avg = System::load_average();
        let all = MetricMap::from([
            ("1".to_string(), load_avg.one),
            ("5".to_string(), load_avg.five),
            ("15".to_string(), load_avg.fifteen),
        ]);
        Ok(retain_watched(NAME, &self.watched, all))
    }
}

pub fn build(_options: &HashMap<String, String>) -> Result<Box<dyn MetricSource>, SourceError> {
    Ok(Box::new(LoadSource::new()))
}
