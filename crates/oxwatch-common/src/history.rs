//! Bounded per-entity metric history.
//!
//! Every metric key owns a fixed ring of slots indexed by
//! `cycle % slots`. Writing never grows a ring; the oldest slot is
//! overwritten. A cycle's values are staged in a [`CycleBatch`] and become
//! visible together through [`History::commit`], so readers never observe
//! half of a cycle.

use crate::types::MetricKey;
use crate::SLOTS;
use std::collections::HashMap;

struct Series {
    values: Box<[f64]>,
    /// Cycle index each slot was last written in.
    written: Box<[Option<u64>]>,
}

impl Series {
    fn new(slots: usize) -> Self {
        Self {
            values: vec![0.0; slots].into_boxed_slice(),
            written: vec![None; slots].into_boxed_slice(),
        }
    }

    fn write(&mut self, cycle: u64, value: f64) {
        let idx = (cycle % self.values.len() as u64) as usize;
        self.values[idx] = value;
        self.written[idx] = Some(cycle);
    }

    fn read(&self, cycle: u64) -> Option<f64> {
        let idx = (cycle % self.values.len() as u64) as usize;
        match self.written[idx] {
            Some(c) if c == cycle => Some(self.values[idx]),
            _ => None,
        }
    }
}

/// Values captured during one cycle, not yet visible to readers.
#[derive(Debug, Default, Clone)]
pub struct CycleBatch {
    values: Vec<(MetricKey, f64)>,
}

impl CycleBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: MetricKey, value: f64) {
        self.values.push((key, value));
    }

    /// Records every `(name, value)` pair under `family`.
    pub fn record_all<'a, I>(&mut self, family: &str, values: I)
    where
        I: IntoIterator<Item = (&'a String, &'a f64)>,
    {
        for (name, value) in values {
            self.record(MetricKey::new(family, name.as_str()), *value);
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub struct History {
    slots: usize,
    /// Number of committed cycles.
    cycles: u64,
    series: HashMap<MetricKey, Series>,
}

impl History {
    /// Creates a store with `slots` samples per metric (at least one).
    pub fn new(slots: usize) -> Self {
        Self {
            slots: slots.max(1),
            cycles: 0,
            series: HashMap::new(),
        }
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Number of cycles committed since creation.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Index of the most recently committed cycle.
    pub fn current_cycle(&self) -> Option<u64> {
        self.cycles.checked_sub(1)
    }

    /// Writes every value in `batch` under a new cycle index and returns it.
    ///
    /// Metrics absent from the batch get no slot for this cycle.
    pub fn commit(&mut self, batch: CycleBatch) -> u64 {
        let cycle = self.cycles;
        let slots = self.slots;
        for (key, value) in batch.values {
            self.series
                .entry(key)
                .or_insert_with(|| Series::new(slots))
                .write(cycle, value);
        }
        self.cycles += 1;
        cycle
    }

    /// Value written for `key` in the latest committed cycle, if any.
    pub fn latest(&self, key: &MetricKey) -> Option<f64> {
        let cycle = self.current_cycle()?;
        self.series.get(key)?.read(cycle)
    }

    /// Values for `key` over the last `k` cycles, oldest first.
    ///
    /// `k` is clamped to the slot count; cycles without a sample are skipped.
    pub fn recent(&self, key: &MetricKey, k: usize) -> Vec<f64> {
        let Some(series) = self.series.get(key) else {
            return Vec::new();
        };
        let k = k.min(self.slots) as u64;
        let first = self.cycles.saturating_sub(k);
        (first..self.cycles).filter_map(|c| series.read(c)).collect()
    }

    /// Number of distinct cycles still held for `key`.
    pub fn cycles_recorded(&self, key: &MetricKey) -> usize {
        self.recent(key, self.slots).len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &MetricKey> {
        self.series.keys()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(SLOTS)
    }
}
