//! Shared types for the oxwatch agent.
//!
//! Holds the sampling cycle constants, process and metric identity types,
//! and the bounded per-entity [`history::History`] store that every other
//! crate reads from or writes to.

pub mod history;
pub mod types;


/// Default sampling period, in seconds.
pub const CYCLE_TIME: u64 = 15;

/// Length of the rolling history window, in seconds.
pub const ONE_HOUR: u64 = 3600;

/// Number of history slots kept per metric at the default cycle period.
pub const SLOTS: usize = (ONE_HOUR / CYCLE_TIME) as usize;

/// Slots needed to cover one hour at the given cycle period.
///
/// # Examples
///
/// ```
/// use oxwatch_common::{slots_for, SLOTS};
///
/// assert_eq!(slots_for(15), SLOTS);
/// assert_eq!(slots_for(60), 60);
/// assert_eq!(slots_for(0), SLOTS);
/// ```
pub fn slots_for(cycle_secs: u64) -> usize {
    if cycle_secs == 0 {
        return SLOTS;
    }
    ((ONE_HOUR / cycle_secs) as usize).max(1)
}
