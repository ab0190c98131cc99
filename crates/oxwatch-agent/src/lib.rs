//! The oxwatch agent: services and the host sampled on a fixed period,
//! with threshold rules evaluated against each entity's history after
//! every cycle.

pub mod config;
pub mod entity;
pub mod scheduler;
