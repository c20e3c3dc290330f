//! Analysis modules.
//!
//! This module derives widget metrics from raw bounty data.

pub mod aggregator;

pub use aggregator::*;
