//! Core domain types and logic.

pub mod ohlcv;
pub mod params;
pub mod indicator;
pub mod signal;
pub mod performance;
pub mod pipeline;
pub mod chart;
pub mod config_validation;
pub mod error;
