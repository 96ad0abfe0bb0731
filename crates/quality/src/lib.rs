//! Data quality engine.
//!
//! Scores a record sequence against six quality dimensions, detects
//! statistical and pattern anomalies, and generates recommendations.
//! Independent of the ETL stages: it consumes any record sequence.

#![warn(missing_docs)]

mod anomaly;
mod checker;
mod config;
mod recommend;

pub use checker::QualityChecker;
pub use config::CheckerConfig;
