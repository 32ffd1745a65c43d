//! Core domain types and logic.

pub mod ohlcv;
pub mod signal;
pub mod indicator;
pub mod regime;
pub mod strategy;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod backtest;
pub mod metrics;
pub mod comparison;
pub mod config_validation;
pub mod error;
