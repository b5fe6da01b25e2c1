//! Core domain types and logic.

pub mod price_series;
pub mod sector;
pub mod event;
pub mod resolver;
pub mod sampler;
pub mod baseline;
pub mod deviation;
pub mod grader;
pub mod engine;
pub mod summary;
pub mod config_validation;
pub mod error;
