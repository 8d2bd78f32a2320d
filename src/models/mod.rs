//! Core data models for flexion: configuration, errors, raw dataset.

mod config;
mod dataset;
mod error;

pub use config::*;
pub use dataset::*;
pub use error::*;
