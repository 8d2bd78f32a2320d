//! Forest module - bagged decision tree classifier and its metrics.

mod forest;
mod metrics;
mod tree;

pub use forest::*;
pub use metrics::*;
pub use tree::*;
