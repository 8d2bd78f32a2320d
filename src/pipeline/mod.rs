//! Pipeline module - staged CSV-to-artifact training flow.

mod preprocess;
mod split;
mod train;
mod validate;

pub use preprocess::*;
pub use split::*;
pub use train::*;
pub use validate::*;
