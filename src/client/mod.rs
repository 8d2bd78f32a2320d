//! Remote collaborators: retrying invoker, endpoint client, object storage.

mod endpoint;
mod retry;
mod storage;

pub use endpoint::*;
pub use retry::*;
pub use storage::*;
