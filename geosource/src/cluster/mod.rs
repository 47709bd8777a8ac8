//! Point clustering for clustered sources.

mod cluster_index;
mod options;

pub use cluster_index::*;
pub use options::*;
