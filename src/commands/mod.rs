//! Command implementations
//!
//! Each module corresponds to one or more subcommands in the CLI.

pub mod build_index;
pub mod query;

// Re-export commonly used items
pub use build_index::{build_index, run as build_index_run, DEFAULT_BATCH_SIZE};
pub use query::{ask, context, describe, load_data, load_pipeline, retrieve};
