//! Async runtime management
//!
//! Tokio runtime hosting the parallel loader workers.

pub mod executor;

pub use executor::{LoaderRuntime, RuntimeConfig};
