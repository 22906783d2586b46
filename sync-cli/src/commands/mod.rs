//! CLI command implementations.

pub mod run;
pub mod status;
pub mod store;
