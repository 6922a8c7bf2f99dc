//! Command-line presentation layer for the SKU registry.
//!
//! The backend (local SQLite file or the HTTP API) is chosen once, when the
//! store is opened; every command then talks to a `SkuStore`.

pub mod args;
pub mod commands;
pub mod output;

pub use args::{Cli, Command, StoreMode};
pub use commands::run;
