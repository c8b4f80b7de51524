//! # CLI Layer
//!
//! The only place that knows about argv, stdout and exit codes. Everything
//! below it is `noteviewapp`.
//!
//! - [`setup`]: clap definitions and version string
//! - [`commands`]: context setup and dispatch
//! - [`render`]: terminal formatting

mod commands;
mod render;
mod setup;

pub use commands::run;
