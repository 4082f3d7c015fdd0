//! # Command-Line Interface
//!
//! User-facing commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `build` | Write the single-header artifact |
//! | `order` | Print the resolved fragment order |
//! | `deps` | Print local dependencies and external includes per fragment |
//! | `harness` | Run a typed test suite and write reference outputs |
//!
//! Fragments come from positional arguments or from `amalgam.toml`:
//! ```bash
//! amalgam build Value.hpp Activation.hpp --base-dir include -o microgradpp.h
//! amalgam build            # uses the nearest amalgam.toml
//! ```
//!
//! ## Output Formats
//!
//! All commands support `--format text|json`. Diagnostics go to stderr;
//! `--verbose` (or `RUST_LOG`) turns on debug logging.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod build;
mod harness_cmd;
mod logging;
mod output;

pub use app::{run, Cli, Commands};
pub use build::FragmentArgs;
pub use output::{Output, OutputFormat};
