//! # Docsafe CLI
//!
//! The binary is intentionally thin: the CLI lives in `src/cli/`, while this file only
//! invokes `cli::run()` and handles process termination.
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/docsafe/src/cli/)                        │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Id prefix resolution + dispatch (handlers.rs)            │
//! │  - Terminal and JSON rendering (render.rs)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Library (crates/docsafeapp)                                │
//! │  - RecordManager: validation, stage-then-commit, delete     │
//! │  - Stores, consistency guard, configuration                 │
//! │  - No knowledge of stdout/stderr or process exits           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything in `docsafeapp` is UI agnostic. The CLI owns argument parsing, logging
//! setup, rendering, and exit codes.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
