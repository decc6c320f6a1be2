//! # Command-Line Interface
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `merge` | Merge and write `<output>/docker/docker-compose.yml` (or print it with `--stdout`) |
//! | `execute` | Answer one plugin request read from stdin |
//! | `manifest` | Print the plugin manifest |
//!
//! ## Settings
//!
//! `merge` reads `compose-merge.toml` from the working directory (or the
//! file given with `--config`), then applies `COMPOSE_MERGE_*` environment
//! variables and flags on top.
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! `--verbose` (or `-v`) lowers the log filter to `debug`. `RUST_LOG`
//! takes precedence:
//! ```bash
//! RUST_LOG=compose_merge=trace compose-merge merge
//! ```

mod app;
mod execute_cmd;
mod logging;
mod merge_cmd;
mod output;

pub use app::{run, Cli, Commands};
pub use merge_cmd::MergeArgs;
pub use output::{Output, OutputFormat};
