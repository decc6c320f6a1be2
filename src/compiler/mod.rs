//! # Compiler
//!
//! Turns a base compose file plus per-project compose files into one
//! merged compose file.
//!
//! ```text
//! base.yml ──────────────────────────────────┐
//! api/docker-compose.yml ──(inject context)──┤
//! web/docker-compose.yml ──(inject context)──┤ combine, in order
//!                                            │
//!                                            v
//!                     <output>/docker/docker-compose.yml
//! ```
//!
//! A project whose file can't be read or parsed is skipped and reported;
//! only a bad base file or a failed write stops the run.

mod inject;
mod pipeline;

pub use inject::{inject_build_context, InjectError};
pub use pipeline::{BuildReport, Compilation, CompileError, Compiler, SkippedProject};
