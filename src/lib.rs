//! modelforge library crate — re-exports for integration tests.
//!
//! The primary interface is the `modelforge` binary. This lib.rs exposes the
//! internal modules so integration tests can exercise the parser, merge
//! engine, scheduler, and batch orchestration directly without going through
//! the CLI.

pub mod backup;
pub mod batch;
pub mod config;
pub mod emit;
pub mod entity;
pub mod error;
pub mod merge;
pub mod model;
pub mod parse;
pub mod report;
pub mod schedule;
pub mod telemetry;
