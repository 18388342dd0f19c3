//! Stable exit codes for the `coder` CLI.

/// Every requested phase completed.
pub const OK: i32 = 0;
/// Any failure other than the ones below (missing ignore file, transport,
/// schema, persistence).
pub const FAILED: i32 = 1;
/// Argument parsing failed (reported by clap).
pub const USAGE: i32 = 2;
/// The `--agent` selector names no known workflow.
pub const UNKNOWN_WORKFLOW: i32 = 3;
