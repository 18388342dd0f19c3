//! Typed failures the CLI must tell apart.
//!
//! Everything else travels as `anyhow::Error` with context attached at the
//! I/O boundary. `main` downcasts to [`CoderError`] to pick an exit code.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoderError {
    /// The ignore control file is required before any scan may run.
    #[error("missing ignore file {} (create it before planning)", .path.display())]
    MissingIgnoreFile { path: PathBuf },

    #[error("invalid ignore pattern '{pattern}' on line {line}: {reason}")]
    InvalidIgnorePattern {
        line: usize,
        pattern: String,
        reason: String,
    },

    #[error("workflow '{0}' is not implemented")]
    UnknownWorkflow(String),

    /// A structured model reply never matched its schema.
    #[error(
        "{label}: response failed schema validation after {attempts} attempt(s):\n- {}",
        .errors.join("\n- ")
    )]
    Schema {
        label: String,
        attempts: u32,
        errors: Vec<String>,
    },

    #[error("invalid plan:\n- {}", .0.join("\n- "))]
    InvalidPlan(Vec<String>),
}
