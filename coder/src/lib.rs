//! Plan/execute coding-mission runner.
//!
//! A mission drives a language model through two phases against a target
//! workspace: planning (scan, select relevant paths, draft `plan.json`) and
//! execution (generate each step's file, persist it, and merge the
//! definitions it introduces into a registry). The crate is split as:
//!
//! - **[`core`]**: Pure, deterministic logic (plan invariants, ignore rules,
//!   registry merge, reply extraction). No I/O.
//! - **[`io`]**: Side effects (workspace scan, persistence, prompts, the model
//!   transport). Capabilities are traits so tests can script them.
//! - **[`agents`]**: One wrapper per kind of model call.
//!
//! Orchestration modules ([`plan`], [`execute`], [`workflow`]) tie these
//! together for the CLI.

pub mod agents;
pub mod core;
pub mod error;
pub mod execute;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod plan;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod workflow;
