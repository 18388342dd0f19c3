//! Deterministic, pure logic shared by the planner and executor.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! documents and return deterministic outputs suitable for tests.

pub mod extract;
pub mod ignore;
pub mod path;
pub mod plan;
pub mod registry;
pub mod types;
