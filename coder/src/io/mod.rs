//! I/O helpers: workspace files, configuration, prompts and the model transport.

pub mod config;
pub mod dependencies;
pub mod layout;
pub mod llm;
pub mod persist;
pub mod prompt;
pub mod scanner;
pub mod schema;
pub mod store;
