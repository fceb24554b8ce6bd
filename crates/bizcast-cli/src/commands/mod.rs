//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `ask` - Question commands (interactive chat, one-shot ask)
//! - `core` - Shared utilities (config loading, assistant wiring, formatting)
//! - `inspect` - Inspection commands (features, check)

pub mod ask;
pub mod core;
pub mod inspect;

// Re-export command functions for main.rs
pub use ask::*;
pub use core::*;
pub use inspect::*;
