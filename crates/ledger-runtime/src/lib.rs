//! # Ledger Runtime Library
//!
//! Exposes the container, configuration and session-script runner of the
//! ledger runtime for testing. The entry point is the `main.rs` binary.

#![allow(clippy::module_name_repetitions)]

pub mod container;
pub mod script;

pub use container::{ConfigError, LedgerContainer, RuntimeConfig};
pub use script::{run_script, seed_chain, Script, ScriptError, Step, StepReport};
