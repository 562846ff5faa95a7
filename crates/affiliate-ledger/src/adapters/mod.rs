//! # Adapters Layer (Outer Hexagon)
//!
//! Implementations of the outbound ports.
//!
//! | Adapter | Ports |
//! |---------|-------|
//! | `InMemoryChain` | `ChainHost`, `TransferExecutor` |
//! | `InMemoryStateStore` | `StateStore` |
//! | `JsonFileStateStore` | `StateStore` |

pub mod chain;
pub mod store;

pub use chain::*;
pub use store::*;
