// Application layer - the Ledger Engine and its concurrency guard.
// Callers (the CLI here, any other presentation layer elsewhere) go through
// LedgerService; nothing else mutates balances.

pub mod error;
pub mod locks;
pub mod service;

pub use error::*;
pub use locks::*;
pub use service::*;
