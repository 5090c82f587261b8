//! Core functionality between the command line and the engine
//!
//! Contains argument validation, inventory host matching, the per-mode
//! adapters and interrupt handling.

pub mod adapter;
pub mod cancel;
pub mod inventory;
pub mod validate;

pub use adapter::{AdHocAdapter, PlaybookAdapter, RunnerAdapter, adapter_for};
pub use cancel::{CancellationHandler, RunnerHandle};
pub use inventory::Inventory;
pub use validate::{ValidatedConfig, validate};
