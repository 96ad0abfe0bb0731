//! Job persistence for Pipewright.
//!
//! One durable record per job, written synchronously after every status
//! transition and reloaded into memory at manager startup.

#![warn(missing_docs)]

mod json_store;
mod memory;
mod trait_;

pub use json_store::JsonFileStore;
pub use memory::MemoryStore;
pub use trait_::{JobStore, Result, StoreError};
