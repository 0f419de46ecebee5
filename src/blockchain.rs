// Thin re-export module: implementation lives under `blockchain/core` split
// into the block data model, the ledger itself and its metrics store.

pub mod core;
pub use core::*;
