// Thin re-export module: implementation is in `blockchain/core.rs`, split into
// block structure, stored-chain metadata and block verification.

pub mod core;
pub use core::*;
