// Thin re-export module: implementation lives in `blockchain/core.rs`, split
// into chain management, pending state and validation.

pub mod core;
pub use core::*;
