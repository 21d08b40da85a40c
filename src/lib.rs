//! HashLedger - a minimal append-only ledger sealed by proof-of-work
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, the chain, the pending-entry buffer and validation
//! - [`hasher`] - Canonical serialization and SHA-256 digests
//!
//! ## Consensus & Mining
//! - [`miner`] - Proof-of-work puzzle and cancellable searches
//!
//! ## Integration
//! - [`node`] - Thread-safe handle used by front ends
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod hasher;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod miner;

// ============================================================================
// Integration
// ============================================================================
pub mod node;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use blockchain::{Block, Ledger};
pub use error::{LedgerError, Result};
pub use node::LedgerNode;
