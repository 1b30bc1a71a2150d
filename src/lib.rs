//! Chainview - query access to a file-backed append-only ledger
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Ledger Records
//! - [`block`] - Blocks, headers and header schemas
//! - [`transaction`] - Ledger transactions and signatures
//! - [`account`] - Account state records
//!
//! ## Identity Hashing
//! - [`encoding`] - Canonical byte encoding of blocks and transactions
//! - [`hashing`] - Keccak-256 identity hashes
//!
//! ## State Access
//! - [`persistence`] - Ledger sources (JSON files, in-memory)
//! - [`resolver`] - Block, transaction and account queries
//! - [`mempool`] - Pending pool of submitted transactions
//!
//! ## Integration
//! - [`api`] - HTTP routes (feature `api`)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`cli`] - Helpers for the binaries

#![forbid(unsafe_code)]

// ============================================================================
// Ledger Records
// ============================================================================
pub mod account;
pub mod block;
pub mod transaction;

// ============================================================================
// Identity Hashing
// ============================================================================
pub mod encoding;
pub mod hashing;

// ============================================================================
// State Access
// ============================================================================
pub mod mempool;
pub mod persistence;
pub mod resolver;

// ============================================================================
// Integration
// ============================================================================
#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod cli;
pub mod config;
pub mod error;

pub use error::{LedgerError, Result};
