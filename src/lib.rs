//! ledger-fixtures - Synthetic transaction and block fixtures for ledger tests
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Fixtures
//! - [`fixtures`] - Fake keys, spend graphs, round trips and chain extension
//!
//! ## Core Ledger
//! - [`blockchain`] - Block structure, stored-chain records and block checks
//! - [`transaction`] - Transaction types, scripts and structural checks
//!
//! ## Consensus
//! - [`miner`] - Proof-of-work solving
//!
//! ## Cryptography
//! - [`crypto`] - Hashing, keys and addresses (secp256k1)
//!
//! ## State Management
//! - [`persistence`] - Chain stores (in-memory and SQLite)
//!
//! ## Configuration & Utilities
//! - [`config`] - Network parameters
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Fixtures
// ============================================================================
pub mod fixtures;

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod miner;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// State Management
// ============================================================================
pub mod persistence;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
