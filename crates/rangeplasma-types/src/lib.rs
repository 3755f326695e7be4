//! # rangeplasma-types
//!
//! Shared types, errors, and configuration for the **RangePlasma** settlement
//! core.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`BlockNumber`], [`HostHeight`], [`ExitId`], [`Coord`]
//! - **Transaction model**: [`Transaction`], [`Transfer`], [`Signature`]
//! - **Ledger model**: [`DepositedRange`], [`RangeEntry`]
//! - **Block model**: [`Block`]
//! - **Exit model**: [`Exit`], [`ExitState`], [`ExitOrigin`], [`ExitOutcome`], [`TransferProof`]
//! - **Configuration**: [`PlasmaConfig`]
//! - **Errors**: [`PlasmaError`] with `PL_ERR_` prefix codes
//! - **Constants**: coordinate bounds, wire widths, defaults

pub mod block;
pub mod config;
pub mod constants;
pub mod error;
pub mod exit;
pub mod hex_serde;
pub mod ids;
pub mod range;
pub mod transaction;

// Re-export all primary types at crate root for ergonomic imports:
//   use rangeplasma_types::{Exit, Transfer, PlasmaError, ...};

pub use block::*;
pub use config::*;
pub use error::*;
pub use exit::*;
pub use ids::*;
pub use range::*;
pub use transaction::*;

// Constants are accessed via `rangeplasma_types::constants::FOO`
// (not re-exported to avoid name collisions).
