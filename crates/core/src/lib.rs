//! Domain types shared by every modelmart crate.
//!
//! Holds the error taxonomy, the run status state machine, the pure
//! terminal-state reconciliation rule, and deployment naming helpers.
//! This crate has no I/O and no framework dependencies.

pub mod error;
pub mod naming;
pub mod reconcile;
pub mod status;
pub mod types;
