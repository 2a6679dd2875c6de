//! Core types shared across the DataTree facilities
//!
//! This crate provides foundational types used by the error handling and
//! logging facilities of `datatree-core`:
//!
//! - **Correlation types**: TransactionId
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::TransactionId;
