//! Domain model for hardware asset records.
//!
//! # Responsibility
//! - Define the item record, its create/patch payloads and validation.
//! - Define audit entries, archived records and reference catalog rows.
//!
//! # Invariants
//! - Items are identified by a store-assigned integer id that is never reused.
//! - Asset tags derive from type code and per-type serial.

pub mod archive;
pub mod audit;
pub mod catalog;
pub mod item;
