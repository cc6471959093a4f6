//! Core domain types
//!
//! This module contains the core domain structures used across Delivery crates.
//! Values are validated when they are constructed, so anything holding a
//! `Step` or `Pipeline` can rely on its invariants.

pub mod pipeline;
pub mod run;
