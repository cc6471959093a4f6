//! Data Transfer Objects
//!
//! Request and response bodies exchanged over the HTTP API. DTOs are
//! lightweight shapes optimized for the wire; the domain types they produce
//! live in [`crate::domain`].

pub mod pipeline;
pub mod run;
