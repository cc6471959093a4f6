//! Delivery Core
//!
//! Core types and abstractions for the Delivery CI/CD control plane.
//!
//! This crate contains:
//! - Domain types: Core business entities (Pipeline, Step, Run)
//! - DTOs: Request/response shapes shared by the orchestrator, client and CLI
//! - Validation errors raised while constructing domain values

pub mod domain;
pub mod dto;
pub mod error;
