//! Shared test utilities for codestory integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs with a private work directory
//! - Builders for archives and scripted collaborators

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
