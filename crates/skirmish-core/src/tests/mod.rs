//! Crate-level test module.
//!
//! - **Determinism tests**: same seed gives the same log, byte for byte
//! - **Integration tests**: full runs of the built-in scenarios
//! - **Helper functions**: scenario factories and a single-phase harness
//!
//! # Test Structure
//!
//! - `determinism.rs`: replay and property tests
//! - `integration.rs`: end-to-end runs through the public API
//! - `helpers.rs`: test setup utilities, also used by the resolver unit tests

mod determinism;
pub(crate) mod helpers;
mod integration;
