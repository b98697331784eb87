//! Helpers for fuzzing and sweep tests.
pub mod generator;
