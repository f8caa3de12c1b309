//! Property-based tests for addressing and merge guarantees

mod determinism;
mod merge_resolution;
