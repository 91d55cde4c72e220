//! Consolidated test modules.
//!
//! End-to-end reap scenarios plus the shared in-memory catalog fake used
//! by the per-module unit tests.

#[cfg(test)]
pub mod support;
