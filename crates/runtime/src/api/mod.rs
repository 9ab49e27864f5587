//! Public runtime API surface.
//!
//! This module gathers the error types exposed to consumers of the runtime
//! crate so other layers can stay focused on orchestration and workers.

pub mod errors;

pub use errors::{ConnectError, Result, RuntimeError};
