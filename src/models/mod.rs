//! Model handles, the registry and model callers
//!
//! Handles describe configured backends; callers invoke them. The
//! orchestration patterns receive both explicitly rather than reaching for
//! process-wide clients.

pub mod client;
pub mod handle;
pub mod registry;

pub use client::{HttpModelCaller, ModelCaller};
pub use handle::{ModelHandle, ModelRole};
pub use registry::ModelRegistry;
