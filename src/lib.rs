//! Triproute - multi-model orchestration for a travel-planning assistant
//!
//! Decides, per request, which LLM backends to call (router, cascade or
//! ensemble), in what order, and how to degrade when a model errors or
//! returns a low-confidence answer.

pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod handlers;
pub mod heuristics;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod orchestration;
pub mod telemetry;
