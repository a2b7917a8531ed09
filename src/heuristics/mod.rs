//! Pure text heuristics
//!
//! Query classification drives pattern and model selection; the quality
//! heuristic drives cascade escalation. Both are deterministic and total.

pub mod classifier;
pub mod quality;

pub use classifier::{
    QueryClass, QueryProfile, is_complex, is_creative, is_simple, is_technical,
};
pub use quality::{QualityIssue, diagnose, looks_low_confidence};
