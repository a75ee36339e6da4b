//! # fovea-classify
//!
//! The local pre-filter: a cheap, deterministic, explainable heuristic over
//! on-device OCR output that screens photos before the expensive extraction
//! call. In curated-album mode its verdict is a hint; in whole-library mode
//! it is a hard gate.

pub mod keywords;
pub mod prefilter;

pub use prefilter::{PreFilter, PreFilterConfig};
