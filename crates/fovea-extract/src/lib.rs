//! # fovea-extract
//!
//! The policy-driven extractor: compiles user-declared natural-language
//! category rules into a system prompt, sends the (downscaled) image to a
//! vision-capable completion endpoint under a bounded-concurrency gate, and
//! parses the structured response into an [`fovea_core::ExtractionResult`].
//!
//! The extractor implements no category logic itself; that decision is
//! delegated to the remote capability. Everything coming back is untrusted
//! and re-validated downstream.

pub mod extractor;
pub mod http_backend;
pub mod mock;
pub mod parse;
pub mod preprocess;
pub mod prompt;

pub use extractor::{ExtractorConfig, PolicyExtractor};
pub use http_backend::{HttpVisionBackend, HttpVisionConfig};
pub use mock::MockVisionBackend;
