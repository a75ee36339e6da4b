//! Scripted mock vision backend for tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use fovea_core::{Error, Result, VisionBackend};

/// A vision backend that replays scripted responses in order.
///
/// Running out of scripted responses is an error, so tests notice
/// unexpected extra calls.
pub struct MockVisionBackend {
    responses: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
    healthy: bool,
}

impl MockVisionBackend {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            healthy: true,
        }
    }

    /// A backend whose health check reports unavailable.
    pub fn unhealthy() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            healthy: false,
        }
    }

    /// Number of `complete` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionBackend for MockVisionBackend {
    async fn complete(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _image_base64: &str,
        _media_type: &str,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self
            .responses
            .lock()
            .map_err(|_| Error::Internal("mock lock poisoned".to_string()))?;
        responses
            .pop_front()
            .ok_or_else(|| Error::Request("mock backend exhausted".to_string()))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.healthy)
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
