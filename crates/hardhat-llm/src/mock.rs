use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use hardhat_core::{Classifier, ClassifierError, ClassifyOptions};

/// Pre-programmed responses for deterministic testing without a model server.
pub enum MockResponse {
    /// Reply with this text.
    Text(String),
    /// Fail the call.
    Error(ClassifierError),
    /// Wait a duration, then yield the inner response.
    Delay(Duration, Box<MockResponse>),
}

impl MockResponse {
    pub fn text(text: &str) -> Self {
        Self::Text(text.to_string())
    }

    pub fn delayed(delay: Duration, inner: MockResponse) -> Self {
        Self::Delay(delay, Box::new(inner))
    }
}

/// Mock classifier that returns pre-programmed responses in sequence and
/// records every prompt it was given.
pub struct MockClassifier {
    responses: Mutex<VecDeque<MockResponse>>,
    prompts: Mutex<Vec<String>>,
}

impl MockClassifier {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn classify(
        &self,
        prompt: &str,
        _options: &ClassifyOptions,
    ) -> Result<String, ClassifierError> {
        let idx = {
            let mut prompts = self.prompts.lock();
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };

        let Some(mut current) = self.responses.lock().pop_front() else {
            return Err(ClassifierError::InvalidRequest(format!(
                "MockClassifier: no response configured for call {idx}"
            )));
        };

        // Unrolls nested delays iteratively to avoid recursive async.
        loop {
            match current {
                MockResponse::Text(text) => return Ok(text),
                MockResponse::Error(e) => return Err(e),
                MockResponse::Delay(duration, inner) => {
                    tokio::time::sleep(duration).await;
                    current = *inner;
                }
            }
        }
    }
}
