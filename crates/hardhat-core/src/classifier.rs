use async_trait::async_trait;

use crate::errors::ClassifierError;

/// Options controlling a single classification call.
#[derive(Clone, Debug)]
pub struct ClassifyOptions {
    pub temperature: f64,
    pub max_tokens: Option<u32>,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
        }
    }
}

/// The natural-language service behind the router, adjudicator and responder.
/// Plain text in, plain text out.
#[async_trait]
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;

    async fn classify(
        &self,
        prompt: &str,
        options: &ClassifyOptions,
    ) -> Result<String, ClassifierError>;
}
