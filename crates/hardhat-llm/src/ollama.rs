use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use hardhat_core::{Classifier, ClassifierError, ClassifyOptions};

const GENERATE_PATH: &str = "/api/generate";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Non-streaming classifier backed by a local Ollama server.
pub struct OllamaClassifier {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaClassifier {
    pub fn new(config: OllamaConfig) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ClassifierError::InvalidRequest(format!("http client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", config.host.trim_end_matches('/'), GENERATE_PATH),
            model: config.model,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn build_body<'a>(model: &'a str, prompt: &'a str, options: &ClassifyOptions) -> GenerateRequest<'a> {
    GenerateRequest {
        model,
        prompt,
        stream: false,
        options: GenerateOptions {
            temperature: options.temperature,
            num_predict: options.max_tokens,
        },
    }
}

fn parse_body(raw: &str) -> Result<String, ClassifierError> {
    let parsed: GenerateResponse = serde_json::from_str(raw)
        .map_err(|e| ClassifierError::InvalidResponse(format!("decode: {e}")))?;
    Ok(parsed.response)
}

fn map_transport(e: reqwest::Error) -> ClassifierError {
    if e.is_timeout() {
        ClassifierError::Timeout(CONNECT_TIMEOUT)
    } else {
        ClassifierError::NetworkError(e.to_string())
    }
}

#[async_trait]
impl Classifier for OllamaClassifier {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, prompt, options), fields(model = %self.model))]
    async fn classify(
        &self,
        prompt: &str,
        options: &ClassifyOptions,
    ) -> Result<String, ClassifierError> {
        let body = build_body(&self.model, prompt, options);

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(map_transport)?;

        let status = resp.status();
        let text = resp.text().await.map_err(map_transport)?;
        if !status.is_success() {
            return Err(ClassifierError::from_status(status.as_u16(), text));
        }

        let reply = parse_body(&text)?;
        debug!(chars = reply.len(), "classification received");
        Ok(reply)
    }
}
