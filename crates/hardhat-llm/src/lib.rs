pub mod mock;
pub mod ollama;
pub mod reliable;

pub use mock::{MockClassifier, MockResponse};
pub use ollama::{OllamaClassifier, OllamaConfig};
pub use reliable::{ReliableClassifier, ReliableConfig};
