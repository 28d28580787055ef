// Translation pipeline
//
// - ollama: HTTP client for the local generate endpoint
// - prompt: prompt construction and language naming
// - batch: barrier-synchronized batch translation into an SRT file

pub mod batch;
pub mod ollama;
pub mod prompt;

use async_trait::async_trait;

pub use batch::BatchTranslator;
pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;

/// Text generation service used by the batch translator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Generate a response for `prompt`. Failures come back as an
    /// `"Error: ..."` string and never as an error value.
    async fn generate(&self, model: &str, prompt: &str) -> String;
}
