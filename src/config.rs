use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, SubtransError};

/// Default prompt; `{language}` and `{text}` are substituted per subtitle
pub const DEFAULT_PROMPT_TEMPLATE: &str = "Give me only the {language} translation: '{text}'";

fn default_prompt_template() -> String {
    DEFAULT_PROMPT_TEMPLATE.to_string()
}

fn default_output_suffix() -> String {
    "_translated".to_string()
}

fn default_request_timeout_secs() -> Option<u64> {
    Some(300)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub translate: TranslateConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Ollama endpoint URL
    pub endpoint: String,
    /// LLM model to use for translation
    pub model: String,
    /// Number of requests in flight between two batch barriers
    pub batch_size: usize,
    /// Target language, either a code ("ro") or a full name ("Romanian")
    pub target_language: String,
    /// Prompt sent for every subtitle
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
    /// Appended to the input file stem to name the translated file
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
    /// Per-request timeout in seconds, 0 disables it. A timed out request
    /// becomes an error marker.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to mkvextract binary
    pub mkvextract_path: String,
    /// Path to mkvmerge binary
    pub mkvmerge_path: String,
    /// Track id holding the subtitles inside the source containers
    pub subtitle_track_id: u32,
    /// Directory receiving extracted SRT files
    pub extract_output_dir: String,
    /// Language tag written on merged subtitle tracks
    pub subtitle_language: String,
    /// Character set of the merged SRT files
    pub subtitle_charset: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            translate: TranslateConfig {
                endpoint: "http://localhost:11434".to_string(),
                model: "gemma3:12b".to_string(),
                batch_size: 10,
                target_language: "ro".to_string(),
                prompt_template: default_prompt_template(),
                output_suffix: default_output_suffix(),
                request_timeout_secs: default_request_timeout_secs(),
            },
            media: MediaConfig {
                mkvextract_path: "mkvextract".to_string(),
                mkvmerge_path: "mkvmerge".to_string(),
                subtitle_track_id: 2,
                extract_output_dir: "extracted_srts".to_string(),
                subtitle_language: "ro".to_string(),
                subtitle_charset: "UTF-8".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubtransError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| SubtransError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubtransError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubtransError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.translate.batch_size == 0 {
            return Err(SubtransError::Config("batch_size must be at least 1".to_string()));
        }
        if self.translate.model.trim().is_empty() {
            return Err(SubtransError::Config("model must not be empty".to_string()));
        }
        if self.translate.endpoint.trim().is_empty() {
            return Err(SubtransError::Config("endpoint must not be empty".to_string()));
        }
        Ok(())
    }
}
