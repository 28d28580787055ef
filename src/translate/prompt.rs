use crate::config::TranslateConfig;

/// Builds the per-subtitle translation prompt
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: String,
    language: String,
}

impl PromptBuilder {
    pub fn new<T: Into<String>>(template: T, target_language: &str) -> Self {
        Self {
            template: template.into(),
            language: language_code_to_name(target_language),
        }
    }

    pub fn from_config(config: &TranslateConfig) -> Self {
        Self::new(config.prompt_template.clone(), &config.target_language)
    }

    /// Full language name used in prompts
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn build(&self, text: &str) -> String {
        self.template
            .replace("{language}", &self.language)
            .replace("{text}", text)
    }
}

/// Convert language code to full language name for clearer prompts
pub fn language_code_to_name(code: &str) -> String {
    let name = match code.trim().to_lowercase().as_str() {
        "ro" => "Romanian",
        "en" => "English",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        "fr" => "French",
        "de" => "German",
        "es" => "Spanish",
        "ru" => "Russian",
        "it" => "Italian",
        "pt" => "Portuguese",
        "pl" => "Polish",
        "nl" => "Dutch",
        "tr" => "Turkish",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "th" => "Thai",
        "vi" => "Vietnamese",
        "sv" => "Swedish",
        "da" => "Danish",
        "no" => "Norwegian",
        "fi" => "Finnish",
        "he" => "Hebrew",
        "hu" => "Hungarian",
        "cs" => "Czech",
        "sk" => "Slovak",
        "bg" => "Bulgarian",
        "hr" => "Croatian",
        "sl" => "Slovenian",
        "el" => "Greek",
        "uk" => "Ukrainian",
        _ => return code.trim().to_string(),
    };
    name.to_string()
}
