use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ParleyError, Result};

/// Top-level configuration for Parley.
///
/// Loaded from `~/.parley/config.toml` by default. Every section falls back
/// to its defaults when absent, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub reply: ReplyConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl ParleyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParleyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ParleyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Conversation session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Assistant turn seeded at session start and after every clear.
    /// `None` starts sessions with an empty log.
    pub greeting: Option<String>,
    /// Submissions longer than this (in characters, after trimming) are rejected.
    pub max_message_chars: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            greeting: Some(
                "Hello! How can I help you today? Ask me anything and I'll show you how I read your question."
                    .to_string(),
            ),
            max_message_chars: 2000,
        }
    }
}

/// Which reply backend answers user turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyProviderKind {
    /// Deterministic local responder; needs no network or credentials.
    Mock,
    /// Google Gemini `generateContent` endpoint.
    Gemini,
}

impl std::str::FromStr for ReplyProviderKind {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(ReplyProviderKind::Mock),
            "gemini" => Ok(ReplyProviderKind::Gemini),
            other => Err(ParleyError::Config(format!(
                "unknown reply provider '{}': expected 'mock' or 'gemini'",
                other
            ))),
        }
    }
}

/// Reply provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyConfig {
    /// Backend used to produce assistant replies.
    pub provider: ReplyProviderKind,
    /// Base URL of the remote generative API.
    pub base_url: String,
    /// Remote model name.
    pub model: String,
    /// Environment variable holding the API credential. The credential itself
    /// is never stored in the config file.
    pub api_key_env: String,
    /// Request timeout for remote calls, in seconds.
    pub timeout_secs: u64,
    /// Reply text returned by the mock provider.
    pub mock_response: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            provider: ReplyProviderKind::Mock,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 30,
            mock_response: "I understand your question. Let me help you with that. This is a demo response - connect the backend for real responses.".to_string(),
        }
    }
}

/// One keyword rule of the topic classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRuleConfig {
    /// Any of these (case-insensitive substring) selects the rule.
    pub keywords: Vec<String>,
    pub level_1: String,
    pub level_2: String,
}

impl TopicRuleConfig {
    fn new(keywords: &[&str], level_1: &str, level_2: &str) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            level_1: level_1.to_string(),
            level_2: level_2.to_string(),
        }
    }
}

/// Query analysis configuration: reference resolution and topic tagging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Leading tokens of the previous assistant turn quoted by anaphora expansion.
    pub anaphora_token_count: usize,
    /// Substituted when "that"/"it" has no assistant turn to point at.
    pub topic_placeholder: String,
    /// Replaces "him"/"her"/"them".
    pub person_placeholder: String,
    /// Catch-all topic when no rule matches.
    pub fallback_level_1: String,
    pub fallback_level_2: String,
    /// Ordered classifier rules; earlier rules shadow later ones.
    pub topic_rules: Vec<TopicRuleConfig>,
    /// Two-level label hierarchy: level_1 label to its level_2 children.
    pub taxonomy: BTreeMap<String, Vec<String>>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            anaphora_token_count: 5,
            topic_placeholder: "the topic".to_string(),
            person_placeholder: "[referenced person]".to_string(),
            fallback_level_1: "General".to_string(),
            fallback_level_2: "Chitchat".to_string(),
            topic_rules: default_topic_rules(),
            taxonomy: default_taxonomy(),
        }
    }
}

/// Baseline classifier rules, in priority order.
pub fn default_topic_rules() -> Vec<TopicRuleConfig> {
    vec![
        TopicRuleConfig::new(&["movie", "film", "actor"], "Entertainment", "Movies"),
        TopicRuleConfig::new(&["football", "soccer", "goal"], "Sports", "Football"),
        TopicRuleConfig::new(
            &["code", "programming", "software"],
            "Technology",
            "Software Development",
        ),
        TopicRuleConfig::new(&["health", "doctor", "medicine"], "Health", "Medicine"),
    ]
}

/// The full two-level topic hierarchy.
pub fn default_taxonomy() -> BTreeMap<String, Vec<String>> {
    let entries: [(&str, &[&str]); 9] = [
        ("Politics", &["India", "UK", "USA", "China", "Russia", "Global"]),
        (
            "Sports",
            &["Cricket", "Football", "Basketball", "Tennis", "Olympics"],
        ),
        (
            "Technology",
            &[
                "Artificial Intelligence",
                "Machine Learning",
                "Software Development",
                "Cybersecurity",
                "Blockchain",
            ],
        ),
        (
            "Business",
            &["Startups", "Finance", "Stock Market", "Economy", "E-commerce"],
        ),
        (
            "Entertainment",
            &["Movies", "TV Shows", "Music", "Celebrities", "OTT Platforms"],
        ),
        (
            "Science",
            &["Physics", "Biology", "Space", "Climate", "Research"],
        ),
        (
            "Health",
            &["Fitness", "Nutrition", "Mental Health", "Diseases", "Medicine"],
        ),
        (
            "Education",
            &[
                "Exams",
                "Universities",
                "Online Courses",
                "Careers",
                "Research",
            ],
        ),
        (
            "General",
            &["Chitchat", "Greetings", "Meta", "Clarification", "Other"],
        ),
    ];

    entries
        .iter()
        .map(|(parent, children)| {
            (
                parent.to_string(),
                children.iter().map(|c| c.to_string()).collect(),
            )
        })
        .collect()
}
