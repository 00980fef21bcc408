use std::path::PathBuf;
use std::sync::Arc;

use easy_config_store::ConfigStore;
use eyre::Result;
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub type Config = Arc<ConfigInner>;

pub fn config(path: PathBuf) -> Result<Config> {
    let config_store = ConfigStore::<ConfigInner>::read(path, "config".to_string())?;
    let inner = (*config_store).clone();

    info!("config parsing successful");
    debug!("loaded configuration:\n{}", toml::to_string_pretty(&inner)?);

    Ok(Arc::new(inner))
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ConfigInner {
    pub llm: LLMConfig,
    pub scrape: ScrapeConfig,
    pub pipeline: PipelineConfig,
    pub paths: PathsConfig,
    pub doc: DocConfig,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct LLMConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default)]
    pub exponential_backoff: bool,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub verbose_prompt: bool,
    #[serde(default)]
    pub verbose_output: bool,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ScrapeConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub base_delay_secs: u64,
    #[serde(default = "default_true")]
    pub exponential_backoff: bool,
    #[serde(default = "default_min_request_delay_ms")]
    pub min_request_delay_ms: u64,
    #[serde(default = "default_max_request_delay_ms")]
    pub max_request_delay_ms: u64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Target bullet count per employer, positionally matched against the
    /// facts file; the last value repeats when there are more employers.
    #[serde(default = "default_responsibility_count")]
    pub responsibility_count: Vec<usize>,
    /// Positional role-title overrides; an empty string means "ask the model".
    #[serde(default)]
    pub role_title_overrides: Vec<String>,
    /// Write the tailored experience entries next to the resume as JSON.
    #[serde(default)]
    pub persist_content: bool,
}

impl PipelineConfig {
    pub fn target_count(&self, index: usize) -> usize {
        self.responsibility_count
            .get(index)
            .or_else(|| self.responsibility_count.last())
            .copied()
            .unwrap_or(4)
    }

    pub fn title_override(&self, index: usize) -> Option<&str> {
        self.role_title_overrides
            .get(index)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct PathsConfig {
    pub job_description_dir: PathBuf,
    pub resume_input: PathBuf,
    pub resume_input_sample: PathBuf,
    pub cover_letter_content_dir: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub areas_of_improvement: PathBuf,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct DocConfig {
    #[serde(default = "default_true")]
    pub currently_employed: bool,
    /// Optional banner image used instead of the text header; blank disables it.
    #[serde(default)]
    pub header_image: String,
    pub h1: FontSpec,
    pub normal: FontSpec,
    pub cover_letter: FontSpec,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct FontSpec {
    pub font: String,
    pub size_pt: usize,
    #[serde(default = "default_font_color")]
    pub color: String,
}

fn default_llm_model() -> String {
    "claude-sonnet-4-5".to_string()
}

fn default_llm_endpoint() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_min_request_delay_ms() -> u64 {
    2000
}

fn default_max_request_delay_ms() -> u64 {
    5000
}

fn default_responsibility_count() -> Vec<usize> {
    vec![4]
}

fn default_true() -> bool {
    true
}

fn default_font_color() -> String {
    "000000".to_string()
}

impl Default for ConfigInner {
    fn default() -> Self {
        let cfg = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.default.toml",));

        toml::from_str(cfg).unwrap() // should be okay
    }
}
