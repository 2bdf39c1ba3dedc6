use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default = "default_work_directory")]
    pub work_directory: PathBuf,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default)]
    pub tasks: TaskConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_work_directory() -> PathBuf {
    std::env::temp_dir()
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            upload: UploadConfig::default(),
            work_directory: default_work_directory(),
            worker_count: default_worker_count(),
            tasks: TaskConfig::default(),
            llm: LlmConfig::default(),
            enrichment: EnrichmentConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    /// Overrides individual settings from the process environment.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Some(base) = env_value("API_BASE") {
            self.llm.api_base = base;
        }
        if let Some(model) = env_value("MODEL_NAME") {
            self.llm.model_name = model;
        }
        if let Some(raw) = env_value("MAX_UPLOAD_SIZE_MB") {
            match raw.parse::<u64>() {
                Ok(mb) => self.upload.max_upload_size_mb = mb,
                Err(e) => log::warn!("Ignoring MAX_UPLOAD_SIZE_MB={:?}: {}", raw, e),
            }
        }
        if let Some(dir) = env_value("CODESTORY_WORK_DIR") {
            self.work_directory = PathBuf::from(dir);
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    #[serde(default = "default_max_upload_size_mb")]
    pub max_upload_size_mb: u64,
    #[serde(default = "default_max_extracted_size_mb")]
    pub max_extracted_size_mb: u64,
}

fn default_max_upload_size_mb() -> u64 {
    500
}

fn default_max_extracted_size_mb() -> u64 {
    2048
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_size_mb: default_max_upload_size_mb(),
            max_extracted_size_mb: default_max_extracted_size_mb(),
        }
    }
}

impl UploadConfig {
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(BYTES_PER_MB)
    }

    pub fn max_extracted_size_bytes(&self) -> u64 {
        self.max_extracted_size_mb.saturating_mul(BYTES_PER_MB)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskConfig {
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u32,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_ttl_hours() -> u32 {
    24
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl TaskConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.ttl_hours))
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Connection settings for the OpenAI-compatible text generator.
///
/// The key itself is never part of the settings file; `api_key_env` names
/// the environment variable it is read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model_name() -> String {
    "gpt-4".to_string()
}

fn default_api_key_env() -> String {
    "API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    1
}

fn default_temperature() -> f32 {
    0.3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model_name: default_model_name(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentConfig {
    #[serde(default = "default_max_files_to_summarize")]
    pub max_files_to_summarize: usize,
    #[serde(default = "default_max_diagram_files")]
    pub max_diagram_files: usize,
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
    #[serde(default = "default_prompt_preview_chars")]
    pub prompt_preview_chars: usize,
    #[serde(default = "default_true")]
    pub store_fragments: bool,
}

fn default_max_files_to_summarize() -> usize {
    20
}

fn default_max_diagram_files() -> usize {
    30
}

fn default_preview_chars() -> usize {
    3000
}

fn default_prompt_preview_chars() -> usize {
    1500
}

fn default_true() -> bool {
    true
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_files_to_summarize: default_max_files_to_summarize(),
            max_diagram_files: default_max_diagram_files(),
            preview_chars: default_preview_chars(),
            prompt_preview_chars: default_prompt_preview_chars(),
            store_fragments: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
