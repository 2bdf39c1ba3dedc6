use std::path::Path;

use crate::config::schema::Settings;
use crate::error::ConfigError;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Settings, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Settings, ConfigError> {
    let settings: Settings = serde_json::from_str(content)?;

    validate_config(&settings)?;

    Ok(settings)
}

pub fn validate_config(settings: &Settings) -> Result<(), ConfigError> {
    if settings.worker_count == 0 {
        return Err(validation("workerCount must be greater than 0"));
    }

    if settings.upload.max_upload_size_mb == 0 {
        return Err(validation("upload.maxUploadSizeMb must be greater than 0"));
    }
    if settings.upload.max_extracted_size_mb == 0 {
        return Err(validation(
            "upload.maxExtractedSizeMb must be greater than 0",
        ));
    }

    if settings.tasks.ttl_hours == 0 {
        return Err(validation("tasks.ttlHours must be greater than 0"));
    }
    if settings.tasks.sweep_interval_secs == 0 {
        return Err(validation("tasks.sweepIntervalSecs must be greater than 0"));
    }

    let api_base = settings.llm.api_base.trim();
    if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
        return Err(ConfigError::Validation {
            message: format!("llm.apiBase must be an http(s) URL, got {:?}", api_base),
        });
    }
    if settings.llm.model_name.trim().is_empty() {
        return Err(validation("llm.modelName must not be empty"));
    }
    if settings.llm.api_key_env.trim().is_empty() {
        return Err(validation("llm.apiKeyEnv must not be empty"));
    }
    if settings.llm.timeout_secs == 0 {
        return Err(validation("llm.timeoutSecs must be greater than 0"));
    }

    if settings.enrichment.preview_chars == 0 {
        return Err(validation("enrichment.previewChars must be greater than 0"));
    }

    let level = settings.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::Validation {
            message: format!(
                "logging.level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                settings.logging.level
            ),
        });
    }

    Ok(())
}

fn validation(message: &str) -> ConfigError {
    ConfigError::Validation {
        message: message.to_string(),
    }
}
