//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    let base_url = config.server.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push("server.base_url must start with http:// or https://".to_string());
    }
    if !config.server.chat_path.starts_with('/') {
        errors.push("server.chat_path must start with '/'".to_string());
    }
    if !config.server.health_path.starts_with('/') {
        errors.push("server.health_path must start with '/'".to_string());
    }

    if let Some(path) = &config.storage.path {
        if path.trim().is_empty() {
            errors.push("storage.path must not be empty when set".to_string());
        }
    }

    if !matches!(config.logging.format.to_lowercase().as_str(), "text" | "json") {
        errors.push("logging.format must be 'text' or 'json'".to_string());
    }
    if config.logging.dir.trim().is_empty() {
        errors.push("logging.dir must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
