use crate::config::types::Config;
use crate::url::UrlSetGenerator;
use crate::ConfigError;

/// Upper bound for both concurrency pools
pub const MAX_CONCURRENCY: u32 = 100;

/// Validates the entire configuration
///
/// Runs before any network or disk activity. The URL pattern check
/// expands the template, so an oversized range is rejected here too.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.url.trim().is_empty() {
        return Err(ConfigError::Validation("url cannot be empty".to_string()));
    }

    validate_concurrency("concurrent", config.concurrent)?;
    if let Some(limit) = config.download_concurrent {
        validate_concurrency("download_concurrent", limit)?;
    }

    if config.save_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("save_path cannot be empty".to_string()));
    }

    validate_selectors(&config.selectors)?;

    let message = UrlSetGenerator::new(config).validate_pattern()?;
    tracing::debug!("{}", message);

    Ok(())
}

fn validate_concurrency(field: &str, value: u32) -> Result<(), ConfigError> {
    if value < 1 || value > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            field, MAX_CONCURRENCY, value
        )));
    }
    Ok(())
}

fn validate_selectors(selectors: &[String]) -> Result<(), ConfigError> {
    if selectors.iter().all(|s| s.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "at least one non-empty selector is required".to_string(),
        ));
    }
    Ok(())
}
