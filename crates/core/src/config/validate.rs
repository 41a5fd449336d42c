use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - At least one format is configured
/// - Format names are lowercase alphanumeric and unique
/// - Transcode timeout is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.formats.is_empty() {
        return Err(ConfigError::ValidationError(
            "formats cannot be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for format in &config.formats {
        let well_formed = !format.is_empty()
            && format
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if !well_formed {
            return Err(ConfigError::ValidationError(format!(
                "invalid format name: {:?}",
                format
            )));
        }
        if !seen.insert(format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate format: {}",
                format
            )));
        }
    }

    if config.transcode.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "transcode.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_empty_formats_fails() {
        let config = Config {
            formats: vec![],
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_duplicate_format_fails() {
        let config = Config {
            formats: vec!["wav".to_string(), "wav".to_string()],
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_uppercase_format_fails() {
        let config = Config {
            formats: vec!["WAV".to_string()],
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = Config::default();
        config.transcode.timeout_secs = Some(0);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }
}
