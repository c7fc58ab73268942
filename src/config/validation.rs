use crate::config::types::{
    Config, CrawlerConfig, DiscoveryConfig, OutputConfig, RetryConfig, UserAgentConfig,
    WriterConfig,
};
use crate::ConfigError;
use url::Url;

/// Characters that would break the CSS attribute selectors built from `docs-path`
const SELECTOR_BREAKING_CHARS: &[char] = &['\'', '"', '[', ']', '\\'];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_discovery_config(&config.discovery)?;
    validate_retry_config(&config.retry)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_writer_config(&config.writer)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", config.base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::Validation(format!(
            "base-url '{}' has no host",
            config.base_url
        )));
    }

    if !config.docs_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "docs-path must start with '/', got '{}'",
            config.docs_path
        )));
    }

    if config.docs_path.contains(SELECTOR_BREAKING_CHARS) {
        return Err(ConfigError::Validation(format!(
            "docs-path '{}' contains quote, bracket or backslash characters",
            config.docs_path
        )));
    }

    if config.page_load_timeout_secs < 1 || config.page_load_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "page-load-timeout-secs must be between 1 and 300, got {}",
            config.page_load_timeout_secs
        )));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    if config.sitemap_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "sitemap-path cannot be empty".to_string(),
        ));
    }

    if config.max_sitemap_depth > 5 {
        return Err(ConfigError::Validation(format!(
            "max-sitemap-depth must be <= 5, got {}",
            config.max_sitemap_depth
        )));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.base_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "base-delay-ms ({}) cannot exceed max-delay-ms ({})",
            config.base_delay_ms, config.max_delay_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.output_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_writer_config(config: &WriterConfig) -> Result<(), ConfigError> {
    if config.wkhtmltopdf_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "wkhtmltopdf-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crawler(base_url: &str, docs_path: &str) -> CrawlerConfig {
        CrawlerConfig {
            base_url: base_url.to_string(),
            docs_path: docs_path.to_string(),
            politeness_delay_ms: 0,
            page_load_timeout_secs: 30,
            max_pages: None,
        }
    }

    #[test]
    fn test_validate_crawler_config() {
        assert!(validate_crawler_config(&crawler("https://docs.example.com", "/")).is_ok());
        assert!(validate_crawler_config(&crawler("http://127.0.0.1:8080", "/docs/")).is_ok());

        assert!(validate_crawler_config(&crawler("not a url", "/")).is_err());
        assert!(validate_crawler_config(&crawler("ftp://example.com", "/")).is_err());
        assert!(validate_crawler_config(&crawler("https://example.com", "docs/")).is_err());
        assert!(validate_crawler_config(&crawler("https://example.com", "/it's/")).is_err());
    }

    #[test]
    fn test_validate_timeouts_and_limits() {
        let mut config = crawler("https://docs.example.com", "/");
        config.page_load_timeout_secs = 0;
        assert!(validate_crawler_config(&config).is_err());

        let mut config = crawler("https://docs.example.com", "/");
        config.max_pages = Some(0);
        assert!(validate_crawler_config(&config).is_err());
    }

    #[test]
    fn test_validate_retry_config() {
        assert!(validate_retry_config(&RetryConfig::default()).is_ok());

        let zero_attempts = RetryConfig {
            max_attempts: 0,
            ..RetryConfig::default()
        };
        assert!(validate_retry_config(&zero_attempts).is_err());

        let inverted = RetryConfig {
            base_delay_ms: 5000,
            max_delay_ms: 100,
            ..RetryConfig::default()
        };
        assert!(validate_retry_config(&inverted).is_err());
    }

    #[test]
    fn test_validate_user_agent() {
        assert!(validate_user_agent_config(&UserAgentConfig::default()).is_ok());

        let bad_name = UserAgentConfig {
            crawler_name: "bad name!".to_string(),
            ..UserAgentConfig::default()
        };
        assert!(validate_user_agent_config(&bad_name).is_err());

        let bad_contact = UserAgentConfig {
            contact_url: Some("not a url".to_string()),
            ..UserAgentConfig::default()
        };
        assert!(validate_user_agent_config(&bad_contact).is_err());
    }
}
