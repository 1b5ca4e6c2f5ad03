use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Failure of a page transport, before any extraction happens.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Browser launch failed: {0}")]
    LaunchError(String),

    #[error("Browser error: {0}")]
    BrowserError(String),

    #[error("Selector '{selector}' did not appear within {waited:?}")]
    SelectorTimeout { selector: String, waited: Duration },
}

/// Everything that can go wrong while resolving a price for a URL.
///
/// The `Display` text of each variant is exactly what ends up in
/// `ScrapingResult::error`, so the messages are user facing.
#[derive(Error, Debug)]
pub enum ScrapingError {
    #[error("Nenhum scraper disponível para esta URL")]
    NoScraperMatched,

    #[error("Erro ao fazer scraping em {marketplace}: {source}")]
    FetchFailed {
        marketplace: String,
        #[source]
        source: FetchError,
    },

    #[error("Preço não encontrado na página")]
    PriceNotFound,

    #[error("Preço inválido na página: '{0}'")]
    InvalidPrice(String),

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout(_) | FetchError::SelectorTimeout { .. })
    }
}

// Conversion implementations for common error types
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FetchError::HttpStatus(status.as_u16()),
            None => FetchError::NetworkError(err.to_string()),
        }
    }
}

impl From<chromiumoxide::error::CdpError> for FetchError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        FetchError::BrowserError(err.to_string())
    }
}

impl From<toml::de::Error> for ScrapingError {
    fn from(err: toml::de::Error) -> Self {
        ScrapingError::ConfigError(err.to_string())
    }
}

impl From<toml::ser::Error> for ScrapingError {
    fn from(err: toml::ser::Error) -> Self {
        ScrapingError::ConfigError(err.to_string())
    }
}

impl From<::config::ConfigError> for ScrapingError {
    fn from(err: ::config::ConfigError) -> Self {
        ScrapingError::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            ScrapingError::NoScraperMatched.to_string(),
            "Nenhum scraper disponível para esta URL"
        );
        assert_eq!(
            ScrapingError::PriceNotFound.to_string(),
            "Preço não encontrado na página"
        );
    }

    #[test]
    fn test_fetch_failure_embeds_marketplace_and_cause() {
        let err = ScrapingError::FetchFailed {
            marketplace: "Amazon".to_string(),
            source: FetchError::HttpStatus(503),
        };
        let message = err.to_string();
        assert!(message.contains("Amazon"));
        assert!(message.contains("503"));
    }

    #[test]
    fn test_timeout_classification() {
        assert!(FetchError::Timeout(Duration::from_secs(10)).is_timeout());
        assert!(FetchError::SelectorTimeout {
            selector: ".price".to_string(),
            waited: Duration::from_secs(20),
        }
        .is_timeout());
        assert!(!FetchError::NetworkError("dns".to_string()).is_timeout());
    }
}
