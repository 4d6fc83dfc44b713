use std::env;
use std::time::Duration;

use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the chatbot backend; endpoints are joined onto it.
    pub api_url: Url,
    /// Host of the site the client is embedded in. Links to it are internal.
    pub site_host: Option<String>,
    pub request_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {value}")]
    InvalidUrl { var: &'static str, value: String },
    #[error("HEALTHCHAT_TIMEOUT_SECS must be a positive number of seconds, got {0}")]
    InvalidTimeout(String),
}

/// Load configuration from environment.
pub fn load() -> Result<Config, ConfigError> {
    from_lookup(|name| env::var(name).ok())
}

/// Build configuration from an arbitrary variable lookup (the environment in production).
pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw_api = lookup("HEALTHCHAT_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let api_url = parse_base_url("HEALTHCHAT_API_URL", &raw_api)?;

    let site_host = match lookup("HEALTHCHAT_SITE_URL").filter(|s| !s.trim().is_empty()) {
        Some(raw) => {
            let url = Url::parse(raw.trim()).map_err(|_| ConfigError::InvalidUrl {
                var: "HEALTHCHAT_SITE_URL",
                value: raw.clone(),
            })?;
            url.host_str().map(|h| h.to_ascii_lowercase())
        }
        None => None,
    };

    let request_timeout = match lookup("HEALTHCHAT_TIMEOUT_SECS") {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => return Err(ConfigError::InvalidTimeout(raw)),
        },
        None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    };

    Ok(Config {
        api_url,
        site_host,
        request_timeout,
    })
}

/// Parse a base URL and make sure it ends with `/` so `Url::join` appends instead of replacing
/// the last path segment.
fn parse_base_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let url = Url::parse(&with_slash).map_err(|_| ConfigError::InvalidUrl {
        var,
        value: raw.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl {
            var,
            value: raw.to_string(),
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/api/");
        assert_eq!(config.site_host, None);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn api_url_gets_trailing_slash() {
        let config = from_lookup(lookup(&[("HEALTHCHAT_API_URL", "https://bot.example.org/v1")]))
            .unwrap();
        assert_eq!(
            config.api_url.join("chat").unwrap().as_str(),
            "https://bot.example.org/v1/chat"
        );
    }

    #[test]
    fn site_host_is_lowercased() {
        let config =
            from_lookup(lookup(&[("HEALTHCHAT_SITE_URL", "https://Clinic.Example.COM/")])).unwrap();
        assert_eq!(config.site_host.as_deref(), Some("clinic.example.com"));
    }

    #[test]
    fn invalid_api_url_is_error() {
        let err = from_lookup(lookup(&[("HEALTHCHAT_API_URL", "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { var: "HEALTHCHAT_API_URL", .. }));
        assert_eq!(err.to_string(), "HEALTHCHAT_API_URL is not a valid URL: not a url");
    }

    #[test]
    fn zero_timeout_is_error() {
        let err = from_lookup(lookup(&[("HEALTHCHAT_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(_)));
        assert!(err.to_string().contains("HEALTHCHAT_TIMEOUT_SECS"));
    }
}
