//! Utility functions and helpers

use crate::error::{EstateError, Result};
use std::path::PathBuf;
use url::Url;

/// URL validation and parsing utilities
pub struct UrlUtils;

impl UrlUtils {
    /// Validate and normalize URL
    pub fn validate_url(input: &str) -> Result<Url> {
        // Add http:// if no scheme is provided
        let url_str = if input.contains("://") {
            input.to_string()
        } else {
            format!("http://{}", input)
        };

        let url = Url::parse(&url_str)
            .map_err(|e| EstateError::InvalidUrl(format!("Invalid URL '{}': {}", input, e)))?;
        if url.host_str().is_none() {
            return Err(EstateError::InvalidUrl(format!(
                "Invalid URL '{}': missing host",
                input
            )));
        }
        Ok(url)
    }

    /// Validate an API base URL and strip the trailing slash
    pub fn normalize_base_url(input: &str) -> Result<String> {
        let url = Self::validate_url(input.trim())?;
        Ok(url.as_str().trim_end_matches('/').to_string())
    }

    /// Compare two URLs ignoring query string and trailing slash
    pub fn same_endpoint(a: &str, b: &str) -> bool {
        fn strip(u: &str) -> &str {
            let without_query = u.split(['?', '#']).next().unwrap_or(u);
            without_query.trim_end_matches('/')
        }
        strip(a) == strip(b)
    }
}

/// File system utilities
pub struct FileUtils;

impl FileUtils {
    /// Expand tilde (~) in file paths
    pub fn expand_path(path: &str) -> Result<PathBuf> {
        if let Some(rest) = path.strip_prefix('~') {
            if let Some(home_dir) = dirs::home_dir() {
                Ok(home_dir.join(rest.trim_start_matches('/')))
            } else {
                Err(EstateError::Config(
                    "Cannot determine home directory".to_string(),
                ))
            }
        } else {
            Ok(PathBuf::from(path))
        }
    }
}

/// String utilities
pub struct StringUtils;

impl StringUtils {
    /// Parse timeout values (supports suffixes like 's', 'm', 'h')
    pub fn parse_timeout(input: &str) -> Result<std::time::Duration> {
        if let Ok(seconds) = input.parse::<u64>() {
            return Ok(std::time::Duration::from_secs(seconds));
        }

        let (number_part, suffix) = if let Some(stripped) = input.strip_suffix('s') {
            (stripped, 1)
        } else if let Some(stripped) = input.strip_suffix('m') {
            (stripped, 60)
        } else if let Some(stripped) = input.strip_suffix('h') {
            (stripped, 3600)
        } else {
            return Err(EstateError::Config(format!(
                "Invalid timeout format: '{}'. Use number with optional suffix (s/m/h)",
                input
            )));
        };

        let number: u64 = number_part
            .parse()
            .map_err(|_| EstateError::Config(format!("Invalid timeout number: '{}'", number_part)))?;

        let seconds = number.checked_mul(suffix).ok_or_else(|| {
            EstateError::Config(format!("Timeout too large: '{}'", input))
        })?;
        Ok(std::time::Duration::from_secs(seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::{FileUtils, StringUtils, UrlUtils};
    use crate::error::EstateError;
    use std::path::PathBuf;

    #[test]
    fn validate_url_adds_scheme() {
        let url = UrlUtils::validate_url("example.com").expect("valid url");
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn validate_url_rejects_invalid_input() {
        let err = UrlUtils::validate_url("http://").expect_err("invalid url");
        assert!(matches!(err, EstateError::InvalidUrl(_)));
    }

    #[test]
    fn normalize_base_url_strips_trailing_slash() {
        let base = UrlUtils::normalize_base_url("https://api.example.com/api/").expect("base");
        assert_eq!(base, "https://api.example.com/api");
    }

    #[test]
    fn same_endpoint_ignores_query_and_slash() {
        assert!(UrlUtils::same_endpoint(
            "http://h/api/auth/v2/refresh-token?x=1",
            "http://h/api/auth/v2/refresh-token/"
        ));
        assert!(!UrlUtils::same_endpoint(
            "http://h/api/auth/v2/me",
            "http://h/api/auth/v2/refresh-token"
        ));
    }

    #[test]
    fn expand_path_expands_home() {
        let home = dirs::home_dir().expect("home dir");
        let path = FileUtils::expand_path("~/estate-test").expect("expanded");
        assert_eq!(path, home.join("estate-test"));
    }

    #[test]
    fn expand_path_leaves_non_tilde_unchanged() {
        let path = FileUtils::expand_path("/tmp/estate").expect("expanded");
        assert_eq!(path, PathBuf::from("/tmp/estate"));
    }

    #[test]
    fn parse_timeout_parses_suffixes() {
        assert_eq!(
            StringUtils::parse_timeout("10").expect("seconds"),
            std::time::Duration::from_secs(10)
        );
        assert_eq!(
            StringUtils::parse_timeout("2m").expect("minutes"),
            std::time::Duration::from_secs(120)
        );
        assert_eq!(
            StringUtils::parse_timeout("1h").expect("hours"),
            std::time::Duration::from_secs(3600)
        );

        let err = StringUtils::parse_timeout("5x").expect_err("invalid suffix");
        assert!(matches!(err, EstateError::Config(_)));

        let err = StringUtils::parse_timeout("xs").expect_err("invalid number");
        assert!(matches!(err, EstateError::Config(_)));
    }

    #[test]
    fn parse_timeout_rejects_overflowing_values() {
        let err = StringUtils::parse_timeout("6000000000000000h").expect_err("overflow");
        assert!(matches!(err, EstateError::Config(_)));

        assert_eq!(
            StringUtils::parse_timeout(&format!("{}s", u64::MAX)).expect("max seconds"),
            std::time::Duration::from_secs(u64::MAX)
        );
    }
}
