//! Configuration management for estate

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{EstateError, Result};
use crate::utils::{StringUtils, UrlUtils};

/// Path of the refresh endpoint, relative to the API base URL
pub const REFRESH_PATH: &str = "/auth/v2/refresh-token";

/// Lifetime given to a stored access token
pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// OAuth provider credentials
#[derive(Debug, Clone)]
pub struct OAuthProvider {
    pub client_id: String,
    pub client_secret: String,
}

/// OAuth configuration
#[derive(Debug, Clone, Default)]
pub struct OAuthConfig {
    pub google: Option<OAuthProvider>,
    pub facebook: Option<OAuthProvider>,
}

impl OAuthConfig {
    /// Look up the provider by its backend name (`google`, `facebook`)
    pub fn provider(&self, name: &str) -> Option<&OAuthProvider> {
        match name.to_ascii_lowercase().as_str() {
            "google" => self.google.as_ref(),
            "facebook" => self.facebook.as_ref(),
            _ => None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub file: Option<PathBuf>,
    pub verbose: bool,
    pub silent: bool,
    pub format_json: bool,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub user_agent: Option<String>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub refresh_path: String,
    /// Treat 403 like 401 and attempt a refresh
    pub refresh_on_forbidden: bool,
    pub token_ttl: Duration,
    /// Where the access-token cookie is persisted. `None` keeps it in memory only.
    pub token_file: Option<PathBuf>,
    /// Directory for recently viewed properties and the remembered email
    pub data_dir: Option<PathBuf>,
    pub show_demo_credentials: bool,
    pub demo_email: Option<String>,
    pub demo_password: Option<String>,
    pub oauth: OAuthConfig,
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: "http://localhost:5000/api".to_string(),
            user_agent: Some(format!("estate/{}", crate::VERSION)),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            refresh_path: REFRESH_PATH.to_string(),
            refresh_on_forbidden: false,
            token_ttl: ACCESS_TOKEN_TTL,
            token_file: None,
            data_dir: None,
            show_demo_credentials: false,
            demo_email: None,
            demo_password: None,
            oauth: OAuthConfig::default(),
            output: OutputConfig {
                file: None,
                verbose: false,
                silent: false,
                format_json: true,
            },
        }
    }
}

impl Config {
    /// Build a configuration from defaults overlaid with environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay values from a key lookup. Split out from `from_env` so tests need not touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("ESTATE_API_URL") {
            self.base_url = UrlUtils::normalize_base_url(&url)?;
        }
        if let Some(timeout) = lookup("ESTATE_TIMEOUT") {
            self.timeout = StringUtils::parse_timeout(&timeout)?;
        }
        if let Some(flag) = lookup("ESTATE_REFRESH_ON_FORBIDDEN") {
            self.refresh_on_forbidden = parse_flag("ESTATE_REFRESH_ON_FORBIDDEN", &flag)?;
        }
        if let Some(path) = lookup("ESTATE_TOKEN_FILE") {
            self.token_file = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("ESTATE_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(path));
        }
        if let Some(flag) = lookup("ESTATE_SHOW_DEMO_CREDENTIALS") {
            // demo credentials never ship in release builds
            self.show_demo_credentials =
                cfg!(debug_assertions) && parse_flag("ESTATE_SHOW_DEMO_CREDENTIALS", &flag)?;
        }

        if let Some(email) = lookup("ESTATE_DEMO_EMAIL") {
            self.demo_email = Some(email);
        }
        if let Some(password) = lookup("ESTATE_DEMO_PASSWORD") {
            self.demo_password = Some(password);
        }

        self.oauth.google = provider_from(&lookup, "GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET");
        self.oauth.facebook =
            provider_from(&lookup, "FACEBOOK_CLIENT_ID", "FACEBOOK_CLIENT_SECRET");
        Ok(())
    }

    /// Absolute URL of an API path
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Absolute URL of the refresh endpoint
    pub fn refresh_url(&self) -> String {
        self.endpoint(&self.refresh_path)
    }

    /// Demo account, offered only when enabled and fully configured
    pub fn demo_credentials(&self) -> Option<(&str, &str)> {
        if !self.show_demo_credentials {
            return None;
        }
        match (self.demo_email.as_deref(), self.demo_password.as_deref()) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email, password))
            }
            _ => None,
        }
    }

    /// Directory used for local state, falling back to the platform data directory
    pub fn resolved_data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join("estate")))
    }
}

fn provider_from<F>(lookup: &F, id_key: &str, secret_key: &str) -> Option<OAuthProvider>
where
    F: Fn(&str) -> Option<String>,
{
    match (lookup(id_key), lookup(secret_key)) {
        (Some(client_id), Some(client_secret)) if !client_id.is_empty() => Some(OAuthProvider {
            client_id,
            client_secret,
        }),
        _ => None,
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(EstateError::Config(format!(
            "Invalid boolean for {}: '{}'",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::error::EstateError;
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn apply_env_overlays_values() {
        let mut config = Config::default();
        config
            .apply_env(lookup(&[
                ("ESTATE_API_URL", "https://api.example.com/api/"),
                ("ESTATE_TIMEOUT", "2m"),
                ("ESTATE_REFRESH_ON_FORBIDDEN", "yes"),
                ("GOOGLE_CLIENT_ID", "gid"),
                ("GOOGLE_CLIENT_SECRET", "gsecret"),
            ]))
            .expect("env applies");

        assert_eq!(config.base_url, "https://api.example.com/api");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert!(config.refresh_on_forbidden);
        assert_eq!(
            config.oauth.provider("Google").map(|p| p.client_id.as_str()),
            Some("gid")
        );
        assert!(config.oauth.facebook.is_none());
    }

    #[test]
    fn apply_env_rejects_bad_flag() {
        let mut config = Config::default();
        let err = config
            .apply_env(lookup(&[("ESTATE_REFRESH_ON_FORBIDDEN", "maybe")]))
            .expect_err("invalid flag");
        assert!(matches!(err, EstateError::Config(_)));
    }

    #[test]
    fn endpoint_joins_paths() {
        let config = Config {
            base_url: "http://localhost:5000/api/".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.endpoint("/properties"),
            "http://localhost:5000/api/properties"
        );
        assert_eq!(
            config.refresh_url(),
            "http://localhost:5000/api/auth/v2/refresh-token"
        );
        assert_eq!(
            config.endpoint("https://cdn.example.com/x"),
            "https://cdn.example.com/x"
        );
    }

    #[test]
    fn demo_credentials_need_flag_and_both_values() {
        let mut config = Config {
            demo_email: Some("demo@example.com".to_string()),
            demo_password: Some("demo".to_string()),
            ..Config::default()
        };
        assert_eq!(config.demo_credentials(), None);

        config.show_demo_credentials = true;
        assert_eq!(config.demo_credentials(), Some(("demo@example.com", "demo")));

        config.demo_password = Some(String::new());
        assert_eq!(config.demo_credentials(), None);
    }
}
