use estate::config::Config;
use estate::utils::UrlUtils;

#[test]
fn test_version() {
    assert!(!estate::VERSION.is_empty());
}

#[test]
fn test_url_utils_adds_scheme() {
    let url = UrlUtils::validate_url("api.example.com/api").expect("URL should parse");
    assert_eq!(url.scheme(), "http");
}

#[test]
fn test_refresh_url_follows_base_url() {
    let config = Config {
        base_url: "https://api.example.com/api/".to_string(),
        ..Config::default()
    };
    assert_eq!(
        config.refresh_url(),
        "https://api.example.com/api/auth/v2/refresh-token"
    );
}
