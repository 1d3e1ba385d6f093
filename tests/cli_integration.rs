use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::tempdir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_cli_help_succeeds() {
    let output = cargo_bin_cmd!("estate")
        .arg("--help")
        .output()
        .expect("run estate");
    assert!(output.status.success(), "help should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"), "help should include usage text");
    assert!(stdout.contains("favorite"), "help should list subcommands");
}

#[test]
fn test_cli_rejects_malformed_credentials() {
    let data = tempdir().expect("tempdir");
    let output = cargo_bin_cmd!("estate")
        .env("ESTATE_DATA_DIR", data.path())
        .env("ESTATE_API_URL", "http://127.0.0.1:9/api")
        .args(["login", "--user", "no-colon-here"])
        .output()
        .expect("run estate");
    assert_eq!(output.status.code(), Some(94));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("EMAIL:PASSWORD"), "{stderr}");
}

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_cli_lists_properties() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/properties"))
        .and(query_param("city", "Porto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "properties": [{ "_id": "p1", "title": "Riverside flat" }],
            "pagination": { "total": 1, "page": 1, "pages": 1, "limit": 12 }
        })))
        .mount(&server)
        .await;

    let data = tempdir().expect("tempdir");
    let output = cargo_bin_cmd!("estate")
        .env("ESTATE_DATA_DIR", data.path())
        .arg("--api-url")
        .arg(format!("{}/api", server.uri()))
        .args(["--compact", "properties", "--city", "Porto"])
        .output()
        .expect("run estate");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Riverside flat"), "{stdout}");
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_cli_login_persists_token_for_next_run() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/v2/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "accessToken": "T1" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/v2/me"))
        .and(header("Authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user": { "_id": "u1", "email": "ada@example.com" }
        })))
        .mount(&server)
        .await;

    let data = tempdir().expect("tempdir");
    let api_url = format!("{}/api", server.uri());

    let login = cargo_bin_cmd!("estate")
        .env("ESTATE_DATA_DIR", data.path())
        .args(["--api-url", &api_url, "login", "--user", "ada@example.com:pw", "--remember"])
        .output()
        .expect("run estate");
    assert!(login.status.success(), "{}", String::from_utf8_lossy(&login.stderr));

    let me = cargo_bin_cmd!("estate")
        .env("ESTATE_DATA_DIR", data.path())
        .args(["--api-url", &api_url, "me"])
        .output()
        .expect("run estate");
    assert!(me.status.success(), "{}", String::from_utf8_lossy(&me.stderr));
    assert!(String::from_utf8_lossy(&me.stdout).contains("ada@example.com"));

    let state = std::fs::read_to_string(data.path().join("local-state.json")).expect("local state");
    assert!(state.contains("ada@example.com"));
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_cli_reports_expired_session() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/v2/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/v2/refresh-token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "refresh token missing"
        })))
        .mount(&server)
        .await;

    let data = tempdir().expect("tempdir");
    let output = cargo_bin_cmd!("estate")
        .env("ESTATE_DATA_DIR", data.path())
        .args(["--api-url", &format!("{}/api", server.uri()), "me"])
        .output()
        .expect("run estate");

    assert_eq!(output.status.code(), Some(94));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("estate login"), "{stderr}");
}
