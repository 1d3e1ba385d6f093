use estate::config::Config;
use estate::http::ApiClient;
use estate::session::AuthSession;
use estate::toggle::{
    CollectionMembership, FavoriteMembership, OptimisticToggle, ToggleCallbacks, ToggleStatus,
};
use estate::EstateError;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

fn client_for(server: &MockServer) -> ApiClient {
    let config = Config {
        base_url: format!("{}/api", server.uri()),
        ..Config::default()
    };
    let client =
        ApiClient::new(config, Arc::new(AuthSession::in_memory())).expect("client should build");
    client.session().set_token("T1").expect("token stored");
    client
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_favorite_toggle_adds_after_initialize() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/favorites/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "isFavorite": false })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/favorites"))
        .and(body_json(json!({ "propertyId": "p1" })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let toggle = OptimisticToggle::new(FavoriteMembership::new(client.favorites(), "p1"));
    assert!(!toggle.initialize().await.expect("initialized"));

    let mut confirmed = None;
    let accepted = toggle
        .toggle(ToggleCallbacks::new().on_success(|value| confirmed = Some(value)))
        .await;

    assert!(accepted);
    assert_eq!(confirmed, Some(true));
    assert!(toggle.value());
    assert_eq!(toggle.status(), ToggleStatus::Idle);
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_favorite_toggle_rolls_back_when_add_fails() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/favorites"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "message": "database offline" }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let toggle = OptimisticToggle::with_initial(FavoriteMembership::new(client.favorites(), "p1"), false);
    let mut states = toggle.subscribe();

    let failure: Arc<Mutex<Option<(bool, Option<u16>)>>> = Arc::default();
    let seen = Arc::clone(&failure);
    let pending = toggle.toggle(ToggleCallbacks::new().on_error(move |restored, err: &EstateError| {
        *seen.lock().expect("lock") = Some((restored, err.status()));
    }));
    let observe = async {
        states
            .wait_for(|s| s.status == ToggleStatus::Mutating)
            .await
            .expect("state")
            .value
    };
    let (accepted, optimistic) = tokio::join!(pending, observe);

    assert!(optimistic, "value flips before the backend answers");
    assert!(!accepted);
    assert!(!toggle.value(), "value restored after failure");
    assert_eq!(*failure.lock().expect("lock"), Some((false, Some(500))));
    assert!(toggle
        .last_error()
        .is_some_and(|message| message.contains("database offline")));
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_collection_membership_check_and_remove() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/collections/c1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "_id": "i1", "propertyId": { "_id": "p1" } }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/collections/c1/items"))
        .and(body_json(json!({ "propertyId": "p1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "removed" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let toggle = OptimisticToggle::new(CollectionMembership::new(client.collections(), "c1", "p1"));
    assert!(toggle.initialize().await.expect("initialized"));
    assert!(!toggle.try_toggle().await.expect("removed"));
    assert!(!toggle.value());
}
