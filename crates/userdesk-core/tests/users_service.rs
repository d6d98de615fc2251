//! Users service and state slice against a mock backend

use std::sync::{Arc, Mutex};

use mockito::Matcher;
use serde_json::json;

use userdesk_core::services::ApiRequestStatus;
use userdesk_core::{
    AdapterConfig, AppMode, CreateUserParams, HttpAdapter, Notifier, RequestConfig, Severity,
    ToastId, ToastOptions, User, UserState, UsersService,
};

#[derive(Default)]
struct RecordingNotifier {
    shown: Mutex<Vec<(Severity, String)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, severity: Severity, message: &str, _options: ToastOptions) -> ToastId {
        let mut shown = self.shown.lock().unwrap();
        shown.push((severity, message.to_string()));
        ToastId(shown.len() as u64)
    }

    fn dismiss(&self, _id: ToastId) {}
}

fn service(origin: &str) -> UsersService {
    let adapter = HttpAdapter::builder()
        .config(AdapterConfig::default().with_mode(AppMode::Production).with_origin(origin))
        .build()
        .unwrap();
    UsersService::new(Arc::new(adapter))
}

fn user_json(id: u64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "email": "someone@example.com",
        "address": {
            "street": "Main",
            "suit": "1",
            "city": "Town",
            "zipcode": "00000",
            "geo": {"lat": "0", "lng": "0"}
        },
        "phone": "555",
        "website": "example.com",
        "company": {"name": "Acme", "catchPhrase": "Things", "bs": "stuff"}
    })
}

#[tokio::test]
async fn test_fetch_fills_state() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/api/users")
        .with_status(200)
        .with_body(json!([user_json(1, "Ada"), user_json(2, "Grace")]).to_string())
        .create_async()
        .await;

    let recording = Arc::new(RecordingNotifier::default());
    let notifier: Arc<dyn Notifier> = recording.clone();
    let mut state = UserState::default();

    state.fetch(&service(&server.url()), &notifier).await.unwrap();

    let names: Vec<_> = state.users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Ada", "Grace"]);
    assert!(!state.is_data_fetch_request_pending);
    assert_eq!(state.request_status, ApiRequestStatus::Success);
    assert!(recording.shown.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_failure_is_reported_and_clears_pending() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/api/users")
        .with_status(500)
        .with_body(r#"{"message":"database unavailable"}"#)
        .create_async()
        .await;

    let recording = Arc::new(RecordingNotifier::default());
    let notifier: Arc<dyn Notifier> = recording.clone();
    let mut state = UserState::default();

    let err = state.fetch(&service(&server.url()), &notifier).await.unwrap_err();

    assert_eq!(err.status, 500);
    assert!(!state.is_data_fetch_request_pending);
    assert_eq!(state.request_status, ApiRequestStatus::Error);
    assert_eq!(
        *recording.shown.lock().unwrap(),
        vec![(Severity::Error, "database unavailable".to_string())]
    );
}

#[tokio::test]
async fn test_create_user_posts_array_with_config() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("POST", "/api/users")
        .match_header("x-request-source", "import")
        .match_body(Matcher::Regex(r#"^\[\{.*"name":"Linus".*\}\]$"#.to_string()))
        .with_status(201)
        .with_body(json!([user_json(7, "Linus")]).to_string())
        .create_async()
        .await;

    let user: User = serde_json::from_value(user_json(7, "Linus")).unwrap();
    let response = service(&server.url())
        .create_user(CreateUserParams {
            request_body: vec![user],
            request_config: Some(RequestConfig::new().header("x-request-source", "import")),
        })
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.body[0].id, 7);
    m.assert_async().await;
}

#[tokio::test]
async fn test_service_abort_after_settled_call_has_no_effect() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("GET", "/api/users")
        .with_status(200)
        .with_body(json!([user_json(1, "Ada")]).to_string())
        .expect(2)
        .create_async()
        .await;

    let users = service(&server.url());
    let settled = users.get_users().await.unwrap();
    let snapshot = settled.clone();

    users.abort_request();
    users.abort_request();
    assert_eq!(settled, snapshot);
    assert_eq!(settled.body[0].name, "Ada");

    let next = users.get_users().await.unwrap();
    assert_eq!(next.status, 200);
    assert_eq!(next.body, settled.body);
    m.assert_async().await;
}
