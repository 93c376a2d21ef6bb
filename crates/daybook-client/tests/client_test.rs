//! HTTP client integration tests against a mock server

use daybook_client::{ClientConfig, ClientError, DaybookClient};
use daybook_core::{
    AuthRemote, AuthRequest, Credential, JournalRemote, MediaUpload, Mood, RemoteError,
    RemoveMediaRequest, UploadRequest,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> DaybookClient {
    DaybookClient::new(ClientConfig {
        base_url: server.uri(),
        timeout_secs: 5,
    })
    .unwrap()
}

fn credential() -> Credential {
    Credential {
        token: "tok-1".to_string(),
        username: "ada".to_string(),
    }
}

fn day_entry(text: &str) -> serde_json::Value {
    json!({
        "dayEntry": {
            "month": 3,
            "dayNumber": 10,
            "text": text,
            "mood": "green",
            "media": [{"url": "https://cdn/a.jpg", "type": "image", "public_id": "d/a"}],
            "updatedAt": "2025-04-10T12:00:00Z"
        }
    })
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_login_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"username": "ada", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-1",
            "user": {"username": "ada"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .login(&AuthRequest {
            username: "ada".to_string(),
            password: "pw".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(response.token, "tok-1");
    assert_eq!(response.user.username, "ada");
}

#[tokio::test]
async fn test_signup_error_text_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/signup"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"error": "Username taken"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = AuthRemote::signup(
        &client,
        AuthRequest {
            username: "ada".to_string(),
            password: "pw".to_string(),
        },
    )
    .await
    .unwrap_err();

    assert_eq!(
        err,
        RemoteError::Status {
            status: 409,
            message: "Username taken".to_string()
        }
    );
}

#[tokio::test]
async fn test_error_without_body_has_empty_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .login(&AuthRequest {
            username: "ada".to_string(),
            password: "pw".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Server { status: 500, ref message } if message.is_empty()));
}

// =============================================================================
// Days
// =============================================================================

#[tokio::test]
async fn test_list_days_sends_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/days"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "list": [
                {"month": 3, "dayNumber": 5, "text": "final"},
                {"month": 3, "dayNumber": 6, "mood": "red"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = client_for(&server).fetch_days(&credential()).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text.as_deref(), Some("final"));
    assert_eq!(records[1].mood.as_deref(), Some("red"));
}

#[tokio::test]
async fn test_list_days_keeps_good_records_next_to_bad_ones() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/days"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "list": [
                {"month": 3, "dayNumber": "5", "mood": null, "media": null},
                42,
                {"month": 3, "dayNumber": 6, "media": [{"url": "", "secure_url": "https://cdn/b.png"}]}
            ]
        })))
        .mount(&server)
        .await;

    let records = client_for(&server).fetch_days(&credential()).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].day_number, Some(5));

    let entry = records[1].clone().into_entry(0, chrono::Utc::now()).unwrap();
    assert_eq!(entry.resolved.image, "https://cdn/b.png");
}

#[tokio::test]
async fn test_upload_day_sends_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/10"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_string_contains("name=\"text\""))
        .and(body_string_contains("name=\"month\""))
        .and(body_string_contains("filename=\"a.jpg\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(day_entry("walk")))
        .expect(1)
        .mount(&server)
        .await;

    let request = UploadRequest {
        text: Some("walk".to_string()),
        mood: Some(Mood::Green),
        month: 3,
        files: vec![MediaUpload {
            file_name: "a.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: b"jpeg-bytes".to_vec(),
        }],
    };

    let client = client_for(&server);
    let record = JournalRemote::upload_day(&client, &credential(), 10, request)
        .await
        .unwrap();

    let entry = record.into_entry(0, chrono::Utc::now()).unwrap();
    assert_eq!(entry.text, "walk");
    assert_eq!(entry.resolved.image, "https://cdn/a.jpg");
}

#[tokio::test]
async fn test_remove_media_sends_json_patch() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/upload/10"))
        .and(body_json(json!({
            "month": 3,
            "removeUrls": ["https://cdn/b.mp4"],
            "removePublicIds": ["d/b"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(day_entry("")))
        .expect(1)
        .mount(&server)
        .await;

    let request = RemoveMediaRequest {
        month: 3,
        remove_urls: vec!["https://cdn/b.mp4".to_string()],
        remove_public_ids: vec!["d/b".to_string()],
    };
    let client = client_for(&server);
    let record = JournalRemote::remove_media(&client, &credential(), 10, request)
        .await
        .unwrap();
    assert_eq!(record.day_number, Some(10));
}

#[tokio::test]
async fn test_null_day_entry_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/upload/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"dayEntry": null})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = JournalRemote::remove_media(
        &client,
        &credential(),
        10,
        RemoveMediaRequest {
            month: 3,
            ..Default::default()
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RemoteError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let client = DaybookClient::new(ClientConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        timeout_secs: 2,
    })
    .unwrap();

    let err = client.fetch_days(&credential()).await.unwrap_err();
    assert!(matches!(err, RemoteError::Transport(_)));
}
