mod common;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use common::FakeServer;
use mail_triage::api::GmailClient;
use mail_triage::error::AppError;
use mail_triage::mail::{GmailMailSource, MailSource};
use secrecy::SecretString;
use serde_json::json;

fn source(server: &FakeServer) -> GmailMailSource {
    GmailMailSource::new(
        GmailClient::with_base_url(&server.base_url),
        SecretString::from("ya29.test".to_string()),
    )
}

fn label_list() -> String {
    json!({
        "labels": [
            {"id": "INBOX", "name": "INBOX", "type": "system"},
            {"id": "Label_1", "name": "EA/Summary", "type": "user"}
        ]
    })
    .to_string()
}

#[tokio::test]
async fn fetches_message_with_plain_text_body() {
    let message = json!({
        "id": "18c1",
        "threadId": "18c0",
        "labelIds": ["INBOX", "Label_1"],
        "internalDate": "1759500300000",
        "snippet": "Hello from Gmail",
        "payload": {
            "mimeType": "multipart/alternative",
            "headers": [
                {"name": "From", "value": "Ann <ann@example.com>"},
                {"name": "Subject", "value": "Lunch?"}
            ],
            "parts": [
                {"mimeType": "text/plain", "body": {"data": "SGVsbG8gZnJvbSBHbWFpbC4NClNlZSB5b3Ugc29vbi4="}},
                {"mimeType": "text/html", "body": {"data": "PGI-aGk8L2I-"}}
            ]
        }
    });
    let server = FakeServer::start(vec![(200, label_list()), (200, message.to_string())]).await;

    let fetched = source(&server).get_message("18c1").await.expect("message");
    assert_eq!(fetched.id, "18c1");
    assert_eq!(fetched.thread_id, "18c0");
    assert_eq!(fetched.timestamp, 1_759_500_300);
    assert_eq!(fetched.sender, "Ann <ann@example.com>");
    assert_eq!(fetched.subject, "Lunch?");
    assert!(fetched.body_text.contains("Hello from Gmail."));
    assert!(fetched.has_label("EA/Summary"));
    assert!(fetched.has_label("INBOX"));

    let requests = server.requests().await;
    assert!(requests[1].request_line.starts_with("GET /gmail/v1/users/me/messages/18c1?format=full"));
    assert_eq!(requests[1].header("authorization"), Some("Bearer ya29.test"));
}

#[tokio::test]
async fn unknown_message_is_not_found() {
    let error = json!({"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}});
    let server = FakeServer::start(vec![(200, label_list()), (404, error.to_string())]).await;

    let err = source(&server).get_message("missing").await.expect_err("404");
    assert!(matches!(err, AppError::NotFound(ref id) if id == "missing"));
}

#[tokio::test]
async fn apply_labels_creates_missing_user_labels() {
    let created = json!({"id": "Label_2", "name": "EA/Priority/Med", "type": "user"});
    let modified = json!({"id": "18c1", "threadId": "18c0", "labelIds": ["INBOX", "Label_1", "Label_2"]});
    let server = FakeServer::start(vec![
        (200, label_list()),
        (200, created.to_string()),
        (200, modified.to_string()),
    ])
    .await;

    source(&server)
        .apply_labels(
            "18c1",
            &["EA/Summary".to_string(), "EA/Priority/Med".to_string()],
            &["INBOX".to_string()],
        )
        .await
        .expect("labels applied");

    let requests = server.requests().await;
    assert!(requests[1].request_line.starts_with("POST /gmail/v1/users/me/labels"));
    assert_eq!(requests[1].body_json()["name"], "EA/Priority/Med");

    assert!(requests[2].request_line.starts_with("POST /gmail/v1/users/me/messages/18c1/modify"));
    let body = requests[2].body_json();
    assert_eq!(body["addLabelIds"], json!(["Label_1", "Label_2"]));
    assert_eq!(body["removeLabelIds"], json!(["INBOX"]));
}

#[tokio::test]
async fn draft_replies_inside_the_thread() {
    let thread = json!({
        "id": "18c0",
        "messages": [{
            "id": "18c1",
            "payload": {
                "headers": [
                    {"name": "Subject", "value": "Lunch?"},
                    {"name": "From", "value": "Ann <ann@example.com>"},
                    {"name": "Message-ID", "value": "<abc@example.com>"}
                ]
            }
        }]
    });
    let draft = json!({"id": "r-42", "message": {"id": "18c9", "threadId": "18c0"}});
    let server = FakeServer::start(vec![(200, thread.to_string()), (200, draft.to_string())]).await;

    let draft_id = source(&server)
        .create_draft("18c0", "Sounds good, see you at noon.")
        .await
        .expect("draft");
    assert_eq!(draft_id, "r-42");

    let requests = server.requests().await;
    assert!(requests[0].request_line.starts_with("GET /gmail/v1/users/me/threads/18c0?format=metadata"));

    let body = requests[1].body_json();
    assert_eq!(body["message"]["threadId"], "18c0");
    let raw = body["message"]["raw"].as_str().expect("raw message");
    let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(raw).expect("base64url")).expect("utf8");
    assert!(decoded.contains("To: Ann <ann@example.com>\r\n"));
    assert!(decoded.contains("Subject: Re: Lunch?\r\n"));
    assert!(decoded.contains("In-Reply-To: <abc@example.com>\r\n"));
    assert!(decoded.ends_with("Sounds good, see you at noon."));
}
