use std::collections::HashMap;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::mail::Message;

use super::drafts;
use super::labels;
use super::messages;
use super::models::{DraftResult, LabelMutationResult, LabelView, ReplyContext};

const GMAIL_API_BASE_URL: &str = "https://gmail.googleapis.com";

/// Gmail emits base64url bodies with and without padding.
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone)]
pub struct GmailClient {
    http: Client,
    base_url: String,
}

impl GmailClient {
    pub fn new() -> Self {
        Self::with_base_url(GMAIL_API_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn list_ids(
        &self,
        access_token: &str,
        limit: usize,
        label: Option<&str>,
    ) -> AppResult<Vec<String>> {
        let endpoint = messages::list_endpoint();
        let query = messages::list_query(limit, label);
        let resource: GmailMessageListResource =
            self.get_json(endpoint, access_token, Some(&query)).await?;

        Ok(resource
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|entry| entry.id)
            .collect())
    }

    pub async fn get_message(
        &self,
        id: &str,
        access_token: &str,
        label_names: &HashMap<String, String>,
    ) -> AppResult<Message> {
        let endpoint = messages::message_endpoint(id);
        let query = messages::get_query();
        let resource: GmailMessageResource = self
            .get_json(&endpoint, access_token, Some(&query))
            .await
            .map_err(|err| not_found_as(err, id))?;
        Ok(resource.into_message(label_names))
    }

    pub async fn reply_context(
        &self,
        thread_id: &str,
        access_token: &str,
    ) -> AppResult<ReplyContext> {
        let endpoint = messages::thread_endpoint(thread_id);
        let query = messages::thread_query();
        let thread: GmailThreadResource = self
            .get_json(&endpoint, access_token, Some(&query))
            .await
            .map_err(|err| not_found_as(err, thread_id))?;

        let Some(latest) = thread.messages.unwrap_or_default().pop() else {
            return Err(AppError::NotFound(thread_id.to_string()));
        };

        let headers = latest
            .payload
            .and_then(|payload| payload.headers)
            .unwrap_or_default();

        Ok(ReplyContext {
            subject: header_value(&headers, "Subject"),
            from: header_value(&headers, "From"),
            reply_to: header_value(&headers, "Reply-To"),
            message_id: header_value(&headers, "Message-ID"),
            references: header_value(&headers, "References"),
        })
    }

    pub async fn list_labels(&self, access_token: &str) -> AppResult<Vec<LabelView>> {
        let endpoint = labels::list_labels_endpoint();
        let response: GmailLabelListResponse = self.get_json(endpoint, access_token, None).await?;
        let mut labels_out = response
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(GmailLabelResource::into_view)
            .collect::<Vec<_>>();
        labels_out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(labels_out)
    }

    pub async fn create_label(&self, name: &str, access_token: &str) -> AppResult<LabelView> {
        let endpoint = labels::create_label_endpoint();
        let body = GmailCreateLabelRequest {
            name: name.to_string(),
            label_list_visibility: "labelShow",
            message_list_visibility: "show",
        };
        let label: GmailLabelResource = self.post_json(endpoint, access_token, &body).await?;
        debug!(label = %label.name, id = %label.id, "created gmail label");
        Ok(label.into_view())
    }

    /// Adds and removes labels by id. Gmail treats repeated calls as no-ops.
    pub async fn modify_labels(
        &self,
        id: &str,
        add_ids: Vec<String>,
        remove_ids: Vec<String>,
        access_token: &str,
    ) -> AppResult<LabelMutationResult> {
        let endpoint = labels::modify_labels_endpoint(id);
        let body = GmailModifyLabelsRequest {
            add_label_ids: add_ids,
            remove_label_ids: remove_ids,
        };

        let _: GmailModifyLabelsResponse = self
            .post_json(&endpoint, access_token, &body)
            .await
            .map_err(|err| not_found_as(err, id))?;

        Ok(LabelMutationResult {
            id: id.to_string(),
            added: body.add_label_ids,
            removed: body.remove_label_ids,
        })
    }

    pub async fn create_draft(
        &self,
        raw_message: &str,
        thread_id: &str,
        access_token: &str,
    ) -> AppResult<DraftResult> {
        let endpoint = drafts::create_draft_endpoint();
        let request = GmailDraftRequest {
            message: GmailDraftMessage {
                raw: raw_message.to_string(),
                thread_id: Some(thread_id.to_string()),
            },
        };
        let response: GmailDraftResponse = self.post_json(endpoint, access_token, &request).await?;

        let (message_id, thread_id) = match response.message {
            Some(message) => (message.id, message.thread_id),
            None => (None, None),
        };

        Ok(DraftResult {
            id: response.id,
            message_id,
            thread_id,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        access_token: &str,
        query: Option<&[(String, String)]>,
    ) -> AppResult<T> {
        let url = self.endpoint_url(endpoint)?;
        let mut request = self.http.get(url).bearer_auth(access_token);
        if let Some(query) = query {
            request = request.query(query);
        }

        let response = request.send().await?;
        self.parse_json_response(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        access_token: &str,
        body: &B,
    ) -> AppResult<T> {
        let url = self.endpoint_url(endpoint)?;
        let response = self
            .http
            .post(url)
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await?;

        self.parse_json_response(response).await
    }

    fn endpoint_url(&self, endpoint: &str) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.set_path(endpoint.trim_start_matches('/'));
        Ok(url)
    }

    async fn parse_json_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(%status, "gmail api request failed");
        Err(map_api_error(status, &body))
    }
}

impl Default for GmailClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct GmailMessageResource {
    id: String,
    #[serde(rename = "threadId")]
    thread_id: Option<String>,
    #[serde(rename = "labelIds")]
    label_ids: Option<Vec<String>>,
    #[serde(rename = "internalDate")]
    internal_date: Option<String>,
    snippet: Option<String>,
    payload: Option<GmailMessagePayload>,
}

impl GmailMessageResource {
    fn into_message(self, label_names: &HashMap<String, String>) -> Message {
        let payload = self.payload.unwrap_or_default();
        let headers = payload.headers.clone().unwrap_or_default();

        let body_text = plain_text_body(&payload)
            .or_else(|| self.snippet.as_deref().map(decode_snippet))
            .unwrap_or_default();

        let labels = self
            .label_ids
            .unwrap_or_default()
            .into_iter()
            .map(|id| label_names.get(&id).cloned().unwrap_or(id))
            .collect();

        Message {
            thread_id: self.thread_id.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            timestamp: internal_date_secs(self.internal_date.as_deref()),
            sender: header_value(&headers, "From").unwrap_or_default(),
            subject: header_value(&headers, "Subject").unwrap_or_default(),
            body_text,
            labels,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GmailMessagePayload {
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
    headers: Option<Vec<GmailMessageHeader>>,
    body: Option<GmailMessageBody>,
    parts: Option<Vec<GmailMessagePayload>>,
}

#[derive(Debug, Clone, Deserialize)]
struct GmailMessageBody {
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GmailMessageListResource {
    messages: Option<Vec<GmailMessageListEntry>>,
}

#[derive(Debug, Deserialize)]
struct GmailMessageListEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GmailThreadResource {
    messages: Option<Vec<GmailThreadMessage>>,
}

#[derive(Debug, Deserialize)]
struct GmailThreadMessage {
    payload: Option<GmailMessagePayload>,
}

#[derive(Debug, Deserialize)]
struct GmailLabelListResponse {
    labels: Option<Vec<GmailLabelResource>>,
}

#[derive(Debug, Deserialize)]
struct GmailLabelResource {
    id: String,
    name: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl GmailLabelResource {
    fn into_view(self) -> LabelView {
        LabelView {
            id: self.id,
            name: self.name,
            kind: self.kind.unwrap_or_else(|| "user".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct GmailCreateLabelRequest {
    name: String,
    #[serde(rename = "labelListVisibility")]
    label_list_visibility: &'static str,
    #[serde(rename = "messageListVisibility")]
    message_list_visibility: &'static str,
}

#[derive(Debug, Serialize)]
struct GmailModifyLabelsRequest {
    #[serde(rename = "addLabelIds")]
    add_label_ids: Vec<String>,
    #[serde(rename = "removeLabelIds")]
    remove_label_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GmailModifyLabelsResponse {}

#[derive(Debug, Serialize)]
struct GmailDraftRequest {
    message: GmailDraftMessage,
}

#[derive(Debug, Serialize)]
struct GmailDraftMessage {
    raw: String,
    #[serde(rename = "threadId", skip_serializing_if = "Option::is_none")]
    thread_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GmailDraftResponse {
    id: String,
    message: Option<GmailDraftMessageRef>,
}

#[derive(Debug, Deserialize)]
struct GmailDraftMessageRef {
    id: Option<String>,
    #[serde(rename = "threadId")]
    thread_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GmailMessageHeader {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct GmailApiErrorEnvelope {
    error: GmailApiError,
}

#[derive(Debug, Deserialize)]
struct GmailApiError {
    code: Option<u16>,
    status: Option<String>,
    message: Option<String>,
    errors: Option<Vec<GmailApiErrorDetail>>,
}

#[derive(Debug, Deserialize)]
struct GmailApiErrorDetail {
    reason: Option<String>,
}

fn header_value(headers: &[GmailMessageHeader], target: &str) -> Option<String> {
    headers
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case(target))
        .map(|header| header.value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Depth-first search for the first `text/plain` part carrying data.
fn plain_text_body(payload: &GmailMessagePayload) -> Option<String> {
    let is_plain = payload
        .mime_type
        .as_deref()
        .is_some_and(|mime| mime.eq_ignore_ascii_case("text/plain"));

    if is_plain {
        let decoded = payload
            .body
            .as_ref()
            .and_then(|body| body.data.as_deref())
            .and_then(|data| BODY_ENGINE.decode(data.trim()).ok())
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
        if decoded.is_some() {
            return decoded;
        }
    }

    payload
        .parts
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find_map(plain_text_body)
}

fn decode_snippet(snippet: &str) -> String {
    html_escape::decode_html_entities(snippet).to_string()
}

fn internal_date_secs(internal_date: Option<&str>) -> i64 {
    internal_date
        .and_then(|value| value.parse::<i64>().ok())
        .map(|millis| millis / 1000)
        .unwrap_or_default()
}

fn not_found_as(err: AppError, id: &str) -> AppError {
    match err {
        AppError::NotFound(_) => AppError::NotFound(id.to_string()),
        other => other,
    }
}

fn map_api_error(status: StatusCode, body: &str) -> AppError {
    let message = parse_api_error_message(body).unwrap_or_else(|| {
        let body = body.trim();
        if body.is_empty() {
            "no error details in response body".to_string()
        } else {
            body.to_string()
        }
    });

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AppError::Auth(format!(
            "gmail api authorization failed ({status}): {message}. refresh or replace the gmail token"
        ));
    }

    if status == StatusCode::NOT_FOUND {
        return AppError::NotFound(message);
    }

    AppError::Api(format!("gmail api request failed ({status}): {message}"))
}

fn parse_api_error_message(body: &str) -> Option<String> {
    let envelope = serde_json::from_str::<GmailApiErrorEnvelope>(body).ok()?;
    let mut parts = Vec::new();

    if let Some(message) = envelope.error.message {
        parts.push(message);
    }

    if let Some(status) = envelope.error.status {
        parts.push(format!("status={status}"));
    }

    if let Some(code) = envelope.error.code {
        parts.push(format!("code={code}"));
    }

    if let Some(reason) = envelope
        .error
        .errors
        .and_then(|errors| errors.into_iter().find_map(|detail| detail.reason))
    {
        parts.push(format!("reason={reason}"));
    }

    if parts.is_empty() {
        return None;
    }

    Some(parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(name: &str, value: &str) -> GmailMessageHeader {
        GmailMessageHeader {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn maps_multipart_resource_to_message() {
        let body = base64::engine::general_purpose::URL_SAFE.encode("Invoice attached.\n");
        let resource = GmailMessageResource {
            id: "msg-123".to_string(),
            thread_id: Some("thread-456".to_string()),
            label_ids: Some(vec!["INBOX".to_string(), "Label_7".to_string()]),
            internal_date: Some("1759500300000".to_string()),
            snippet: Some("Invoice attached.".to_string()),
            payload: Some(GmailMessagePayload {
                mime_type: Some("multipart/alternative".to_string()),
                headers: Some(vec![
                    header("Subject", "Your billing invoice"),
                    header("From", "accounts@example.com"),
                ]),
                body: None,
                parts: Some(vec![
                    GmailMessagePayload {
                        mime_type: Some("text/html".to_string()),
                        headers: None,
                        body: Some(GmailMessageBody {
                            data: Some("PGI-aGk8L2I-".to_string()),
                        }),
                        parts: None,
                    },
                    GmailMessagePayload {
                        mime_type: Some("text/plain".to_string()),
                        headers: None,
                        body: Some(GmailMessageBody { data: Some(body) }),
                        parts: None,
                    },
                ]),
            }),
        };

        let names = HashMap::from([("Label_7".to_string(), "EA/Summary".to_string())]);
        let message = resource.into_message(&names);

        assert_eq!(message.id, "msg-123");
        assert_eq!(message.thread_id, "thread-456");
        assert_eq!(message.timestamp, 1_759_500_300);
        assert_eq!(message.subject, "Your billing invoice");
        assert_eq!(message.sender, "accounts@example.com");
        assert_eq!(message.body_text, "Invoice attached.\n");
        assert!(message.has_label("INBOX"));
        assert!(message.has_label("EA/Summary"));
    }

    #[test]
    fn falls_back_to_decoded_snippet() {
        let resource = GmailMessageResource {
            id: "msg-1".to_string(),
            thread_id: None,
            label_ids: None,
            internal_date: None,
            snippet: Some("I&#39;ll be there &amp; on time".to_string()),
            payload: None,
        };

        let message = resource.into_message(&HashMap::new());
        assert_eq!(message.thread_id, "msg-1");
        assert_eq!(message.body_text, "I'll be there & on time");
        assert_eq!(message.timestamp, 0);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let headers = vec![header("sUbJeCt", "case test")];

        assert_eq!(
            header_value(&headers, "Subject").as_deref(),
            Some("case test")
        );
    }

    #[test]
    fn maps_unauthorized_as_auth_error() {
        let error = map_api_error(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"code":401,"message":"Request had invalid authentication credentials.","status":"UNAUTHENTICATED"}}"#,
        );

        match error {
            AppError::Auth(message) => {
                assert!(message.contains("invalid authentication credentials"));
            }
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[test]
    fn maps_missing_message_as_not_found() {
        let error = map_api_error(
            StatusCode::NOT_FOUND,
            r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#,
        );

        match not_found_as(error, "msg-404") {
            AppError::NotFound(id) => assert_eq!(id, "msg-404"),
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn maps_server_error_as_api_error() {
        let error = map_api_error(StatusCode::SERVICE_UNAVAILABLE, "");

        match error {
            AppError::Api(message) => assert!(message.contains("no error details")),
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
