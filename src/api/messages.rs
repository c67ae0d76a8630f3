pub fn message_endpoint(id: &str) -> String {
    format!("/gmail/v1/users/me/messages/{id}")
}

pub fn list_endpoint() -> &'static str {
    "/gmail/v1/users/me/messages"
}

pub fn thread_endpoint(thread_id: &str) -> String {
    format!("/gmail/v1/users/me/threads/{thread_id}")
}

pub fn get_query() -> Vec<(String, String)> {
    vec![("format".to_string(), "full".to_string())]
}

/// Headers needed to address a reply inside an existing thread.
pub fn thread_query() -> Vec<(String, String)> {
    let mut query = vec![("format".to_string(), "metadata".to_string())];

    for header in ["Subject", "From", "Reply-To", "Message-ID", "References"] {
        query.push(("metadataHeaders".to_string(), header.to_string()));
    }

    query
}

pub fn list_query(limit: usize, label: Option<&str>) -> Vec<(String, String)> {
    let mut params = vec![("maxResults".to_string(), limit.to_string())];
    if let Some(label) = label {
        params.push(("labelIds".to_string(), label.to_string()));
    }
    params
}
