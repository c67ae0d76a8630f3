pub fn list_labels_endpoint() -> &'static str {
    "/gmail/v1/users/me/labels"
}

pub fn create_label_endpoint() -> &'static str {
    "/gmail/v1/users/me/labels"
}

pub fn modify_labels_endpoint(id: &str) -> String {
    format!("/gmail/v1/users/me/messages/{id}/modify")
}

/// Gmail system labels are addressed by id and never created.
pub fn is_system_label(name: &str) -> bool {
    matches!(
        name,
        "INBOX"
            | "SPAM"
            | "TRASH"
            | "UNREAD"
            | "STARRED"
            | "IMPORTANT"
            | "SENT"
            | "DRAFT"
            | "CATEGORY_PERSONAL"
            | "CATEGORY_SOCIAL"
            | "CATEGORY_PROMOTIONS"
            | "CATEGORY_UPDATES"
            | "CATEGORY_FORUMS"
    )
}
