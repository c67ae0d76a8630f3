pub fn create_draft_endpoint() -> &'static str {
    "/gmail/v1/users/me/drafts"
}
