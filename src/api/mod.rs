pub mod client;
pub mod drafts;
pub mod labels;
pub mod messages;
pub mod models;

pub use client::GmailClient;
