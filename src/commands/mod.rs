pub mod draft;
pub mod get;
pub mod label;
pub mod list;
pub mod triage;
