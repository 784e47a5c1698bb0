// Re-export network modules
pub mod api_client;
pub mod event_stream;

pub use api_client::ApiClient;

/// Base URL for API calls. The editor is served by the same backend it talks
/// to, so all endpoints are same-origin relative paths.
pub(crate) fn api_url(path: &str) -> String {
    format!("/api{}", path)
}
