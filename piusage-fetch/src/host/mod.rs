//! Host APIs for network access.
//!
//! - [`http`] - HTTP client with tracing and domain allowlist
//! - [`status`] - Status page polling (statuspage.io)

pub mod http;
pub mod status;

pub use http::HttpClient;
pub use status::StatusPoller;
