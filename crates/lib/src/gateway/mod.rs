//! Gateway: HTTP server that fronts the LangGraph service.
//!
//! Every request passes the auth gate first; `/api/*` is forwarded upstream with the API key,
//! a default `assistant_id` on stream runs, and CORS headers on every response.

mod cors;
mod error;
mod proxy;
mod server;

pub use cors::{cors_headers, merge_headers, ALLOW_METHODS};
pub use error::GatewayError;
pub use proxy::{
    ensure_assistant_id, is_json_content_type, is_stream_run_path, proxy, upstream_error_message,
    upstream_url,
};
pub use server::{router, run_gateway, GatewayState, UpstreamSettings};
