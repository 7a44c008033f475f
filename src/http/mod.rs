//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, tracing, timeout)
//!     → request.rs (request id, cookies, form parameters)
//!     → [gateway pipeline decides: reply or forward]
//!     → response.rs (sign-out script, JSON errors, session cookie)
//!     → server.rs forward_handler (relay to upstream)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{FormParams, RequestIdExt, X_REQUEST_ID};
pub use response::Reply;
pub use server::HttpServer;
