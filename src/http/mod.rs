//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, transport marking)
//!     → request.rs (request ID)
//!     → middleware/filter.rs (admit or reject)
//!     → response.rs (rejection → status + plain-text reason)
//!     → next stage
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use middleware::{filter_middleware, FilterState};
pub use request::{RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::{FilterServer, ServerError};
