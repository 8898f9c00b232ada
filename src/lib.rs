//! Request admission filter.
//!
//! Decides per request whether to continue to the next stage or reject it,
//! based on the client IP, User-Agent, XHR marker and transport security.
//!
//! ```
//! use request_filter::filter::{evaluate, Decision, FilterConfig, RequestContext};
//!
//! let config = FilterConfig::builder()
//!     .user_agent_filters(["PostmanRuntime.*"])
//!     .build();
//! let ctx = RequestContext {
//!     source_address: "127.0.0.1".into(),
//!     client_agent: "PostmanRuntime/7.26.8".into(),
//!     is_secure: true,
//!     ..Default::default()
//! };
//! assert!(matches!(evaluate(&config, &ctx), Decision::Reject(_)));
//! ```

pub mod config;
pub mod filter;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::AppConfig;
pub use filter::{Decision, FilterConfig, FilterEngine, RequestContext};
pub use http::FilterServer;
pub use lifecycle::Shutdown;
