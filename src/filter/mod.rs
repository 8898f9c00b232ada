//! Request filter subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → context.rs (snapshot: peer IP, User-Agent, XHR, TLS, path)
//!     → engine.rs (ordered checks, first failure wins)
//!         → flag checks (XHR, insecure transport)
//!         → matcher.rs (IP rules, then User-Agent rules)
//!     → Decision: Continue | Reject(status, reason)
//! ```
//!
//! # Design Decisions
//! - Rules are regular expressions, not globs (a bare `*` is malformed)
//! - Rules compile on every evaluation; a malformed rule surfaces per request
//! - Absent rule set and empty rule set both allow, but stay distinct
//! - Evaluation order is part of the contract: it decides the reported reason

pub mod context;
pub mod engine;
pub mod matcher;

pub use context::{ContextOptions, RequestContext, TransportSecurity};
pub use engine::{
    evaluate, Decision, FilterConfig, FilterConfigBuilder, FilterEngine, RejectReason,
    RejectStatus, Rejection, SkipPredicate,
};
pub use matcher::{filter, validate_rules, FilterError, InvalidRule};
