//! Filter decision engine.
//!
//! # Responsibilities
//! - Hold the immutable filter configuration
//! - Run the checks in a fixed order against a request snapshot
//! - Produce a single decision per request
//!
//! # Check Order
//! ```text
//! skip predicate → XHR flag → insecure flag → IP rules → User-Agent rules
//! ```
//! The first failing check decides the reject reason.

use std::fmt;
use std::sync::Arc;

use crate::filter::context::RequestContext;
use crate::filter::matcher::{self, FilterError};

/// Predicate that bypasses the filter for a request when it returns true.
pub type SkipPredicate = Arc<dyn Fn(&RequestContext) -> bool + Send + Sync>;

/// Immutable filter configuration.
#[derive(Clone, Default)]
pub struct FilterConfig {
    /// Regex rules applied to the client address. `None` disables IP filtering.
    pub ip_filters: Option<Vec<String>>,

    /// Regex rules applied to the User-Agent header. `None` disables UA filtering.
    pub user_agent_filters: Option<Vec<String>>,

    /// Reject requests that declare themselves as XHR.
    pub disallow_xhr: bool,

    /// Reject requests that did not arrive over TLS.
    pub disallow_insecure: bool,

    /// Bypass every check when this returns true.
    pub skip: Option<SkipPredicate>,
}

impl fmt::Debug for FilterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterConfig")
            .field("ip_filters", &self.ip_filters)
            .field("user_agent_filters", &self.user_agent_filters)
            .field("disallow_xhr", &self.disallow_xhr)
            .field("disallow_insecure", &self.disallow_insecure)
            .field("skip", &self.skip.as_ref().map(|_| "<predicate>"))
            .finish()
    }
}

impl FilterConfig {
    pub fn builder() -> FilterConfigBuilder {
        FilterConfigBuilder::default()
    }
}

/// Builder for [`FilterConfig`].
#[derive(Default)]
pub struct FilterConfigBuilder {
    config: FilterConfig,
}

impl FilterConfigBuilder {
    pub fn ip_filters<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.ip_filters = Some(rules.into_iter().map(Into::into).collect());
        self
    }

    pub fn user_agent_filters<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.user_agent_filters = Some(rules.into_iter().map(Into::into).collect());
        self
    }

    pub fn disallow_xhr(mut self, disallow: bool) -> Self {
        self.config.disallow_xhr = disallow;
        self
    }

    pub fn disallow_insecure(mut self, disallow: bool) -> Self {
        self.config.disallow_insecure = disallow;
        self
    }

    pub fn skip<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RequestContext) -> bool + Send + Sync + 'static,
    {
        self.config.skip = Some(Arc::new(predicate));
        self
    }

    pub fn build(self) -> FilterConfig {
        self.config
    }
}

/// Status class of a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectStatus {
    /// A rule or flag matched the request.
    Forbidden,
    /// A configured rule could not be compiled.
    BadConfiguration,
}

impl RejectStatus {
    /// Conventional HTTP status code for this class.
    pub fn code(&self) -> u16 {
        match self {
            RejectStatus::Forbidden => 403,
            RejectStatus::BadConfiguration => 400,
        }
    }
}

/// Which check rejected the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    Xhr,
    Insecure,
    IpAddress,
    UserAgent,
    MalformedFilter,
}

impl RejectReason {
    /// Machine-stable reason string, also used as the response body.
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Xhr => "XHR request filtered",
            RejectReason::Insecure => "insecure request filtered",
            RejectReason::IpAddress => "request IP filtered",
            RejectReason::UserAgent => "request user agent filtered",
            RejectReason::MalformedFilter => "cannot compile malformed filter string",
        }
    }

    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::Xhr => "xhr",
            RejectReason::Insecure => "insecure",
            RejectReason::IpAddress => "ip",
            RejectReason::UserAgent => "user_agent",
            RejectReason::MalformedFilter => "malformed_filter",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub status: RejectStatus,
    pub reason: RejectReason,
}

impl Rejection {
    fn forbidden(reason: RejectReason) -> Self {
        Self {
            status: RejectStatus::Forbidden,
            reason,
        }
    }

    fn from_filter_error(err: FilterError) -> Self {
        match err {
            FilterError::MalformedFilter => Self {
                status: RejectStatus::BadConfiguration,
                reason: RejectReason::MalformedFilter,
            },
        }
    }
}

/// Outcome of evaluating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Reject(Rejection),
}

impl Decision {
    pub fn is_continue(&self) -> bool {
        matches!(self, Decision::Continue)
    }
}

/// Evaluate a request against the filter configuration.
pub fn evaluate(config: &FilterConfig, ctx: &RequestContext) -> Decision {
    if let Some(skip) = &config.skip {
        if skip(ctx) {
            return Decision::Continue;
        }
    }

    match check(config, ctx) {
        Ok(()) => Decision::Continue,
        Err(rejection) => Decision::Reject(rejection),
    }
}

fn check(config: &FilterConfig, ctx: &RequestContext) -> Result<(), Rejection> {
    // Flag checks
    if config.disallow_xhr && ctx.is_xhr {
        return Err(Rejection::forbidden(RejectReason::Xhr));
    }

    if config.disallow_insecure && !ctx.is_secure {
        return Err(Rejection::forbidden(RejectReason::Insecure));
    }

    // Pattern checks
    let allowed = matcher::filter(&ctx.source_address, config.ip_filters.as_deref())
        .map_err(Rejection::from_filter_error)?;
    if !allowed {
        return Err(Rejection::forbidden(RejectReason::IpAddress));
    }

    let allowed = matcher::filter(&ctx.client_agent, config.user_agent_filters.as_deref())
        .map_err(Rejection::from_filter_error)?;
    if !allowed {
        return Err(Rejection::forbidden(RejectReason::UserAgent));
    }

    Ok(())
}

/// A filter configuration bound for repeated evaluation.
///
/// Cheap to share: wrap in `Arc` and evaluate from any task.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    config: FilterConfig,
}

impl FilterEngine {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, ctx: &RequestContext) -> Decision {
        evaluate(&self.config, ctx)
    }
}
