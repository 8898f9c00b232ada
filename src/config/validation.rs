//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, timeouts and header names
//! - Compile filter rules up front when `validate_on_load` is set
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - The filter engine never depends on this having run

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::filter::matcher::validate_rules;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} {value:?}: expected host:port")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("listener.tls.{0} must not be empty")]
    EmptyTlsPath(&'static str),

    #[error("invalid filter.client_ip_header {0:?}")]
    InvalidHeaderName(String),

    #[error("filter.{set} {detail}")]
    MalformedRule { set: &'static str, detail: String },
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.trim().is_empty() {
            errors.push(ValidationError::EmptyTlsPath("cert_path"));
        }
        if tls.key_path.trim().is_empty() {
            errors.push(ValidationError::EmptyTlsPath("key_path"));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let filter = &config.filter;
    if let Some(name) = &filter.client_ip_header {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }

    if filter.validate_on_load {
        let sets = [
            ("ip_filters", &filter.ip_filters),
            ("user_agent_filters", &filter.user_agent_filters),
        ];
        for (set, rules) in sets {
            let Some(rules) = rules else { continue };
            if let Err(invalid) = validate_rules(rules) {
                errors.extend(invalid.into_iter().map(|rule| ValidationError::MalformedRule {
                    set,
                    detail: rule.to_string(),
                }));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
