//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, window > 0)
//! - Keep the request deadline above the upstream timeout
//! - Check allow-list entries are bare origins
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::{IpAddr, SocketAddr};

use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("origin {0:?} is not of the form scheme://host[:port]")]
    Origin(String),

    #[error("{field} is not a valid address: {value:?}")]
    Address { field: &'static str, value: String },

    #[error("listener.request_timeout_secs ({request}) must exceed upstream.timeout_secs ({upstream})")]
    DeadlineBelowUpstream { request: u64, upstream: u64 },
}

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::Address {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "listener.request_timeout_secs" });
    }

    for origin in &config.origins.allowed {
        if !is_bare_origin(origin) {
            errors.push(ValidationError::Origin(origin.clone()));
        }
    }

    let rate_limit = &config.rate_limit;
    if rate_limit.enabled {
        if rate_limit.window_secs == 0 {
            errors.push(ValidationError::Zero { field: "rate_limit.window_secs" });
        }
        if rate_limit.max_requests == 0 {
            errors.push(ValidationError::Zero { field: "rate_limit.max_requests" });
        }
        if rate_limit.sweep_interval_secs == 0 {
            errors.push(ValidationError::Zero { field: "rate_limit.sweep_interval_secs" });
        }
    }

    let upstream = &config.upstream;
    if upstream.timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "upstream.timeout_secs" });
    }
    if upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "upstream.connect_timeout_secs" });
    }
    if upstream.max_body_bytes == 0 {
        errors.push(ValidationError::Zero { field: "upstream.max_body_bytes" });
    }
    // Otherwise the deadline answers 408 before the fetch can fail with a 500.
    let request = config.listener.request_timeout_secs;
    if request > 0 && upstream.timeout_secs > 0 && request <= upstream.timeout_secs {
        errors.push(ValidationError::DeadlineBelowUpstream {
            request,
            upstream: upstream.timeout_secs,
        });
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Browsers send `Origin` without a path or trailing slash, so an entry
/// carrying either could never match.
fn is_bare_origin(origin: &str) -> bool {
    let Ok(url) = Url::parse(origin) else {
        return false;
    };
    url.has_host()
        && url.username().is_empty()
        && url.password().is_none()
        && url.query().is_none()
        && url.fragment().is_none()
        && url.origin().ascii_serialization() == origin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn test_bare_origins() {
        assert!(is_bare_origin("https://your-website.com"));
        assert!(is_bare_origin("http://localhost:5500"));
        assert!(!is_bare_origin("https://your-website.com/"));
        assert!(!is_bare_origin("https://your-website.com/app"));
        assert!(!is_bare_origin("your-website.com"));
        // Default ports are elided by browsers.
        assert!(!is_bare_origin("https://your-website.com:443"));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = ProxyConfig::default();
        config.rate_limit.window_secs = 0;
        config.rate_limit.max_requests = 0;
        config.upstream.max_body_bytes = 0;
        config.origins.allowed.push("https://example.com/".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::Zero { field: "rate_limit.window_secs" }));
        assert!(errors.contains(&ValidationError::Origin("https://example.com/".into())));
    }

    #[test]
    fn test_disabled_rate_limit_skips_checks() {
        let mut config = ProxyConfig::default();
        config.rate_limit.enabled = false;
        config.rate_limit.max_requests = 0;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_request_deadline_must_exceed_upstream_timeout() {
        let mut config = ProxyConfig::default();
        config.upstream.timeout_secs = 2;
        config.listener.request_timeout_secs = 1;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::DeadlineBelowUpstream { request: 1, upstream: 2 }])
        );

        config.listener.request_timeout_secs = 2;
        assert!(validate_config(&config).is_err());

        config.listener.request_timeout_secs = 3;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_zero_deadline_reported_once() {
        let mut config = ProxyConfig::default();
        config.listener.request_timeout_secs = 0;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::Zero { field: "listener.request_timeout_secs" }])
        );
    }

    #[test]
    fn test_bad_addresses() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "localhost".into();
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
