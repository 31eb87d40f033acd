//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check bind addresses parse and do not collide
//! - Require a real admin key when the admin API is enabled
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{AdminConfig, GatewayConfig};

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("invalid {field} address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{a} and {b} share bind address {value:?}")]
    AddressCollision {
        a: &'static str,
        b: &'static str,
        value: String,
    },

    #[error("admin API enabled with placeholder api_key")]
    PlaceholderAdminKey,

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

/// Validate a gateway configuration, collecting every violation.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(
        "listener",
        &config.listener.bind_address,
        &mut errors,
    );
    if config.observability.metrics_enabled {
        check_address(
            "metrics",
            &config.observability.metrics_address,
            &mut errors,
        );
    }
    if config.admin.enabled {
        check_address("admin", &config.admin.bind_address, &mut errors);
        if is_placeholder_key(&config.admin) {
            errors.push(ValidationError::PlaceholderAdminKey);
        }
        if config.admin.bind_address == config.listener.bind_address {
            errors.push(ValidationError::AddressCollision {
                a: "admin",
                b: "listener",
                value: config.admin.bind_address.clone(),
            });
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn is_placeholder_key(admin: &AdminConfig) -> bool {
    admin.api_key.is_empty() || admin.api_key == AdminConfig::default().api_key
}
