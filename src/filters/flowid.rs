//! Flow ID filter.
//!
//! `flowId()` tags every request with an `X-Flow-Id` header so a request
//! can be traced across hops. `flowId("reuse")` keeps an already valid
//! incoming ID instead of overwriting it.

use axum::http::{HeaderName, HeaderValue};

use super::{FilterContext, FilterError, FilterSpec, RequestFilter};
use crate::routex::Arg;

pub const FLOW_ID_HEADER: HeaderName = HeaderName::from_static("x-flow-id");

const REUSE_PARAMETER: &str = "reuse";
const DEFAULT_LEN: usize = 16;
const MIN_LEN: usize = 8;
const MAX_LEN: usize = 64;

// URL-safe, no lookalike characters.
const ALPHABET: &[u8] = b"23456789abcdefghijkmnpqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ";

/// Generates and validates request tracing flow IDs.
pub trait Generator: Send + Sync {
    /// Returns a new flow ID.
    fn generate(&self) -> String;

    /// True if `id` follows this generator's format.
    fn is_valid(&self, id: &str) -> bool;
}

/// Default generator: fixed-length random string over [`ALPHABET`].
pub struct StandardGenerator {
    len: usize,
}

impl StandardGenerator {
    pub fn new(len: usize) -> Result<Self, FilterError> {
        if !(MIN_LEN..=MAX_LEN).contains(&len) {
            return Err(FilterError::InvalidArgs {
                name: "flowId".to_string(),
                reason: "id length out of range",
            });
        }
        Ok(Self { len })
    }
}

impl Generator for StandardGenerator {
    fn generate(&self) -> String {
        (0..self.len)
            .map(|_| ALPHABET[fastrand::usize(..ALPHABET.len())] as char)
            .collect()
    }

    fn is_valid(&self, id: &str) -> bool {
        id.len() >= MIN_LEN
            && id.len() <= MAX_LEN
            && id.bytes().all(|b| ALPHABET.contains(&b))
    }
}

pub struct FlowIdSpec {
    generator: std::sync::Arc<dyn Generator>,
}

impl Default for FlowIdSpec {
    fn default() -> Self {
        Self::with_generator(std::sync::Arc::new(
            StandardGenerator::new(DEFAULT_LEN).expect("default length is in range"),
        ))
    }
}

impl FlowIdSpec {
    pub fn with_generator(generator: std::sync::Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

struct FlowId {
    reuse_existing: bool,
    generator: std::sync::Arc<dyn Generator>,
}

impl FilterSpec for FlowIdSpec {
    fn name(&self) -> &'static str {
        "flowId"
    }

    fn create(&self, args: &[Arg]) -> Result<Box<dyn RequestFilter>, FilterError> {
        let reuse_existing = match args {
            [] => false,
            [Arg::String(s)] => s.eq_ignore_ascii_case(REUSE_PARAMETER),
            _ => {
                return Err(FilterError::InvalidArgs {
                    name: "flowId".to_string(),
                    reason: "expected no arguments or (\"reuse\")",
                })
            }
        };

        Ok(Box::new(FlowId {
            reuse_existing,
            generator: self.generator.clone(),
        }))
    }
}

impl RequestFilter for FlowId {
    fn on_request(&self, ctx: &mut FilterContext) {
        if self.reuse_existing {
            let existing = ctx
                .request()
                .headers()
                .get(&FLOW_ID_HEADER)
                .and_then(|v| v.to_str().ok());
            if existing.is_some_and(|id| self.generator.is_valid(id)) {
                return;
            }
        }

        let id = self.generator.generate();
        match HeaderValue::from_str(&id) {
            Ok(value) => {
                ctx.request_mut().headers_mut().insert(FLOW_ID_HEADER, value);
            }
            Err(e) => tracing::warn!(error = %e, "generated flow id is not a valid header value"),
        }
    }
}
