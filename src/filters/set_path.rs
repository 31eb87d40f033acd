//! Path rewrite filter.
//!
//! `setPath("/new")` replaces the request path before backend dispatch,
//! keeping the query string intact.

use axum::http::uri::{PathAndQuery, Uri};

use super::{FilterContext, FilterError, FilterSpec, RequestFilter};
use crate::routex::Arg;

pub struct SetPathSpec;

struct SetPath {
    path: String,
}

impl FilterSpec for SetPathSpec {
    fn name(&self) -> &'static str {
        "setPath"
    }

    fn create(&self, args: &[Arg]) -> Result<Box<dyn RequestFilter>, FilterError> {
        let invalid = |reason| FilterError::InvalidArgs {
            name: "setPath".to_string(),
            reason,
        };

        let [path] = args else {
            return Err(invalid("expected one path argument"));
        };
        let path = path.as_str().ok_or_else(|| invalid("path must be a string"))?;
        if !path.starts_with('/') {
            return Err(invalid("path must start with '/'"));
        }
        if path.parse::<PathAndQuery>().is_err() {
            return Err(invalid("path is not a valid URI path"));
        }

        Ok(Box::new(SetPath {
            path: path.to_string(),
        }))
    }
}

impl RequestFilter for SetPath {
    fn on_request(&self, ctx: &mut FilterContext) {
        let uri = ctx.request().uri();
        let rewritten = match uri.query() {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        };

        let mut parts = uri.clone().into_parts();
        match rewritten.parse::<PathAndQuery>() {
            Ok(pq) => parts.path_and_query = Some(pq),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path, "path rewrite produced invalid URI");
                return;
            }
        }

        match Uri::from_parts(parts) {
            Ok(new_uri) => *ctx.request_mut().uri_mut() = new_uri,
            Err(e) => tracing::warn!(error = %e, "path rewrite produced invalid URI"),
        }
    }
}
