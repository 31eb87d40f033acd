//! Redirect filter.
//!
//! `redirectTo(code, location)` serves an HTTP redirect and shunts the
//! request flow: the chain stops and no backend is contacted. The location
//! may be partial; missing parts (scheme, host, path, query) are completed
//! from the incoming request.

use axum::body::Body;
use axum::http::{header, uri::Uri, Request, Response, StatusCode};

use super::{FilterContext, FilterError, FilterSpec, RequestFilter};
use crate::routex::Arg;

pub struct RedirectToSpec;

struct RedirectTo {
    code: StatusCode,
    location: Uri,
}

impl FilterSpec for RedirectToSpec {
    fn name(&self) -> &'static str {
        "redirectTo"
    }

    fn create(&self, args: &[Arg]) -> Result<Box<dyn RequestFilter>, FilterError> {
        let invalid = |reason| FilterError::InvalidArgs {
            name: "redirectTo".to_string(),
            reason,
        };

        let [code, location] = args else {
            return Err(invalid("expected (code, location)"));
        };
        let code = code
            .as_number()
            .and_then(|n| StatusCode::from_u16(n as u16).ok())
            .filter(StatusCode::is_redirection)
            .ok_or_else(|| invalid("code must be a 3xx status number"))?;
        let location = location
            .as_str()
            .and_then(|s| s.parse::<Uri>().ok())
            .ok_or_else(|| invalid("location must be a valid URI string"))?;

        Ok(Box::new(RedirectTo { code, location }))
    }
}

impl RequestFilter for RedirectTo {
    fn on_request(&self, ctx: &mut FilterContext) {
        let location = complete_location(ctx.request(), &self.location);
        let response = Response::builder()
            .status(self.code)
            .header(header::LOCATION, location)
            .body(Body::empty())
            // Status and header are validated at chain-build time.
            .unwrap_or_else(|_| Response::new(Body::empty()));
        ctx.serve(response);
    }
}

/// Fills in scheme, authority, path and query from the request when the
/// configured location leaves them out.
fn complete_location(request: &Request<Body>, location: &Uri) -> String {
    let req_uri = request.uri();

    let scheme = location
        .scheme_str()
        .or(req_uri.scheme_str())
        .unwrap_or("https");

    let authority = location
        .authority()
        .map(|a| a.to_string())
        .or_else(|| request_host(request))
        .unwrap_or_default();

    let path = match location.path() {
        "" | "/" if location.path_and_query().is_none() => req_uri.path(),
        p => p,
    };

    let query = location
        .query()
        .or(req_uri.query())
        .map(|q| format!("?{q}"))
        .unwrap_or_default();

    format!("{scheme}://{authority}{path}{query}")
}

fn request_host(request: &Request<Body>) -> Option<String> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().host().map(str::to_string))
}
