//! Route expression language.
//!
//! # Data Flow
//! ```text
//! Route file / admin push (UTF-8 text)
//!     → parser.rs (lex + parse batch)
//!     → Route values
//!     → routing engine (compile + match)
//!
//! Route values
//!     → print.rs (compact or pretty)
//!     → persistence, diffing, admin diagnostics
//! ```
//!
//! # Design Decisions
//! - The textual form is the single source of truth for route definitions
//! - Parse and print are exact inverses: parse(print(r)) == [r]
//! - Routes are immutable value objects once parsed; printing never mutates
//! - Header maps are BTreeMaps so printed output is deterministic

pub mod escape;
pub mod lexer;
pub mod parser;
pub mod print;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use parser::{parse, ParseError};
pub use print::print_routes;

/// A predicate or filter argument.
///
/// The grammar only admits string and number literals in argument position,
/// so the variant set is closed. Filter specs downcast from these two kinds
/// when constructing instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arg {
    String(String),
    Number(f64),
}

impl Arg {
    /// Returns the string value, if this argument is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::String(s) => Some(s),
            Arg::Number(_) => None,
        }
    }

    /// Returns the numeric value, if this argument is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Arg::Number(n) => Some(*n),
            Arg::String(_) => None,
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::String(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::String(s)
    }
}

impl From<f64> for Arg {
    fn from(n: f64) -> Self {
        Arg::Number(n)
    }
}

/// A named matching condition with its arguments.
///
/// Built-in predicates (Path, Host, PathRegexp, Method, Header,
/// HeaderRegexp) are stored in dedicated [`Route`] fields; everything else
/// lands here. `Any` is a valid no-op predicate: it parses, matches every
/// request, and is suppressed from printed output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Predicate {
    pub name: String,
    pub args: Vec<Arg>,
}

impl Predicate {
    pub fn new(name: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// A named request/response transformation step.
///
/// Order inside a route is significant: filters run in sequence on the
/// request path and in reverse on the response path. The core only
/// guarantees that the (name, args) pair round-trips through print/parse;
/// argument semantics belong to the filter registry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    pub args: Vec<Arg>,
}

impl Filter {
    pub fn new(name: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// The destination kind of a matched route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// Forward to a network address given as a URL string.
    #[default]
    Network,
    /// Terminate processing without forwarding; a filter produces the
    /// response.
    Shunt,
    /// Re-enter the routing engine with the (possibly filtered) request.
    Loopback,
}

/// A single route definition: match predicates, an ordered filter chain and
/// a backend target.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Route {
    /// Route identifier. Empty means unnamed; unique within a batch when
    /// present.
    pub id: String,

    /// Exact path to match (`Path("/foo")`). Empty means no path condition.
    pub path: String,

    /// Host regexps, one `Host(/…/)` predicate per entry.
    pub host_regexps: Vec<String>,

    /// Path regexps, one `PathRegexp(/…/)` predicate per entry.
    pub path_regexps: Vec<String>,

    /// HTTP method to match. Empty means any method.
    pub method: String,

    /// Exact header matches, one `Header("k", "v")` per entry. Sorted map
    /// so printing is deterministic.
    pub headers: BTreeMap<String, String>,

    /// Header regexp matches, one `HeaderRegexp("k", /v/)` per (key, regexp).
    pub header_regexps: BTreeMap<String, Vec<String>>,

    /// Generic predicates, in source order.
    pub predicates: Vec<Predicate>,

    /// Filter chain, in execution order.
    pub filters: Vec<Filter>,

    /// Backend address for [`BackendType::Network`] routes.
    pub backend: String,

    /// Backend kind. Must agree with `shunt`: shunted routes carry
    /// either the flag or the Shunt kind, and consumers honor both.
    pub backend_type: BackendType,

    /// Legacy shunt flag, kept in sync with `backend_type` by the parser.
    pub shunt: bool,
}

impl Route {
    /// True if this route terminates processing without a network backend.
    pub fn is_shunt(&self) -> bool {
        self.shunt || self.backend_type == BackendType::Shunt
    }

    /// Serializes the route expression, omitting the route id.
    pub fn print(&self, pretty: bool) -> String {
        print::print_route(self, pretty)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.print(false))
    }
}
