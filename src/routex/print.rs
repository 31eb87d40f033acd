//! Canonical printer for route expressions.
//!
//! # Responsibilities
//! - Render a Route (or an ordered batch) as route-expression text
//! - Compact form for persistence and diffing, pretty form for humans
//!
//! # Design Decisions
//! - Built-in predicates always print first, in a fixed order, so output is
//!   canonical for a given Route value
//! - Printing never fails: any Route value is representable as text
//! - A single unnamed route prints without the `id:` prefix; batches and
//!   named routes always carry it

use super::escape::escape;
use super::{Arg, BackendType, Route};

/// Renders one argument list, comma-space joined.
///
/// Integral numbers print without decimals. This is a display heuristic,
/// not a type distinction: `3.0` and `3` are the same value after parsing.
fn args_string(args: &[Arg]) -> String {
    let rendered: Vec<String> = args
        .iter()
        .map(|a| match a {
            Arg::Number(n) if n.fract() == 0.0 && n.is_finite() => format!("{n:.0}"),
            Arg::Number(n) => format!("{n}"),
            Arg::String(s) => format!("\"{}\"", escape(s, &['"'])),
        })
        .collect();
    rendered.join(", ")
}

fn predicate_string(route: &Route) -> String {
    let mut predicates = Vec::new();

    if !route.path.is_empty() {
        predicates.push(format!("Path(\"{}\")", escape(&route.path, &['"'])));
    }

    for h in &route.host_regexps {
        predicates.push(format!("Host(/{}/)", escape(h, &['/'])));
    }

    for p in &route.path_regexps {
        predicates.push(format!("PathRegexp(/{}/)", escape(p, &['/'])));
    }

    if !route.method.is_empty() {
        predicates.push(format!("Method(\"{}\")", escape(&route.method, &['"'])));
    }

    for (k, v) in &route.headers {
        predicates.push(format!(
            "Header(\"{}\", \"{}\")",
            escape(k, &['"']),
            escape(v, &['"'])
        ));
    }

    for (k, regexps) in &route.header_regexps {
        for rx in regexps {
            predicates.push(format!(
                "HeaderRegexp(\"{}\", /{}/)",
                escape(k, &['"']),
                escape(rx, &['/'])
            ));
        }
    }

    for p in &route.predicates {
        if p.name != "Any" {
            predicates.push(format!("{}({})", p.name, args_string(&p.args)));
        }
    }

    if predicates.is_empty() {
        return "*".to_string();
    }

    predicates.join(" && ")
}

fn filter_string(route: &Route, pretty: bool) -> String {
    let filters: Vec<String> = route
        .filters
        .iter()
        .map(|f| format!("{}({})", f.name, args_string(&f.args)))
        .collect();
    if pretty {
        filters.join("\n  -> ")
    } else {
        filters.join(" -> ")
    }
}

fn backend_string(route: &Route) -> String {
    if route.is_shunt() {
        return "<shunt>".to_string();
    }
    match route.backend_type {
        BackendType::Loopback => "<loopback>".to_string(),
        _ => route.backend.clone(),
    }
}

fn backend_string_quoted(route: &Route) -> String {
    let s = backend_string(route);
    if route.backend_type == BackendType::Network && !route.shunt {
        format!("\"{s}\"")
    } else {
        s
    }
}

/// Serializes one route expression, omitting the route id.
pub fn print_route(route: &Route, pretty: bool) -> String {
    let mut parts = vec![predicate_string(route)];

    let filters = filter_string(route, pretty);
    if !filters.is_empty() {
        parts.push(filters);
    }

    parts.push(backend_string_quoted(route));

    let separator = if pretty { "\n  -> " } else { " -> " };
    parts.join(separator)
}

/// Serializes a batch of routes.
///
/// A single unnamed route prints bare; otherwise every route prints as
/// `id: expression` and routes are separated by `;\n`.
pub fn print_routes(routes: &[Route], pretty: bool) -> String {
    if routes.len() == 1 && routes[0].id.is_empty() {
        return print_route(&routes[0], pretty);
    }

    let rendered: Vec<String> = routes
        .iter()
        .map(|r| format!("{}: {}", r.id, print_route(r, pretty)))
        .collect();
    rendered.join(";\n")
}

#[cfg(test)]
mod tests {
    use super::super::{Filter, Predicate};
    use super::*;

    fn network(addr: &str) -> Route {
        Route {
            backend: addr.to_string(),
            ..Route::default()
        }
    }

    #[test]
    fn test_wildcard_route() {
        let r = network("https://example.org");
        assert_eq!(r.print(false), "* -> \"https://example.org\"");
    }

    #[test]
    fn test_builtin_predicate_order() {
        let mut r = network("https://example.org");
        r.method = "GET".to_string();
        r.path = "/foo".to_string();
        r.host_regexps = vec!["example[.]org".to_string()];
        assert_eq!(
            r.print(false),
            "Path(\"/foo\") && Host(/example[.]org/) && Method(\"GET\") \
             -> \"https://example.org\""
        );
    }

    #[test]
    fn test_header_predicates() {
        let mut r = network("https://example.org");
        r.headers.insert("X-Test".to_string(), "v".to_string());
        r.header_regexps
            .insert("Accept".to_string(), vec!["json".to_string()]);
        assert_eq!(
            r.print(false),
            "Header(\"X-Test\", \"v\") && HeaderRegexp(\"Accept\", /json/) \
             -> \"https://example.org\""
        );
    }

    #[test]
    fn test_any_predicate_suppressed() {
        let mut r = network("https://example.org");
        r.predicates.push(Predicate::new("Any", vec![]));
        assert_eq!(r.print(false), "* -> \"https://example.org\"");
    }

    #[test]
    fn test_filter_chain_compact_and_pretty() {
        let mut r = network("https://example.org");
        r.filters.push(Filter::new("setPath", vec!["/bar".into()]));
        r.filters.push(Filter::new("flowId", vec![]));
        assert_eq!(
            r.print(false),
            "* -> setPath(\"/bar\") -> flowId() -> \"https://example.org\""
        );
        assert_eq!(
            r.print(true),
            "*\n  -> setPath(\"/bar\")\n  -> flowId()\n  -> \"https://example.org\""
        );
    }

    #[test]
    fn test_numeric_args() {
        let mut r = network("https://example.org");
        r.filters.push(Filter::new(
            "redirectTo",
            vec![301.0.into(), "/new".into()],
        ));
        r.filters.push(Filter::new("backendTimeout", vec![3.5.into()]));
        assert_eq!(
            r.print(false),
            "* -> redirectTo(301, \"/new\") -> backendTimeout(3.5) \
             -> \"https://example.org\""
        );
    }

    #[test]
    fn test_shunt_and_loopback_backends() {
        let mut shunt = Route::default();
        shunt.shunt = true;
        shunt.backend = "https://ignored.example".to_string();
        assert_eq!(shunt.print(false), "* -> <shunt>");

        let mut lb = Route::default();
        lb.backend_type = BackendType::Loopback;
        assert_eq!(lb.print(false), "* -> <loopback>");
    }

    #[test]
    fn test_string_escaping_in_args() {
        let mut r = network("https://example.org");
        r.path = "/say \"hi\"".to_string();
        assert_eq!(
            r.print(false),
            "Path(\"/say \\\"hi\\\"\") -> \"https://example.org\""
        );
    }

    #[test]
    fn test_batch_id_elision() {
        let unnamed = network("https://example.org");
        assert_eq!(
            print_routes(std::slice::from_ref(&unnamed), false),
            "* -> \"https://example.org\""
        );

        let mut named = unnamed.clone();
        named.id = "r1".to_string();
        assert_eq!(
            print_routes(std::slice::from_ref(&named), false),
            "r1: * -> \"https://example.org\""
        );

        let mut second = network("https://other.example");
        second.id = "r2".to_string();
        assert_eq!(
            print_routes(&[named, second], false),
            "r1: * -> \"https://example.org\";\nr2: * -> \"https://other.example\""
        );
    }
}
