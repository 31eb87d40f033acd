//! Round-trip properties of the route expression language.
//!
//! For every well-formed route value, printing and reparsing must yield the
//! same value; for canonical text, reparsing and reprinting must yield the
//! same text.

use routegate::routex::{parse, print_routes, Arg, BackendType, Filter, Predicate, Route};

/// Canonical expressions: parse then print must reproduce them exactly.
const CANONICAL: &[&str] = &[
    "* -> <shunt>",
    "* -> <loopback>",
    "* -> \"https://example.org\"",
    "Path(\"/foo\") -> \"https://example.org\"",
    "Path(\"/foo\") && Method(\"GET\") -> setPath(\"/bar\") -> \"https://example.org\"",
    "Host(/^www[.]example[.]org$/) && PathRegexp(/^\\/api\\//) -> <shunt>",
    "Header(\"X-Tenant\", \"blue\") && HeaderRegexp(\"Accept\", /json/) -> \"http://b.example\"",
    "After(3, \"x\") && Weekdays() -> flowId(\"reuse\") -> redirectTo(301, \"/new\") -> <shunt>",
    "Path(\"/say \\\"hi\\\"\") -> <shunt>",
    "* -> backendTimeout(3.5) -> retryAfter(30) -> \"http://e.org\"",
    "r1: Path(\"/a\") -> <shunt>;\nr2: * -> <loopback>",
    "a: * -> <shunt>;\nb: Method(\"POST\") -> flowId() -> \"http://b.example\"",
];

#[test]
fn test_canonical_text_round_trips() {
    for text in CANONICAL {
        let routes = parse(text).unwrap_or_else(|e| panic!("{text}: {e}"));
        assert_eq!(&print_routes(&routes, false), text, "reprint of {text:?}");

        // Pretty printing must reparse to the same values.
        let pretty = print_routes(&routes, true);
        assert_eq!(parse(&pretty).unwrap(), routes, "pretty reparse of {text:?}");
    }
}

#[test]
fn test_value_round_trips() {
    let mut route = Route {
        id: String::new(),
        path: "/dashboard".to_string(),
        method: "GET".to_string(),
        backend: "https://internal.example:8443".to_string(),
        backend_type: BackendType::Network,
        ..Route::default()
    };
    route.host_regexps.push("^admin[.]".to_string());
    route.path_regexps.push(r"\.html$".to_string());
    route
        .headers
        .insert("X-Tenant".to_string(), "blue".to_string());
    route
        .header_regexps
        .insert("Accept".to_string(), vec!["json".to_string(), "html".to_string()]);
    route.predicates.push(Predicate::new(
        "QueryParam",
        vec![Arg::String("debug".to_string())],
    ));
    route.filters.push(Filter::new(
        "redirectTo",
        vec![Arg::Number(308.0), Arg::String("/x".to_string())],
    ));

    let reparsed = parse(&route.print(false)).unwrap();
    assert_eq!(reparsed, vec![route]);
}

#[test]
fn test_wildcard_round_trip() {
    let route = Route {
        shunt: true,
        backend_type: BackendType::Shunt,
        ..Route::default()
    };
    let text = route.print(false);
    assert_eq!(text, "* -> <shunt>");
    let reparsed = parse(&text).unwrap();
    assert!(reparsed[0].predicates.is_empty());
    assert!(reparsed[0].path.is_empty());
}

#[test]
fn test_numeric_display_heuristic() {
    // 3.0 prints as 3 and reparses as the same value.
    let route = Route {
        filters: vec![Filter::new("limit", vec![Arg::Number(3.0)])],
        shunt: true,
        backend_type: BackendType::Shunt,
        ..Route::default()
    };
    let text = route.print(false);
    assert_eq!(text, "* -> limit(3) -> <shunt>");
    assert_eq!(parse(&text).unwrap(), vec![route]);

    let route = Route {
        filters: vec![Filter::new("limit", vec![Arg::Number(3.5)])],
        shunt: true,
        backend_type: BackendType::Shunt,
        ..Route::default()
    };
    assert_eq!(route.print(false), "* -> limit(3.5) -> <shunt>");
}

#[test]
fn test_negative_numeric_args_round_trip() {
    let route = Route {
        filters: vec![Filter::new(
            "clockSkew",
            vec![Arg::Number(-3.0), Arg::Number(-0.5)],
        )],
        shunt: true,
        backend_type: BackendType::Shunt,
        ..Route::default()
    };
    let text = route.print(false);
    assert_eq!(text, "* -> clockSkew(-3, -0.5) -> <shunt>");
    assert_eq!(parse(&text).unwrap(), vec![route]);
}

#[test]
fn test_escaped_strings_round_trip() {
    let awkward = [
        r#"quote " slash / backslash \ end"#,
        r"\\double\\",
        "tab\tand space",
    ];
    for value in awkward {
        let route = Route {
            filters: vec![Filter::new("setHeader", vec![Arg::String(value.to_string())])],
            shunt: true,
            backend_type: BackendType::Shunt,
            ..Route::default()
        };
        let reparsed = parse(&route.print(false)).unwrap();
        assert_eq!(reparsed, vec![route], "round trip of {value:?}");
    }
}

#[test]
fn test_batch_id_prefix_rules() {
    // Single unnamed route: no prefix.
    let unnamed = parse("* -> <shunt>").unwrap();
    assert_eq!(print_routes(&unnamed, false), "* -> <shunt>");

    // Single named route: prefix stays.
    let named = parse("only: * -> <shunt>").unwrap();
    assert_eq!(print_routes(&named, false), "only: * -> <shunt>");

    // Multiple routes: always prefixed, ';\n' separated, even when unnamed.
    let batch = parse("* -> <shunt>; * -> <loopback>").unwrap();
    assert_eq!(print_routes(&batch, false), ": * -> <shunt>;\n: * -> <loopback>");
}

#[test]
fn test_any_only_route_prints_wildcard() {
    let routes = parse("Any() -> <shunt>").unwrap();
    assert_eq!(routes[0].predicates.len(), 1);
    assert_eq!(print_routes(&routes, false), "* -> <shunt>");
}
