//! Parser for route expression batches.
//!
//! # Responsibilities
//! - Turn a batch text into Route values, or fail with a positional error
//! - Reconcile built-in predicates into their dedicated Route fields
//! - Reject duplicate non-empty route ids within one batch
//!
//! # Design Decisions
//! - No partial recovery: callers get a complete batch or an error
//! - Pure function, no cross-call state; safe to call concurrently
//! - Exact semantic inverse of the printer: parse(print(r)) == [r]

use std::collections::HashSet;

use thiserror::Error;

use super::lexer::{LexError, Lexer, Pos, Token, TokenKind};
use super::{Arg, BackendType, Filter, Predicate, Route};

/// Error aborting the parse of a whole batch.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("expected {expected}, found {found} at {pos}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        pos: Pos,
    },

    #[error("invalid arguments for {name} at {pos}: {reason}")]
    InvalidBuiltinArgs {
        name: String,
        reason: &'static str,
        pos: Pos,
    },

    #[error("regexp literal not allowed as {name} argument at {pos}")]
    RegexpArgNotAllowed { name: String, pos: Pos },

    #[error("duplicate route id {id:?}")]
    DuplicateId { id: String },
}

/// Argument value as lexed, before the regexp form is reconciled away.
///
/// Regexp literals are only valid in the regexp positions of built-in
/// predicates; everywhere else only string and number survive, matching the
/// closed [`Arg`] variant set.
#[derive(Debug, Clone)]
enum RawArg {
    Str(String),
    Num(f64),
    Regexp(String),
}

/// Parses a batch of route definitions.
///
/// Returns every route in source order, or the first error encountered.
pub fn parse(text: &str) -> Result<Vec<Route>, ParseError> {
    let mut parser = Parser::new(text);
    let routes = parser.parse_batch()?;

    let mut seen = HashSet::new();
    for route in &routes {
        if !route.id.is_empty() && !seen.insert(route.id.as_str()) {
            return Err(ParseError::DuplicateId {
                id: route.id.clone(),
            });
        }
    }

    Ok(routes)
}

struct Parser {
    lexer: Lexer,
    // LIFO pushback for the two-token lookahead at `id:`.
    buffer: Vec<Token>,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            lexer: Lexer::new(text),
            buffer: Vec::new(),
        }
    }

    fn next(&mut self) -> Result<Token, ParseError> {
        match self.buffer.pop() {
            Some(token) => Ok(token),
            None => Ok(self.lexer.next_token()?),
        }
    }

    fn push_back(&mut self, token: Token) {
        self.buffer.push(token);
    }

    fn unexpected(expected: &'static str, token: Token) -> ParseError {
        ParseError::UnexpectedToken {
            expected,
            found: token.kind.describe(),
            pos: token.pos,
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, ParseError> {
        let token = self.next()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(Self::unexpected(expected, token))
        }
    }

    fn parse_batch(&mut self) -> Result<Vec<Route>, ParseError> {
        let mut routes = vec![self.parse_route_def()?];
        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::Eof => return Ok(routes),
                TokenKind::Semicolon => {
                    // Tolerate a trailing separator at end of input.
                    let after = self.next()?;
                    if after.kind == TokenKind::Eof {
                        return Ok(routes);
                    }
                    self.push_back(after);
                    routes.push(self.parse_route_def()?);
                }
                _ => return Err(Self::unexpected("';' or end of input", token)),
            }
        }
    }

    fn parse_route_def(&mut self) -> Result<Route, ParseError> {
        let mut route = Route::default();

        // Optional `id:` prefix needs two tokens of lookahead.
        let first = self.next()?;
        if let TokenKind::Ident(ref id) = first.kind {
            let second = self.next()?;
            if second.kind == TokenKind::Colon {
                route.id = id.clone();
            } else {
                self.push_back(second);
                self.push_back(first);
            }
        } else {
            self.push_back(first);
        }

        self.parse_predicate_clause(&mut route)?;
        self.parse_filters_and_backend(&mut route)?;
        Ok(route)
    }

    fn parse_predicate_clause(&mut self, route: &mut Route) -> Result<(), ParseError> {
        let token = self.next()?;
        if token.kind == TokenKind::Wildcard {
            return Ok(());
        }
        self.push_back(token);

        loop {
            self.parse_predicate(route)?;
            let token = self.next()?;
            if token.kind != TokenKind::And {
                self.push_back(token);
                return Ok(());
            }
        }
    }

    fn parse_predicate(&mut self, route: &mut Route) -> Result<(), ParseError> {
        let token = self.next()?;
        let TokenKind::Ident(name) = token.kind else {
            return Err(Self::unexpected("predicate name or '*'", token));
        };
        let pos = token.pos;
        let args = self.parse_arg_list()?;

        match name.as_str() {
            "Path" => route.path = one_string(&name, args, pos)?,
            "Host" => route.host_regexps.push(one_regexp(&name, args, pos)?),
            "PathRegexp" => route.path_regexps.push(one_regexp(&name, args, pos)?),
            "Method" => route.method = one_string(&name, args, pos)?,
            "Header" => {
                let (k, v) = two_strings(&name, args, pos)?;
                route.headers.insert(k, v);
            }
            "HeaderRegexp" => {
                let (k, rx) = string_and_regexp(&name, args, pos)?;
                route.header_regexps.entry(k).or_default().push(rx);
            }
            _ => {
                let args = plain_args(&name, args, pos)?;
                route.predicates.push(Predicate { name, args });
            }
        }
        Ok(())
    }

    fn parse_filters_and_backend(&mut self, route: &mut Route) -> Result<(), ParseError> {
        loop {
            self.expect(TokenKind::Arrow, "'->'")?;
            debug_assert!(self.buffer.is_empty());

            let token = match self.lexer.next_arrow_target() {
                Ok(token) => token,
                Err(e) => return Err(e.into()),
            };
            match token.kind {
                TokenKind::Ident(name) => {
                    let pos = token.pos;
                    let args = self.parse_arg_list()?;
                    let args = plain_args(&name, args, pos)?;
                    route.filters.push(Filter { name, args });
                }
                TokenKind::Str(url) | TokenKind::Url(url) => {
                    route.backend = url;
                    route.backend_type = BackendType::Network;
                    return Ok(());
                }
                TokenKind::Shunt => {
                    route.backend_type = BackendType::Shunt;
                    route.shunt = true;
                    return Ok(());
                }
                TokenKind::Loopback => {
                    route.backend_type = BackendType::Loopback;
                    return Ok(());
                }
                _ => return Err(Self::unexpected("filter or backend", token)),
            }
        }
    }

    fn parse_arg_list(&mut self) -> Result<Vec<(RawArg, Pos)>, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;

        let mut args = Vec::new();
        let token = self.next()?;
        if token.kind == TokenKind::RParen {
            return Ok(args);
        }
        self.push_back(token);

        loop {
            let token = self.next()?;
            let arg = match token.kind {
                TokenKind::Str(s) => RawArg::Str(s),
                TokenKind::Number(n) => RawArg::Num(n),
                TokenKind::Regexp(r) => RawArg::Regexp(r),
                _ => return Err(Self::unexpected("string, number or regexp", token)),
            };
            args.push((arg, token.pos));

            let token = self.next()?;
            match token.kind {
                TokenKind::Comma => continue,
                TokenKind::RParen => return Ok(args),
                _ => return Err(Self::unexpected("',' or ')'", token)),
            }
        }
    }
}

fn arity_error(name: &str, pos: Pos, reason: &'static str) -> ParseError {
    ParseError::InvalidBuiltinArgs {
        name: name.to_string(),
        reason,
        pos,
    }
}

fn one_string(name: &str, args: Vec<(RawArg, Pos)>, pos: Pos) -> Result<String, ParseError> {
    match <[_; 1]>::try_from(args) {
        Ok([(RawArg::Str(s), _)]) => Ok(s),
        Ok(_) => Err(arity_error(name, pos, "expected one string argument")),
        Err(_) => Err(arity_error(name, pos, "expected one string argument")),
    }
}

/// Regexp positions also accept a plain string, which is treated as the
/// regexp source.
fn one_regexp(name: &str, args: Vec<(RawArg, Pos)>, pos: Pos) -> Result<String, ParseError> {
    match <[_; 1]>::try_from(args) {
        Ok([(RawArg::Regexp(r), _)]) | Ok([(RawArg::Str(r), _)]) => Ok(r),
        Ok(_) | Err(_) => Err(arity_error(name, pos, "expected one regexp argument")),
    }
}

fn two_strings(
    name: &str,
    args: Vec<(RawArg, Pos)>,
    pos: Pos,
) -> Result<(String, String), ParseError> {
    match <[_; 2]>::try_from(args) {
        Ok([(RawArg::Str(a), _), (RawArg::Str(b), _)]) => Ok((a, b)),
        Ok(_) | Err(_) => Err(arity_error(name, pos, "expected two string arguments")),
    }
}

fn string_and_regexp(
    name: &str,
    args: Vec<(RawArg, Pos)>,
    pos: Pos,
) -> Result<(String, String), ParseError> {
    match <[_; 2]>::try_from(args) {
        Ok([(RawArg::Str(k), _), (RawArg::Regexp(r), _)])
        | Ok([(RawArg::Str(k), _), (RawArg::Str(r), _)]) => Ok((k, r)),
        Ok(_) | Err(_) => Err(arity_error(
            name,
            pos,
            "expected a string and a regexp argument",
        )),
    }
}

/// Converts generic predicate/filter arguments, rejecting regexp literals.
fn plain_args(name: &str, args: Vec<(RawArg, Pos)>, _pos: Pos) -> Result<Vec<Arg>, ParseError> {
    args.into_iter()
        .map(|(arg, pos)| match arg {
            RawArg::Str(s) => Ok(Arg::String(s)),
            RawArg::Num(n) => Ok(Arg::Number(n)),
            RawArg::Regexp(_) => Err(ParseError::RegexpArgNotAllowed {
                name: name.to_string(),
                pos,
            }),
        })
        .collect()
}
