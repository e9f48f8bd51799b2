//! Query text parser
//!
//! Recursive descent over the lexed tokens. The parser is registry driven:
//! each function's declared argument-type vector decides, per position,
//! whether a bare token becomes a word, an integer, or a nested
//! expression. Arity and argument types are enforced here, before any
//! environment access.
//!
//! Infix `+`, `^`, `-` (and the spelled-out `union`, `intersect`,
//! `except`) share one precedence level, associate left, and desugar to
//! the equivalent function applications.

use crate::error::{QueryError, QueryResult};
use crate::expr::{Argument, ArgumentType, QueryExpr};
use crate::functions::{self, FunctionRegistry};
use crate::lexer::{self, Token, TokenKind};

/// Query parser over a function registry
pub struct QueryParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    registry: &'a FunctionRegistry,
}

impl<'a> QueryParser<'a> {
    /// Parse a query string into an expression
    pub fn parse(query: &str, registry: &'a FunctionRegistry) -> QueryResult<QueryExpr> {
        let mut parser = Self {
            tokens: lexer::tokenize(query),
            pos: 0,
            registry,
        };
        let expr = parser.parse_expr()?;
        parser.expect_eof()?;
        Ok(expr)
    }

    fn parse_expr(&mut self) -> QueryResult<QueryExpr> {
        let mut lhs = self.parse_primary()?;

        while let Some(op) = self.peek_operator() {
            self.bump();
            let rhs = self.parse_primary()?;
            lhs = QueryExpr::function(
                op,
                vec![Argument::Expression(lhs), Argument::Expression(rhs)],
            );
        }

        Ok(lhs)
    }

    /// The set-operator name if the current token is one, `None` otherwise
    fn peek_operator(&self) -> Option<&'static str> {
        let token = self.peek();
        match token.kind {
            TokenKind::Plus => Some("union"),
            TokenKind::Caret => Some("intersect"),
            TokenKind::Minus => Some("except"),
            TokenKind::Word => match token.text.as_str() {
                "union" => Some("union"),
                "intersect" => Some("intersect"),
                "except" => Some("except"),
                _ => None,
            },
            _ => None,
        }
    }

    fn parse_primary(&mut self) -> QueryResult<QueryExpr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::LParen => {
                self.bump();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen, "expected ')'")?;
                Ok(expr)
            }
            TokenKind::Word if self.peek_ahead(1).kind == TokenKind::LParen => {
                self.parse_function_call()
            }
            TokenKind::Word | TokenKind::Integer => {
                self.bump();
                Ok(QueryExpr::pattern(token.text))
            }
            TokenKind::QuotedWord => {
                self.bump();
                Ok(QueryExpr::pattern(unquote(&token.text)))
            }
            TokenKind::Eof => Err(self.error_at(&token, "unexpected end of query")),
            _ => Err(self.error_at(&token, &format!("unexpected token '{}'", token.text))),
        }
    }

    fn parse_function_call(&mut self) -> QueryResult<QueryExpr> {
        let name_token = self.peek().clone();
        let name = name_token.text.clone();
        let function = self
            .registry
            .get(name.as_str())
            .ok_or_else(|| QueryError::UnknownFunction(name.clone()))?;
        self.bump(); // name
        self.bump(); // '('

        let types = function.argument_types();
        let mut args = Vec::new();

        if self.peek().kind != TokenKind::RParen {
            loop {
                let expected = expected_type(types, args.len());
                let arg = self.parse_argument(function.name(), args.len(), expected)?;
                args.push(arg);

                match self.peek().kind {
                    TokenKind::Comma => {
                        self.bump();
                    }
                    TokenKind::RParen => break,
                    // Word-typed variadic arguments (set(...)) may also be
                    // separated by bare whitespace.
                    TokenKind::Word | TokenKind::QuotedWord | TokenKind::Integer
                        if expected_type(types, args.len()) == ArgumentType::Word => {}
                    _ => {
                        let token = self.peek().clone();
                        return Err(
                            self.error_at(&token, &format!("expected ',' or ')' in {name}()"))
                        );
                    }
                }
            }
        }

        self.expect(TokenKind::RParen, &format!("missing ')' in {name}()"))?;
        functions::validate_arguments(function, &args)?;

        Ok(QueryExpr::Function { name, args })
    }

    fn parse_argument(
        &mut self,
        function: &str,
        position: usize,
        expected: ArgumentType,
    ) -> QueryResult<Argument> {
        let token = self.peek().clone();
        match expected {
            ArgumentType::Word => match token.kind {
                // A nested call cannot stand in for a word
                TokenKind::Word if self.peek_ahead(1).kind == TokenKind::LParen => {
                    Err(QueryError::ArgumentType {
                        function: function.to_string(),
                        position,
                        expected,
                        got: ArgumentType::Expression,
                        text: token.text,
                    })
                }
                TokenKind::Word | TokenKind::Integer => {
                    self.bump();
                    Ok(Argument::Word(token.text))
                }
                TokenKind::QuotedWord => {
                    self.bump();
                    Ok(Argument::Word(unquote(&token.text)))
                }
                _ => Err(self.error_at(
                    &token,
                    &format!("expected a word as argument {position} of {function}()"),
                )),
            },
            ArgumentType::Integer => match token.kind {
                TokenKind::Integer => {
                    let value = token.text.parse::<u64>().map_err(|_| {
                        self.error_at(&token, &format!("integer '{}' out of range", token.text))
                    })?;
                    self.bump();
                    Ok(Argument::Integer(value))
                }
                TokenKind::Word | TokenKind::QuotedWord => Err(QueryError::ArgumentType {
                    function: function.to_string(),
                    position,
                    expected,
                    got: ArgumentType::Word,
                    text: token.text,
                }),
                _ => Err(self.error_at(
                    &token,
                    &format!("expected an integer as argument {position} of {function}()"),
                )),
            },
            ArgumentType::Expression => Ok(Argument::Expression(self.parse_expr()?)),
        }
    }

    fn peek(&self) -> &Token {
        self.peek_ahead(0)
    }

    fn peek_ahead(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn bump(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> QueryResult<()> {
        let token = self.peek().clone();
        if token.kind == kind {
            self.bump();
            Ok(())
        } else {
            Err(self.error_at(&token, message))
        }
    }

    fn expect_eof(&self) -> QueryResult<()> {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            Ok(())
        } else {
            Err(self.error_at(
                token,
                &format!("unexpected trailing input '{}'", token.text),
            ))
        }
    }

    fn error_at(&self, token: &Token, message: &str) -> QueryError {
        QueryError::Parse {
            message: message.to_string(),
            offset: token.span.start,
        }
    }
}

/// Declared type for the argument at `position`; the final type repeats
/// for variadic functions
fn expected_type(types: &[ArgumentType], position: usize) -> ArgumentType {
    types
        .get(position.min(types.len().saturating_sub(1)))
        .copied()
        .unwrap_or(ArgumentType::Expression)
}

/// Strip matching single or double quotes
fn unquote(s: &str) -> String {
    if s.len() >= 2
        && ((s.starts_with('\'') && s.ends_with('\'')) || (s.starts_with('"') && s.ends_with('"')))
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}
