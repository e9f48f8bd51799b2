// Lexer for query text using logos
// Words are greedy: '-' joins a word when it follows word characters, so
// `lib-static` is one token while a spaced ` - ` is the except operator.

use logos::Logos;
use std::ops::Range;

/// Token kinds produced by the query lexer
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,

    // Infix set operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("^")]
    Caret,

    #[regex(r"[0-9]+", priority = 3)]
    Integer,

    // Quoted words keep their quotes in the token text; the parser strips them
    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r#"'([^'\\]|\\.)*'"#)]
    QuotedWord,

    // Bare words: target patterns, function names, attribute names.
    // A word cannot start with '-' but may contain it.
    #[regex(r"[A-Za-z0-9_/:.@~*$%=#][A-Za-z0-9_/:.@~*$%=#\-]*", priority = 2)]
    Word,

    /// Unrecognized input
    Error,

    /// End of query text
    Eof,
}

/// A lexed token with its source text and span
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Range<usize>,
}

/// Tokenize query text. Always ends with an EOF token; unrecognized input
/// becomes an `Error` token rather than aborting, so the parser can report
/// a positioned diagnostic.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = TokenKind::lexer(input);
    let mut tokens = Vec::new();

    while let Some(kind) = lexer.next() {
        let kind = kind.unwrap_or(TokenKind::Error);
        tokens.push(Token {
            kind,
            text: lexer.slice().to_string(),
            span: lexer.span(),
        });
    }

    let len = input.len();
    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        span: len..len,
    });

    tokens
}
