//! Lexer (tokenizer) for the network DSL.

use super::ast::{SourcePos, Span};
use crate::error::{CnideError, Result};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's text
    pub text: String,
    /// Where the token appears in the source
    pub span: Span,
}

/// Token types in the DSL.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A network, wire, signal or keyword name
    Identifier,
    /// An unsigned integer literal (sign is handled by the parser)
    Integer,
    /// Arithmetic or comparison operator other than `=`
    Operator,
    /// `->`
    Arrow,
    /// `=`, both the binding sign and the equality comparison
    Equals,
    /// `{`
    OpenBrace,
    /// `}`
    CloseBrace,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `#` heading; the text holds the label and the level is the `#` count
    Heading(u8),
    /// End of file
    Eof,
}

/// Lexer for tokenizing network DSL input.
pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments()?;

        let start = self.pos();
        let ch = match self.peek_char() {
            Some(ch) => ch,
            None => {
                return Ok(Token {
                    kind: TokenKind::Eof,
                    text: String::new(),
                    span: Span::new(start, start),
                });
            }
        };

        let kind = match ch {
            '{' => self.single(TokenKind::OpenBrace),
            '}' => self.single(TokenKind::CloseBrace),
            '(' => self.single(TokenKind::OpenParen),
            ')' => self.single(TokenKind::CloseParen),
            ',' => self.single(TokenKind::Comma),
            ':' => self.single(TokenKind::Colon),
            '+' | '*' | '/' | '%' | '&' | '|' | '^' => self.single(TokenKind::Operator),
            '-' => {
                self.advance();
                if self.peek_char() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    TokenKind::Operator
                }
            }
            '=' => self.single(TokenKind::Equals),
            '!' => {
                self.advance();
                if self.peek_char() != Some('=') {
                    return Err(CnideError::syntax(
                        "expected '=' after '!'",
                        Span::new(start, self.pos()),
                    ));
                }
                self.advance();
                TokenKind::Operator
            }
            '<' | '>' => {
                self.advance();
                match self.peek_char() {
                    Some('=') => {
                        self.advance();
                    }
                    Some(next) if next == ch => {
                        self.advance();
                    }
                    _ => {}
                }
                TokenKind::Operator
            }
            '#' => {
                let mut level = 0u8;
                while self.peek_char() == Some('#') {
                    self.advance();
                    level = level.saturating_add(1);
                }
                let text_start = self.pos().offset;
                while let Some(c) = self.peek_char() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                let text = self.input[text_start..self.pos().offset].trim().to_string();
                return Ok(Token {
                    kind: TokenKind::Heading(level),
                    text,
                    span: Span::new(start, self.pos()),
                });
            }
            '0'..='9' => {
                while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
                if matches!(self.peek_char(), Some(c) if c.is_alphabetic() || c == '_') {
                    return Err(CnideError::syntax(
                        "identifiers cannot start with a digit",
                        Span::new(start, self.pos()),
                    ));
                }
                TokenKind::Integer
            }
            _ if ch.is_alphabetic() || ch == '_' => {
                self.read_identifier();
                TokenKind::Identifier
            }
            _ => {
                self.advance();
                return Err(CnideError::syntax(
                    format!("unexpected character '{}'", ch),
                    Span::new(start, self.pos()),
                ));
            }
        };

        let end = self.pos();
        Ok(Token {
            kind,
            text: self.input[start.offset..end.offset].to_string(),
            span: Span::new(start, end),
        })
    }

    fn pos(&mut self) -> SourcePos {
        let offset = self
            .chars
            .peek()
            .map(|&(pos, _)| pos)
            .unwrap_or(self.input.len());
        SourcePos {
            offset,
            line: self.line,
            column: self.column,
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, ch)| ch)
    }

    /// The character after the next one.
    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, ch)| ch)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn advance(&mut self) -> Option<char> {
        let (_, ch) = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '/' && self.peek_second() == Some('/') {
                while let Some(c) = self.peek_char() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else if ch == '/' && self.peek_second() == Some('*') {
                let start = self.pos();
                self.advance();
                self.advance();
                loop {
                    match self.advance() {
                        Some('*') if self.peek_char() == Some('/') => {
                            self.advance();
                            break;
                        }
                        Some(_) => {}
                        None => {
                            return Err(CnideError::syntax(
                                "unterminated block comment",
                                Span::new(start, self.pos()),
                            ));
                        }
                    }
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    fn read_identifier(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }
}
