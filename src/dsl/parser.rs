//! Parser for the network DSL.

use super::ast::*;
use super::lexer::{Lexer, Token, TokenKind};
use crate::error::{CnideError, Result};
use crate::solver::Color;

/// Recursive descent parser for network DSL source.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peeked: Option<Token>,
    /// End of the most recently consumed token
    last_end: SourcePos,
}

impl<'a> Parser<'a> {
    /// Create a new parser with the given lexer.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            peeked: None,
            last_end: SourcePos::START,
        })
    }

    /// Parse the entire source into a program.
    pub fn parse(&mut self) -> Result<Program> {
        let mut program = Program::default();

        while self.current.kind != TokenKind::Eof {
            let def = self.parse_definition()?;
            if program.find(&def.name).is_some() {
                return Err(CnideError::DuplicateNetwork {
                    name: def.name,
                    location: def.span,
                });
            }
            program.networks.push(def);
        }

        if program.networks.is_empty() {
            return Err(CnideError::syntax(
                "expected a network definition such as 'Main() { }'",
                self.current.span,
            ));
        }

        Ok(program)
    }

    fn advance(&mut self) -> Result<Token> {
        let next = match self.peeked.take() {
            Some(tok) => tok,
            None => self.lexer.next_token()?,
        };
        let previous = std::mem::replace(&mut self.current, next);
        self.last_end = previous.span.end;
        Ok(previous)
    }

    fn peek(&mut self) -> Result<&Token> {
        let tok = match self.peeked.take() {
            Some(tok) => tok,
            None => self.lexer.next_token()?,
        };
        Ok(self.peeked.insert(tok))
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if self.current.kind == kind {
            self.advance()
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<Token> {
        if self.at_keyword(keyword) {
            self.advance()
        } else {
            Err(self.unexpected(&format!("'{}'", keyword)))
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.current.kind == TokenKind::Identifier && self.current.text == keyword
    }

    fn unexpected(&self, expected: &str) -> CnideError {
        let found = match self.current.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.current.text),
        };
        CnideError::syntax(format!("expected {}, found {}", expected, found), self.current.span)
    }

    fn span_from(&self, start: SourcePos) -> Span {
        Span::new(start, self.last_end)
    }

    fn parse_definition(&mut self) -> Result<NetworkDef> {
        let start = self.current.span.start;
        let name = self.expect(TokenKind::Identifier, "a network name")?.text;
        self.expect(TokenKind::OpenParen, "'('")?;

        let mut params = Vec::new();
        while self.current.kind != TokenKind::CloseParen {
            let param = self.expect(TokenKind::Identifier, "a parameter name")?;
            if params.contains(&param.text) {
                return Err(CnideError::syntax(
                    format!("duplicate parameter '{}'", param.text),
                    param.span,
                ));
            }
            params.push(param.text);
            if self.current.kind != TokenKind::Comma {
                break;
            }
            self.advance()?;
        }
        self.expect(TokenKind::CloseParen, "')'")?;
        let span = self.span_from(start);

        self.expect(TokenKind::OpenBrace, "'{'")?;
        let mut body = Vec::new();
        while self.current.kind != TokenKind::CloseBrace {
            if self.current.kind == TokenKind::Eof {
                return Err(self.unexpected("'}'"));
            }
            body.push(self.parse_statement()?);
        }
        self.advance()?;

        Ok(NetworkDef {
            name,
            params,
            body,
            span,
        })
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let start = self.current.span.start;

        let kind = match self.current.kind.clone() {
            TokenKind::Heading(level) => {
                let tok = self.advance()?;
                StatementKind::Label {
                    text: tok.text,
                    level: level.min(3),
                }
            }
            TokenKind::OpenBrace => self.parse_constant(ConstantMode::Constant)?,
            TokenKind::OpenParen => self.parse_wired()?,
            TokenKind::Identifier => {
                let next = self.peek()?.kind.clone();
                let head = self.current.text.clone();
                match (head.as_str(), next) {
                    ("toggle", TokenKind::OpenBrace) => {
                        self.advance()?;
                        self.parse_constant(ConstantMode::Toggle)?
                    }
                    ("pulse", TokenKind::OpenBrace) => {
                        self.advance()?;
                        self.parse_constant(ConstantMode::Pulse)?
                    }
                    ("red" | "green", TokenKind::Identifier | TokenKind::OpenParen) => {
                        let color = if head == "red" {
                            Color::Red
                        } else {
                            Color::Green
                        };
                        self.advance()?;
                        let wires = self.parse_wires()?;
                        StatementKind::ForceColor { color, wires }
                    }
                    (_, TokenKind::OpenParen) => self.parse_instantiation()?,
                    _ => self.parse_wired()?,
                }
            }
            _ => return Err(self.unexpected("a statement")),
        };

        Ok(Statement {
            kind,
            span: self.span_from(start),
        })
    }

    /// `{sig: value, ...} -> WIRES`
    fn parse_constant(&mut self, mode: ConstantMode) -> Result<StatementKind> {
        self.expect(TokenKind::OpenBrace, "'{'")?;
        let mut values = Vec::new();
        while self.current.kind != TokenKind::CloseBrace {
            let signal = self.expect(TokenKind::Identifier, "a signal name")?;
            if SpecialSignal::from_name(&signal.text).is_some() {
                return Err(CnideError::syntax(
                    format!("'{}' cannot be used as a constant signal", signal.text),
                    signal.span,
                ));
            }
            self.expect(TokenKind::Colon, "':'")?;
            let value = self.parse_integer()?;
            values.push((signal.text, value));
            if self.current.kind != TokenKind::Comma {
                break;
            }
            self.advance()?;
        }
        self.expect(TokenKind::CloseBrace, "'}'")?;
        self.expect(TokenKind::Arrow, "'->'")?;
        let outputs = self.parse_wires()?;
        Ok(StatementKind::Constant {
            mode,
            values,
            outputs,
        })
    }

    /// Statements that begin with input wires: binary expressions and displays.
    fn parse_wired(&mut self) -> Result<StatementKind> {
        let inputs = self.parse_wires()?;
        self.expect(TokenKind::Arrow, "'->'")?;

        if self.at_keyword("display") && self.peek()?.kind == TokenKind::Identifier {
            self.advance()?;
            let signal = self.expect(TokenKind::Identifier, "a signal name")?.text;
            return Ok(StatementKind::Display { inputs, signal });
        }

        let expr = self.parse_expr()?;
        self.expect(TokenKind::Arrow, "'->'")?;
        let outputs = self.parse_wires()?;
        Ok(StatementKind::Binary {
            inputs,
            expr,
            outputs,
        })
    }

    /// `left op right as output` or `left cmp right then [1 as] output`
    fn parse_expr(&mut self) -> Result<Expr> {
        let start = self.current.span.start;
        let left = self.parse_operand()?;

        let op_token = match self.current.kind {
            TokenKind::Operator | TokenKind::Equals => self.advance()?,
            _ => return Err(self.unexpected("an operator")),
        };
        let op = Operator::from_symbol(&op_token.text).ok_or_else(|| {
            CnideError::syntax(format!("unknown operator '{}'", op_token.text), op_token.span)
        })?;

        let right = self.parse_operand()?;

        let mut as_one = false;
        if op.is_comparison() {
            self.expect_keyword("then")?;
            if self.current.kind == TokenKind::Integer {
                let one = self.advance()?;
                if one.text != "1" {
                    return Err(CnideError::syntax(
                        "a decider can only output its input count or 1",
                        one.span,
                    ));
                }
                self.expect_keyword("as")?;
                as_one = true;
            }
        } else {
            self.expect_keyword("as")?;
        }

        let output = self.expect(TokenKind::Identifier, "an output signal")?.text;

        Ok(Expr {
            left,
            op,
            right,
            output,
            as_one,
            span: self.span_from(start),
        })
    }

    fn parse_operand(&mut self) -> Result<Operand> {
        match self.current.kind {
            TokenKind::Identifier => Ok(Operand::Signal(self.advance()?.text)),
            TokenKind::Integer | TokenKind::Operator => Ok(Operand::Literal(self.parse_integer()?)),
            _ => Err(self.unexpected("a signal or a number")),
        }
    }

    /// `[-] digits`, rejecting values that do not fit in 64 bits.
    fn parse_integer(&mut self) -> Result<i64> {
        let start = self.current.span;
        let negative = if self.current.kind == TokenKind::Operator && self.current.text == "-" {
            self.advance()?;
            true
        } else {
            false
        };
        let digits = self.expect(TokenKind::Integer, "a number")?;
        let text = if negative {
            format!("-{}", digits.text)
        } else {
            digits.text
        };
        text.parse::<i64>().map_err(|_| {
            CnideError::syntax(
                format!("number {} is out of range", text),
                start.to(digits.span),
            )
        })
    }

    /// `WIRE` or `(WIRE, WIRE, ...)`
    fn parse_wires(&mut self) -> Result<Vec<String>> {
        if self.current.kind != TokenKind::OpenParen {
            let wire = self.expect(TokenKind::Identifier, "a wire name or '('")?;
            return Ok(vec![wire.text]);
        }
        self.advance()?;
        let mut wires = vec![self.expect(TokenKind::Identifier, "a wire name")?.text];
        while self.current.kind == TokenKind::Comma {
            self.advance()?;
            wires.push(self.expect(TokenKind::Identifier, "a wire name")?.text);
        }
        self.expect(TokenKind::CloseParen, "')'")?;
        Ok(wires)
    }

    /// `Name(formal=actual, ...)`
    fn parse_instantiation(&mut self) -> Result<StatementKind> {
        let name = self.expect(TokenKind::Identifier, "a network name")?.text;
        self.expect(TokenKind::OpenParen, "'('")?;
        let mut bindings = Vec::new();
        while self.current.kind != TokenKind::CloseParen {
            let formal = self.expect(TokenKind::Identifier, "a parameter name")?;
            self.expect(TokenKind::Equals, "'='")?;
            let actual = self.expect(TokenKind::Identifier, "a wire or signal name")?;
            bindings.push(Binding {
                formal: formal.text,
                actual: actual.text,
                span: formal.span.to(actual.span),
            });
            if self.current.kind != TokenKind::Comma {
                break;
            }
            self.advance()?;
        }
        self.expect(TokenKind::CloseParen, "')'")?;
        Ok(StatementKind::Instantiate { name, bindings })
    }
}
