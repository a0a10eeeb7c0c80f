//! DSL (Domain Specific Language) parser for combinator networks.
//!
//! A source file holds one or more named network definitions. Each body is a
//! list of statements that wire combinators together through named wires.
//! Whitespace, including newlines, is insignificant.
//!
//! # Grammar Overview
//!
//! ```text
//! program       = definition { definition }
//! definition    = IDENT '(' [ IDENT { ',' IDENT } ] ')' '{' { statement } '}'
//! statement     = constant | binary | display | instantiation | force_color | label
//! constant      = [ 'toggle' | 'pulse' ] '{' [ IDENT ':' INT { ',' IDENT ':' INT } ] '}' '->' wires
//! binary        = wires '->' operand OP operand ( 'as' | 'then' [ '1' 'as' ] ) IDENT '->' wires
//! display       = wires '->' 'display' IDENT
//! instantiation = IDENT '(' [ IDENT '=' IDENT { ',' IDENT '=' IDENT } ] ')'
//! force_color   = ( 'red' | 'green' ) wires
//! label         = '#' { '#' } text-to-end-of-line
//! wires         = IDENT | '(' IDENT { ',' IDENT } ')'
//! operand       = IDENT | INT
//! INT           = [ '-' ] digit { digit }
//! ```
//!
//! Comments are `// ...` to end of line and `/* ... */`.
//!
//! # Operators
//!
//! | Kind | Operators | Keyword |
//! |------|-----------|---------|
//! | Arithmetic | `+ - * / % & \| ^ >> <<` | `as` |
//! | Decider | `< <= = != >= >` | `then` |
//!
//! The left operand may be `each`, `any`/`anything` or `all`/`everything`.
//! The output may be `each` or `all`/`everything`.
//!
//! # Example
//!
//! ```text
//! Main() {
//!   # Halve and count
//!   {a: 42} -> ALPHA
//!   Half(IN=ALPHA, OUT=OMEGA, sig=a)
//!   OMEGA -> display b
//! }
//!
//! Half(IN, OUT, sig) {
//!   IN -> sig / 2 as b -> OUT
//! }
//! ```

mod ast;
mod lexer;
mod parser;

pub use ast::*;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::error::Result;

/// Parse network DSL source into an AST.
pub fn parse(input: &str) -> Result<Program> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse()
}

/// Parse a network DSL file.
#[cfg(feature = "cli")]
pub fn parse_file(path: &std::path::Path) -> Result<Program> {
    let content = std::fs::read_to_string(path).map_err(|e| crate::error::CnideError::FileRead {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&content)
}
