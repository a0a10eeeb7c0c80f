//! Abstract Syntax Tree types for the network DSL.

use std::fmt;

use serde::Serialize;

use crate::solver::Color;

/// A position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SourcePos {
    /// Byte offset from the start of the source
    pub offset: usize,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed, in characters)
    pub column: usize,
}

impl SourcePos {
    /// Position of the first character of a source.
    pub const START: SourcePos = SourcePos {
        offset: 0,
        line: 1,
        column: 1,
    };
}

/// A half-open range of source text, suitable for caret highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: SourcePos,
    pub end: SourcePos,
}

impl Span {
    /// Create a span between two positions.
    pub fn new(start: SourcePos, end: SourcePos) -> Self {
        Self { start, end }
    }

    /// A span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.start.line, self.start.column)
    }
}

/// A parsed source file: one or more network definitions.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub networks: Vec<NetworkDef>,
}

impl Program {
    /// Look up a definition by name.
    pub fn find(&self, name: &str) -> Option<&NetworkDef> {
        self.networks.iter().find(|n| n.name == name)
    }

    /// The network that is instantiated at the top level: `Main` if defined,
    /// otherwise the first definition.
    pub fn entry(&self) -> Option<&NetworkDef> {
        self.find(ENTRY_NETWORK).or_else(|| self.networks.first())
    }
}

/// Name of the preferred top-level network.
pub const ENTRY_NETWORK: &str = "Main";

/// A named network (sub-network template) definition.
#[derive(Debug, Clone)]
pub struct NetworkDef {
    /// Network name
    pub name: String,
    /// Formal parameters, bound to wires or signals at instantiation
    pub params: Vec<String>,
    /// Statements in declaration order
    pub body: Vec<Statement>,
    /// Span of the definition header
    pub span: Span,
}

/// A statement inside a network body.
#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum StatementKind {
    /// `{sig: value, ...} -> WIRES`, optionally prefixed with `toggle` or `pulse`
    Constant {
        mode: ConstantMode,
        values: Vec<(String, i64)>,
        outputs: Vec<String>,
    },
    /// `WIRES -> left op right as|then output -> WIRES`
    Binary {
        inputs: Vec<String>,
        expr: Expr,
        outputs: Vec<String>,
    },
    /// `WIRES -> display signal`
    Display { inputs: Vec<String>, signal: String },
    /// `Name(formal=actual, ...)`
    Instantiate { name: String, bindings: Vec<Binding> },
    /// `red WIRES` or `green WIRES`
    ForceColor { color: Color, wires: Vec<String> },
    /// `# text`, level is the number of leading `#`
    Label { text: String, level: u8 },
}

/// How a constant statement is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantMode {
    /// Always on
    Constant,
    /// On while switched on from outside
    Toggle,
    /// On for a single tick after being switched on
    Pulse,
}

/// `formal=actual` inside an instantiation.
#[derive(Debug, Clone)]
pub struct Binding {
    pub formal: String,
    pub actual: String,
    pub span: Span,
}

/// The expression part of a binary statement.
#[derive(Debug, Clone)]
pub struct Expr {
    pub left: Operand,
    pub op: Operator,
    pub right: Operand,
    /// Output signal or special output keyword
    pub output: String,
    /// `then 1 as X` rather than `then X`
    pub as_one: bool,
    pub span: Span,
}

/// An operand: a signal name (possibly a special keyword) or a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Signal(String),
    Literal(i64),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Signal(s) => write!(f, "{}", s),
            Operand::Literal(v) => write!(f, "{}", v),
        }
    }
}

/// Arithmetic and comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shr,
    Shl,
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl Operator {
    /// Parse an operator from its DSL symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Rem,
            "&" => Self::And,
            "|" => Self::Or,
            "^" => Self::Xor,
            ">>" => Self::Shr,
            "<<" => Self::Shl,
            "<" => Self::Lt,
            "<=" => Self::Le,
            "=" => Self::Eq,
            "!=" => Self::Ne,
            ">=" => Self::Ge,
            ">" => Self::Gt,
            _ => return None,
        })
    }

    /// The DSL symbol for this operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::Shr => ">>",
            Self::Shl => "<<",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Ge => ">=",
            Self::Gt => ">",
        }
    }

    /// Whether this operator belongs to decider combinators.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Lt | Self::Le | Self::Eq | Self::Ne | Self::Ge | Self::Gt
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Reserved signal names with special reduction semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialSignal {
    /// Every present signal, independently
    Each,
    /// True if the condition holds for at least one present signal
    Any,
    /// True if the condition holds for every present signal
    All,
}

impl SpecialSignal {
    /// Recognize a special signal keyword, including the long aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "each" => Some(Self::Each),
            "any" | "anything" => Some(Self::Any),
            "all" | "everything" => Some(Self::All),
            _ => None,
        }
    }
}
