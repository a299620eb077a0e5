use thiserror::Error;

use crate::ir::scope::ScopeSnapshot;
use crate::parser::lexer::Span;

/// Top-level error type for the lazyc pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}", format_error_pretty("syntax error", &format!("{}", _0)))]
    Parse(#[from] ParseError),

    #[error("{}", format_error_pretty("lowering error", &format!("{}", _0)))]
    Lower(#[from] LowerError),

    #[error("{}", format_error_pretty("codegen error", &format!("{}", _0)))]
    Codegen(#[from] CodegenError),

    #[error("{}", format_error_pretty("runtime error", &format!("{}", _0)))]
    Runtime(#[from] RuntimeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_error_pretty(category: &str, msg: &str) -> String {
    format!("[{}] {}", category, msg)
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected character '{ch}' (at byte {pos})")]
    UnexpectedChar { ch: char, pos: u32 },

    #[error("unterminated string literal (at byte {pos})")]
    UnterminatedString { pos: u32 },

    #[error("invalid escape sequence '\\{ch}' (at byte {pos})")]
    InvalidEscape { ch: char, pos: u32 },

    #[error("unterminated block comment (opened at byte {pos})")]
    UnterminatedComment { pos: u32 },

    #[error("integer literal '{text}' does not fit in 64 bits")]
    IntegerOverflow { text: String, span: Span },

    #[error("expected {expected}, found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unexpected end of input while parsing {context}")]
    UnexpectedEof { context: String },

    #[error("pattern matching is not supported; parameters must be plain variables")]
    UnsupportedPattern { span: Span },

    #[error("operator sections with an operand are not supported; write a lambda or use '({op})'")]
    UnsupportedSection { op: String, span: Span },

    #[error("operator '{op}' is non-associative and cannot be chained without parentheses")]
    NonAssociative { op: String, span: Span },
}

// ---------------------------------------------------------------------------
// Lowering errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LowerError {
    #[error("cannot find '{name}' in scope ({scope})")]
    Unresolved {
        name: String,
        scope: ScopeSnapshot,
        span: Span,
    },

    #[error("{construct} is not implemented")]
    Unsupported { construct: String, span: Span },

    #[error("'{name}' is defined more than once in the same block")]
    DuplicateDefinition { name: String, span: Span },

    #[error("internal error: node for '{name}' was never filled in")]
    UnfilledNode { name: String },
}

// ---------------------------------------------------------------------------
// Codegen errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("internal error: lambda node {node} was referenced but not collected")]
    UncollectedLambda { node: u32 },

    #[error("no '{name}' binding to use as the program entry point")]
    MissingEntry { name: String },

    #[error("value '{name}' depends on itself without passing through a function")]
    CyclicValue { name: String },

    #[error("internal error: parameter '{name}' is not in scope of the function being emitted")]
    UnboundPlaceholder { name: String },

    #[error("internal error: node for '{name}' was never filled in")]
    UnfilledNode { name: String },

    #[error("native build failed: {detail}")]
    Toolchain { detail: String },

    #[error("failed to format generated code")]
    Format(#[from] std::fmt::Error),

    #[error("I/O error during code generation: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Runtime errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("applying a non-closure value ({found})")]
    NotAClosure { found: &'static str },

    #[error("arity {arity} not supported")]
    UnsupportedArity { arity: usize },

    #[error("function expects {expected} arguments but was called with {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("{intrinsic} expects {expected}, found {found}")]
    TypeMismatch {
        intrinsic: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("call depth exceeded {limit}")]
    StackOverflow { limit: usize },

    #[error("internal error: variable '{name}' read before it was set")]
    UndefinedVariable { name: String },
}

impl Error {
    /// Returns a stable diagnostic code string for this error.
    pub fn diagnostic_code(&self) -> &'static str {
        match self {
            Error::Parse(p) => match p {
                ParseError::UnexpectedChar { .. } => "E0001",
                ParseError::UnterminatedString { .. } => "E0002",
                ParseError::InvalidEscape { .. } => "E0003",
                ParseError::UnterminatedComment { .. } => "E0004",
                ParseError::IntegerOverflow { .. } => "E0005",
                ParseError::UnexpectedToken { .. } => "E0006",
                ParseError::UnexpectedEof { .. } => "E0007",
                ParseError::UnsupportedPattern { .. } => "E0008",
                ParseError::UnsupportedSection { .. } => "E0009",
                ParseError::NonAssociative { .. } => "E0010",
            },
            Error::Lower(l) => match l {
                LowerError::Unresolved { .. } => "E0100",
                LowerError::Unsupported { .. } => "E0101",
                LowerError::DuplicateDefinition { .. } => "E0102",
                LowerError::UnfilledNode { .. } => "E0104",
            },
            Error::Codegen(c) => match c {
                CodegenError::UncollectedLambda { .. } => "E0200",
                CodegenError::MissingEntry { .. } => "E0201",
                CodegenError::CyclicValue { .. } => "E0202",
                CodegenError::UnboundPlaceholder { .. } => "E0203",
                CodegenError::UnfilledNode { .. } => "E0204",
                CodegenError::Toolchain { .. } => "E0205",
                CodegenError::Format(_) | CodegenError::Io(_) => "E0206",
            },
            Error::Runtime(_) => "E0300",
            Error::Io(_) => "E0400",
        }
    }

    /// Returns the source span this error points at, if it carries one.
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Parse(pe) => match pe {
                ParseError::UnexpectedChar { pos, .. }
                | ParseError::UnterminatedString { pos }
                | ParseError::InvalidEscape { pos, .. }
                | ParseError::UnterminatedComment { pos } => Some(Span::at(*pos)),
                ParseError::IntegerOverflow { span, .. }
                | ParseError::UnexpectedToken { span, .. }
                | ParseError::UnsupportedPattern { span }
                | ParseError::UnsupportedSection { span, .. }
                | ParseError::NonAssociative { span, .. } => Some(*span),
                ParseError::UnexpectedEof { .. } => None,
            },
            Error::Lower(le) => match le {
                LowerError::Unresolved { span, .. }
                | LowerError::Unsupported { span, .. }
                | LowerError::DuplicateDefinition { span, .. } => Some(*span),
                LowerError::UnfilledNode { .. } => None,
            },
            _ => None,
        }
    }
}
