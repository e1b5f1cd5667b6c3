//! Error types for sfxml
//!
//! Every failure raised by the parser is a malformed-input failure. The kinds
//! exist for diagnosis only; callers are expected to propagate the error.

use std::fmt;
use thiserror::Error;

/// Maximum number of characters of input carried as error context
pub const CONTEXT_LEN: usize = 30;

/// Position in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.offset, self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn at(pos: Pos) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

/// Kind of dialect violation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    UnexpectedEof,
    Expected { expected: String, found: String },
    MismatchedEndTag { expected: String, found: String },
    UnterminatedComment,
    TextBetweenElements,
    UnexpectedAttributes { element: String, attributes: String },
    MaxDepthExceeded { max: u16 },
    MaxSizeExceeded { max: usize },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::Expected { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::MismatchedEndTag { expected, found } => {
                write!(f, "mismatched end tag: expected </{expected}>, found {found}")
            }
            Self::UnterminatedComment => write!(f, "unterminated comment"),
            Self::TextBetweenElements => write!(f, "text between elements"),
            Self::UnexpectedAttributes {
                element,
                attributes,
            } => write!(f, "unsupported attributes on <{element}>:{attributes}"),
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
            Self::MaxSizeExceeded { max } => write!(f, "max size exceeded: {max}"),
        }
    }
}

/// Malformed-input error raised by the parser
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("error at {}: {message} near {context:?}", .span.start)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
    context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
            context: String::new(),
        }
    }

    /// Attach the input text following the failure offset
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Byte offset of the failure in the input text
    pub fn offset(&self) -> usize {
        self.span.start.offset
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Create error at specific position
    pub fn at(kind: ErrorKind, offset: usize, line: u32, col: u32) -> Self {
        Self::new(kind, Span::at(Pos::new(offset, line, col)))
    }
}

/// Result type alias for sfxml
pub type Result<T> = std::result::Result<T, Error>;
