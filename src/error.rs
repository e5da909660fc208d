//! Error taxonomy for the fuzzy query engine.
//!
//! Syntax problems (`ParseError`), per-document evaluation problems
//! (`EvalError`) and data/argument problems (`DomainError`) are kept apart so
//! an interactive caller can tell "bad query" from "bad data". A field path
//! that resolves to nothing is not an error anywhere in the crate.

use std::fmt;

/// Character offset into the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "position {}", self.offset)
    }
}

/// Grammar violation found while tokenizing or parsing a query string.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub position: Option<Position>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            position: None,
        }
    }

    pub fn at(message: impl Into<String>, offset: usize) -> Self {
        ParseError {
            message: message.into(),
            position: Some(Position { offset }),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "Syntax error at {}: {}", pos, self.message),
            None => write!(f, "Syntax error: {}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors raised while evaluating a query against a single document.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Operator or predicate name not present in the registry
    UnknownOperator(String),

    /// Wrong number of operands for an operator
    Arity {
        op: String,
        expected: String,
        found: usize,
    },

    /// Quantifier name other than `all`, `any` or `none`
    InvalidQuantifier(String),

    /// Operand of the wrong shape (e.g. a non-path where a path is required)
    InvalidOperand(String),

    /// Pattern handed to a regex predicate failed to compile
    InvalidRegex(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UnknownOperator(name) => write!(f, "Unknown operator: {}", name),
            EvalError::Arity {
                op,
                expected,
                found,
            } => write!(
                f,
                "Wrong number of operands for '{}': expected {}, got {}",
                op, expected, found
            ),
            EvalError::InvalidQuantifier(name) => {
                write!(f, "Invalid quantifier: '{}' (expected all, any or none)", name)
            }
            EvalError::InvalidOperand(msg) => write!(f, "Invalid operand: {}", msg),
            EvalError::InvalidRegex(msg) => write!(f, "Invalid regex: {}", msg),
        }
    }
}

impl std::error::Error for EvalError {}

/// Invariant violations in data handed to the algebra, defuzzifiers or samplers.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Membership supplied by the caller lies outside [0, 1]
    OutOfRange(f64),

    /// Two membership sequences of different length were combined
    LengthMismatch { left: usize, right: usize },

    /// Total membership is zero where a distribution is required
    ZeroMass,

    /// Sample size is zero, or too large for sampling without replacement
    InvalidSampleSize { requested: usize, population: usize },

    /// Probability mass outside [0, 1]
    InvalidProbability(f64),

    /// Operation needs at least one membership
    Empty,
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::OutOfRange(v) => {
                write!(f, "Membership {} is outside the interval [0, 1]", v)
            }
            DomainError::LengthMismatch { left, right } => write!(
                f,
                "Fuzzy sets must have the same length ({} vs {})",
                left, right
            ),
            DomainError::ZeroMass => write!(f, "Total membership is zero"),
            DomainError::InvalidSampleSize {
                requested,
                population,
            } => write!(
                f,
                "Invalid sample size {} for a population of {}",
                requested, population
            ),
            DomainError::InvalidProbability(p) => {
                write!(f, "Probability {} must be between 0 and 1, inclusive", p)
            }
            DomainError::Empty => write!(f, "Operation requires at least one membership"),
        }
    }
}

impl std::error::Error for DomainError {}

/// Failures while pulling documents through a stream pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    /// A source record is not valid JSON (1-based line for JSON-lines sources)
    Json { line: usize, message: String },
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Json { line, message } => {
                write!(f, "Invalid JSON record at line {}: {}", line, message)
            }
        }
    }
}

impl std::error::Error for StreamError {}

/// Umbrella error so callers can use `?` across parsing, evaluation and
/// set/stream operations.
#[derive(Debug, Clone, PartialEq)]
pub enum FuzzyError {
    Parse(ParseError),
    Eval(EvalError),
    Domain(DomainError),
    Stream(StreamError),
}

impl FuzzyError {
    /// True for problems with the query text itself.
    pub fn is_syntax(&self) -> bool {
        matches!(self, FuzzyError::Parse(_))
    }

    /// True for problems with the data or numeric arguments.
    pub fn is_domain(&self) -> bool {
        matches!(self, FuzzyError::Domain(_) | FuzzyError::Stream(_))
    }
}

impl fmt::Display for FuzzyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuzzyError::Parse(e) => write!(f, "{}", e),
            FuzzyError::Eval(e) => write!(f, "Evaluation error: {}", e),
            FuzzyError::Domain(e) => write!(f, "Domain error: {}", e),
            FuzzyError::Stream(e) => write!(f, "Stream error: {}", e),
        }
    }
}

impl std::error::Error for FuzzyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FuzzyError::Parse(e) => Some(e),
            FuzzyError::Eval(e) => Some(e),
            FuzzyError::Domain(e) => Some(e),
            FuzzyError::Stream(e) => Some(e),
        }
    }
}

impl From<ParseError> for FuzzyError {
    fn from(e: ParseError) -> Self {
        FuzzyError::Parse(e)
    }
}

impl From<EvalError> for FuzzyError {
    fn from(e: EvalError) -> Self {
        FuzzyError::Eval(e)
    }
}

impl From<DomainError> for FuzzyError {
    fn from(e: DomainError) -> Self {
        FuzzyError::Domain(e)
    }
}

impl From<StreamError> for FuzzyError {
    fn from(e: StreamError) -> Self {
        FuzzyError::Stream(e)
    }
}
