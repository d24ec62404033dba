//! Error taxonomy for the pasting engine.
//!
//! Each kind gets its own small struct with a manually written [`Display`]
//! and [`std::error::Error`] impl, in the style of
//! [`crate::io::OpenFastqError`], rather than a single `thiserror`-derived
//! enum.

use std::fmt;

/// A row could not be turned into an [`Alignment`](crate::paste::record::Alignment).
///
/// Carries the offending alignment id so callers can report which input row
/// was at fault.
#[derive(Debug, Clone)]
pub struct ParsingError {
    pub id:      i64,
    pub message: String,
}

impl ParsingError {
    pub(crate) fn new(id: i64, message: impl Into<String>) -> Self {
        Self {
            id,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse alignment (id: {}): {}", self.id, self.message)
    }
}

impl std::error::Error for ParsingError {}

/// A merge (`paste_right`/`paste_left`) was attempted between two alignments
/// that don't satisfy the precondition inequalities.
///
/// This indicates a controller bug: candidates reaching a merge call should
/// already have been screened by candidate selection.
#[derive(Debug, Clone)]
pub struct PastingError {
    pub message: String,
}

impl PastingError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for PastingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid pasting configuration: {}", self.message)
    }
}

impl std::error::Error for PastingError {}

/// The (reward, penalty, open_cost, extend_cost) quadruple is not in the
/// supported parameter table.
#[derive(Debug, Clone)]
pub struct ScoringError {
    pub reward:  i32,
    pub penalty: i32,
    pub open:    i32,
    pub extend:  i32,
}

impl fmt::Display for ScoringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported scoring parameter quadruple: (reward: {}, penalty: {}, open: {}, extend: {})",
            self.reward, self.penalty, self.open, self.extend
        )
    }
}

impl std::error::Error for ScoringError {}

/// A numeric configuration input fell outside its valid range (e.g. a
/// non-positive effective database size).
#[derive(Debug, Clone)]
pub struct OutOfRange {
    pub message: String,
}

impl OutOfRange {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value out of range: {}", self.message)
    }
}

impl std::error::Error for OutOfRange {}

/// `qseqid` or `sseqid` was empty where a non-empty identifier is required.
#[derive(Debug, Clone)]
pub struct UnexpectedEmptyString {
    pub field: &'static str,
}

impl fmt::Display for UnexpectedEmptyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected non-empty string for field '{}'", self.field)
    }
}

impl std::error::Error for UnexpectedEmptyString {}

/// I/O failure or a malformed row (too few tab-separated fields, premature
/// end of line) encountered while reading the input table.
#[derive(Debug)]
pub struct ReadError {
    pub message: String,
}

impl ReadError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to read alignment table: {}", self.message)
    }
}

impl std::error::Error for ReadError {}

/// Union of all error kinds the pasting engine can surface, so `main` has a
/// single type to match on and propagate as a process exit code.
#[derive(Debug)]
pub enum Error {
    Parsing(ParsingError),
    Pasting(PastingError),
    Scoring(ScoringError),
    OutOfRange(OutOfRange),
    UnexpectedEmptyString(UnexpectedEmptyString),
    Read(ReadError),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parsing(e) => write!(f, "{e}"),
            Error::Pasting(e) => write!(f, "{e}"),
            Error::Scoring(e) => write!(f, "{e}"),
            Error::OutOfRange(e) => write!(f, "{e}"),
            Error::UnexpectedEmptyString(e) => write!(f, "{e}"),
            Error::Read(e) => write!(f, "{e}"),
            Error::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parsing(e) => Some(e),
            Error::Pasting(e) => Some(e),
            Error::Scoring(e) => Some(e),
            Error::OutOfRange(e) => Some(e),
            Error::UnexpectedEmptyString(e) => Some(e),
            Error::Read(e) => Some(e),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<ParsingError> for Error {
    fn from(e: ParsingError) -> Self {
        Error::Parsing(e)
    }
}

impl From<PastingError> for Error {
    fn from(e: PastingError) -> Self {
        Error::Pasting(e)
    }
}

impl From<ScoringError> for Error {
    fn from(e: ScoringError) -> Self {
        Error::Scoring(e)
    }
}

impl From<OutOfRange> for Error {
    fn from(e: OutOfRange) -> Self {
        Error::OutOfRange(e)
    }
}

impl From<UnexpectedEmptyString> for Error {
    fn from(e: UnexpectedEmptyString) -> Self {
        Error::UnexpectedEmptyString(e)
    }
}

impl From<ReadError> for Error {
    fn from(e: ReadError) -> Self {
        Error::Read(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
