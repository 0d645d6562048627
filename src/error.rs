use std::fmt;
use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    // Decode errors.
    #[error("unexpected EOF")]
    ErrUnexpectedEof,
    #[error("attribute header too short")]
    ErrAttributeHeaderShort,
    #[error("bad magic cookie")]
    ErrBadMagicCookie,
    #[error("bad message length")]
    ErrBadLength,
    #[error("first two bits of the message type are not zero")]
    ErrFirstBitsNotZero,
    #[error("attribute not found")]
    ErrAttributeNotFound,

    // Attribute codec errors.
    #[error("attribute size is invalid")]
    ErrAttributeSizeInvalid,
    #[error("attribute size overflow")]
    ErrAttributeSizeOverflow,
    #[error("invalid length of IP value")]
    ErrBadIpLength,
    #[error("invalid address family value")]
    ErrBadAddressFamily,
    #[error("UNKNOWN-ATTRIBUTES has an odd on-the-wire length")]
    ErrBadUnknownAttrsSize,
    #[error("no default reason for error code")]
    ErrNoDefaultReason,

    // Integrity errors. The checks themselves run in constant time;
    // the error only reports the boolean outcome.
    #[error("integrity check failed")]
    ErrIntegrityMismatch,
    #[error("fingerprint check failed")]
    ErrFingerprintMismatch,
    #[error("FINGERPRINT before MESSAGE-INTEGRITY attribute")]
    ErrFingerprintBeforeIntegrity,

    // Transaction lifecycle errors.
    #[error("transaction exists with same id")]
    ErrTransactionExists,
    #[error("transaction not exists")]
    ErrTransactionNotExists,
    #[error("transaction is stopped")]
    ErrTransactionStopped,
    #[error("transaction is timed out")]
    ErrTransactionTimeOut,
    #[error("agent is closed")]
    ErrAgentClosed,

    // Client lifecycle errors.
    #[error("client not initialized")]
    ErrClientNotInitialized,
    #[error("client is closed")]
    ErrClientClosed,
    #[error("no connection provided")]
    ErrNoConnection,
    #[error("connection already provided")]
    ErrConnectionAlreadySet,
    #[error("network type is not supported")]
    ErrUnsupportedNetwork,

    // Composite errors.
    #[error(transparent)]
    ErrStop(StopError),
    #[error(transparent)]
    ErrClose(CloseError),

    #[error("mutex poison: {0}")]
    PoisonError(String),
    #[error("{0}")]
    Io(#[source] IoError),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
#[error("io error: {0}")]
pub struct IoError(#[from] pub io::Error);

// Workaround for wanting PartialEq for io::Error.
impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(IoError(e))
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Error::PoisonError(e.to_string())
    }
}

/// StopError occurs when Client fails to stop a transaction while
/// processing a send error; `cause` is the error that triggered the
/// stop, `err` is the stop failure itself.
#[derive(Debug, PartialEq)]
pub struct StopError {
    pub err: Box<Error>,
    pub cause: Box<Error>,
}

impl fmt::Display for StopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error while stopping due to {}: {}", self.cause, self.err)
    }
}

impl std::error::Error for StopError {}

/// CloseError indicates client close failure, preserving both the
/// agent and the connection sub-errors.
#[derive(Debug, PartialEq)]
pub struct CloseError {
    pub agent: Option<Box<Error>>,
    pub connection: Option<Box<Error>>,
}

fn sprint_err(err: &Option<Box<Error>>) -> String {
    match err {
        Some(err) => err.to_string(),
        None => "<nil>".to_owned(),
    }
}

impl fmt::Display for CloseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to close: {} (connection), {} (agent)",
            sprint_err(&self.connection),
            sprint_err(&self.agent)
        )
    }
}

impl std::error::Error for CloseError {}
