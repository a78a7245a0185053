use backtrace::Backtrace;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for document storage operations.
///
/// The kinds fall into three groups:
///
/// * [`ErrorKind::NotFound`] is the well-known "document absent" sentinel. It is a
///   normal outcome of lookups, never a fault.
/// * [`ErrorKind::Cancelled`] and [`ErrorKind::DeadlineExceeded`] report that the
///   [`Context`](crate::context::Context) driving an operation finished before
///   the operation did.
/// * Everything else is an operational error raised by a backend and propagated
///   unchanged through the builders.
///
/// # Examples
///
/// ```rust,ignore
/// use nosql::errors::{NosqlError, ErrorKind, NosqlResult};
///
/// fn example() -> NosqlResult<()> {
///     Err(NosqlError::new("Collection is read only", ErrorKind::InvalidOperation))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// The requested document does not exist
    NotFound,

    /// The execution context was cancelled
    Cancelled,
    /// The execution context deadline elapsed
    DeadlineExceeded,

    /// The operation is not valid in the current state
    InvalidOperation,
    /// A value has the wrong type for the operation
    InvalidDataType,
    /// A document key is empty or malformed
    InvalidKey,
    /// An index declaration is invalid
    IndexError,
    /// A document with the same key already exists
    UniqueConstraintViolation,

    /// Error encoding or decoding a document
    EncodingError,
    /// Generic IO error
    IOError,

    /// Error from a storage backend
    BackendError,
    /// Store has not been opened
    StoreNotInitialized,
    /// Store has already been closed
    StoreAlreadyClosed,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::Cancelled => write!(f, "Cancelled"),
            ErrorKind::DeadlineExceeded => write!(f, "Deadline exceeded"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::InvalidDataType => write!(f, "Invalid data type"),
            ErrorKind::InvalidKey => write!(f, "Invalid key"),
            ErrorKind::IndexError => write!(f, "Index error"),
            ErrorKind::UniqueConstraintViolation => write!(f, "Unique constraint violation"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::StoreNotInitialized => write!(f, "Store not initialized"),
            ErrorKind::StoreAlreadyClosed => write!(f, "Store already closed"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type of every fallible operation in this crate and its backends.
///
/// `NosqlError` carries a message, an [`ErrorKind`], an optional cause and the
/// backtrace captured at creation time. It is cheap to clone, which lets the
/// emulated batch writer keep reporting the first error it saw.
///
/// # Examples
///
/// ```rust,ignore
/// use nosql::errors::{NosqlError, ErrorKind};
///
/// let cause = NosqlError::new("disk unplugged", ErrorKind::IOError);
/// let err = NosqlError::new_with_cause("insert failed", ErrorKind::BackendError, cause);
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct NosqlError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<NosqlError>>,
    backtrace: Atomic<Backtrace>,
}

impl NosqlError {
    /// Creates a new `NosqlError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        NosqlError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `NosqlError` that wraps the error that caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: NosqlError) -> Self {
        NosqlError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// The "document absent" sentinel returned by key lookups and `Query::one`.
    pub fn not_found() -> Self {
        NosqlError::new("not found", ErrorKind::NotFound)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&NosqlError> {
        self.cause.as_deref()
    }

    /// Returns `true` for the [`ErrorKind::NotFound`] sentinel.
    pub fn is_not_found(&self) -> bool {
        self.error_kind == ErrorKind::NotFound
    }

    /// Returns `true` if the error reports a cancelled or expired context.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self.error_kind,
            ErrorKind::Cancelled | ErrorKind::DeadlineExceeded
        )
    }
}

impl Display for NosqlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for NosqlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for NosqlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for document storage operations.
pub type NosqlResult<T> = Result<T, NosqlError>;

impl de::Error for NosqlError {
    fn custom<T: Display>(msg: T) -> Self {
        NosqlError::new(&msg.to_string(), ErrorKind::EncodingError)
    }
}

impl ser::Error for NosqlError {
    fn custom<T: Display>(msg: T) -> Self {
        NosqlError::new(&msg.to_string(), ErrorKind::EncodingError)
    }
}

impl From<std::io::Error> for NosqlError {
    fn from(err: std::io::Error) -> Self {
        NosqlError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<std::string::FromUtf8Error> for NosqlError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        NosqlError::new(
            &format!("UTF-8 encoding error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<String> for NosqlError {
    fn from(msg: String) -> Self {
        NosqlError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for NosqlError {
    fn from(msg: &str) -> Self {
        NosqlError::new(msg, ErrorKind::InternalError)
    }
}
