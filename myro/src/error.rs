//! `myro` error types.
//!
//! Encoding never retries nor recovers, an [`Error`] means the frame was not written and the
//! batch it belongs to has failed.
use std::{
    backtrace::{Backtrace, BacktraceStatus},
    borrow::Cow,
    fmt,
};

use crate::{config::ParseError, encode::EncodeError, mysql::ProtocolError};

/// A specialized [`Result`] type for `myro` operation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Frame encoding or configuration failure.
///
/// Errors raised while encoding a batch carry the failed command as context, e.g.
/// `command 2: Parameter '@id' must be defined.`
pub struct Error {
    context: Cow<'static, str>,
    backtrace: Backtrace,
    kind: ErrorKind,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Returns the [`ProtocolError`] if the command or its parameters were rejected.
    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        match &self.kind {
            ErrorKind::Protocol(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the [`EncodeError`] if a parameter value could not be encoded.
    pub fn as_encode(&self) -> Option<&EncodeError> {
        match &self.kind {
            ErrorKind::Encode(e) => Some(e),
            _ => None,
        }
    }

    pub(crate) fn context(mut self, context: impl Into<Cow<'static, str>>) -> Self {
        self.context = context.into();
        self
    }
}

/// Error source.
pub enum ErrorKind {
    /// Invalid configuration value.
    Config(ParseError),
    /// Command, parameters or batch position cannot be expressed as a frame.
    Protocol(ProtocolError),
    /// Parameter value rejected by the type mapper or statement preparer.
    Encode(EncodeError),
}

macro_rules! from {
    (<$ty:ty>$pat:pat => $body:expr) => {
        impl From<$ty> for Error {
            fn from($pat: $ty) -> Self {
                Self { context: Cow::Borrowed(""), backtrace: Backtrace::capture(), kind: $body }
            }
        }
    };
}

from!(<ErrorKind>e => e);
from!(<ParseError>e => ErrorKind::Config(e));
from!(<ProtocolError>e => ErrorKind::Protocol(e));
from!(<EncodeError>e => ErrorKind::Encode(e));

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Config(e) => Some(e),
            ErrorKind::Protocol(e) => Some(e),
            ErrorKind::Encode(e) => Some(e),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.context.is_empty() {
            write!(f, "{}: ", self.context)?;
        }
        write!(f, "{}", self.kind)?;

        if let BacktraceStatus::Captured = self.backtrace.status() {
            let backtrace = self.backtrace.to_string();
            write!(f, "\n\nStack backtrace:\n{}", backtrace.trim_end())?;
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => e.fmt(f),
            Self::Protocol(e) => e.fmt(f),
            Self::Encode(e) => e.fmt(f),
        }
    }
}

impl fmt::Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Config(_) => "Config",
            Self::Protocol(_) => "Protocol",
            Self::Encode(_) => "Encode",
        };
        write!(f, "{name}(\"{self}\")")
    }
}
