//! Protocol error
use std::fmt;

/// An error when the command or its parameters cannot be expressed as a protocol frame.
#[derive(Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Named placeholder or formal parameter without matching parameter.
    UndefinedParameter {
        name: String,
    },
    /// Positional reference past the end of the parameter collection.
    ParameterIndex {
        index: usize,
        len: usize,
    },
    /// Procedure declares a parameter the caller did not supply.
    ProcedureParameterNotFound {
        name: String,
    },
    /// More than one caller parameter matches a declared procedure parameter.
    AmbiguousParameter {
        name: String,
    },
    /// Stored function called without a return value parameter.
    MissingReturnParameter {
        procedure: String,
    },
    DuplicateReturnParameter,
    /// Return value combined with output or input/output parameter.
    ReturnWithOutput,
    /// Prepared command without any statement.
    EmptyStatements {
        command: usize,
    },
    /// Batch position outside the batch.
    InvalidPosition {
        command_index: usize,
        statement_index: usize,
    },
}

impl std::error::Error for ProtocolError { }

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedParameter { name } => {
                write!(f, "Parameter '{name}' must be defined.")
            }
            Self::ParameterIndex { index, len } => {
                let verb = if *len == 1 { "parameter is" } else { "parameters are" };
                write!(f, "Parameter index {index} is invalid when only {len} {verb} defined.")
            }
            Self::ProcedureParameterNotFound { name } => {
                write!(f, "Parameter '{name}' not found in the collection.")
            }
            Self::AmbiguousParameter { name } => {
                write!(f, "Parameter '{name}' is ambiguous, it is defined more than once.")
            }
            Self::MissingReturnParameter { procedure } => {
                write!(f, "Attempt to call stored function {procedure} without specifying a return parameter")
            }
            Self::DuplicateReturnParameter => {
                f.write_str("Only one parameter can have the ReturnValue direction")
            }
            Self::ReturnWithOutput => {
                f.write_str("ReturnValue parameter cannot be combined with Output or InputOutput parameters")
            }
            Self::EmptyStatements { command } => {
                write!(f, "Prepared command {command} contains no statement")
            }
            Self::InvalidPosition { command_index, statement_index } => {
                write!(f, "Invalid batch position: command {command_index}, statement {statement_index}")
            }
        }
    }
}

impl fmt::Debug for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl ProtocolError {
    pub(crate) fn undefined_parameter(name: &str) -> ProtocolError {
        Self::UndefinedParameter { name: name.to_owned() }
    }

    pub(crate) fn parameter_index(index: usize, len: usize) -> ProtocolError {
        Self::ParameterIndex { index, len }
    }

    pub(crate) fn procedure_parameter_not_found(name: &str) -> ProtocolError {
        Self::ProcedureParameterNotFound { name: name.to_owned() }
    }

    pub(crate) fn ambiguous_parameter(name: &str) -> ProtocolError {
        Self::AmbiguousParameter { name: name.to_owned() }
    }

    pub(crate) fn missing_return_parameter(procedure: String) -> ProtocolError {
        Self::MissingReturnParameter { procedure }
    }

    pub(crate) fn invalid_position(command_index: usize, statement_index: usize) -> ProtocolError {
        Self::InvalidPosition { command_index, statement_index }
    }
}
