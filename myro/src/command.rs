//! Logical database command.
use std::sync::Arc;

use crate::{
    parameter::{Parameter, ParameterCollection},
    statement::PreparedStatements,
};

/// How the command text is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CommandType {
    /// Sql text.
    #[default]
    Text,
    /// The text is a stored procedure or stored function name.
    StoredProcedure,
}

/// Execution behavior hints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommandBehavior {
    /// Only column metadata is wanted, no output parameter result is selected.
    pub schema_only: bool,
}

/// Output parameter, bound to the session variable the synthesized call writes it to.
#[derive(Clone, Debug, PartialEq)]
pub struct OutParameter {
    pub(crate) variable: String,
    pub(crate) parameter: Parameter,
}

impl OutParameter {
    /// Session variable name, e.g. `@outParam1`.
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// The caller parameter, as aligned with the procedure signature.
    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }
}

/// Logical database command.
///
/// Encoding only reads the command, except stored procedure synthesis which records
/// [`out_parameters`][Command::out_parameters] and [`return_parameter`][Command::return_parameter]
/// for the result reader.
#[derive(Clone, Debug, Default)]
pub struct Command {
    text: String,
    command_type: CommandType,
    behavior: CommandBehavior,
    parameters: ParameterCollection,
    prepared: Option<Arc<PreparedStatements>>,
    out_parameters: Vec<OutParameter>,
    return_parameter: Option<Parameter>,
}

impl Command {
    /// Sql text command.
    pub fn text(sql: impl Into<String>) -> Command {
        Command { text: sql.into(), ..Default::default() }
    }

    /// Stored procedure or stored function call.
    pub fn procedure(name: impl Into<String>) -> Command {
        Command {
            text: name.into(),
            command_type: CommandType::StoredProcedure,
            ..Default::default()
        }
    }

    /// Add parameter.
    pub fn bind(mut self, param: Parameter) -> Command {
        self.parameters.push(param);
        self
    }

    /// Execute with previously prepared statements instead of sending text.
    pub fn with_prepared(mut self, prepared: Arc<PreparedStatements>) -> Command {
        self.prepared = Some(prepared);
        self
    }

    pub fn with_behavior(mut self, behavior: CommandBehavior) -> Command {
        self.behavior = behavior;
        self
    }

    pub fn command_text(&self) -> &str {
        &self.text
    }

    pub fn command_type(&self) -> CommandType {
        self.command_type
    }

    pub fn behavior(&self) -> CommandBehavior {
        self.behavior
    }

    pub fn parameters(&self) -> &ParameterCollection {
        &self.parameters
    }

    pub fn prepared(&self) -> Option<&Arc<PreparedStatements>> {
        self.prepared.as_ref()
    }

    /// Output parameters recorded by the last stored procedure synthesis.
    pub fn out_parameters(&self) -> &[OutParameter] {
        &self.out_parameters
    }

    /// Return value parameter recorded by the last stored procedure synthesis.
    pub fn return_parameter(&self) -> Option<&Parameter> {
        self.return_parameter.as_ref()
    }

    pub(crate) fn set_call_results(
        &mut self,
        out_parameters: Vec<OutParameter>,
        return_parameter: Option<Parameter>,
    ) {
        self.out_parameters = out_parameters;
        self.return_parameter = return_parameter;
    }
}
