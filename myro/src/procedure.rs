//! Stored procedure call synthesis.
//!
//! `CALL` cannot bind output parameters, so a stored procedure command is rewritten into sql
//! that passes output values through session variables and selects them afterwards:
//!
//! ```text
//! SET @outParam1=@inParam1; CALL p(@inParam0, @outParam1);SELECT '<sentinel>' AS '<sentinel>', @outParam1
//! ```
//!
//! The trailing result set starts with the [`OUT_PARAMETER_SENTINEL`] column, the remaining
//! columns are the output values in [`Command::out_parameters`] order.
use std::{collections::HashMap, fmt::Write};

use crate::{
    command::{Command, OutParameter},
    common::verbose,
    mysql::{MySqlDbType, ProtocolError},
    parameter::{Parameter, ParameterCollection, ParameterDirection},
};

/// Column name of the result set carrying output parameter values.
pub const OUT_PARAMETER_SENTINEL: &str = "\u{E001}\u{8}\u{B}";

/// Returns `true` if `column` marks an output parameter result set.
pub fn is_out_parameter_sentinel(column: &str) -> bool {
    column == OUT_PARAMETER_SENTINEL
}

/// Parameter declared by the database for a stored procedure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcedureParameter {
    name: String,
    direction: ParameterDirection,
    db_type: MySqlDbType,
}

impl ProcedureParameter {
    pub fn new(name: impl Into<String>, direction: ParameterDirection, db_type: MySqlDbType) -> Self {
        Self { name: name.into(), direction, db_type }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> ParameterDirection {
        self.direction
    }

    pub fn db_type(&self) -> MySqlDbType {
        self.db_type
    }
}

/// Stored procedure signature as known to the database, parameters in ordinal order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcedureSignature {
    schema: String,
    name: String,
    parameters: Vec<ProcedureParameter>,
}

impl ProcedureSignature {
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        parameters: impl IntoIterator<Item = ProcedureParameter>,
    ) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            parameters: parameters.into_iter().collect(),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[ProcedureParameter] {
        &self.parameters
    }

    /// Quoted `` `schema`.`name` ``.
    pub fn fully_qualified(&self) -> String {
        format!(
            "`{}`.`{}`",
            self.schema.replace('`', "``"),
            self.name.replace('`', "``")
        )
    }

    /// Reorder `params` to the declared ordinal order.
    ///
    /// Direction and type the caller left unset are taken from the declaration.
    pub fn align(&self, params: &ParameterCollection) -> Result<ParameterCollection, ProtocolError> {
        let return_value = params
            .iter()
            .find(|e| e.direction() == ParameterDirection::ReturnValue);

        self.parameters
            .iter()
            .map(|declared| {
                let param = match declared.direction {
                    ParameterDirection::ReturnValue => return_value
                        .ok_or_else(|| ProtocolError::missing_return_parameter(self.fully_qualified()))?,
                    _ => {
                        if params.count_of(&declared.name) > 1 {
                            return Err(ProtocolError::ambiguous_parameter(&declared.name));
                        }
                        params
                            .index_of(&declared.name)
                            .map(|i| &params[i])
                            .ok_or_else(|| ProtocolError::procedure_parameter_not_found(&declared.name))?
                    }
                };
                let mut param = param.clone();
                param.fill(declared.direction, declared.db_type);
                Ok(param)
            })
            .collect()
    }
}

/// Source of stored procedure signatures.
pub trait ProcedureLookup {
    fn lookup(&self, name: &str) -> Option<&ProcedureSignature>;
}

/// No known signature, parameters are used as given.
impl ProcedureLookup for () {
    fn lookup(&self, _: &str) -> Option<&ProcedureSignature> {
        None
    }
}

impl<L: ProcedureLookup + ?Sized> ProcedureLookup for &L {
    fn lookup(&self, name: &str) -> Option<&ProcedureSignature> {
        L::lookup(self, name)
    }
}

/// In memory [`ProcedureLookup`].
///
/// Signatures are found by `schema.name`, or by `name` alone, ignoring ascii case and backtick
/// quoting. When two schemas declare the same name, the bare name finds the last inserted.
#[derive(Debug, Default)]
pub struct ProcedureCache {
    procedures: HashMap<String, ProcedureSignature>,
    names: HashMap<String, String>,
}

impl ProcedureCache {
    pub fn new() -> ProcedureCache {
        ProcedureCache::default()
    }

    pub fn insert(&mut self, signature: ProcedureSignature) {
        let qualified = cache_key(&format!("{}.{}", signature.schema, signature.name));
        self.names.insert(cache_key(&signature.name), qualified.clone());
        self.procedures.insert(qualified, signature);
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}

impl ProcedureLookup for ProcedureCache {
    fn lookup(&self, name: &str) -> Option<&ProcedureSignature> {
        let key = cache_key(name);
        match self.procedures.get(&key) {
            Some(signature) => Some(signature),
            None => self.procedures.get(self.names.get(&key)?),
        }
    }
}

fn cache_key(name: &str) -> String {
    name.trim().replace('`', "").to_ascii_lowercase()
}

/// Synthesized stored procedure call.
#[derive(Debug)]
pub struct ProcedureCall {
    /// Sql to hand to the statement preparer.
    pub sql: String,
    /// Input parameters, renamed to `@inParam{i}`.
    pub parameters: ParameterCollection,
}

#[derive(Default)]
struct CallBuilder {
    preamble: String,
    arguments: Vec<String>,
    inputs: ParameterCollection,
    outputs: Vec<OutParameter>,
    return_parameter: Option<Parameter>,
}

impl CallBuilder {
    fn input(&mut self, param: &Parameter, in_name: &str) {
        self.inputs.push(param.renamed(in_name));
    }

    fn output(&mut self, param: &Parameter, out_name: String) {
        self.outputs.push(OutParameter { variable: out_name.clone(), parameter: param.clone() });
        self.arguments.push(out_name);
    }

    fn return_value(&mut self, param: &Parameter) -> Result<(), ProtocolError> {
        if self.return_parameter.is_some() {
            return Err(ProtocolError::DuplicateReturnParameter);
        }
        self.return_parameter = Some(param.clone());
        Ok(())
    }
}

/// Rewrite a stored procedure command into sql and its input parameters.
///
/// On success, the output parameters and the return parameter are recorded on `command`.
pub fn synthesize_call<L>(command: &mut Command, procedures: &L) -> Result<ProcedureCall, ProtocolError>
where
    L: ProcedureLookup + ?Sized,
{
    let (name, params) = match procedures.lookup(command.command_text()) {
        Some(signature) => (signature.fully_qualified(), signature.align(command.parameters())?),
        None => (command.command_text().to_owned(), command.parameters().clone()),
    };

    let mut call = CallBuilder::default();

    // the return value takes no argument slot
    let mut slot = 0;

    for param in params.iter() {
        let in_name = format!("@inParam{slot}");
        let out_name = format!("@outParam{slot}");

        match param.direction() {
            ParameterDirection::Input => {
                call.input(param, &in_name);
                call.arguments.push(in_name);
            }
            ParameterDirection::InputOutput => {
                call.input(param, &in_name);
                let _ = write!(call.preamble, "SET {out_name}={in_name}; ");
                call.output(param, out_name);
            }
            ParameterDirection::Output => call.output(param, out_name),
            ParameterDirection::ReturnValue => {
                call.return_value(param)?;
                continue;
            }
        }

        slot += 1;
    }

    if call.return_parameter.is_some() && !call.outputs.is_empty() {
        return Err(ProtocolError::ReturnWithOutput);
    }

    let call_text = format!("{name}({});", call.arguments.join(", "));

    let sql = match call.return_parameter {
        Some(_) => format!("SELECT {call_text}"),
        None => {
            let mut sql = format!("{}CALL {call_text}", call.preamble);
            if !call.outputs.is_empty() && !command.behavior().schema_only {
                let names = call.outputs.iter().map(OutParameter::variable).collect::<Vec<_>>();
                let _ = write!(
                    sql,
                    "SELECT '{OUT_PARAMETER_SENTINEL}' AS '{OUT_PARAMETER_SENTINEL}', {}",
                    names.join(", ")
                );
            }
            sql
        }
    };

    verbose!(procedure = %name, sql = %sql, "synthesized call");

    command.set_call_results(call.outputs, call.return_parameter);

    Ok(ProcedureCall { sql, parameters: call.inputs })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{command::CommandBehavior, value::Value};
    use crate::parameter::ParameterDirection::*;

    fn param(name: &str, value: impl Into<Value>, direction: ParameterDirection) -> Parameter {
        Parameter::new(name, value).with_direction(direction)
    }

    #[test]
    fn input_and_output() {
        let mut command = Command::procedure("p")
            .bind(param("@a", 5, Input))
            .bind(param("@b", Value::Null, Output));

        let call = synthesize_call(&mut command, &()).unwrap();

        assert_eq!(
            call.sql,
            format!(
                "CALL p(@inParam0, @outParam1);SELECT '{0}' AS '{0}', @outParam1",
                OUT_PARAMETER_SENTINEL
            )
        );
        assert_eq!(call.parameters.len(), 1);
        assert_eq!(call.parameters[0].name(), "@inParam0");
        assert_eq!(call.parameters[0].value(), &Value::I32(5));

        let out = command.out_parameters();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].variable(), "@outParam1");
        assert_eq!(out[0].parameter().name(), "@b");
        assert!(command.return_parameter().is_none());
    }

    #[test]
    fn input_output_sets_variable_first() {
        let mut command = Command::procedure("q").bind(param("@x", 1, InputOutput));

        let call = synthesize_call(&mut command, &()).unwrap();

        assert_eq!(
            call.sql,
            format!(
                "SET @outParam0=@inParam0; CALL q(@outParam0);SELECT '{0}' AS '{0}', @outParam0",
                OUT_PARAMETER_SENTINEL
            )
        );
        assert_eq!(call.parameters[0].name(), "@inParam0");
        assert_eq!(command.out_parameters()[0].variable(), "@outParam0");
    }

    #[test]
    fn function_returns_value() {
        let mut command = Command::procedure("f")
            .bind(param("@r", Value::Null, ReturnValue))
            .bind(param("@a", "x", Input));

        let call = synthesize_call(&mut command, &()).unwrap();

        assert_eq!(call.sql, "SELECT f(@inParam0);");
        assert!(command.out_parameters().is_empty());
        assert_eq!(command.return_parameter().map(Parameter::name), Some("@r"));
    }

    #[test]
    fn function_with_leading_input() {
        let mut command = Command::procedure("f")
            .bind(param("@a", 1, Input))
            .bind(param("@r", Value::Null, ReturnValue));

        let call = synthesize_call(&mut command, &()).unwrap();
        assert_eq!(call.sql, "SELECT f(@inParam0);");
    }

    #[test]
    fn return_with_output_is_rejected() {
        let mut command = Command::procedure("p")
            .bind(param("@a", 1, Input))
            .bind(param("@b", Value::Null, Output))
            .bind(param("@c", 2, InputOutput))
            .bind(param("@r", Value::Null, ReturnValue));

        let err = synthesize_call(&mut command, &()).unwrap_err();
        assert_eq!(err, ProtocolError::ReturnWithOutput);
        assert!(command.out_parameters().is_empty());
    }

    #[test]
    fn duplicate_return_is_rejected() {
        let mut command = Command::procedure("f")
            .bind(param("@r", Value::Null, ReturnValue))
            .bind(param("@s", Value::Null, ReturnValue));

        let err = synthesize_call(&mut command, &()).unwrap_err();
        assert_eq!(err, ProtocolError::DuplicateReturnParameter);
    }

    #[test]
    fn schema_only_skips_sentinel_select() {
        let mut command = Command::procedure("p")
            .bind(param("@b", Value::Null, Output))
            .with_behavior(CommandBehavior { schema_only: true });

        let call = synthesize_call(&mut command, &()).unwrap();
        assert_eq!(call.sql, "CALL p(@outParam0);");
        assert_eq!(command.out_parameters().len(), 1);
    }

    #[test]
    fn no_parameters() {
        let mut command = Command::procedure("cleanup");
        let call = synthesize_call(&mut command, &()).unwrap();
        assert_eq!(call.sql, "CALL cleanup();");
        assert!(call.parameters.is_empty());
    }

    fn signature() -> ProcedureCache {
        let mut cache = ProcedureCache::new();
        cache.insert(ProcedureSignature::new(
            "app",
            "transfer",
            [
                ProcedureParameter::new("source", Input, MySqlDbType::Int32),
                ProcedureParameter::new("amount", Input, MySqlDbType::NewDecimal),
                ProcedureParameter::new("balance", Output, MySqlDbType::NewDecimal),
            ],
        ));
        cache
    }

    #[test]
    fn aligns_with_cached_signature() {
        let cache = signature();
        assert_eq!(cache.len(), 1);

        // caller order and directions differ from the declaration
        let mut command = Command::procedure("App.Transfer")
            .bind(Parameter::new("@balance", Value::Null))
            .bind(Parameter::new("@Amount", Value::Decimal("10.00".into())))
            .bind(Parameter::new("@source", 7));

        let call = synthesize_call(&mut command, &cache).unwrap();

        assert_eq!(
            call.sql,
            format!(
                "CALL `app`.`transfer`(@inParam0, @inParam1, @outParam2);SELECT '{0}' AS '{0}', @outParam2",
                OUT_PARAMETER_SENTINEL
            )
        );
        assert_eq!(call.parameters[0].value(), &Value::I32(7));
        assert_eq!(call.parameters[1].db_type(), MySqlDbType::NewDecimal);
        assert_eq!(command.out_parameters()[0].parameter().direction(), Output);
    }

    #[test]
    fn explicit_direction_wins_over_signature() {
        let cache = signature();
        let mut command = Command::procedure("transfer")
            .bind(param("@source", 1, Input))
            .bind(param("@amount", 2, InputOutput))
            .bind(Parameter::new("@balance", Value::Null));

        let call = synthesize_call(&mut command, &cache).unwrap();
        assert!(call.sql.starts_with("SET @outParam1=@inParam1; CALL `app`.`transfer`(@inParam0, @outParam1, @outParam2);"));
    }

    #[test]
    fn missing_declared_parameter() {
        let cache = signature();
        let mut command = Command::procedure("transfer").bind(Parameter::new("@source", 1));

        let err = synthesize_call(&mut command, &cache).unwrap_err();
        assert_eq!(err, ProtocolError::ProcedureParameterNotFound { name: "amount".into() });
    }

    #[test]
    fn ambiguous_declared_parameter() {
        let cache = signature();
        let mut command = Command::procedure("transfer")
            .bind(Parameter::new("@source", 1))
            .bind(Parameter::new("?SOURCE", 2));

        let err = synthesize_call(&mut command, &cache).unwrap_err();
        assert_eq!(err, ProtocolError::AmbiguousParameter { name: "source".into() });
    }

    #[test]
    fn function_signature_requires_return_parameter() {
        let mut cache = ProcedureCache::new();
        cache.insert(ProcedureSignature::new(
            "app",
            "f",
            [ProcedureParameter::new("", ReturnValue, MySqlDbType::Int32)],
        ));

        let mut command = Command::procedure("f");
        let err = synthesize_call(&mut command, &cache).unwrap_err();
        assert_eq!(err, ProtocolError::MissingReturnParameter { procedure: "`app`.`f`".into() });
    }

    #[test]
    fn sentinel() {
        assert!(is_out_parameter_sentinel(OUT_PARAMETER_SENTINEL));
        assert!(!is_out_parameter_sentinel("balance"));
    }
}
