use bytes::BytesMut;
use myro::{
    Command, Config, FrameEncoder, Parameter, ParameterDirection, Position, ProcedureCache,
    Result, Value,
    mysql::MySqlDbType,
    procedure::{ProcedureParameter, ProcedureSignature},
};

pub fn main(config: &Config) -> Result<()> {
    let encoder = FrameEncoder::new(config.options());

    let mut procedures = ProcedureCache::new();
    procedures.insert(ProcedureSignature::new(
        "app",
        "increment",
        [
            ProcedureParameter::new("amount", ParameterDirection::Input, MySqlDbType::Int32),
            ProcedureParameter::new("counter", ParameterDirection::InputOutput, MySqlDbType::Int64),
            ProcedureParameter::new("at", ParameterDirection::Output, MySqlDbType::DateTime),
        ],
    ));

    let mut batch = [
        Command::procedure("increment")
            .bind(Parameter::new("@counter", 10i64))
            .bind(Parameter::new("@amount", 2))
            .bind(Parameter::new("@at", Value::Null)),
        Command::procedure("app.version")
            .bind(Parameter::new("@v", Value::Null).with_direction(ParameterDirection::ReturnValue)),
    ];

    let mut position = Position::new();
    let mut buf = BytesMut::new();

    while encoder.write_next_frame(&mut batch, &mut position, &procedures, &mut buf)? {
        let frame = buf.split();
        tracing::info!(sql = %String::from_utf8_lossy(&frame[1..]), "call");
    }

    for out in batch[0].out_parameters() {
        tracing::info!(variable = out.variable(), parameter = out.parameter().name(), "output");
    }
    if let Some(ret) = batch[1].return_parameter() {
        tracing::info!(parameter = ret.name(), "return value");
    }

    Ok(())
}
