use std::sync::Arc;

use bytes::BytesMut;
use myro::{
    Command, Config, FrameEncoder, Guid, Parameter, Position, Result, Value,
    statement::{FormalParameter, PreparedStatement, PreparedStatements},
};
use time::macros::datetime;

pub fn main(config: &Config) -> Result<()> {
    let encoder = FrameEncoder::new(config.options()).with_session(1);

    let guid = Guid::parse("6f9619ff-8b86-d011-b42d-00c04fc964ff").unwrap_or(Guid::from_bytes([0; 16]));
    let meta = serde_json::json!({ "tags": ["a", "b"] });

    let prepared = Arc::new(PreparedStatements::new(
        "INSERT INTO post (id, meta, created) VALUES (?, ?, ?)",
        vec![PreparedStatement::new(
            1,
            (0..3).map(FormalParameter::positional),
        )],
    ));

    let mut batch = [
        Command::text("SELECT * FROM post WHERE title = @title")
            .bind(Parameter::new("@title", "it's \\ here")),
        Command::text(prepared.sql())
            .bind(Parameter::positional(guid))
            .bind(Parameter::positional(Value::from(&meta)))
            .bind(Parameter::positional(datetime!(2025-01-02 03:04:05.5)))
            .with_prepared(prepared),
    ];

    let mut position = Position::new();
    let mut buf = BytesMut::new();

    while encoder.write_next_frame(&mut batch, &mut position, &(), &mut buf)? {
        let frame = buf.split();
        tracing::info!(len = frame.len(), frame = %crate::hex(&frame), "frame");
    }

    Ok(())
}
