use std::sync::Arc;

use bytes::BytesMut;
use myro::{
    Config,
    mysql::frontend::{self, StmtClose, StmtPrepare},
    statement::{FormalParameter, PreparedStatement, PreparedStatements},
};

pub fn main(config: &Config) {
    let mut cache = config.statement_cache();
    let mut buf = BytesMut::new();

    for (id, sql) in ["SELECT ?", "SELECT ?, ?", "SELECT ?, ?, ?"].into_iter().enumerate() {
        if cache.get(sql).is_some() {
            continue;
        }

        frontend::write(StmtPrepare { sql }, &mut buf);
        tracing::info!(frame = %crate::hex(&buf.split()), "prepare");

        let count = sql.matches('?').count();
        let statement = PreparedStatement::new(id as u32 + 1, (0..count).map(FormalParameter::positional));
        let prepared = Arc::new(PreparedStatements::new(sql, vec![statement]));

        if let Some(evicted) = cache.insert(prepared) {
            for statement in evicted.statements() {
                frontend::write(StmtClose { statement_id: statement.id() }, &mut buf);
                tracing::info!(frame = %crate::hex(&buf.split()), "close");
            }
        }
    }

    tracing::info!(?cache, "cached");

    for prepared in cache.clear() {
        for statement in prepared.statements() {
            frontend::write(StmtClose { statement_id: statement.id() }, &mut buf);
        }
    }
    tracing::info!(len = buf.len(), "closed all");
}
