//! MySQL Command Messages
//!
//! <https://dev.mysql.com/doc/dev/mysql-server/latest/page_protocol_command_phase_ps.html>
use bytes::{BufMut, BytesMut};
use std::borrow::Cow;

use super::{COM_STMT_CLOSE, COM_STMT_EXECUTE, COM_STMT_PREPARE, COM_STMT_RESET, ColumnType, StatementId};
use crate::value::{GuidFormat, Value};

/// Write a command message to `buf`.
pub fn write<F: FrontendProtocol>(msg: F, buf: &mut BytesMut) {
    // command
    const PREFIX: usize = 1;

    let size_hint = msg.size_hint();
    buf.reserve(PREFIX + size_hint);

    let offset = buf.len();
    buf.put_u8(F::MSGTYPE);

    msg.encode(&mut *buf);

    assert_eq!(
        buf.len() - offset,
        PREFIX + size_hint,
        "Command message body size not equal to size hint"
    );
}

/// A type which can be encoded into a command message.
pub trait FrontendProtocol {
    /// Command byte.
    const MSGTYPE: u8;

    /// Size of the body, excluding the command byte.
    fn size_hint(&self) -> usize;

    /// Write the body of the message.
    ///
    /// The length of body written must be equal to the
    /// length returned by [`size_hint`][FrontendProtocol::size_hint].
    fn encode(self, buf: impl BufMut);
}

/// Create a prepared statement from the sql.
#[derive(Debug)]
pub struct StmtPrepare<'a> {
    /// The query to prepare, to the end of the packet.
    pub sql: &'a str,
}

impl FrontendProtocol for StmtPrepare<'_> {
    const MSGTYPE: u8 = COM_STMT_PREPARE;

    fn size_hint(&self) -> usize {
        self.sql.len()
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_slice(self.sql.as_bytes());
    }
}

/// Parameter of [`StmtExecute`] with its resolved wire type.
#[derive(Debug)]
pub struct BoundParameter<'a> {
    pub column_type: ColumnType,
    /// [`UNSIGNED_FLAG`][super::UNSIGNED_FLAG] or zero.
    pub flags: u8,
    /// Value converted with [`Value::to_wire`] for `column_type`.
    pub value: Cow<'a, Value>,
}

/// Execute a prepared statement.
///
/// ```text
/// statement_id  u32
/// flags         u8     0, no cursor
/// iteration     u32    always 1
/// -- only when the statement has parameters
/// null_bitmap   [u8]   (n + 7) / 8
/// new_params    u8     1
/// types         [u8;2] n times, type then flag
/// values        [u8]   binary value of every non null parameter
/// ```
#[derive(Debug)]
pub struct StmtExecute<'a> {
    pub statement_id: StatementId,
    pub params: &'a [BoundParameter<'a>],
    pub guid_format: GuidFormat,
}

/// `CURSOR_TYPE_NO_CURSOR`
const NO_CURSOR: u8 = 0x00;
const ITERATION_COUNT: u32 = 1;
const NEW_PARAMS_BOUND: u8 = 1;

/// Number of bytes of the null bitmap for `len` parameters.
pub const fn null_bitmap_len(len: usize) -> usize {
    len.div_ceil(8)
}

impl FrontendProtocol for StmtExecute<'_> {
    const MSGTYPE: u8 = COM_STMT_EXECUTE;

    fn size_hint(&self) -> usize {
        let header = size_of::<StatementId>() + size_of::<u8>() + size_of::<u32>();
        if self.params.is_empty() {
            return header;
        }
        header
            + null_bitmap_len(self.params.len())
            + size_of::<u8>()
            + self.params.len() * 2
            + self
                .params
                .iter()
                .map(|e| e.value.binary_len(self.guid_format))
                .sum::<usize>()
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_u32_le(self.statement_id);
        buf.put_u8(NO_CURSOR);
        buf.put_u32_le(ITERATION_COUNT);

        if self.params.is_empty() {
            return;
        }

        let mut null_byte = 0u8;
        for (i, param) in self.params.iter().enumerate() {
            if param.value.is_null() {
                null_byte |= 1 << (i % 8);
            }
            if i % 8 == 7 {
                buf.put_u8(null_byte);
                null_byte = 0;
            }
        }
        if self.params.len() % 8 != 0 {
            buf.put_u8(null_byte);
        }

        buf.put_u8(NEW_PARAMS_BOUND);

        for param in self.params {
            buf.put_u8(param.column_type.code());
            buf.put_u8(param.flags);
        }

        for param in self.params {
            param.value.put_binary(&mut buf, self.guid_format);
        }
    }
}

/// Deallocate a prepared statement, the server sends no response.
#[derive(Debug)]
pub struct StmtClose {
    pub statement_id: StatementId,
}

impl FrontendProtocol for StmtClose {
    const MSGTYPE: u8 = COM_STMT_CLOSE;

    fn size_hint(&self) -> usize {
        size_of::<StatementId>()
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_u32_le(self.statement_id);
    }
}

/// Reset the data accumulated for a prepared statement.
#[derive(Debug)]
pub struct StmtReset {
    pub statement_id: StatementId,
}

impl FrontendProtocol for StmtReset {
    const MSGTYPE: u8 = COM_STMT_RESET;

    fn size_hint(&self) -> usize {
        size_of::<StatementId>()
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_u32_le(self.statement_id);
    }
}
