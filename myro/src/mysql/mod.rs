//! MySQL Client/Server Command Phase
//!
//! Every command the client sends is a single packet whose first byte identifies the command,
//! the rest of the packet is the command body. Packet framing (the 3 byte length and the
//! sequence id) belongs to the transport and is not written here.
//!
//! ```text
//! ┏━━━━━━━━━┳━━━━━━┓
//! ┃ Command ┃ Body ┃
//! ┣━━━━━━━━━╋━━━━━━┫
//! ┃   u8    ┃ [u8] ┃
//! ┣━━━━━━━━━╋━━━━━━┫
//! ┃   03    ┃  ..  ┃
//! ┗━━━━━━━━━┻━━━━━━┛
//! ```
//!
//! ## Text and Binary Protocol
//!
//! `COM_QUERY` carries plain sql text, parameter values are inlined as literal before sending.
//!
//! `COM_STMT_EXECUTE` executes a statement previously prepared with `COM_STMT_PREPARE`, its
//! parameters are sent in binary form, each one tagged with a [`ColumnType`].
//!
//! <https://dev.mysql.com/doc/dev/mysql-server/latest/page_protocol_command_phase.html>

mod column_type;
mod type_mapper;

pub mod frontend;

mod error;

pub use column_type::{ColumnType, MySqlDbType, UNSIGNED_FLAG};
pub use type_mapper::{DefaultTypeMapper, TypeMapper};

pub use frontend::FrontendProtocol;
pub use error::ProtocolError;

/// Text protocol query.
pub const COM_QUERY: u8 = 0x03;
/// Prepare a statement.
pub const COM_STMT_PREPARE: u8 = 0x16;
/// Execute a prepared statement.
pub const COM_STMT_EXECUTE: u8 = 0x17;
/// Deallocate a prepared statement.
pub const COM_STMT_CLOSE: u8 = 0x19;
/// Reset the data of a prepared statement.
pub const COM_STMT_RESET: u8 = 0x1a;

/// Server assigned prepared statement identifier.
pub type StatementId = u32;
