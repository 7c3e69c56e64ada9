//! MySQL Command Payload Encoder
//!
//! Turns logical database commands into MySQL command frames: text queries with inlined
//! parameters, prepared statement executions with binary parameters, and stored procedure
//! calls rewritten so output parameters come back as a result set.
//!
//! # Examples
//!
//! Encode a batch, one frame per call:
//!
//! ```
//! use std::sync::Arc;
//! use bytes::BytesMut;
//! use myro::{
//!     Command, FrameEncoder, Parameter, Position,
//!     statement::{FormalParameter, PreparedStatement, PreparedStatements},
//! };
//!
//! # fn app() -> myro::Result<()> {
//! let prepared = Arc::new(PreparedStatements::new(
//!     "UPDATE t SET a = @a",
//!     vec![PreparedStatement::new(7, [FormalParameter::named("@a", 0)])],
//! ));
//!
//! let mut batch = [
//!     Command::text("SELECT @id").bind(Parameter::new("@id", 42)),
//!     Command::text("UPDATE t SET a = @a")
//!         .bind(Parameter::new("@a", "x"))
//!         .with_prepared(prepared),
//! ];
//!
//! let encoder = FrameEncoder::default();
//! let mut position = Position::new();
//! let mut buf = BytesMut::new();
//!
//! // COM_QUERY
//! assert!(encoder.write_next_frame(&mut batch, &mut position, &(), &mut buf)?);
//! assert_eq!(&buf.split()[..], b"\x03SELECT 42");
//!
//! // COM_STMT_EXECUTE
//! assert!(encoder.write_next_frame(&mut batch, &mut position, &(), &mut buf)?);
//! assert_eq!(buf.split()[0], 0x17);
//!
//! assert!(!encoder.write_next_frame(&mut batch, &mut position, &(), &mut buf)?);
//! # Ok(())
//! # }
//! # app().unwrap();
//! ```
//!
//! Stored procedure output parameters:
//!
//! ```
//! use bytes::BytesMut;
//! use myro::{Command, FrameEncoder, Parameter, ParameterDirection, Position, Value};
//!
//! # fn app() -> myro::Result<()> {
//! let mut batch = [Command::procedure("add_one")
//!     .bind(Parameter::new("@n", 1).with_direction(ParameterDirection::Input))
//!     .bind(Parameter::new("@result", Value::Null).with_direction(ParameterDirection::Output))];
//!
//! let mut buf = BytesMut::new();
//! FrameEncoder::default().write_all(&mut batch, &mut Position::new(), &(), &mut buf)?;
//!
//! // the last result set is tagged with the sentinel column
//! let out = batch[0].out_parameters();
//! assert_eq!(out[0].variable(), "@outParam1");
//! assert_eq!(out[0].parameter().name(), "@result");
//! # Ok(())
//! # }
//! # app().unwrap();
//! ```
mod common;
mod ext;

// Protocol
pub mod mysql;

// Encoding
pub mod value;
pub mod encode;

// Component
pub mod parameter;
pub mod command;
pub mod statement;
pub mod procedure;

// Operation
pub mod prepare;
pub mod execute;
pub mod batch;

pub mod config;

mod error;


pub use value::{Guid, GuidFormat, Value};
pub use parameter::{Parameter, ParameterCollection, ParameterDirection};
pub use command::{Command, CommandBehavior, CommandType};
pub use procedure::{OUT_PARAMETER_SENTINEL, ProcedureCache, ProcedureLookup};
pub use batch::{FrameEncoder, Position};
pub use config::{Config, FormatOptions};
pub use error::{Error, ErrorKind, Result};
