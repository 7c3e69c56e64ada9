//! Command batch encoding.
//!
//! A batch is a slice of [`Command`]s walked by a [`Position`]. Every call to
//! [`FrameEncoder::write_next_frame`] writes exactly one frame and advances the position by
//! one frame:
//!
//! - a command without prepared statements is one `COM_QUERY` frame
//! - a prepared command is one `COM_STMT_EXECUTE` frame per prepared statement
use bytes::{BufMut, BytesMut};

use crate::{
    Result,
    command::{Command, CommandType},
    common::{debug, span, verbose},
    config::FormatOptions,
    execute::write_execute,
    mysql::{COM_QUERY, DefaultTypeMapper, ProtocolError, TypeMapper},
    prepare::{LiteralPreparer, StatementPreparer},
    procedure::{ProcedureLookup, synthesize_call},
};

/// Position in a command batch.
///
/// `command_index` is the command the next frame is written for, `statement_index` is the
/// prepared statement of that command. The position is terminal when `command_index` equals
/// the batch length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    command_index: usize,
    statement_index: usize,
}

impl Position {
    /// Start of the batch.
    pub const fn new() -> Position {
        Position { command_index: 0, statement_index: 0 }
    }

    /// Arbitrary position, checked by [`Position::validate`] before use.
    pub const fn at(command_index: usize, statement_index: usize) -> Position {
        Position { command_index, statement_index }
    }

    pub const fn command_index(&self) -> usize {
        self.command_index
    }

    pub const fn statement_index(&self) -> usize {
        self.statement_index
    }

    /// Returns `true` if no frame is left in `batch`.
    pub fn is_terminal(&self, batch: &[Command]) -> bool {
        self.command_index >= batch.len()
    }

    /// Check the position against `batch`.
    pub fn validate(&self, batch: &[Command]) -> Result<(), ProtocolError> {
        let invalid = || ProtocolError::invalid_position(self.command_index, self.statement_index);

        let Some(command) = batch.get(self.command_index) else {
            return match self.command_index == batch.len() && self.statement_index == 0 {
                true => Ok(()),
                false => Err(invalid()),
            };
        };

        let statements = command.prepared().map_or(0, |e| e.len());
        match command.prepared() {
            Some(_) if statements == 0 => Err(ProtocolError::EmptyStatements { command: self.command_index }),
            Some(_) if self.statement_index >= statements => Err(invalid()),
            None if self.statement_index != 0 => Err(invalid()),
            _ => Ok(()),
        }
    }

    /// Position after one frame of a command with `statements` prepared statements.
    fn advance(self, statements: usize) -> Position {
        let next = self.statement_index + 1;
        if next < statements {
            Position { statement_index: next, ..self }
        } else {
            Position { command_index: self.command_index + 1, statement_index: 0 }
        }
    }
}

/// Write command batch frames.
///
/// Holds the per connection [`FormatOptions`], the [`StatementPreparer`] used for text
/// commands and the [`TypeMapper`] used for prepared statement parameters.
#[derive(Debug)]
pub struct FrameEncoder<P = LiteralPreparer, M = DefaultTypeMapper> {
    options: FormatOptions,
    preparer: P,
    mapper: M,
    session: Option<u32>,
}

impl FrameEncoder {
    pub fn new(options: FormatOptions) -> FrameEncoder {
        FrameEncoder {
            options,
            preparer: LiteralPreparer,
            mapper: DefaultTypeMapper,
            session: None,
        }
    }
}

impl Default for FrameEncoder {
    fn default() -> Self {
        FrameEncoder::new(FormatOptions::default())
    }
}

impl<P, M> FrameEncoder<P, M> {
    pub fn with_preparer<P2>(self, preparer: P2) -> FrameEncoder<P2, M> {
        FrameEncoder { options: self.options, preparer, mapper: self.mapper, session: self.session }
    }

    pub fn with_mapper<M2>(self, mapper: M2) -> FrameEncoder<P, M2> {
        FrameEncoder { options: self.options, preparer: self.preparer, mapper, session: self.session }
    }

    /// Session id included in trace records.
    pub fn with_session(mut self, session: u32) -> FrameEncoder<P, M> {
        self.session = Some(session);
        self
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }
}

impl<P: StatementPreparer, M: TypeMapper> FrameEncoder<P, M> {
    /// Write the frame at `position` and advance it.
    ///
    /// Returns `false` without writing when `position` is terminal.
    ///
    /// On error, the position is not advanced and `buf` is truncated to its length before the
    /// call. The batch must be considered failed, stored procedure results recorded on
    /// previous commands are stale.
    pub fn write_next_frame<L: ProcedureLookup + ?Sized>(
        &self,
        batch: &mut [Command],
        position: &mut Position,
        procedures: &L,
        buf: &mut BytesMut,
    ) -> Result<bool> {
        position.validate(batch)?;

        let current = *position;
        let Some(command) = batch.get_mut(current.command_index) else {
            return Ok(false);
        };

        span!("frame", session = ?self.session, command = current.command_index);

        let offset = buf.len();
        match self.write_frame(command, current, procedures, buf) {
            Ok(statements) => {
                *position = current.advance(statements);
                Ok(true)
            }
            Err(err) => {
                debug!("discarding frame of command {}: {err}", current.command_index);
                buf.truncate(offset);
                Err(err.context(format!("command {}", current.command_index)))
            }
        }
    }

    /// Write every remaining frame, returns the number of frames written.
    pub fn write_all<L: ProcedureLookup + ?Sized>(
        &self,
        batch: &mut [Command],
        position: &mut Position,
        procedures: &L,
        buf: &mut BytesMut,
    ) -> Result<usize> {
        let mut frames = 0;
        while self.write_next_frame(batch, position, procedures, buf)? {
            frames += 1;
        }
        Ok(frames)
    }

    /// Returns the number of prepared statements of the command, zero for a text frame.
    fn write_frame<L: ProcedureLookup + ?Sized>(
        &self,
        command: &mut Command,
        position: Position,
        procedures: &L,
        buf: &mut BytesMut,
    ) -> Result<usize> {
        let Some(prepared) = command.prepared().cloned() else {
            verbose!(session = ?self.session, sql = command.command_text(), "query");
            buf.put_u8(COM_QUERY);
            self.write_query_payload(command, procedures, buf)?;
            return Ok(0);
        };

        let statement = prepared
            .get(position.statement_index)
            .ok_or_else(|| ProtocolError::invalid_position(position.command_index, position.statement_index))?;

        verbose!(session = ?self.session, statement = statement.id(), "execute");

        write_execute(statement, command.parameters(), &self.options, &self.mapper, buf)?;
        Ok(prepared.len())
    }

    /// Write the body of a `COM_QUERY` frame for `command`.
    ///
    /// A stored procedure is synthesized into a call first, its session variables are allowed
    /// regardless of [`FormatOptions::allow_user_variables`].
    pub fn write_query_payload<L: ProcedureLookup + ?Sized>(
        &self,
        command: &mut Command,
        procedures: &L,
        buf: &mut BytesMut,
    ) -> Result<()> {
        match command.command_type() {
            CommandType::Text => {
                self.preparer.write(command.command_text(), command.parameters(), &self.options, buf)
            }
            CommandType::StoredProcedure => {
                let call = synthesize_call(command, procedures)?;
                let options = FormatOptions { allow_user_variables: true, ..self.options };
                self.preparer.write(&call.sql, &call.parameters, &options, buf)
            }
        }
    }
}
