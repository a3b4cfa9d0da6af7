//! Connection contract
//!
//! The cursor never touches a socket. Everything on the wire is delegated to
//! an implementation of [`Connection`]: encoding, round trips, decoding of
//! data rows into the [`RowBuffer`](crate::result::RowBuffer) it hands back.

use crate::error::Result;
use crate::result::StatementResult;
use crate::types::Value;
use std::fmt;
use std::io::{Read, Write};

/// COPY data source or sink passed through to the transport
pub enum CopyStream<'a> {
    /// Readable input for `COPY ... FROM STDIN`
    From(&'a mut dyn Read),
    /// Writable output for `COPY ... TO STDOUT`
    To(&'a mut dyn Write),
}

impl fmt::Debug for CopyStream<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyStream::From(_) => f.write_str("CopyStream::From(..)"),
            CopyStream::To(_) => f.write_str("CopyStream::To(..)"),
        }
    }
}

/// Per-statement options for `Cursor::execute_with`
#[derive(Debug, Default)]
pub struct ExecuteOptions<'a> {
    /// COPY data source or sink
    pub stream: Option<CopyStream<'a>>,
    /// Merge socket reads while decoding this statement
    pub merge_socket_read: bool,
}

impl<'a> ExecuteOptions<'a> {
    /// No stream, no socket read merging
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a COPY stream
    #[must_use]
    pub fn with_stream(mut self, stream: CopyStream<'a>) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Ask the transport to merge socket reads for this statement
    #[must_use]
    pub fn with_merge_socket_read(mut self, merge: bool) -> Self {
        self.merge_socket_read = merge;
        self
    }
}

/// One statement as handed to the transport
#[derive(Debug)]
pub struct ExecuteRequest<'a> {
    /// SQL with `$n` placeholders
    pub sql: &'a str,
    /// Flat positional arguments for `$1..$n`
    pub args: &'a [Value],
    /// COPY data source or sink
    pub stream: Option<CopyStream<'a>>,
    /// Merge socket reads while decoding this statement
    pub merge_socket_read: bool,
}

impl<'a> ExecuteRequest<'a> {
    /// A plain statement with no COPY stream
    pub fn new(sql: &'a str, args: &'a [Value]) -> Self {
        Self {
            sql,
            args,
            stream: None,
            merge_socket_read: false,
        }
    }
}

/// A live session to the server
///
/// Implementations own the socket. Errors returned from `execute` are
/// surfaced to the caller unchanged.
pub trait Connection {
    /// Run one statement and return its description and decoded rows
    fn execute(&mut self, request: ExecuteRequest<'_>) -> Result<StatementResult>;

    /// Whether an explicit transaction is open
    fn in_transaction(&self) -> bool;

    /// Whether each statement commits on its own
    fn autocommit(&self) -> bool;

    /// Whether catalog metadata is limited to the connected database
    fn is_single_database_metadata(&self) -> bool;

    /// Whether the transport socket is still open
    fn is_open(&self) -> bool;

    /// Raw socket state for debug logging
    fn socket_state(&self) -> String {
        format!("open={}", self.is_open())
    }
}
