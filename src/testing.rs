//! In-memory [`Connection`] for tests
//!
//! `ScriptedConnection` records every statement it receives and answers from
//! a script: substring rules first, then a FIFO of queued results, then an
//! empty command result.

use crate::connection::{Connection, CopyStream, ExecuteRequest};
use crate::error::{Error, Result};
use crate::result::{ColumnDescription, StatementResult};
use crate::types::{Row, Value};
use std::collections::VecDeque;
use std::io::{Read, Write};

/// A statement as the transport saw it
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    /// SQL after paramstyle conversion
    pub sql: String,
    /// Arguments bound to `$1..$n`
    pub args: Vec<Value>,
}

#[derive(Debug, Clone)]
enum Response {
    Result(StatementResult),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    response: Response,
}

/// Scripted stand-in for a live session
#[derive(Debug, Clone)]
pub struct ScriptedConnection {
    rules: Vec<Rule>,
    queued: VecDeque<StatementResult>,
    executed: Vec<ExecutedStatement>,
    copy_in: Vec<u8>,
    copy_out: Vec<u8>,
    autocommit: bool,
    in_transaction: bool,
    single_database_metadata: bool,
    open: bool,
}

impl Default for ScriptedConnection {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            queued: VecDeque::new(),
            executed: Vec::new(),
            copy_in: Vec::new(),
            copy_out: Vec::new(),
            autocommit: true,
            in_transaction: false,
            single_database_metadata: true,
            open: true,
        }
    }
}

impl ScriptedConnection {
    /// An open autocommit connection with no rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer statements containing `pattern` with `result`
    #[must_use]
    pub fn on(mut self, pattern: impl Into<String>, result: StatementResult) -> Self {
        self.rules.push(Rule {
            pattern: pattern.into(),
            response: Response::Result(result),
        });
        self
    }

    /// Fail statements containing `pattern` with a database error
    #[must_use]
    pub fn fail(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules.push(Rule {
            pattern: pattern.into(),
            response: Response::Fail(message.into()),
        });
        self
    }

    /// Queue a result for the next statement no rule matches
    #[must_use]
    pub fn then(mut self, result: StatementResult) -> Self {
        self.queued.push_back(result);
        self
    }

    /// Autocommit mode; off makes the cursor open a transaction first
    #[must_use]
    pub fn with_autocommit(mut self, autocommit: bool) -> Self {
        self.autocommit = autocommit;
        self
    }

    /// Value reported by `is_single_database_metadata`
    #[must_use]
    pub fn with_single_database_metadata(mut self, single: bool) -> Self {
        self.single_database_metadata = single;
        self
    }

    /// Bytes written to the sink of `COPY ... TO STDOUT`
    #[must_use]
    pub fn with_copy_out(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.copy_out = data.into();
        self
    }

    /// Simulate the server closing the socket
    pub fn close_socket(&mut self) {
        self.open = false;
    }

    /// Every statement run so far, in order
    pub fn executed(&self) -> &[ExecutedStatement] {
        &self.executed
    }

    /// SQL of every executed statement, in order
    pub fn statements(&self) -> Vec<&str> {
        self.executed.iter().map(|s| s.sql.as_str()).collect()
    }

    /// Everything read from `COPY ... FROM STDIN` streams
    pub fn copy_in(&self) -> &[u8] {
        &self.copy_in
    }

    fn respond(&mut self, sql: &str) -> Result<StatementResult> {
        if let Some(rule) = self.rules.iter().find(|rule| sql.contains(&rule.pattern)) {
            return match &rule.response {
                Response::Result(result) => Ok(result.clone()),
                Response::Fail(message) => Err(Error::database(message.clone())),
            };
        }
        Ok(self
            .queued
            .pop_front()
            .unwrap_or_else(|| StatementResult::command(-1)))
    }
}

impl Connection for ScriptedConnection {
    fn execute(&mut self, request: ExecuteRequest<'_>) -> Result<StatementResult> {
        self.executed.push(ExecutedStatement {
            sql: request.sql.to_string(),
            args: request.args.to_vec(),
        });
        if request.sql.eq_ignore_ascii_case("begin transaction") {
            self.in_transaction = true;
        }

        match request.stream {
            Some(CopyStream::From(reader)) => {
                reader.read_to_end(&mut self.copy_in)?;
            }
            Some(CopyStream::To(writer)) => {
                writer.write_all(&self.copy_out)?;
            }
            None => {}
        }

        self.respond(request.sql)
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn autocommit(&self) -> bool {
        self.autocommit
    }

    fn is_single_database_metadata(&self) -> bool {
        self.single_database_metadata
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// Single-column result, one row per value
pub fn rows_of(label: &str, type_oid: u32, values: Vec<Value>) -> StatementResult {
    let rows: Vec<Row> = values.into_iter().map(|v| vec![v]).collect();
    StatementResult::query(vec![ColumnDescription::new(label, type_oid)], rows)
}
