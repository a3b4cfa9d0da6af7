// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]

//! # Redshift DB-API cursor
//!
//! The client-facing cursor of an Amazon Redshift driver: statement
//! execution, row retrieval and catalog reflection on top of a transport
//! that implements [`Connection`].
//!
//! ## Features
//!
//! - **DB-API cursor**: `execute`, `executemany`, `callproc`, `fetchone`,
//!   `fetchmany`, `fetchall`, iteration
//! - **Paramstyles**: qmark, numeric, named, format and pyformat rewritten to `$n`
//! - **Bulk insert**: batched multi-row inserts from delimited files
//! - **Arrow interop**: result sets as `RecordBatch`, record batches as inserts
//! - **Catalog reflection**: JDBC-shaped tables, columns, schemas, catalogs,
//!   primary keys, foreign keys and procedures
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use redshift_dbapi::{Cursor, Params, Result, Value};
//!
//! fn list_orders(conn: &mut impl redshift_dbapi::Connection) -> Result<()> {
//!     let mut cursor = Cursor::new(conn);
//!     cursor.execute("select id, total from orders where region = %s", vec![Value::from("eu")])?;
//!     for row in cursor.by_ref() {
//!         println!("{:?}", row?);
//!     }
//!
//!     let tables = cursor.get_tables(None, Some("public"), None, &["TABLE"])?;
//!     println!("{} tables", tables.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Cursor                             │
//! │  execute / fetch*   insert_data_bulk   *_dataframe   get_*   │
//! └──────────────────────────────────────────────────────────────┘
//!          │                                        │
//! ┌────────┴─────────┐                    ┌─────────┴──────────┐
//! │   Paramstyle     │                    │  Catalog builders  │
//! │  %s :name ? → $n │                    │  type map, filters │
//! └────────┬─────────┘                    └─────────┬──────────┘
//!          └───────────────────┬────────────────────┘
//! ┌────────────────────────────┴─────────────────────────────────┐
//! │              Connection (transport, not in this crate)       │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the cursor layer
pub mod error;

/// Decoded values, rows and statement parameters
pub mod types;

/// Cursor configuration
pub mod config;

/// Paramstyle parsing and `$n` rewriting
pub mod paramstyle;

/// Transport contract
pub mod connection;

/// Row descriptions and result sets
pub mod result;

/// The DB-API cursor
pub mod cursor;

/// Catalog reflection queries
pub mod catalog;

/// Scripted in-memory connection
pub mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use catalog::{ForeignKey, RelationKey, SchemaPatternMode};
pub use config::CursorConfig;
pub use connection::{Connection, CopyStream, ExecuteOptions, ExecuteRequest};
pub use cursor::{BulkInsert, Cursor};
pub use error::{Error, Result};
pub use paramstyle::Paramstyle;
pub use result::{ColumnDescription, StatementResult};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
