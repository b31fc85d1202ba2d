//! Database engine handling for deployment scripts
//!
//! Vendor-specific knowledge (client command lines, dump commands, default
//! ports, restore-output quirks) lives here behind the [`TypeHandler`]
//! trait, so steps that restore, dump, or shell into databases never
//! special-case an engine.

#![warn(missing_docs)]

pub mod database;
pub mod error;
pub mod filter;
pub mod handler;

mod mysql;
mod postgres;

pub use database::{Database, DbType};
pub use error::{Error, Result};
pub use filter::filter_restore_output;
pub use handler::{handler_for, ConnectionParams, TypeHandler};
pub use mysql::MysqlHandler;
pub use postgres::PostgresHandler;
