//! Domain types for coordinated creation of sharded resources.
//!
//! Everything in here is plain data: the validated [`CreateIntent`], the
//! [`StatusRecord`] written by the fulfillment side, and the command parser
//! that turns `CREATE TABLE ... shards=N rf=M` text into an intent.

pub mod domain;
pub mod error;
pub mod parser;

pub use domain::*;
pub use error::{CoreError, Result};
pub use parser::{matches_request, parse_create};
