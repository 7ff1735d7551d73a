//! Parser for `CREATE TABLE` statements that carry sharding options.
//!
//! The accepted shape is
//!
//! ```text
//! CREATE TABLE [cluster:]name [(structure)] shards=N rf=M [extra options]
//! ```
//!
//! where `N` and `M` may be quoted (`shards='3'`). Keywords are matched
//! case-insensitively and the statement may span several lines.

use regex::Regex;
use std::sync::OnceLock;

use crate::domain::CreateIntent;
use crate::error::{CoreError, Result};

const PARSE_FAILED: &str = "Failed to parse query";

fn create_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(concat!(
            r"(?is)^\s*CREATE\s+TABLE\s+",
            r"(?:(?P<cluster>[^:\s]+):)?(?P<name>[^:\s()]+)\s*",
            r"(?:\((?P<structure>.+?)\)\s*)?",
            r"shards=(?P<shards>\d+|'\d+')\s+",
            r"rf=(?P<rf>\d+|'\d+')\s*",
            r"(?P<extra>.*)$",
        ))
        .expect("create pattern is a valid regex")
    })
}

/// Parse a sharded `CREATE TABLE` statement into a validated intent.
pub fn parse_create(query: &str) -> Result<CreateIntent> {
    let caps = create_pattern()
        .captures(query)
        .ok_or_else(|| CoreError::Parse(PARSE_FAILED.to_string()))?;

    let text = |name: &str| caps.name(name).map(|m| m.as_str().to_string());

    let shard_count = parse_count(caps.name("shards").map(|m| m.as_str()))?;
    let replication_factor = parse_count(caps.name("rf").map(|m| m.as_str()))?;

    CreateIntent::new(
        text("cluster"),
        text("name").unwrap_or_default(),
        text("structure"),
        text("extra").map(|e| e.trim().to_string()).unwrap_or_default(),
        shard_count,
        replication_factor,
    )
}

fn parse_count(raw: Option<&str>) -> Result<u32> {
    raw.map(|s| s.trim_matches('\''))
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| CoreError::Parse(PARSE_FAILED.to_string()))
}

/// Whether a request is one this parser should handle.
///
/// The upstream daemon forwards statements it could not execute itself,
/// tagging them with its own parser error. Only `P03` syntax errors on a
/// `CREATE TABLE` statement are ours.
pub fn matches_request(query: &str, error: &str) -> bool {
    let error_lower = error.to_lowercase();
    error.starts_with("P03")
        && error_lower.contains("syntax error")
        && query.trim_start().to_lowercase().starts_with("create table")
}
