//! Statement model and parser for the `q` parameter of `/query`.
//!
//! Only the administrative statements executed by the gateway are parsed
//! field by field. Everything else is recognised by its leading keywords
//! and carried through as raw text for the query engine behind the gateway.

pub mod error;
pub mod lexer;
pub mod parser;

use std::str::FromStr;
use std::time::Duration;

pub use error::ParseError;
pub use parser::parse_query;

/// Ordered list of statements; execution follows this order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    pub statements: Vec<Statement>,
}

impl Query {
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl FromStr for Query {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_query(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    CreateDatabase {
        name: String,
    },
    DropDatabase {
        name: String,
    },
    CreateUser {
        name: String,
        password: String,
        /// `WITH ALL PRIVILEGES` was present in the statement text
        all_privileges: bool,
    },
    DropUser {
        name: String,
    },
    CreateRetentionPolicy {
        name: String,
        database: String,
        duration: Duration,
        replication: i64,
    },
    AlterRetentionPolicy {
        name: String,
        database: String,
        duration: Option<Duration>,
        replication: Option<i64>,
    },

    // Recognised but executed elsewhere; the text is kept verbatim.
    Select(String),
    DropSeries(String),
    ListSeries(String),
    ListMeasurements(String),
    ListTagKeys(String),
    ListTagValues(String),
    ListFieldKeys(String),
    ListFieldValues(String),
    Grant(String),
    Revoke(String),
    CreateContinuousQuery(String),
    DropContinuousQuery(String),
    ListContinuousQueries(String),
}

impl Statement {
    /// Statement kind as written in the query language
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::CreateDatabase { .. } => "CREATE DATABASE",
            Statement::DropDatabase { .. } => "DROP DATABASE",
            Statement::CreateUser { .. } => "CREATE USER",
            Statement::DropUser { .. } => "DROP USER",
            Statement::CreateRetentionPolicy { .. } => "CREATE RETENTION POLICY",
            Statement::AlterRetentionPolicy { .. } => "ALTER RETENTION POLICY",
            Statement::Select(_) => "SELECT",
            Statement::DropSeries(_) => "DROP SERIES",
            Statement::ListSeries(_) => "LIST SERIES",
            Statement::ListMeasurements(_) => "LIST MEASUREMENTS",
            Statement::ListTagKeys(_) => "LIST TAG KEYS",
            Statement::ListTagValues(_) => "LIST TAG VALUES",
            Statement::ListFieldKeys(_) => "LIST FIELD KEYS",
            Statement::ListFieldValues(_) => "LIST FIELD VALUES",
            Statement::Grant(_) => "GRANT",
            Statement::Revoke(_) => "REVOKE",
            Statement::CreateContinuousQuery(_) => "CREATE CONTINUOUS QUERY",
            Statement::DropContinuousQuery(_) => "DROP CONTINUOUS QUERY",
            Statement::ListContinuousQueries(_) => "LIST CONTINUOUS QUERIES",
        }
    }

    pub fn is_create_user(&self) -> bool {
        matches!(self, Statement::CreateUser { .. })
    }
}
