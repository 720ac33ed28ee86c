use std::time::Duration;

use super::error::ParseError;
use super::lexer::{tokenize, Token};
use super::{Query, Statement};

const STATEMENT_START: &str = "SELECT, CREATE, DROP, ALTER, LIST, GRANT, REVOKE";

/// Parse query text into its ordered statements
pub fn parse_query(text: &str) -> Result<Query, ParseError> {
    let statements = split_statements(text)
        .into_iter()
        .map(parse_statement)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Query { statements })
}

/// Split on `;` outside of quoted sections, dropping empty statements
fn split_statements(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ';') => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            (None, _) => {}
        }
    }
    parts.push(&text[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

fn parse_statement(text: &str) -> Result<Statement, ParseError> {
    let words: Vec<String> = text
        .split_whitespace()
        .take(3)
        .map(|w| w.to_ascii_uppercase())
        .collect();
    let words: Vec<&str> = words.iter().map(String::as_str).collect();
    let raw = text.to_string();

    let statement = match words.as_slice() {
        ["SELECT", ..] => Statement::Select(raw),
        ["GRANT", ..] => Statement::Grant(raw),
        ["REVOKE", ..] => Statement::Revoke(raw),
        ["LIST", "SERIES", ..] => Statement::ListSeries(raw),
        ["LIST", "MEASUREMENTS", ..] => Statement::ListMeasurements(raw),
        ["LIST", "TAG", "KEYS"] => Statement::ListTagKeys(raw),
        ["LIST", "TAG", "VALUES"] => Statement::ListTagValues(raw),
        ["LIST", "FIELD", "KEYS"] => Statement::ListFieldKeys(raw),
        ["LIST", "FIELD", "VALUES"] => Statement::ListFieldValues(raw),
        ["LIST", "CONTINUOUS", "QUERIES"] => Statement::ListContinuousQueries(raw),
        ["CREATE", "CONTINUOUS", "QUERY"] => Statement::CreateContinuousQuery(raw),
        ["DROP", "CONTINUOUS", "QUERY"] => Statement::DropContinuousQuery(raw),
        ["DROP", "SERIES", ..] => Statement::DropSeries(raw),
        ["CREATE", ..] | ["DROP", ..] | ["ALTER", ..] => Parser::new(tokenize(text)?).administrative()?,
        [first, ..] => {
            return Err(ParseError::UnexpectedToken {
                found: first.to_string(),
                expected: STATEMENT_START.to_string(),
            })
        }
        [] => return Err(ParseError::UnexpectedEnd(STATEMENT_START.to_string())),
    };
    Ok(statement)
}

/// Recursive-descent parser over the tokens of a single statement
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn administrative(mut self) -> Result<Statement, ParseError> {
        let statement = if self.accept_keyword("CREATE") {
            if self.accept_keyword("DATABASE") {
                Statement::CreateDatabase { name: self.identifier()? }
            } else if self.accept_keyword("USER") {
                self.create_user()?
            } else if self.accept_keyword("RETENTION") {
                self.expect_keyword("POLICY")?;
                self.create_retention_policy()?
            } else {
                return Err(self.unexpected("DATABASE, USER, RETENTION, CONTINUOUS"));
            }
        } else if self.accept_keyword("DROP") {
            if self.accept_keyword("DATABASE") {
                Statement::DropDatabase { name: self.identifier()? }
            } else if self.accept_keyword("USER") {
                Statement::DropUser { name: self.identifier()? }
            } else {
                return Err(self.unexpected("DATABASE, USER, SERIES, CONTINUOUS"));
            }
        } else {
            self.expect_keyword("ALTER")?;
            self.expect_keyword("RETENTION")?;
            self.expect_keyword("POLICY")?;
            self.alter_retention_policy()?
        };

        self.expect_end()?;
        Ok(statement)
    }

    fn create_user(&mut self) -> Result<Statement, ParseError> {
        let name = self.identifier()?;
        self.expect_keyword("WITH")?;
        self.expect_keyword("PASSWORD")?;
        let password = self.string()?;

        let all_privileges = if self.accept_keyword("WITH") {
            self.expect_keyword("ALL")?;
            self.accept_keyword("PRIVILEGES");
            true
        } else {
            false
        };

        Ok(Statement::CreateUser {
            name,
            password,
            all_privileges,
        })
    }

    fn create_retention_policy(&mut self) -> Result<Statement, ParseError> {
        let name = self.identifier()?;
        self.expect_keyword("ON")?;
        let database = self.identifier()?;
        self.expect_keyword("DURATION")?;
        let duration = self.duration()?;
        self.expect_keyword("REPLICATION")?;
        let replication = self.integer()?;

        Ok(Statement::CreateRetentionPolicy {
            name,
            database,
            duration,
            replication,
        })
    }

    fn alter_retention_policy(&mut self) -> Result<Statement, ParseError> {
        let name = self.identifier()?;
        self.expect_keyword("ON")?;
        let database = self.identifier()?;

        let mut duration = None;
        let mut replication = None;
        loop {
            if self.accept_keyword("DURATION") {
                if duration.is_some() {
                    return Err(ParseError::DuplicateClause("DURATION"));
                }
                duration = Some(self.duration()?);
            } else if self.accept_keyword("REPLICATION") {
                if replication.is_some() {
                    return Err(ParseError::DuplicateClause("REPLICATION"));
                }
                replication = Some(self.integer()?);
            } else {
                break;
            }
        }

        if duration.is_none() && replication.is_none() {
            return Err(self.unexpected("DURATION, REPLICATION"));
        }

        Ok(Statement::AlterRetentionPolicy {
            name,
            database,
            duration,
            replication,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn accept_keyword(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(token) if token.is_keyword(keyword) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.accept_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(keyword))
        }
    }

    fn identifier(&mut self) -> Result<String, ParseError> {
        match self.next() {
            Some(Token::Ident(word)) | Some(Token::QuotedIdent(word)) => Ok(word),
            Some(other) => Err(unexpected_token(&other, "identifier")),
            None => Err(ParseError::UnexpectedEnd("identifier".to_string())),
        }
    }

    fn string(&mut self) -> Result<String, ParseError> {
        match self.next() {
            Some(Token::Str(value)) => Ok(value),
            Some(other) => Err(unexpected_token(&other, "string")),
            None => Err(ParseError::UnexpectedEnd("string".to_string())),
        }
    }

    fn duration(&mut self) -> Result<Duration, ParseError> {
        match self.next() {
            Some(Token::Duration(d)) => Ok(d),
            Some(token) if token.is_keyword("INF") => Ok(Duration::ZERO),
            Some(other) => Err(unexpected_token(&other, "duration")),
            None => Err(ParseError::UnexpectedEnd("duration".to_string())),
        }
    }

    fn integer(&mut self) -> Result<i64, ParseError> {
        match self.next() {
            Some(Token::Integer(n)) => Ok(n),
            Some(other) => Err(unexpected_token(&other, "integer")),
            None => Err(ParseError::UnexpectedEnd("integer".to_string())),
        }
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(unexpected_token(token, "end of statement")),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => unexpected_token(token, expected),
            None => ParseError::UnexpectedEnd(expected.to_string()),
        }
    }
}

fn unexpected_token(token: &Token, expected: &str) -> ParseError {
    ParseError::UnexpectedToken {
        found: token.to_string(),
        expected: expected.to_string(),
    }
}
