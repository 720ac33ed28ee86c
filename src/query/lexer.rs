use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use std::time::Duration;

use super::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Bare word; keywords are bare words compared case-insensitively
    Ident(String),
    /// `"double quoted"` identifier
    QuotedIdent(String),
    /// `'single quoted'` string literal
    Str(String),
    Integer(i64),
    Duration(Duration),
    Punct(char),
}

impl Token {
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Ident(word) if word.eq_ignore_ascii_case(keyword))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(word) => write!(f, "{}", word),
            Token::QuotedIdent(word) => write!(f, "\"{}\"", word),
            Token::Str(_) => write!(f, "string"),
            Token::Integer(n) => write!(f, "{}", n),
            Token::Duration(d) => write!(f, "{:?}", d),
            Token::Punct(c) => write!(f, "{}", c),
        }
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut chars = input.chars().peekable();
    let mut tokens = Vec::new();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_alphabetic() || c == '_' {
            tokens.push(Token::Ident(take_word(&mut chars)));
        } else if c == '"' {
            chars.next();
            let word = take_quoted(&mut chars, '"').ok_or(ParseError::UnterminatedIdentifier)?;
            tokens.push(Token::QuotedIdent(word));
        } else if c == '\'' {
            chars.next();
            let literal = take_quoted(&mut chars, '\'').ok_or(ParseError::UnterminatedString)?;
            tokens.push(Token::Str(literal));
        } else if c.is_ascii_digit() || (c == '-' && starts_number(&chars)) {
            tokens.push(take_number(&mut chars)?);
        } else {
            chars.next();
            tokens.push(Token::Punct(c));
        }
    }

    Ok(tokens)
}

fn starts_number(chars: &Peekable<Chars<'_>>) -> bool {
    let mut ahead = chars.clone();
    ahead.next();
    matches!(ahead.peek(), Some(c) if c.is_ascii_digit())
}

fn take_word(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '_' {
            word.push(c);
            chars.next();
        } else {
            break;
        }
    }
    word
}

/// Reads up to the closing quote; the opening quote is already consumed
fn take_quoted(chars: &mut Peekable<Chars<'_>>, quote: char) -> Option<String> {
    let mut value = String::new();
    loop {
        match chars.next()? {
            '\\' => match chars.next()? {
                'n' => value.push('\n'),
                escaped => value.push(escaped),
            },
            c if c == quote => return Some(value),
            c => value.push(c),
        }
    }
}

fn take_number(chars: &mut Peekable<Chars<'_>>) -> Result<Token, ParseError> {
    let mut digits = String::new();
    if chars.peek() == Some(&'-') {
        digits.push('-');
        chars.next();
    }
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            digits.push(c);
            chars.next();
        } else {
            break;
        }
    }

    let mut unit = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphabetic() {
            unit.push(c);
            chars.next();
        } else {
            break;
        }
    }

    let value: i64 = digits
        .parse()
        .map_err(|_| ParseError::InvalidNumber(digits.clone()))?;

    if unit.is_empty() {
        return Ok(Token::Integer(value));
    }

    let literal = format!("{}{}", digits, unit);
    let magnitude = u64::try_from(value).map_err(|_| ParseError::InvalidDuration(literal.clone()))?;
    // Durations are carried as u64 nanoseconds; anything larger is rejected.
    let per_unit: u64 = match unit.as_str() {
        "u" | "µ" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 60 * 60 * 1_000_000_000,
        "d" => 24 * 60 * 60 * 1_000_000_000,
        "w" => 7 * 24 * 60 * 60 * 1_000_000_000,
        _ => return Err(ParseError::InvalidDuration(literal)),
    };
    let nanos = magnitude
        .checked_mul(per_unit)
        .ok_or(ParseError::InvalidDuration(literal))?;
    let duration = Duration::from_nanos(nanos);
    Ok(Token::Duration(duration))
}
