use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;

/// Username/password pair supplied by a caller
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keeps passwords out of logs and panic messages.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Malformed credential carriers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("invalid authentication header")]
    InvalidHeader,

    #[error("invalid encoding")]
    InvalidEncoding,

    #[error("invalid authentication value")]
    InvalidValue,
}

/// Extract credentials from the `u`/`p` query parameters or a Basic
/// `Authorization` header.
///
/// Query parameters win whenever both are non-empty; the header is not
/// consulted in that case. `Ok(None)` means the request carried no
/// credentials at all.
pub fn extract_credentials(
    query: Option<&str>,
    headers: &HeaderMap,
) -> Result<Option<Credentials>, CredentialError> {
    if let Some(credentials) = query.and_then(query_credentials) {
        return Ok(Some(credentials));
    }

    let header = match headers.get(AUTHORIZATION) {
        Some(value) => value.to_str().map_err(|_| CredentialError::InvalidHeader)?,
        None => return Ok(None),
    };
    if header.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = header.split(' ').collect();
    let [_scheme, encoded] = fields.as_slice() else {
        return Err(CredentialError::InvalidHeader);
    };

    let decoded = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| CredentialError::InvalidEncoding)?;
    let decoded = String::from_utf8(decoded).map_err(|_| CredentialError::InvalidEncoding)?;

    let pair: Vec<&str> = decoded.split(':').collect();
    match pair.as_slice() {
        [username, password] => Ok(Some(Credentials::new(*username, *password))),
        _ => Err(CredentialError::InvalidValue),
    }
}

fn query_credentials(query: &str) -> Option<Credentials> {
    let mut username = None;
    let mut password = None;

    // First occurrence of each key wins
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "u" if username.is_none() => username = Some(value.into_owned()),
            "p" if password.is_none() => password = Some(value.into_owned()),
            _ => {}
        }
    }

    match (username, password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some(Credentials::new(u, p)),
        _ => None,
    }
}
