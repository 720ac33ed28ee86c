pub mod credentials;
pub mod password;

pub use credentials::{extract_credentials, CredentialError, Credentials};
pub use password::{PasswordHasher, Sha256Hasher};
