use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// One-way password hashing used by the user directory
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password into a self-describing string
    fn hash(&self, password: &str) -> String;

    /// Check a plaintext password against a stored hash
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Salted SHA-256 hasher; stored form is `<salt>$<hex digest>`
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    fn digest(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl PasswordHasher for Sha256Hasher {
    fn hash(&self, password: &str) -> String {
        let salt = Uuid::new_v4().simple().to_string();
        let digest = Self::digest(&salt, password);
        format!("{}${}", salt, digest)
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let Some((salt, expected)) = hash.split_once('$') else {
            return false;
        };
        let actual = Self::digest(salt, password);
        actual.as_bytes().ct_eq(expected.as_bytes()).into()
    }
}
