//! Activation and authentication tokens.
//!
//! Only the SHA-256 hash of a token is kept by the store; the plaintext is
//! handed to the client once and never persisted.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::data::DataError;
use crate::validator::Validator;

/// Length of a token's plaintext form.
pub const TOKEN_LENGTH: usize = 26;

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Activation,
    Authentication,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub plaintext: String,
    #[serde(skip)]
    pub hash: [u8; 32],
    #[serde(skip)]
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    #[serde(skip)]
    pub scope: Scope,
}

impl Token {
    /// Generate a random token for `user_id` that expires after `ttl`.
    pub fn generate(user_id: i64, ttl: Duration, scope: Scope) -> Self {
        let mut rng = rand::thread_rng();
        let plaintext: String = (0..TOKEN_LENGTH)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();

        Self {
            hash: hash_token(&plaintext),
            plaintext,
            user_id,
            expiry: Utc::now() + ttl,
            scope,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry <= now
    }
}

pub fn hash_token(plaintext: &str) -> [u8; 32] {
    Sha256::digest(plaintext.as_bytes()).into()
}

pub fn validate_token_plaintext(v: &mut Validator, plaintext: &str) {
    v.check(!plaintext.is_empty(), "token", "must be provided");
    v.check(plaintext.len() == TOKEN_LENGTH, "token", "must be 26 bytes long");
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Generate and store a new token.
    async fn new_token(&self, user_id: i64, ttl: Duration, scope: Scope) -> Result<Token, DataError>;

    async fn insert(&self, token: &Token) -> Result<(), DataError>;

    async fn delete_all_for_user(&self, scope: Scope, user_id: i64) -> Result<(), DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_shape() {
        let token = Token::generate(3, Duration::hours(1), Scope::Authentication);
        assert_eq!(token.plaintext.len(), TOKEN_LENGTH);
        assert!(token.plaintext.bytes().all(|b| ALPHABET.contains(&b)));
        assert_eq!(token.hash, hash_token(&token.plaintext));
        assert!(!token.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_tokens_are_distinct() {
        let a = Token::generate(1, Duration::hours(1), Scope::Activation);
        let b = Token::generate(1, Duration::hours(1), Scope::Activation);
        assert_ne!(a.plaintext, b.plaintext);
    }

    #[test]
    fn test_serialization_exposes_plaintext_and_expiry_only() {
        let token = Token::generate(1, Duration::hours(24), Scope::Authentication);
        let value = serde_json::to_value(&token).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["expiry".to_string(), "token".to_string()]);
    }

    #[test]
    fn test_plaintext_validation() {
        let mut v = Validator::new();
        validate_token_plaintext(&mut v, "short");
        assert_eq!(v.errors()["token"], "must be 26 bytes long");
    }
}
