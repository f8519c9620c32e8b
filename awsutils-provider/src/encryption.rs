//! PGP encryption of generated secrets
//!
//! A key is given either as `keybase:<username>`, in which case the user's
//! primary public key is fetched from Keybase, or as base64 of a binary
//! public key. The value is encrypted to the key's encryption subkey (or the
//! primary key when it can encrypt) and returned as base64 with the hex
//! fingerprint of the primary key.

use std::io::Cursor;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::ser::Serialize;
use pgp::types::KeyTrait;
use pgp::{Deserializable, Message, SignedPublicKey};
use serde::Deserialize;

use crate::conns::TransportSettings;

const KEYBASE_PREFIX: &str = "keybase:";
const KEYBASE_URL: &str = "https://keybase.io";

#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("error fetching key from Keybase: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Keybase lookup for {user}: {message}")]
    Keybase { user: String, message: String },

    #[error("error decoding PGP key: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("error parsing PGP key: {0}")]
    Pgp(#[from] pgp::errors::Error),

    #[error("PGP key {0} has no encryption-capable key")]
    NoEncryptionKey(String),
}

/// Where a `pgp_key` attribute says to find the key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Keybase(String),
    Binary(Vec<u8>),
}

impl KeySource {
    pub fn parse(pgp_key: &str) -> Result<Self, EncryptionError> {
        let pgp_key = pgp_key.trim();
        match pgp_key.strip_prefix(KEYBASE_PREFIX) {
            Some(user) => Ok(KeySource::Keybase(user.to_string())),
            None => Ok(KeySource::Binary(STANDARD.decode(pgp_key)?)),
        }
    }
}

/// An encrypted secret as stored in state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedValue {
    pub key_fingerprint: String,
    pub ciphertext: String,
}

#[async_trait]
pub trait KeyResolver: Send + Sync {
    /// Public key named by a `pgp_key` attribute
    async fn resolve(&self, pgp_key: &str) -> Result<SignedPublicKey, EncryptionError>;
}

#[derive(Deserialize)]
struct LookupResponse {
    status: LookupStatus,
    #[serde(default)]
    them: Vec<Option<LookupUser>>,
}

#[derive(Deserialize)]
struct LookupStatus {
    code: i64,
    #[serde(default)]
    desc: Option<String>,
}

#[derive(Deserialize)]
struct LookupUser {
    public_keys: PublicKeys,
}

#[derive(Deserialize)]
struct PublicKeys {
    primary: PrimaryKey,
}

#[derive(Deserialize)]
struct PrimaryKey {
    bundle: String,
}

fn primary_bundle(user: &str, body: &str) -> Result<String, EncryptionError> {
    let lookup_error = |message: String| EncryptionError::Keybase {
        user: user.to_string(),
        message,
    };

    let response: LookupResponse =
        serde_json::from_str(body).map_err(|e| lookup_error(e.to_string()))?;
    if response.status.code != 0 {
        return Err(lookup_error(
            response
                .status
                .desc
                .unwrap_or_else(|| format!("status code {}", response.status.code)),
        ));
    }

    response
        .them
        .into_iter()
        .flatten()
        .next()
        .map(|u| u.public_keys.primary.bundle)
        .ok_or_else(|| lookup_error("user not found".to_string()))
}

/// Resolves keys fetched from Keybase or given inline
pub struct KeybaseResolver {
    transport: TransportSettings,
    base_url: String,
}

impl KeybaseResolver {
    pub fn new(transport: TransportSettings) -> Self {
        Self {
            transport,
            base_url: KEYBASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_keybase_key(&self, user: &str) -> Result<SignedPublicKey, EncryptionError> {
        let url = format!("{}/_/api/1.0/user/lookup.json", self.base_url);
        log::debug!("fetching public key for {} from {}", user, url);

        let body = self
            .transport
            .http_client()?
            .get(url)
            .query(&[("usernames", user), ("fields", "public_keys")])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let bundle = primary_bundle(user, &body)?;
        let (key, _headers) = SignedPublicKey::from_armor_single(Cursor::new(bundle.as_bytes()))?;
        Ok(key)
    }
}

#[async_trait]
impl KeyResolver for KeybaseResolver {
    async fn resolve(&self, pgp_key: &str) -> Result<SignedPublicKey, EncryptionError> {
        match KeySource::parse(pgp_key)? {
            KeySource::Keybase(user) => self.fetch_keybase_key(&user).await,
            KeySource::Binary(bytes) => Ok(SignedPublicKey::from_bytes(Cursor::new(bytes))?),
        }
    }
}

/// Encrypt `value` to `key`. `name` becomes the literal data file name
/// inside the message.
pub fn encrypt_value(
    key: &SignedPublicKey,
    value: &str,
    name: &str,
) -> Result<EncryptedValue, EncryptionError> {
    let key_fingerprint = hex::encode(key.fingerprint());
    let message = Message::new_literal(name, value);
    let mut rng = rand::rngs::OsRng;

    let encrypted = match key.public_subkeys.iter().find(|k| k.is_encryption_key()) {
        Some(subkey) => {
            message.encrypt_to_keys(&mut rng, SymmetricKeyAlgorithm::AES128, &[subkey])?
        }
        None if key.is_encryption_key() => {
            message.encrypt_to_keys(&mut rng, SymmetricKeyAlgorithm::AES128, &[key])?
        }
        None => return Err(EncryptionError::NoEncryptionKey(key_fingerprint)),
    };

    Ok(EncryptedValue {
        key_fingerprint,
        ciphertext: STANDARD.encode(encrypted.to_bytes()?),
    })
}
