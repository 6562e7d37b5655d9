//! Compact `HS256` session tokens.
//!
//! A token is `base64url(header).base64url(claims).base64url(mac)` where the
//! MAC is HMAC-SHA256 over the first two segments as sent on the wire. The
//! claims carry only the user id plus issue and expiry times in unix seconds.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretSlice, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const MIN_SECRET_BYTES: usize = 32;
const MAC_LEN: usize = 32;
const ALG: &str = "HS256";
const TYP: &str = "JWT";

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("signing secret must be at least {MIN_SECRET_BYTES} bytes")]
    WeakSecret,
    #[error("token TTL must be positive")]
    InvalidTtl,
    #[error("invalid token format")]
    Format,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json,
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signature")]
    Signature,
    #[error("token expired")]
    Expired,
    #[error("issued after expiry")]
    IssuedAfterExpiry,
    #[error("invalid signing key")]
    Key,
}

/// Issues and verifies session tokens with a process-wide secret and TTL.
pub struct TokenCodec {
    key: SecretSlice<u8>,
    ttl_seconds: i64,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("key", &"[REDACTED]")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|_| TokenError::Json)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::Base64)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Json)
}

impl TokenCodec {
    /// # Errors
    /// Returns [`TokenError::WeakSecret`] when the secret is shorter than
    /// [`MIN_SECRET_BYTES`] and [`TokenError::InvalidTtl`] for a non-positive TTL.
    pub fn new(secret: &SecretString, ttl_seconds: i64) -> Result<Self, TokenError> {
        let bytes = secret.expose_secret().as_bytes();
        if bytes.len() < MIN_SECRET_BYTES {
            return Err(TokenError::WeakSecret);
        }
        if ttl_seconds <= 0 {
            return Err(TokenError::InvalidTtl);
        }
        Ok(Self {
            key: SecretSlice::from(bytes.to_vec()),
            ttl_seconds,
        })
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        <HmacSha256 as Mac>::new_from_slice(self.key.expose_secret()).map_err(|_| TokenError::Key)
    }

    /// Issue a token for `user_id` valid from now for the configured TTL.
    ///
    /// # Errors
    /// Only fails if the header or claims cannot be serialized.
    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue_at(user_id, now_unix())
    }

    /// Same as [`TokenCodec::issue`] with an explicit clock.
    ///
    /// # Errors
    /// Only fails if the header or claims cannot be serialized.
    pub fn issue_at(&self, user_id: Uuid, now: i64) -> Result<String, TokenError> {
        let header = TokenHeader {
            alg: ALG.to_string(),
            typ: TYP.to_string(),
        };
        let claims = SessionClaims {
            user_id,
            iat: now,
            exp: now.saturating_add(self.ttl_seconds),
        };
        let signing_input = format!("{}.{}", b64e_json(&header)?, b64e_json(&claims)?);

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{signing_input}.{}",
            Base64UrlUnpadded::encode_string(&signature)
        ))
    }

    /// Verify a token against the current clock.
    ///
    /// # Errors
    /// Returns a [`TokenError`] describing why the token was rejected. Callers
    /// must not forward the reason to clients.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.verify_at(token, now_unix())
    }

    /// Same as [`TokenCodec::verify`] with an explicit clock.
    ///
    /// # Errors
    /// See [`TokenCodec::verify`].
    pub fn verify_at(&self, token: &str, now: i64) -> Result<SessionClaims, TokenError> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(TokenError::Format)?;
        let claims_b64 = parts.next().ok_or(TokenError::Format)?;
        let sig_b64 = parts.next().ok_or(TokenError::Format)?;
        if parts.next().is_some() {
            return Err(TokenError::Format);
        }

        let header: TokenHeader = b64d_json(header_b64)?;
        if header.alg != ALG {
            return Err(TokenError::UnsupportedAlg(header.alg));
        }
        if header.typ != TYP {
            return Err(TokenError::Format);
        }

        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| TokenError::Base64)?;
        // Only the canonical encoding of a full-length MAC is accepted.
        if signature.len() != MAC_LEN || Base64UrlUnpadded::encode_string(&signature) != sig_b64 {
            return Err(TokenError::Signature);
        }

        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::Signature)?;

        let claims: SessionClaims = b64d_json(claims_b64)?;
        if claims.iat > claims.exp {
            return Err(TokenError::IssuedAfterExpiry);
        }
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
