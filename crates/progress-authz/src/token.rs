//! Verification of bearer tokens issued by the external identity provider.
//!
//! # Purpose
//! Turns an `Authorization: Bearer` JWT into [`ActorClaims`]. Issuance lives
//! entirely with the identity provider; this side only holds public keys.
//!
//! # Key invariants
//! - Tokens are EdDSA (Ed25519) only; any other `alg` is rejected.
//! - `iss`, `aud`, `sub` and `exp` are mandatory and validated.
//! - When the header names a `kid`, that key is tried first, then the rest in
//!   configuration order so rotations keep working.
use crate::{AuthzError, AuthzResult, UserId};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const ED25519_KEY_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorClaims {
    pub iss: String,
    pub aud: String,
    /// Numeric id of the user in the registry.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl ActorClaims {
    pub fn user_id(&self) -> AuthzResult<UserId> {
        self.sub
            .parse::<u64>()
            .map(UserId::new)
            .map_err(|_| AuthzError::InvalidSubject(self.sub.clone()))
    }
}

/// An Ed25519 public key the identity provider signs with.
#[derive(Clone)]
pub struct VerificationKey {
    kid: String,
    public_key: [u8; ED25519_KEY_LEN],
    decoding_key: DecodingKey,
}

impl VerificationKey {
    pub fn from_bytes(
        kid: impl Into<String>,
        public_key: [u8; ED25519_KEY_LEN],
    ) -> AuthzResult<Self> {
        // jsonwebtoken builds EdDSA decoding keys from the JWK `x` component.
        let x = URL_SAFE_NO_PAD.encode(public_key);
        let decoding_key = DecodingKey::from_ed_components(&x)?;
        Ok(Self {
            kid: kid.into(),
            public_key,
            decoding_key,
        })
    }

    /// Parse a base64url (unpadded) raw public key, as published in a JWK `x`.
    pub fn from_base64url(kid: impl Into<String>, encoded: &str) -> AuthzResult<Self> {
        let kid = kid.into();
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|err| AuthzError::InvalidKey {
                kid: kid.clone(),
                reason: err.to_string(),
            })?;
        let public_key: [u8; ED25519_KEY_LEN] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| AuthzError::InvalidKey {
                    kid: kid.clone(),
                    reason: format!("expected {ED25519_KEY_LEN} bytes, got {}", bytes.len()),
                })?;
        Self::from_bytes(kid, public_key)
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn public_key(&self) -> &[u8; ED25519_KEY_LEN] {
        &self.public_key
    }
}

impl std::fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationKey")
            .field("kid", &self.kid)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct ActorTokenVerifier {
    issuer: String,
    audience: String,
    leeway: u64,
    keys: Arc<Vec<VerificationKey>>,
}

impl ActorTokenVerifier {
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        leeway: u64,
        keys: Vec<VerificationKey>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            leeway,
            keys: Arc::new(keys),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn verify(&self, token: &str) -> AuthzResult<ActorClaims> {
        if self.keys.is_empty() {
            return Err(AuthzError::MissingVerificationKeys);
        }
        let header = jsonwebtoken::decode_header(token)?;
        let mut ordered: Vec<&VerificationKey> = Vec::with_capacity(self.keys.len());
        if let Some(kid) = header.kid.as_deref() {
            ordered.extend(self.keys.iter().filter(|key| key.kid == kid));
            ordered.extend(self.keys.iter().filter(|key| key.kid != kid));
        } else {
            ordered.extend(self.keys.iter());
        }

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = self.leeway;

        let mut last_err = None;
        for key in ordered {
            match jsonwebtoken::decode::<ActorClaims>(token, &key.decoding_key, &validation) {
                Ok(data) => return Ok(data.claims),
                Err(err) => last_err = Some(err),
            }
        }
        Err(AuthzError::Jwt(last_err.unwrap_or_else(|| {
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidToken)
        })))
    }
}

impl std::fmt::Debug for ActorTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorTokenVerifier")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway", &self.leeway)
            .field("keys", &self.keys)
            .finish()
    }
}
