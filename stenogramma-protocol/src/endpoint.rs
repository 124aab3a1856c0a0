//! Secret endpoint token and matching.
//!
//! The upload route is not `/transcribe` but `/{token}`, where the token is
//! a high-entropy URL-safe string. Knowing the token is the only
//! authentication the transport layer has, so the token is treated as a
//! credential: comparisons are constant-time and `Debug` output is
//! redacted. The server exposes the token verbatim on an unauthenticated
//! introspection route; that trade-off is deliberate and documented.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Bytes of CSPRNG entropy behind a generated token.
pub const TOKEN_ENTROPY_LEN: usize = 32;

/// The secret URL path segment acting as the upload credential.
#[derive(Clone)]
pub struct SecretEndpoint(String);

impl SecretEndpoint {
    /// Generate a fresh token: 32 random bytes, base64 URL-safe without
    /// padding (43 characters).
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_ENTROPY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap an externally supplied token.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Compare a candidate path segment against the token without
    /// short-circuiting on the first differing byte.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }

    /// The token itself, for building URLs and the introspection route.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretEndpoint").finish_non_exhaustive()
    }
}

/// Owner of the process-lifetime secret endpoint.
#[derive(Clone, Debug)]
pub struct EndpointRegistry {
    endpoint: SecretEndpoint,
}

impl EndpointRegistry {
    /// Register a freshly generated token.
    pub fn generate() -> Self {
        Self {
            endpoint: SecretEndpoint::generate(),
        }
    }

    /// Register an externally supplied token.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            endpoint: SecretEndpoint::from_token(token),
        }
    }

    /// The registered endpoint.
    pub fn endpoint(&self) -> &SecretEndpoint {
        &self.endpoint
    }

    /// Constant-time check of a candidate path segment.
    pub fn matches(&self, candidate: &str) -> bool {
        self.endpoint.matches(candidate)
    }

    /// Introspection payload for `GET /endpoint_info`.
    pub fn describe(&self) -> EndpointInfo {
        EndpointInfo {
            endpoint: self.endpoint.as_str().to_string(),
        }
    }
}

/// Introspection response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub endpoint: String,
}
