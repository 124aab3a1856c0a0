//! Wire protocol shared by the stenogramma server and client.
//!
//! This crate defines everything both sides of the encrypted transcription
//! exchange must agree on:
//!
//! - [`envelope`]: the `IV || AES-256-CBC ciphertext` payload format
//! - [`keys`]: 256-bit symmetric key material and its hex interface
//! - [`endpoint`]: the secret URL path token and its matching rules
//!
//! The envelope provides confidentiality only. There is no authentication
//! tag, so a tampered envelope is detected only as far as PKCS#7 padding
//! validation reaches. Both deployed sides share this trade-off; changing
//! it changes the wire format.

pub mod endpoint;
pub mod envelope;
pub mod keys;

pub use endpoint::{EndpointInfo, EndpointRegistry, SecretEndpoint};
pub use envelope::EnvelopeError;
pub use keys::{KeyError, SymmetricKey};
