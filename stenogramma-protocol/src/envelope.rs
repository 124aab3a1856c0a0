//! The symmetric envelope both sides exchange.
//!
//! Format: `IV (16 bytes) || AES-256-CBC ciphertext`, PKCS#7 padded.
//! A fresh random IV is drawn for every encryption, so sealing the same
//! plaintext twice yields different envelopes. The smallest well-formed
//! envelope is 32 bytes: the IV plus one cipher block (an empty plaintext
//! pads to a full block).
//!
//! There is no authentication tag. Decrypting with the wrong key or a
//! corrupted envelope fails on PKCS#7 validation in the overwhelming
//! majority of cases, but a forged envelope whose padding happens to
//! validate decrypts to garbage without error.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

use crate::keys::SymmetricKey;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// IV length in bytes.
pub const IV_LEN: usize = 16;

/// AES block length in bytes.
pub const BLOCK_LEN: usize = 16;

/// Smallest well-formed envelope: IV plus one padded block.
pub const MIN_ENVELOPE_LEN: usize = IV_LEN + BLOCK_LEN;

/// Errors from opening an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Envelope too short: {0} bytes, minimum is 32")]
    TooShort(usize),

    #[error("Ciphertext length {0} is not a multiple of the cipher block size")]
    Misaligned(usize),

    #[error("Decryption failed - bad padding (wrong key or corrupted envelope)")]
    Padding,
}

/// Seal a plaintext under `key`.
///
/// Never fails; any plaintext length is accepted, including empty.
pub fn encrypt(plaintext: &[u8], key: &SymmetricKey) -> Vec<u8> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let ciphertext =
        Aes256CbcEnc::new(key.as_bytes().into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut envelope = Vec::with_capacity(IV_LEN + ciphertext.len());
    envelope.extend_from_slice(&iv);
    envelope.extend_from_slice(&ciphertext);
    envelope
}

/// Open an envelope with `key` and return the plaintext.
pub fn decrypt(envelope: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, EnvelopeError> {
    if envelope.len() < MIN_ENVELOPE_LEN {
        return Err(EnvelopeError::TooShort(envelope.len()));
    }

    let (iv, ciphertext) = envelope.split_at(IV_LEN);
    if ciphertext.len() % BLOCK_LEN != 0 {
        return Err(EnvelopeError::Misaligned(ciphertext.len()));
    }

    Aes256CbcDec::new(key.as_bytes().into(), GenericArray::from_slice(iv))
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| EnvelopeError::Padding)
}
