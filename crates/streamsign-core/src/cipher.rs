//! AES-CBC cipher used to produce policy signatures.
//!
//! The initialization vector is a fixed constant shared by every issuer and
//! verifier, which makes encryption deterministic for a given
//! `(plaintext, key)` pair. Verification re-encrypts and compares, so the IV
//! must never be randomized.
//!
//! Keys are the raw UTF-8 bytes of the configured key string (no KDF), which
//! limits them to 16, 24 or 32 bytes (AES-128/192/256).

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};

use crate::error::{SigningError, SigningResult};

/// Initialization vector shared by all issuers and verifiers.
pub const FIXED_IV: [u8; 16] = *b"AAAAAAAAAAAAAAAA";

/// Key lengths (in bytes) accepted by [`encrypt`] and [`decrypt`].
pub const VALID_KEY_LENGTHS: [usize; 3] = [16, 24, 32];

/// Whether `key` can be used as an AES key as-is.
pub fn is_valid_key(key: &str) -> bool {
    VALID_KEY_LENGTHS.contains(&key.len())
}

/// Encrypt `plaintext` with AES-CBC/PKCS#7 under `key`.
pub fn encrypt(plaintext: &[u8], key: &str) -> SigningResult<Vec<u8>> {
    let key = key.as_bytes();
    match key.len() {
        16 => encrypt_with::<cbc::Encryptor<Aes128>>(key, plaintext),
        24 => encrypt_with::<cbc::Encryptor<Aes192>>(key, plaintext),
        32 => encrypt_with::<cbc::Encryptor<Aes256>>(key, plaintext),
        len => Err(SigningError::InvalidKeyLength { len }),
    }
}

/// Decrypt AES-CBC/PKCS#7 `ciphertext` under `key`.
pub fn decrypt(ciphertext: &[u8], key: &str) -> SigningResult<Vec<u8>> {
    let key = key.as_bytes();
    match key.len() {
        16 => decrypt_with::<cbc::Decryptor<Aes128>>(key, ciphertext),
        24 => decrypt_with::<cbc::Decryptor<Aes192>>(key, ciphertext),
        32 => decrypt_with::<cbc::Decryptor<Aes256>>(key, ciphertext),
        len => Err(SigningError::InvalidKeyLength { len }),
    }
}

fn encrypt_with<C>(key: &[u8], plaintext: &[u8]) -> SigningResult<Vec<u8>>
where
    C: KeyIvInit + BlockEncryptMut,
{
    let cipher = C::new_from_slices(key, &FIXED_IV)
        .map_err(|_| SigningError::InvalidKeyLength { len: key.len() })?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn decrypt_with<C>(key: &[u8], ciphertext: &[u8]) -> SigningResult<Vec<u8>>
where
    C: KeyIvInit + BlockDecryptMut,
{
    let cipher = C::new_from_slices(key, &FIXED_IV)
        .map_err(|_| SigningError::InvalidKeyLength { len: key.len() })?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|e| SigningError::Decrypt {
            reason: e.to_string(),
        })
}
