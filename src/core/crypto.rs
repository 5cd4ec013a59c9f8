//! Cryptographic operations using age encryption.
//!
//! Provides high-level encryption and decryption using the age format with
//! x25519 keys and ASCII armor, so ciphertext travels safely as text.

use std::io::{Read, Write};

use age::x25519;

use crate::core::types::Ciphertext;
use crate::error::CryptoError;

type Result<T> = std::result::Result<T, CryptoError>;

/// Encrypt plaintext for a set of recipient public keys.
///
/// Unparseable entries in `recipients` are skipped; an empty or
/// entirely-invalid set is an error. Returns an ASCII-armored envelope any
/// of the recipients can decrypt.
pub fn encrypt(plaintext: &[u8], recipients: &[String]) -> Result<Ciphertext> {
    if recipients.is_empty() {
        return Err(CryptoError::NoRecipients);
    }
    let parsed: Vec<x25519::Recipient> = recipients
        .iter()
        .filter_map(|raw| raw.trim().parse::<x25519::Recipient>().ok())
        .collect();
    if parsed.is_empty() {
        return Err(CryptoError::NoRecipients);
    }

    let encryptor =
        age::Encryptor::with_recipients(parsed.iter().map(|r| r as &dyn age::Recipient))
            .map_err(|e| CryptoError::Encrypt(e.to_string()))?;

    let armored = age::armor::ArmoredWriter::wrap_output(
        Vec::new(),
        age::armor::Format::AsciiArmor,
    )
    .map_err(|e| CryptoError::Armor(e.to_string()))?;

    let mut writer = encryptor
        .wrap_output(armored)
        .map_err(|e| CryptoError::Encrypt(e.to_string()))?;
    writer
        .write_all(plaintext)
        .map_err(|e| CryptoError::Encrypt(e.to_string()))?;
    let armored = writer
        .finish()
        .map_err(|e| CryptoError::Encrypt(e.to_string()))?;
    let encrypted = armored
        .finish()
        .map_err(|e| CryptoError::Armor(e.to_string()))?;

    String::from_utf8(encrypted).map_err(|e| CryptoError::Encrypt(e.to_string()))
}

/// Decrypt an armored envelope with a private identity.
///
/// Succeeds only when the identity matches one of the recipients used at
/// encryption time.
pub fn decrypt(encrypted: &str, identity: &x25519::Identity) -> Result<Vec<u8>> {
    let reader = age::armor::ArmoredReader::new(encrypted.as_bytes());
    let decryptor =
        age::Decryptor::new(reader).map_err(|e| CryptoError::Decrypt(e.to_string()))?;

    let mut decrypted = Vec::new();
    let mut reader = decryptor
        .decrypt(std::iter::once(identity as &dyn age::Identity))
        .map_err(|e| CryptoError::Decrypt(e.to_string()))?;
    reader
        .read_to_end(&mut decrypted)
        .map_err(|e| CryptoError::Decrypt(e.to_string()))?;

    Ok(decrypted)
}
