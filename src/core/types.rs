//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// An age public key string (starts with "age1...").
///
/// The public half of a machine identity, authorized to decrypt anything
/// encrypted for it.
pub type PublicKey = String;

/// An ASCII-armored age ciphertext envelope.
pub type Ciphertext = String;
