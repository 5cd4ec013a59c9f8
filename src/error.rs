//! Error types for cloak.
//!
//! Errors are grouped per subsystem and folded into a single top-level
//! [`Error`] so callers can use one `Result` alias throughout the crate.

use thiserror::Error;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("not initialized: run `cloak init` first")]
    NotInitialized,

    #[error("unable to determine home directory")]
    NoHome,

    #[error("invalid key storage {0:?} (use file or keychain)")]
    InvalidKeyStorage(String),

    #[error("create storage directory: {0}")]
    CreateLayout(#[source] std::io::Error),

    #[error("read config: {0}")]
    Read(#[source] std::io::Error),

    #[error("decode config: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("encode config: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("write config: {0}")]
    Write(#[source] std::io::Error),
}

/// Private key loading and persistence errors.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("missing key file path in config")]
    MissingKeyFile,

    #[error("read identity file: {0}")]
    Read(#[source] std::io::Error),

    #[error("parse identity: {0}")]
    Parse(String),

    #[error("write identity file: {0}")]
    Write(#[source] std::io::Error),

    #[error("keychain: {0}")]
    Keychain(#[source] keyring::Error),
}

/// Encryption and decryption errors.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("no valid recipients configured")]
    NoRecipients,

    #[error("encryption failed: {0}")]
    Encrypt(String),

    #[error("armor failed: {0}")]
    Armor(String),

    #[error("decryption failed: {0}")]
    Decrypt(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Project bundle persistence errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("read project file: {0}")]
    Read(#[source] std::io::Error),

    #[error("write project file: {0}")]
    Write(#[source] std::io::Error),

    #[error("decrypt project {project:?}: {source}")]
    Decrypt {
        project: String,
        #[source]
        source: CryptoError,
    },

    #[error("decode project {project:?}: {source}")]
    Decode {
        project: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("encode project: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Secret lookup errors.
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("key {key:?} not found in project {project:?}")]
    NotFound { key: String, project: String },
}

/// `.env` parsing errors.
#[derive(Error, Debug)]
pub enum EnvError {
    #[error("invalid .env line {0}")]
    InvalidLine(usize),

    #[error("empty key at line {0}")]
    EmptyKey(usize),
}

/// Remote container API errors.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("no remote linked (run `cloak link`)")]
    NotLinked,

    #[error("remote api {operation} failed: {status} {body}")]
    Api {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("remote request: {0}")]
    Http(#[from] reqwest::Error),
}

/// Access token resolution errors.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error(
        "missing GitHub token: set GH_TOKEN/GITHUB_TOKEN, run `gh auth login`, \
         or set CLOAK_GITHUB_CLIENT_ID for the device flow"
    )]
    NoToken,

    #[error("empty token")]
    Empty,

    #[error("store token in keychain: {0}")]
    Keychain(#[source] keyring::Error),

    #[error("device flow: {0}")]
    DeviceFlow(String),

    #[error("device flow denied: {0}")]
    Denied(String),

    #[error("device flow timed out")]
    TimedOut,

    #[error("device flow request: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
