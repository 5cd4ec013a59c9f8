//! Cloak - an encrypted per-project secret manager with multi-device sync.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── init          # First-time setup
//! │   ├── secrets       # Secret CRUD operations
//! │   ├── projects      # Project listing
//! │   ├── env           # .env import/export
//! │   ├── run           # Run with injected secrets
//! │   ├── sync          # Remote link + sync
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── config        # config.json management
//!     ├── identity      # age keypair storage (file / OS keychain)
//!     ├── crypto        # multi-recipient age encryption
//!     ├── resolve       # project resolution heuristics
//!     ├── bundle        # per-project secret bundles
//!     ├── vault         # per-invocation session object
//!     ├── env           # .env parsing and rendering
//!     ├── remote        # blob container contract + gist binding
//!     ├── token         # access token resolution chain
//!     ├── sync          # multi-device reconciliation
//!     └── editor        # interactive input-mode state machine
//! ```
//!
//! # Features
//!
//! - Age-based encryption with x25519 keys, one ciphertext file per project
//! - Every device that ever joined keeps decrypting: the recipient set only grows
//! - Project detection from registered paths and package marker files
//! - Whole-bundle last-write-wins sync through a shared remote container

pub mod cli;
pub mod core;
pub mod error;
