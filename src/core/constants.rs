//! Constants used throughout cloak.
//!
//! Centralizes magic strings and configuration values.

/// Config schema version written to new config files.
pub const CONFIG_VERSION: u32 = 1;

/// Environment variable overriding the home directory (~/.cloak).
pub const HOME_ENV: &str = "CLOAK_HOME";

/// Home directory name under $HOME when `CLOAK_HOME` is unset.
pub const HOME_DIR: &str = ".cloak";

/// Config file name inside the home directory.
pub const CONFIG_FILE: &str = "config.json";

/// Ciphertext store directory inside the home directory.
pub const STORE_DIR: &str = "store";

/// Private key directory inside the home directory (file storage mode).
pub const KEY_DIR: &str = "keys";

/// Suffix for per-project ciphertext files, locally and remotely.
pub const BUNDLE_SUFFIX: &str = ".json.age";

/// Directory marker file that pins a project name.
pub const PROJECT_MARKER: &str = ".cloak";

/// Project used when no name can be derived from the directory.
pub const DEFAULT_PROJECT: &str = "general";

/// OS secret-store service name for identities and tokens.
pub const SERVICE_NAME: &str = "cloak";

/// OS secret-store account holding the GitHub token.
pub const TOKEN_ACCOUNT: &str = "github-token";

/// Environment variables consulted for a GitHub token, in order.
pub const TOKEN_ENV_VARS: &[&str] = &["GH_TOKEN", "GITHUB_TOKEN"];

/// Environment variable carrying the OAuth client id for the device flow.
pub const CLIENT_ID_ENV: &str = "CLOAK_GITHUB_CLIENT_ID";

/// Recipients ledger file name inside the remote container.
pub const RECIPIENTS_FILE: &str = "recipients.txt";

/// Package/language marker files that identify a project directory.
pub const PROJECT_MARKERS: &[&str] = &[
    "package.json",
    "go.mod",
    "Cargo.toml",
    "pyproject.toml",
    "composer.json",
    "Gemfile",
];

/// Ordered prefix rules for classifying new secrets into groups.
///
/// Evaluated top to bottom against the upper-cased key; the first matching
/// prefix wins. Keys matching nothing land in [`FALLBACK_GROUP`].
pub const GROUP_RULES: &[(&str, &str)] = &[
    ("OPENAI_", "API Keys"),
    ("ANTHROPIC_", "API Keys"),
    ("STRIPE_", "Payments"),
    ("DATABASE_", "Database"),
    ("SUPABASE_", "Database"),
    ("POSTGRES_", "Database"),
    ("REDIS_", "Database"),
    ("AWS_", "AWS"),
    ("GITHUB_", "GitHub"),
    ("NEXT_PUBLIC_", "Frontend"),
];

/// Group assigned when no prefix rule matches.
pub const FALLBACK_GROUP: &str = "General";
