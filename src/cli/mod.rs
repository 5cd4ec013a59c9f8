//! Command-line interface.

pub mod completions;
pub mod env;
pub mod init;
pub mod output;
pub mod projects;
pub mod run;
pub mod secrets;
pub mod sync;

use clap::{Parser, Subcommand};

/// Cloak - encrypted per-project secrets, synced across your machines.
#[derive(Parser)]
#[command(
    name = "cloak",
    about = "Encrypted per-project secrets, synced across your machines",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// First-time setup: generate this machine's identity
    Init {
        /// Key storage backend: file or keychain
        #[arg(long, default_value = "file")]
        key_storage: String,
        /// Display name for this machine (defaults to the hostname)
        #[arg(long)]
        machine_name: Option<String>,
        /// Create/link the remote container after init
        #[arg(long)]
        link: bool,
    },

    /// Add or update a secret
    Set {
        /// Secret key (e.g., DATABASE_URL)
        key: String,
        /// Secret value (multiple words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        value: Vec<String>,
        /// Project override
        #[arg(short, long)]
        project: Option<String>,
        /// Group label override
        #[arg(long)]
        group: Option<String>,
    },

    /// Print a secret value
    Get {
        /// Secret key
        key: String,
        /// Project override
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Delete a secret
    Rm {
        /// Secret key
        key: String,
        /// Project override
        #[arg(short, long)]
        project: Option<String>,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show keys in a project, grouped and masked
    Ls {
        /// Project name (defaults to the resolved project)
        name: Option<String>,
        /// Project override
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Show all projects with secret counts
    List,

    /// Batch import secrets from a .env file
    Import {
        /// Path to a .env file, or `-` for stdin
        file: String,
        /// Project override
        #[arg(short, long)]
        project: Option<String>,
        /// Skip keys that already exist
        #[arg(long)]
        skip_existing: bool,
    },

    /// Export project secrets
    Export {
        /// Project name (defaults to the resolved project)
        name: Option<String>,
        /// Export format
        #[arg(long, value_enum)]
        format: Option<env::ExportFormat>,
        /// Output path (stdout when omitted)
        #[arg(long)]
        out: Option<String>,
        /// Project override
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Run a command with secrets injected as environment variables
    Run {
        /// Project override
        #[arg(short, long)]
        project: Option<String>,
        /// Command to run (after `--`)
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },

    /// Connect to a shared remote container
    Link {
        /// Token override (also stored in the OS secret store)
        #[arg(long)]
        token: Option<String>,
        /// Existing container id
        #[arg(long)]
        container: Option<String>,
    },

    /// Reconcile local projects with the remote container
    Sync {
        /// Token override
        #[arg(long)]
        token: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Execute a command.
pub fn execute(command: Command) -> crate::error::Result<()> {
    use Command::*;

    match command {
        Init {
            key_storage,
            machine_name,
            link,
        } => init::execute(&key_storage, machine_name, link),
        Set {
            key,
            value,
            project,
            group,
        } => secrets::set(&key, &value.join(" "), project.as_deref(), group.as_deref()),
        Get { key, project } => secrets::get(&key, project.as_deref()),
        Rm { key, project, yes } => secrets::rm(&key, project.as_deref(), yes),
        Ls { name, project } => secrets::ls(name.as_deref().or(project.as_deref())),
        List => projects::list(),
        Import {
            file,
            project,
            skip_existing,
        } => env::import(&file, project.as_deref(), skip_existing),
        Export {
            name,
            format,
            out,
            project,
        } => env::export(
            name.as_deref().or(project.as_deref()),
            format,
            out.as_deref(),
        ),
        Run { project, command } => run::execute(project.as_deref(), &command),
        Link { token, container } => sync::link(token.as_deref(), container.as_deref()),
        Sync { token } => sync::sync(token.as_deref()),
        Completions { shell } => completions::execute(shell),
    }
}
