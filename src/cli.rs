use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hyperfab")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative state reconciliation for hyperfabric network fabrics", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Declared configuration file
    #[arg(short, long, global = true, default_value = "hyperfab.toml")]
    pub file: PathBuf,

    /// State file
    #[arg(long, global = true, default_value = "hyperfab.state.json")]
    pub state: PathBuf,

    /// Controller base URL
    #[arg(long, global = true, env = "HYPERFAB_ENDPOINT")]
    pub endpoint: Option<String>,

    /// API bearer token
    #[arg(long, global = true, env = "HYPERFAB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Preview what apply would change
    Plan(TargetArgs),

    /// Make the fabric match the declared configuration
    Apply(ApplyArgs),

    /// Re-read every managed resource into state
    Refresh(RefreshArgs),

    /// Adopt an existing remote resource into state
    Import {
        /// Resource type (fabric, node, node_breakout, vrf)
        resource_type: String,

        /// Address to record it under
        address: String,

        /// Composite id or name path, e.g. fab-a/nodes/leaf1/breakouts/uplinks
        path: String,
    },

    /// Show managed resources, or one resource in detail
    Show {
        /// Resource as type.address
        address: Option<String>,
    },

    /// Delete a managed resource
    Destroy {
        /// Resource as type.address
        address: String,

        /// Show what would be deleted
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Command Args
// ============================================================================

#[derive(Debug, Clone, clap::Args)]
pub struct TargetArgs {
    /// Limit to one resource (type.address)
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ApplyArgs {
    /// Limit to one resource (type.address)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Show what would happen without making changes
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, clap::Args)]
pub struct RefreshArgs {
    /// Number of parallel reads
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply() {
        let cli = Cli::try_parse_from([
            "hyperfab",
            "apply",
            "--target",
            "node.leaf1",
            "--dry-run",
            "-f",
            "lab.toml",
        ])
        .unwrap();
        assert_eq!(cli.file, PathBuf::from("lab.toml"));
        assert_eq!(cli.state, PathBuf::from("hyperfab.state.json"));
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.target.as_deref(), Some("node.leaf1"));
        assert!(args.dry_run);
    }

    #[test]
    fn test_parse_import() {
        let cli = Cli::try_parse_from(["hyperfab", "-vv", "import", "fabric", "main", "F1"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Command::Import { ref resource_type, ref path, .. } if resource_type == "fabric" && path == "F1"
        ));
    }
}
