//! CLI command definitions for the `sktree` binary.
//!
//! Uses clap derive macros for argument parsing. Skill commands act directly
//! on the local database; `serve` exposes the same operations over REST.

pub mod skill;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Manage a hierarchy of skills.
#[derive(Parser)]
#[command(name = "sktree", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (overrides config.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config.toml).
        #[arg(long)]
        host: Option<String>,
    },

    /// Create a skill, optionally under a parent.
    #[command(alias = "new")]
    Create(CreateArgs),

    /// Show a skill with its path, children and stats.
    Show {
        /// Skill id.
        id: String,
    },

    /// Print the skill forest.
    #[command(alias = "ls")]
    Tree {
        /// Keep only branches whose names contain this text.
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Edit a skill's fields.
    Update(UpdateArgs),

    /// Move a skill (and its subtree) under another parent.
    #[command(alias = "mv")]
    Move {
        /// Skill id.
        id: String,

        /// New parent id.
        #[arg(long, conflicts_with = "root", required_unless_present = "root")]
        parent: Option<String>,

        /// Detach the skill and make it a root.
        #[arg(long)]
        root: bool,
    },

    /// Delete a skill and everything beneath it.
    #[command(alias = "rm")]
    Delete {
        /// Skill id.
        id: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Args)]
pub struct CreateArgs {
    /// Skill name (prompted when omitted).
    pub name: Option<String>,

    /// Short description.
    #[arg(short, long)]
    pub description: Option<String>,

    /// Icon token.
    #[arg(long)]
    pub icon: Option<String>,

    /// Color index.
    #[arg(long, allow_negative_numbers = true)]
    pub color: Option<i64>,

    /// Parent skill id.
    #[arg(long)]
    pub parent: Option<String>,

    /// Recorded as the skill's creator.
    #[arg(long, env = "SKILLTREE_ACTOR")]
    pub actor: Option<String>,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Skill id.
    pub id: String,

    /// New name.
    #[arg(short, long)]
    pub name: Option<String>,

    /// New description (empty string clears it).
    #[arg(short, long)]
    pub description: Option<String>,

    /// New icon token (empty string clears it).
    #[arg(long)]
    pub icon: Option<String>,

    /// New color index.
    #[arg(long, allow_negative_numbers = true)]
    pub color: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_move_requires_parent_or_root() {
        assert!(Cli::try_parse_from(["sktree", "move", "abc"]).is_err());
        assert!(Cli::try_parse_from(["sktree", "move", "abc", "--root"]).is_ok());
        assert!(Cli::try_parse_from(["sktree", "move", "abc", "--parent", "def"]).is_ok());
        assert!(
            Cli::try_parse_from(["sktree", "move", "abc", "--parent", "def", "--root"]).is_err()
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["sktree", "tree", "--search", "alg", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Tree { search } => assert_eq!(search.as_deref(), Some("alg")),
            _ => panic!("expected tree command"),
        }
    }
}
