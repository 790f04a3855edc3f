//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::{AccessRights, AffiliationType};

/// Associated entities of an organisation: roles, shareholders and ownership structure
#[derive(Parser, Debug)]
#[command(name = "assocent")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Directory searched for a local .assocent.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the ownership structure as a tree
    Tree {
        /// Seed file (default: seed_file from config)
        #[arg(value_hint = ValueHint::FilePath)]
        seed: Option<PathBuf>,
    },

    /// List role sections with members and candidates
    Sections {
        /// Seed file (default: seed_file from config)
        #[arg(value_hint = ValueHint::FilePath)]
        seed: Option<PathBuf>,
    },

    /// Print aggregate direct ownership; fails when above 100%
    Total {
        /// Seed file (default: seed_file from config)
        #[arg(value_hint = ValueHint::FilePath)]
        seed: Option<PathBuf>,
    },

    /// Validate a seed file
    Check {
        /// Seed file (default: seed_file from config)
        #[arg(value_hint = ValueHint::FilePath)]
        seed: Option<PathBuf>,
    },

    /// Link an existing entity as an owner and show the resulting tree
    Link {
        /// Seed file (default: seed_file from config)
        #[arg(value_hint = ValueHint::FilePath)]
        seed: Option<PathBuf>,
        /// Entity that is owned ("root" for the organisation)
        #[arg(long)]
        parent: String,
        /// Entity that becomes an owner
        #[arg(long)]
        owner: String,
        /// Percentage of the parent's equity
        #[arg(long)]
        pct: String,
    },

    /// Add an existing entity to a role and show the sections
    Role {
        /// Seed file (default: seed_file from config)
        #[arg(value_hint = ValueHint::FilePath)]
        seed: Option<PathBuf>,
        /// Entity id
        #[arg(long)]
        id: String,
        /// Role, e.g. DIRECTOR or authorised-signatory
        #[arg(long)]
        role: AffiliationType,
        /// Percentage, when the role is SHAREHOLDER
        #[arg(long)]
        pct: Option<String>,
        /// Access rights (viewer, reviewer, admin), when the role is USER
        #[arg(long)]
        access: Option<AccessRights>,
        /// Mobile number, when the role is USER
        #[arg(long)]
        mobile: Option<String>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print a config template
    Init,

    /// Show config paths
    Path,
}
