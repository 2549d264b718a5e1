//! CLI argument parsing definitions

use campus_rbac::RoleName;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "campus", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply database migrations
    Migrate,

    /// Seed permissions, the system role and tenant roles
    Seed {
        /// Only seed this tenant's roles
        #[arg(long, value_name = "ID")]
        tenant_id: Option<i32>,

        /// Rebuild role-permission links from the default matrix
        #[arg(long)]
        force: bool,
    },

    /// Tenant management
    Tenant {
        #[command(subcommand)]
        tenant_cmd: TenantCommands,
    },

    /// Branch management
    Branch {
        #[command(subcommand)]
        branch_cmd: BranchCommands,
    },

    /// User management
    User {
        #[command(subcommand)]
        user_cmd: UserCommands,
    },

    /// Check whether a user holds a permission
    Check {
        #[arg(long, value_name = "ID")]
        user: i32,

        /// Permission code, e.g. student.view
        #[arg(long, value_name = "CODE")]
        permission: String,

        #[arg(long, value_name = "ID")]
        branch: Option<i32>,
    },

    /// Assign a role to a user
    Assign {
        #[arg(long, value_name = "ID")]
        user: i32,

        #[arg(long, value_name = "ROLE")]
        role: RoleName,

        #[arg(long, value_name = "ID")]
        tenant: Option<i32>,

        /// Restrict the assignment to one branch
        #[arg(long, value_name = "ID")]
        branch: Option<i32>,

        /// Acting user, subject to the role hierarchy
        #[arg(long, value_name = "ID")]
        by: Option<i32>,

        /// Expire the assignment after this many days
        #[arg(long, value_name = "DAYS")]
        valid_days: Option<u32>,
    },

    /// Revoke a role assignment
    Revoke {
        #[arg(long, value_name = "ID")]
        assignment: i32,

        /// Acting user, subject to the role hierarchy
        #[arg(long, value_name = "ID")]
        by: Option<i32>,
    },

    /// List roles for a tenant, or a user's assignments
    Roles {
        #[arg(long, value_name = "ID")]
        tenant: Option<i32>,

        #[arg(long, value_name = "ID", conflicts_with = "tenant")]
        user: Option<i32>,

        /// Include expired and revoked assignments
        #[arg(long, requires = "user")]
        all: bool,
    },

    /// List the permission catalogue
    Permissions {
        /// Storage category, e.g. finance
        #[arg(long, value_name = "CATEGORY")]
        category: Option<String>,
    },

    /// Count role holders in a branch
    Summary {
        #[arg(long, value_name = "ID")]
        branch: i32,
    },

    /// Show recent audit entries
    Audit {
        #[arg(long, value_name = "ID")]
        user: Option<i32>,

        #[arg(long, value_name = "N")]
        limit: Option<u64>,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum TenantCommands {
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        display_name: String,
    },

    List {
        /// Include inactive tenants
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum BranchCommands {
    Create {
        #[arg(long, value_name = "ID")]
        tenant: i32,

        #[arg(long)]
        name: String,

        #[arg(long)]
        code: Option<String>,
    },

    List {
        #[arg(long, value_name = "ID")]
        tenant: i32,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Create a user and assign the default role for its type
    Create {
        #[arg(long)]
        email: String,

        #[arg(long)]
        display_name: Option<String>,

        #[arg(long, value_name = "ROLE")]
        user_type: Option<RoleName>,

        #[arg(long, value_name = "ID")]
        tenant: Option<i32>,

        #[arg(long)]
        superuser: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Write a sample configuration file
    Generate {
        /// Output file path
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration in use
    Show {
        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}
