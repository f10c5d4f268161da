//! CLI module - Command-line interface for Bugdesk
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

use crate::domain::Role;

/// Bugdesk - Issue tracker backend
#[derive(Parser)]
#[command(name = "bugdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API and the stats scheduler (default)
    #[command(alias = "daemon")]
    Serve,

    /// Materialize today's daily stats once and exit
    Aggregate,

    /// Create a user account
    CreateUser {
        email: String,

        /// Display name
        #[arg(long)]
        name: String,

        #[arg(long, value_parser = parse_role, default_value = "REPORTER")]
        role: Role,

        /// Read from BUGDESK_PASSWORD when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

fn parse_role(value: &str) -> Result<Role, String> {
    Role::ALL
        .into_iter()
        .find(|role| role.as_str().eq_ignore_ascii_case(value))
        .ok_or_else(|| format!("unknown role '{value}' (expected ADMIN, MAINTAINER or REPORTER)"))
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!(parse_role("maintainer"), Ok(Role::Maintainer));
        assert_eq!(parse_role("ADMIN"), Ok(Role::Admin));
        assert!(parse_role("owner").is_err());
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["bugdesk"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from([
            "bugdesk",
            "create-user",
            "ops@example.com",
            "--name",
            "Ops",
            "--role",
            "maintainer",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::CreateUser {
                role: Role::Maintainer,
                password: None,
                ..
            })
        ));
    }
}
