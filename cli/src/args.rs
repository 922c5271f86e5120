//! [`Args`] definitions.

use clap::{Parser, Subcommand};

/// Terminal front-end for the users directory.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "directory.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Action performed after the initial load.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show all users.
    List,

    /// Create a user.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },

    /// Edit a user. Omitted fields keep their current value.
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },

    /// Delete a user.
    Delete { id: u64 },
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_fields_are_optional() {
        let args = Args::try_parse_from(["directory", "update", "7", "--name", "Ada"]).unwrap();
        assert_eq!(args.config, "directory.toml");
        match args.command {
            Command::Update { id, name, email } => {
                assert_eq!(id, 7);
                assert_eq!(name.as_deref(), Some("Ada"));
                assert!(email.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn create_requires_both_fields() {
        assert!(Args::try_parse_from(["directory", "create", "--name", "Ada"]).is_err());
    }
}
