//! Command-line argument parsing
//!
//! Supported invocations:
//! - `weblocation [-c FILE]` / `weblocation serve`: HTTP server (default)
//! - `weblocation refresh [--category NAME]`: one refresh cycle, then exit
//! - `weblocation lookup <IP>`: resolve one address against the current store
//! - `weblocation config-gen`: print a sample configuration

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "weblocation", version, about = "IP to location, currency and weather")]
pub struct Args {
    /// Configuration file path (default: config.toml)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Refresh datasets on startup and serve HTTP
    Serve,
    /// Run a single refresh cycle
    Refresh {
        /// Only refresh this category (Country, City, Currency)
        #[arg(long)]
        category: Option<String>,
    },
    /// Resolve an address and print the report as JSON
    Lookup { ip: String },
    /// Print a sample TOML configuration
    ConfigGen,
}

impl Args {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_serve() {
        let args = Args::parse_from(["weblocation"]);
        assert_eq!(args.command(), &Command::Serve);
        assert_eq!(args.config, None);
    }

    #[test]
    fn test_config_flag_short_and_long() {
        let args = Args::parse_from(["weblocation", "-c", "custom.toml"]);
        assert_eq!(args.config.as_deref(), Some("custom.toml"));

        let args = Args::parse_from(["weblocation", "--config=custom.toml", "serve"]);
        assert_eq!(args.config.as_deref(), Some("custom.toml"));
        assert_eq!(args.command(), &Command::Serve);
    }

    #[test]
    fn test_refresh_with_category() {
        let args = Args::parse_from(["weblocation", "refresh", "--category", "City"]);
        assert_eq!(
            args.command(),
            &Command::Refresh {
                category: Some("City".to_string())
            }
        );
    }

    #[test]
    fn test_lookup_requires_ip() {
        assert!(Args::try_parse_from(["weblocation", "lookup"]).is_err());
        let args = Args::parse_from(["weblocation", "lookup", "8.8.8.8", "-c", "x.toml"]);
        assert_eq!(
            args.command(),
            &Command::Lookup {
                ip: "8.8.8.8".to_string()
            }
        );
        assert_eq!(args.config.as_deref(), Some("x.toml"));
    }
}
