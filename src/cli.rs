use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::models::CheckType;
use crate::output::OutputFormat;

/// Network diagnostics run from a global fleet of vantage points.
#[derive(Parser)]
#[command(name = "globeping", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ping a host from every vantage point
    Ping {
        /// Host to ping
        host: String,

        /// Ping count (the backend fixes the per-node attempt count; kept
        /// for familiarity)
        #[arg(short, long, default_value_t = 4)]
        count: u32,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Fetch a URL from every vantage point
    Http {
        /// URL to test; plain hosts get http:// prefixed
        url: String,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Probe a TCP port from every vantage point
    Tcp {
        /// Host to test, host or host:port
        host: String,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Probe a UDP port from every vantage point
    Udp {
        /// Host to test, host or host:port
        host: String,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Resolve a domain from every vantage point
    Dns {
        /// Domain to resolve
        domain: String,

        #[command(flatten)]
        out: OutputArgs,
    },
}

impl Command {
    /// The check to run and its prepared target.
    pub fn into_check(self) -> (CheckType, String, OutputArgs) {
        match self {
            Command::Ping { host, out, .. } => (CheckType::Ping, host, out),
            Command::Http { url, out } => {
                let url = CheckType::Http.prepare_target(url);
                (CheckType::Http, url, out)
            }
            Command::Tcp { host, out } => (CheckType::Tcp, host, out),
            Command::Udp { host, out } => (CheckType::Udp, host, out),
            Command::Dns { domain, out } => (CheckType::Dns, domain, out),
        }
    }
}

#[derive(Args)]
pub struct OutputArgs {
    /// Output file to save results
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn http_targets_are_prepared_on_dispatch() {
        let cli = Cli::parse_from(["globeping", "http", "example.com"]);
        let (check, target, _) = cli.command.unwrap().into_check();
        assert_eq!(check, CheckType::Http);
        assert_eq!(target, "http://example.com");
    }

    #[test]
    fn output_flags_parse_per_subcommand() {
        let cli = Cli::parse_from([
            "globeping", "dns", "example.com", "-o", "out.txt", "-f", "text",
        ]);
        let (check, _, out) = cli.command.unwrap().into_check();
        assert_eq!(check, CheckType::Dns);
        assert_eq!(out.format, OutputFormat::Text);
        assert_eq!(out.output.as_deref(), Some(std::path::Path::new("out.txt")));
    }
}
