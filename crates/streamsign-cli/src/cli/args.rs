use clap::{Parser, Subcommand};

use super::commands::authorize::AuthorizeArgs;
use super::commands::issue::IssueArgs;
use super::commands::keys::KeysCmd;

#[derive(Parser, Debug)]
#[command(
    name = "streamsign",
    version,
    about = "Issue and verify signed URLs for streamed media resources"
)]
pub struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a signed query string for a resource
    Issue(IssueArgs),
    /// Run a signed query string through the authorizer
    Authorize(AuthorizeArgs),
    /// Inspect signing key files
    #[command(subcommand)]
    Keys(KeysCmd),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_expiry_flags_conflict() {
        let parsed = Cli::try_parse_from([
            "streamsign",
            "issue",
            "--resource",
            "http://mh/1",
            "--key-id",
            "default",
            "--keys",
            "keys.properties",
            "--expires-in",
            "1h",
            "--expires-at",
            "2030-01-01T00:00:00Z",
        ]);
        assert!(parsed.is_err());
    }
}
