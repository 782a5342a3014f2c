//! `streamsign issue` - Print a signed query string.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use streamsign_core::{KeyRegistry, Policy, Signer};

use crate::exit_codes;

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Resource the policy grants access to
    #[arg(long)]
    pub resource: String,

    /// Key identifier to sign with
    #[arg(long)]
    pub key_id: String,

    /// Key file (`keyId=key` per line)
    #[arg(long)]
    pub keys: PathBuf,

    /// Lifetime of the grant, e.g. `90m` or `2h`
    #[arg(long, default_value = "1h", conflicts_with = "expires_at")]
    pub expires_in: humantime::Duration,

    /// Absolute expiry (RFC 3339)
    #[arg(long)]
    pub expires_at: Option<DateTime<Utc>>,

    /// Absolute start of the grant (RFC 3339)
    #[arg(long, conflicts_with = "available_in")]
    pub available_from: Option<DateTime<Utc>>,

    /// Delay before the grant becomes active, e.g. `10m`
    #[arg(long)]
    pub available_in: Option<humantime::Duration>,

    /// Restrict the grant to one client address
    #[arg(long)]
    pub client_ip: Option<String>,

    /// Authorizer config (YAML); selects algorithm and parameter names
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn cmd_issue(args: IssueArgs) -> i32 {
    match run_issue(args) {
        Ok(query) => {
            println!("{query}");
            exit_codes::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_codes::ERROR
        }
    }
}

fn run_issue(args: IssueArgs) -> Result<String> {
    let config = super::load_config(args.config.as_ref())?;
    let keys = super::load_keys(&args.keys)?;
    let key = keys
        .lookup(&args.key_id)
        .with_context(|| format!("unknown key id '{}' in {}", args.key_id, args.keys.display()))?;

    let now = Utc::now();
    let expires_at = match args.expires_at {
        Some(at) => at,
        None => now + chrono_duration(args.expires_in)?,
    };
    let available_from = match (args.available_from, args.available_in) {
        (Some(at), _) => Some(at),
        (None, Some(delay)) => Some(now + chrono_duration(delay)?),
        (None, None) => None,
    };

    let mut policy = Policy::new(args.resource, expires_at)?;
    if let Some(from) = available_from {
        policy = policy.with_available_from(from);
    }
    if let Some(ip) = args.client_ip {
        policy = policy.with_client_ip(ip);
    }

    let query = Signer::from_config(&config)
        .signed_query_string(&policy, &args.key_id, key)
        .with_context(|| format!("failed to sign with key '{}'", args.key_id))?;
    tracing::debug!(
        resource = policy.resource(),
        key_id = %args.key_id,
        algorithm = %config.algorithm,
        "issued signed query string"
    );
    Ok(query)
}

fn chrono_duration(duration: humantime::Duration) -> Result<chrono::Duration> {
    chrono::Duration::from_std(duration.into()).context("duration out of range")
}
