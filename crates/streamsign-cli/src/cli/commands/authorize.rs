//! `streamsign authorize` - Check a signed query string.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use streamsign_core::{Authorizer, SignedRequest};

use crate::exit_codes;

#[derive(Args, Debug)]
pub struct AuthorizeArgs {
    /// Query string as received, with or without the leading `?`
    #[arg(long)]
    pub query: String,

    /// Requested resource
    #[arg(long)]
    pub resource: String,

    /// Address of the requesting client
    #[arg(long, default_value = "")]
    pub client_ip: String,

    /// Key file (`keyId=key` per line)
    #[arg(long)]
    pub keys: PathBuf,

    /// Authorizer config (YAML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn cmd_authorize(args: AuthorizeArgs) -> i32 {
    let format = args.format;
    match run_authorize(args) {
        Ok(request) => {
            println!("{}", render(&request, format));
            exit_codes::for_status(request.status())
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_codes::ERROR
        }
    }
}

fn run_authorize(args: AuthorizeArgs) -> Result<SignedRequest> {
    let config = super::load_config(args.config.as_ref())?;
    let keys = super::load_keys(&args.keys)?;
    let authorizer = Authorizer::new(keys, config)?;
    Ok(authorizer.authorize(&args.query, &args.client_ip, &args.resource))
}

fn render(request: &SignedRequest, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => match request.rejection_reason() {
            Some(reason) => format!("{}: {}", request.status(), reason),
            None => request.status().to_string(),
        },
        OutputFormat::Json => serde_json::json!({
            "status": request.status(),
            "http_status": request.status().http_status(),
            "reason": request.rejection_reason(),
            "key_id": request.key_id(),
            "resource": request.policy().map(|p| p.resource()),
            "expires_at": request.policy().map(|p| p.expires_at().to_rfc3339()),
        })
        .to_string(),
    }
}
