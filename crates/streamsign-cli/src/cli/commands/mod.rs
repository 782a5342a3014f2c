//! Command implementations.
//!
//! Each command exposes `cmd_*` returning a process exit code; the fallible
//! work lives in `run_*` and reports errors through `anyhow`.

pub mod authorize;
pub mod issue;
pub mod keys;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use streamsign_core::{AuthorizerConfig, StaticKeyRegistry};

use super::args::{Cli, Command};

pub fn dispatch(cli: Cli) -> i32 {
    match cli.cmd {
        Command::Issue(args) => issue::cmd_issue(args),
        Command::Authorize(args) => authorize::cmd_authorize(args),
        Command::Keys(cmd) => keys::cmd_keys(cmd),
    }
}

/// Config file (if any) with `STREAMSIGN_*` overrides applied.
pub(crate) fn load_config(path: Option<&PathBuf>) -> Result<AuthorizerConfig> {
    let base = match path {
        Some(path) => AuthorizerConfig::from_path(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => AuthorizerConfig::default(),
    };
    base.with_env_overrides()
        .context("invalid STREAMSIGN_* environment override")
}

/// Unlike a long-running host, the CLI refuses to run without its key file.
pub(crate) fn load_keys(path: &Path) -> Result<StaticKeyRegistry> {
    StaticKeyRegistry::from_properties_path(path)
        .with_context(|| format!("failed to load keys: {}", path.display()))
}
