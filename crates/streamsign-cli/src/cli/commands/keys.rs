//! `streamsign keys` - Inspect key files.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use sha2::{Digest, Sha256};
use streamsign_core::cipher::{is_valid_key, VALID_KEY_LENGTHS};
use streamsign_core::KeyRegistry;

use crate::exit_codes;

#[derive(Subcommand, Debug)]
pub enum KeysCmd {
    /// List key ids and flag keys unusable for AES signatures
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Key file (`keyId=key` per line)
    #[arg(long)]
    pub keys: PathBuf,
}

pub fn cmd_keys(cmd: KeysCmd) -> i32 {
    match cmd {
        KeysCmd::Check(args) => cmd_check(args),
    }
}

fn cmd_check(args: CheckArgs) -> i32 {
    match run_check(args) {
        Ok(true) => exit_codes::SUCCESS,
        Ok(false) => exit_codes::ERROR,
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_codes::ERROR
        }
    }
}

/// Prints one line per key. Returns whether every key is a valid AES key.
fn run_check(args: CheckArgs) -> Result<bool> {
    let keys = super::load_keys(&args.keys)?;
    if keys.is_empty() {
        println!("no keys in {}", args.keys.display());
        return Ok(false);
    }

    let mut all_valid = true;
    for key_id in keys.key_ids() {
        let key = keys.lookup(key_id).unwrap_or_default();
        let verdict = if is_valid_key(key) {
            "ok".to_string()
        } else {
            all_valid = false;
            format!(
                "invalid: {} bytes, AES needs {:?}",
                key.len(),
                VALID_KEY_LENGTHS
            )
        };
        println!("{key_id}  sha256:{}  {verdict}", fingerprint(key));
    }
    Ok(all_valid)
}

/// Short fingerprint so keys can be compared across hosts without printing them.
fn fingerprint(key: &str) -> String {
    hex::encode(&Sha256::digest(key.as_bytes())[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        let a = fingerprint("0123456789abcdef");
        assert_eq!(a.len(), 16);
        assert_eq!(a, fingerprint("0123456789abcdef"));
        assert_ne!(a, fingerprint("fedcba9876543210"));
    }
}
