// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node Configuration
//!
//! All tuneable settings, read once from the environment at startup.
//! Sensitive values (the admin token) are never persisted; key material is
//! bootstrapped into the vault, not configured.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the node
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Bearer token guarding `/admin/*`; admin endpoints answer 503 while
    /// unset
    pub admin_token: Option<String>,
    /// Minutes before a record's DEK is destroyed (data death)
    pub key_expiry_minutes: i64,
    /// Leading zero hex digits required of the PoW hash.
    /// 4 ≈ 65k hashes, 6 ≈ 16M. Raise to slow spam.
    pub pow_difficulty: usize,
    /// Root directory for the JSON documents; the vault lives underneath
    pub storage_dir: PathBuf,
    /// Pause between expiry sweeps
    pub sweep_interval: Duration,
    /// HTTP listen port
    pub api_port: u16,
}

impl NodeConfig {
    /// Assemble configuration from environment variables, falling back to
    /// defaults
    pub fn from_env() -> Self {
        let admin_token = env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty());

        let key_expiry_minutes = env::var("KEY_EXPIRY_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(60);

        let pow_difficulty = env::var("POW_DIFFICULTY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(6);

        let storage_dir = env::var("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./storage"));

        let sweep_interval = Duration::from_secs(
            env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60),
        );

        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);

        Self {
            admin_token,
            key_expiry_minutes,
            pow_difficulty,
            storage_dir,
            sweep_interval,
            api_port,
        }
    }

    /// Vault directory under the storage root
    pub fn vault_dir(&self) -> PathBuf {
        self.storage_dir.join("vault")
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            admin_token: None,
            key_expiry_minutes: 60,
            pow_difficulty: 6,
            storage_dir: PathBuf::from("./storage"),
            sweep_interval: Duration::from_secs(60),
            api_port: 8080,
        }
    }
}
