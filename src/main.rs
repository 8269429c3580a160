// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use fabstir_drop_node::{
    api::{start_server, AppState},
    chat::ChatService,
    config::NodeConfig,
    expiry::ExpirySweeper,
    registry::KeyRegistry,
    storage::DocumentStore,
    submissions::SubmissionService,
    vault::Vault,
    verification::VerificationService,
};
use std::{env, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting Fabstir Drop Node...\n");

    let config = Arc::new(NodeConfig::from_env());

    if config.admin_token.is_none() {
        println!("ℹ️  ADMIN_TOKEN not set - admin endpoints disabled");
        println!("   To enable diagnostics, set ADMIN_TOKEN environment variable");
    }

    // Open storage and bootstrap the vault (idempotent: keys are created on
    // first start, reloaded thereafter)
    println!("🗄️  Opening storage at {}", config.storage_dir.display());
    let store = DocumentStore::open(&config.storage_dir)?;

    println!("🔐 Bootstrapping vault...");
    let vault = Vault::bootstrap(&config.vault_dir())?;
    let signer = vault.signer();
    println!("✅ Vault ready (KEK + RSA signing key loaded)");

    // Wire the core services
    let submissions = SubmissionService::new(
        store.clone(),
        vault.clone(),
        config.key_expiry_minutes,
        config.pow_difficulty,
    );
    let chat = ChatService::new(store.clone(), signer.clone(), config.key_expiry_minutes);
    let registry = KeyRegistry::new(store.clone());
    let verification = VerificationService::new(store.clone(), signer.clone());
    let sweeper = ExpirySweeper::new(store.clone(), config.sweep_interval);

    // Launch the expiry sweeper, exactly once for the process lifetime
    let sweeper_handle = sweeper.clone().spawn();
    println!(
        "✅ Expiry sweeper running (interval: {}s)",
        config.sweep_interval.as_secs()
    );

    let separator = "=".repeat(60);
    println!("\n{}", separator);
    println!("🎉 Fabstir Drop Node is running!");
    println!("{}", separator);
    println!("API Port:           {}", config.api_port);
    println!("PoW difficulty:     {}", config.pow_difficulty);
    println!("Key expiry:         {} min", config.key_expiry_minutes);
    println!("\nAPI Endpoints:");
    println!("  Identity:     POST http://localhost:{}/auth/identity", config.api_port);
    println!("  Submit:       POST http://localhost:{}/auth/submit", config.api_port);
    println!("  Read:         GET  http://localhost:{}/auth/read/{{msg_id}}", config.api_port);
    println!("  Chat send:    POST http://localhost:{}/chat/send", config.api_port);
    println!("  Inbox:        GET  http://localhost:{}/chat/inbox/{{user_id}}", config.api_port);
    println!("  Merkle root:  GET  http://localhost:{}/verify/root", config.api_port);
    println!("\nPress Ctrl+C to shutdown...");
    println!("{}\n", separator);

    let state = AppState {
        config,
        store,
        submissions,
        chat,
        registry,
        verification,
        sweeper,
        signer,
    };

    start_server(state).await?;

    println!("\n⏹️  Shutting down...");
    sweeper_handle.abort();

    println!("👋 Goodbye!");
    Ok(())
}
