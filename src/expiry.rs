// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Cryptographic Data Expiry
//!
//! The background worker behind "data death": every sweep interval, destroy
//! the wrapped DEK of each submission whose deadline has passed, and clear
//! the encrypted blobs of each expired chat message. Ciphertext and proof
//! records remain for audit; the plaintext is gone forever, even for the
//! operator, even with the KEK.
//!
//! The sweeper runs exactly once per process, started at application
//! startup. Sweeps are idempotent: a record is only counted the first time
//! its key material is destroyed. Transient I/O failures are logged and the
//! loop continues.
//!
//! Lock order within a sweep: submissions → chat messages.

use chrono::Utc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::models::{ChatMessages, Submissions};
use crate::storage::{Document, DocumentStore};

/// Handle over the expiry sweep
#[derive(Clone)]
pub struct ExpirySweeper {
    store: DocumentStore,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(store: DocumentStore, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// One synchronous sweep; returns how many records had key material
    /// destroyed
    ///
    /// Also serves the privileged force-expire trigger.
    pub async fn sweep_once(&self) -> anyhow::Result<usize> {
        let destroyed = self
            .store
            .mutate_if(Document::Submissions, |submissions: &mut Submissions| {
                let now = Utc::now();
                let mut destroyed = 0;
                for record in submissions.values_mut() {
                    if record.wrapped_dek.is_some() && record.is_expired(now) {
                        // 🔥 key destroyed; the ciphertext is now dead data
                        record.wrapped_dek = None;
                        destroyed += 1;
                    }
                }
                (destroyed, destroyed > 0)
            })
            .await?;

        let cleared = self
            .store
            .mutate_if(Document::ChatMessages, |messages: &mut ChatMessages| {
                let now = Utc::now();
                let mut cleared = 0;
                for record in messages.values_mut() {
                    if !record.expired && record.is_expired(now) {
                        record.encrypted_message = None;
                        record.encrypted_key = None;
                        record.expired = true;
                        cleared += 1;
                    }
                }
                (cleared, cleared > 0)
            })
            .await?;

        let total = destroyed + cleared;
        if total > 0 {
            info!(
                "🔥 Expiry sweep destroyed {} submission DEK(s) and cleared {} chat message(s)",
                destroyed, cleared
            );
        } else {
            debug!("Expiry sweep: nothing to destroy");
        }

        Ok(total)
    }

    /// Launch the background loop. Call exactly once at startup.
    pub fn spawn(self) -> JoinHandle<()> {
        info!(
            "⏲️ Expiry sweeper started, interval {}s",
            self.interval.as_secs()
        );

        tokio::spawn(async move {
            loop {
                if let Err(e) = self.sweep_once().await {
                    error!("❌ Expiry sweep failed: {:#}", e);
                }
                tokio::time::sleep(self.interval).await;
            }
        })
    }
}
