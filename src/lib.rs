// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod chat;
pub mod config;
pub mod crypto;
pub mod expiry;
pub mod models;
pub mod registry;
pub mod storage;
pub mod submissions;
pub mod vault;
pub mod verification;

// Re-export main types from the service modules
pub use chat::{ChatReceipt, ChatSendRequest, ChatService};
pub use config::NodeConfig;
pub use expiry::ExpirySweeper;
pub use registry::{KeyRegistry, RegisterKeyRequest};
pub use submissions::{SubmissionReceipt, SubmissionRequest, SubmissionService};
pub use verification::VerificationService;

// Re-export types from the storage and vault layers
pub use storage::{Document, DocumentStore};
pub use vault::Vault;
