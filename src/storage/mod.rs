// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persistent Document Storage
//!
//! Single point of serialization for the node's JSON documents. Every read
//! or write of a document holds that document's exclusive async lock for
//! the whole read-modify-write cycle, so operations on one document are
//! totally ordered while distinct documents proceed in parallel.
//!
//! Writes go through a write-new-then-rename discipline: serialize to
//! `<path>.tmp`, then rename over the target. A crash can lose the write
//! in flight but can never tear a document.
//!
//! Missing documents read as their empty value. I/O failures are fatal to
//! the current request; locks are RAII guards and release on every path.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

/// Identifier for one persistent JSON document
///
/// Cross-document lock order, where multiple documents are touched in one
/// operation: commitments → submissions → proofs; the expiry sweeper takes
/// submissions → chat messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Document {
    Submissions,
    ChatMessages,
    Commitments,
    Proofs,
    PublicKeys,
}

impl Document {
    /// Path relative to the storage root
    fn relative_path(&self) -> &'static str {
        match self {
            Document::Submissions => "submissions.json",
            Document::ChatMessages => "chat_messages.json",
            Document::Commitments => "commitments.json",
            Document::Proofs => "proofs.json",
            Document::PublicKeys => "vault/public_keys.json",
        }
    }
}

/// Handle over the storage root with a lazily populated per-document lock
/// table
#[derive(Clone)]
pub struct DocumentStore {
    root: PathBuf,
    locks: Arc<StdMutex<HashMap<Document, Arc<Mutex<()>>>>>,
}

impl DocumentStore {
    /// Open a store rooted at `root`, creating the directory tree
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join("vault"))
            .with_context(|| format!("failed to create storage root {}", root.display()))?;

        Ok(Self {
            root,
            locks: Arc::new(StdMutex::new(HashMap::new())),
        })
    }

    fn path(&self, doc: Document) -> PathBuf {
        self.root.join(doc.relative_path())
    }

    fn lock_for(&self, doc: Document) -> Arc<Mutex<()>> {
        let mut table = self.locks.lock().unwrap();
        table
            .entry(doc)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Read a document, returning its empty value when the file is absent
    pub async fn load<T>(&self, doc: Document) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let lock = self.lock_for(doc);
        let _guard = lock.lock().await;
        self.read_unlocked(doc).await
    }

    /// Replace a document's contents atomically
    pub async fn store<T>(&self, doc: Document, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        let lock = self.lock_for(doc);
        let _guard = lock.lock().await;
        self.write_unlocked(doc, value).await
    }

    /// Atomic read-modify-write under the document lock
    ///
    /// Loads the document (empty value if absent), applies `f`, persists
    /// the result, and returns whatever `f` returned. ID allocation and
    /// check-then-insert logic belong inside `f` so the lock covers them.
    pub async fn mutate<T, R, F>(&self, doc: Document, f: F) -> Result<R>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> R,
    {
        let lock = self.lock_for(doc);
        let _guard = lock.lock().await;

        let mut value: T = self.read_unlocked(doc).await?;
        let result = f(&mut value);
        self.write_unlocked(doc, &value).await?;

        Ok(result)
    }

    /// Like [`mutate`](Self::mutate), but `f` additionally reports whether
    /// it changed the document; an unchanged document is not rewritten
    ///
    /// Used where a pass frequently touches nothing, such as the expiry
    /// sweeper and the commitment consume-or-reject check.
    pub async fn mutate_if<T, R, F>(&self, doc: Document, f: F) -> Result<R>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> (R, bool),
    {
        let lock = self.lock_for(doc);
        let _guard = lock.lock().await;

        let mut value: T = self.read_unlocked(doc).await?;
        let (result, dirty) = f(&mut value);
        if dirty {
            self.write_unlocked(doc, &value).await?;
        }

        Ok(result)
    }

    async fn read_unlocked<T>(&self, doc: Document) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(doc);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()))
            }
        };

        serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    async fn write_unlocked<T>(&self, doc: Document, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        let path = self.path(doc);
        let tmp = path.with_extension("json.tmp");

        let raw = serde_json::to_vec_pretty(value).context("failed to serialize document")?;
        tokio::fs::write(&tmp, raw)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("failed to rename {} into place", tmp.display()))?;

        Ok(())
    }
}
