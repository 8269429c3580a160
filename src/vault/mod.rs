// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Key Vault
//!
//! On-disk trust anchor of the node. Holds exactly two secrets, both
//! created on first start and never rotated for the lifetime of the
//! persisted state:
//!
//! - `kek.json`: the 256-bit AES Key Encryption Key, hex-encoded
//! - `signing_key.pem`: the RSA-2048 signing key, PKCS#8 PEM
//!
//! Bootstrap is idempotent: existing files are loaded, missing files are
//! generated and persisted with restrictive permissions. Both keys are
//! loaded once per process and shared read-only afterwards.
//!
//! An operator who deletes the vault destroys every unexpired submission
//! and all future signature verifiability.

use anyhow::{Context, Result};
use rand::{rngs::OsRng, RngCore};
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::crypto::aes_eax::KEY_SIZE;
use crate::crypto::ProofSigner;

const KEK_FILE: &str = "kek.json";
const SIGNING_KEY_FILE: &str = "signing_key.pem";
const RSA_KEY_BITS: usize = 2048;

#[derive(Serialize, Deserialize)]
struct KekFile {
    kek: String,
}

/// Loaded vault: the KEK and the proof signer built from the signing key
#[derive(Clone)]
pub struct Vault {
    kek: [u8; KEY_SIZE],
    signer: Arc<ProofSigner>,
}

impl Vault {
    /// Load the vault from `dir`, generating any missing key material
    pub fn bootstrap(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create vault directory {}", dir.display()))?;

        let kek = load_or_create_kek(&dir.join(KEK_FILE))?;
        let private_key = load_or_create_signing_key(&dir.join(SIGNING_KEY_FILE))?;
        let signer = ProofSigner::new(private_key).context("failed to build proof signer")?;

        Ok(Self {
            kek,
            signer: Arc::new(signer),
        })
    }

    /// The Key Encryption Key; read-only after bootstrap
    pub fn kek(&self) -> &[u8; KEY_SIZE] {
        &self.kek
    }

    /// The RSA-PSS signer for proof-of-existence signatures
    pub fn signer(&self) -> Arc<ProofSigner> {
        self.signer.clone()
    }
}

fn load_or_create_kek(path: &Path) -> Result<[u8; KEY_SIZE]> {
    if path.exists() {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file: KekFile =
            serde_json::from_str(&raw).with_context(|| format!("malformed {}", path.display()))?;
        let bytes = hex::decode(&file.kek).context("KEK is not valid hex")?;
        let kek: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| anyhow::anyhow!("KEK must be 32 bytes, found {}", v.len()))?;
        return Ok(kek);
    }

    let mut kek = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut kek);
    let contents = serde_json::to_string_pretty(&KekFile {
        kek: hex::encode(kek),
    })?;
    write_restricted(path, contents.as_bytes())?;

    info!("🔐 New KEK generated and saved to {}", path.display());
    Ok(kek)
}

fn load_or_create_signing_key(path: &Path) -> Result<RsaPrivateKey> {
    if path.exists() {
        let pem = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return RsaPrivateKey::from_pkcs8_pem(&pem)
            .with_context(|| format!("malformed signing key in {}", path.display()));
    }

    let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
        .context("RSA keypair generation failed")?;
    let pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .context("failed to encode signing key as PKCS#8 PEM")?;
    write_restricted(path, pem.as_bytes())?;

    info!("🔐 New RSA signing key generated and saved to {}", path.display());
    Ok(private_key)
}

/// Write a secret file with owner-only permissions
fn write_restricted(path: &Path, contents: &[u8]) -> Result<()> {
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("failed to restrict permissions on {}", path.display()))?;
    }

    Ok(())
}
