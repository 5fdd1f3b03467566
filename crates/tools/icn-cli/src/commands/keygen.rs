use crate::error::{CliError, CliResult};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use ed25519_dalek::{SigningKey, SECRET_KEY_LENGTH};
use icn_committee::did::did_from_verifying_key;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const PRIVATE_KEY_PREFIX: &str = "ed25519-priv:";

/// Key file format shared by member, issuer and ledger keys
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct KeyFile {
    pub did: String,
    #[serde(rename = "privateKey")]
    pub private_key: String,
    /// Base64 verifying key, the form `committee init --ledger-key` expects
    #[serde(rename = "publicKey")]
    pub public_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

impl KeyFile {
    pub fn from_signing_key(signing_key: &SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            did: did_from_verifying_key(&verifying_key),
            private_key: format!("{}{}", PRIVATE_KEY_PREFIX, BASE64_STANDARD.encode(signing_key.as_bytes())),
            public_key: BASE64_STANDARD.encode(verifying_key.as_bytes()),
            created: Some(Utc::now().to_rfc3339()),
        }
    }

    pub fn generate() -> (Self, SigningKey) {
        let signing_key = SigningKey::generate(&mut OsRng);
        (Self::from_signing_key(&signing_key), signing_key)
    }

    pub fn signing_key(&self) -> CliResult<SigningKey> {
        let encoded = self
            .private_key
            .strip_prefix(PRIVATE_KEY_PREFIX)
            .ok_or_else(|| CliError::InvalidKey("Invalid private key format in key file".to_string()))?;
        let bytes = BASE64_STANDARD
            .decode(encoded)
            .map_err(|e| CliError::InvalidKey(format!("Invalid private key encoding: {}", e)))?;
        let secret: [u8; SECRET_KEY_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
            CliError::InvalidKey(format!(
                "Expected {} private key bytes, got {}",
                SECRET_KEY_LENGTH,
                bytes.len()
            ))
        })?;
        let signing_key = SigningKey::from_bytes(&secret);
        if BASE64_STANDARD.encode(signing_key.verifying_key().as_bytes()) != self.public_key {
            return Err(CliError::InvalidKey(
                "Public key does not match the private key".to_string(),
            ));
        }
        Ok(signing_key)
    }

    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Err(CliError::InvalidKey(format!("Key file not found: {}", path.display())));
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| CliError::InvalidKey(format!("Invalid key file format in {}: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path, force: bool) -> CliResult<()> {
        if path.exists() && !force {
            return Err(CliError::Input(format!(
                "Output file '{}' already exists. Use --force to overwrite.",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct KeygenArgs {
    /// Output file to save the key
    #[arg(short, long)]
    pub output: PathBuf,

    /// Force overwrite if file exists
    #[arg(short, long)]
    pub force: bool,
}

pub fn handle_keygen(args: &KeygenArgs) -> CliResult {
    let (key_file, _) = KeyFile::generate();
    key_file.save(&args.output, args.force)?;

    println!("{} Key written to {}", "✓".green(), args.output.display());
    println!("DID: {}", key_file.did);
    println!("Public key: {}", key_file.public_key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_key_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("key.json");
        let (key_file, signing_key) = KeyFile::generate();
        key_file.save(&path, false).unwrap();

        let loaded = KeyFile::load(&path).unwrap();
        assert_eq!(loaded.did, key_file.did);
        assert_eq!(loaded.signing_key().unwrap().to_bytes(), signing_key.to_bytes());
        assert!(key_file.save(&path, false).is_err());
        assert!(key_file.save(&path, true).is_ok());
    }

    #[test]
    fn test_mismatched_public_key_rejected() {
        let (mut key_file, _) = KeyFile::generate();
        let (other, _) = KeyFile::generate();
        key_file.public_key = other.public_key;
        assert!(matches!(key_file.signing_key(), Err(CliError::InvalidKey(_))));
    }
}
