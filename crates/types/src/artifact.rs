//! Persisted contract binding produced by the deploy step.

use crate::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONTRACT_NAME: &str = "AccessControl";
pub const CONTRACT_VERSION: &str = "1";

/// Methods exposed by the access-control contract.
pub const CONTRACT_METHODS: &[&str] = &[
    "register_content",
    "grant_access",
    "revoke_access",
    "access_file",
    "authorized",
];

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("artifact {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("artifact describes {found}, expected AccessControl")]
    WrongContract { found: String },
    #[error("invalid contract address: {0}")]
    InvalidAddress(String),
}

/// Address of a deployed contract (`0x` + 40 hex characters).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContractAddress(String);

impl ContractAddress {
    /// Derive the address of the `nonce`-th contract created by `deployer`.
    pub fn derive(deployer: &Identity, nonce: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"fileguard-contract");
        hasher.update(deployer.as_bytes());
        hasher.update(&nonce.to_le_bytes());
        let digest = hasher.finalize();
        Self(format!("0x{}", hex::encode(&digest.as_bytes()[..20])))
    }

    pub fn parse(value: &str) -> Result<Self, ArtifactError> {
        let lowered = value.trim().to_ascii_lowercase();
        let Some(raw) = lowered.strip_prefix("0x") else {
            return Err(ArtifactError::InvalidAddress(value.to_string()));
        };
        if raw.len() != 40 || hex::decode(raw).is_err() {
            return Err(ArtifactError::InvalidAddress(value.to_string()));
        }
        Ok(Self(lowered))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractAddress({})", self.0)
    }
}

impl From<ContractAddress> for String {
    fn from(value: ContractAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for ContractAddress {
    type Error = ArtifactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ContractAddress::parse(&value)
    }
}

/// Interface descriptor of the deployed contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDescriptor {
    pub name: String,
    pub version: String,
    pub methods: Vec<String>,
}

impl ContractDescriptor {
    pub fn access_control() -> Self {
        Self {
            name: CONTRACT_NAME.to_string(),
            version: CONTRACT_VERSION.to_string(),
            methods: CONTRACT_METHODS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// `{ descriptor, address }` record binding a client to a deployed contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractArtifact {
    pub descriptor: ContractDescriptor,
    pub address: ContractAddress,
}

impl ContractArtifact {
    pub fn new(address: ContractAddress) -> Self {
        Self {
            descriptor: ContractDescriptor::access_control(),
            address,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: ContractArtifact =
            serde_json::from_str(&raw).map_err(|source| ArtifactError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if artifact.descriptor.name != CONTRACT_NAME {
            return Err(ArtifactError::WrongContract {
                found: artifact.descriptor.name,
            });
        }
        Ok(artifact)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        let write_err = |source| ArtifactError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let body = serde_json::to_string_pretty(self).map_err(|source| ArtifactError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, body).map_err(write_err)
    }
}
