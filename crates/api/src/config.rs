use anyhow::{Context, Result, bail};
use std::env;
use std::fmt;

pub const DEFAULT_PINATA_API_URL: &str = "https://api.pinata.cloud";
pub const DEFAULT_PINATA_GATEWAY_URL: &str = "https://gateway.pinata.cloud";

#[derive(Clone, PartialEq, Eq)]
pub enum LedgerBackend {
    Memory,
    Ethereum { rpc_url: String, registry_address: String },
}

#[derive(Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Pinata {
        jwt: String,
        api_url: String,
        gateway_url: String,
    },
}

/// Process configuration, read once at start-up
#[derive(Clone)]
pub struct Config {
    pub ledger: LedgerBackend,
    pub storage: StorageBackend,
    pub signer_private_key: String,
    pub encryption_key: String,
    pub api_key: Option<String>,
    pub unpin_on_anchor_failure: bool,
}

impl Config {
    /// Load from the environment, after applying a `.env` file if there is one
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &str| var(name).with_context(|| format!("{} is not set", name));

        let ledger = match var("LEDGER_BACKEND").as_deref().unwrap_or("memory") {
            "memory" => LedgerBackend::Memory,
            "ethereum" => LedgerBackend::Ethereum {
                rpc_url: required("ETHEREUM_RPC_URL")?,
                registry_address: required("DATA_REGISTRY_ADDRESS")?,
            },
            other => bail!("Unknown LEDGER_BACKEND: {}", other),
        };

        let storage = match var("STORAGE_BACKEND").as_deref().unwrap_or("memory") {
            "memory" => StorageBackend::Memory,
            "pinata" => StorageBackend::Pinata {
                jwt: required("PINATA_JWT")?,
                api_url: var("PINATA_API_URL").unwrap_or_else(|| DEFAULT_PINATA_API_URL.to_string()),
                gateway_url: var("PINATA_GATEWAY_URL")
                    .unwrap_or_else(|| DEFAULT_PINATA_GATEWAY_URL.to_string()),
            },
            other => bail!("Unknown STORAGE_BACKEND: {}", other),
        };

        let unpin_on_anchor_failure = match var("UNPIN_ON_ANCHOR_FAILURE").as_deref() {
            None | Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            Some(other) => bail!("UNPIN_ON_ANCHOR_FAILURE must be true or false, got {}", other),
        };

        Ok(Self {
            ledger,
            storage,
            signer_private_key: required("SIGNER_PRIVATE_KEY")?,
            encryption_key: required("ENCRYPTION_KEY")?,
            api_key: var("API_KEY"),
            unpin_on_anchor_failure,
        })
    }
}

// Secrets stay out of logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ledger = match &self.ledger {
            LedgerBackend::Memory => "memory".to_string(),
            LedgerBackend::Ethereum { rpc_url, registry_address } => {
                format!("ethereum({} @ {})", registry_address, rpc_url)
            }
        };
        let storage = match &self.storage {
            StorageBackend::Memory => "memory".to_string(),
            StorageBackend::Pinata { api_url, .. } => format!("pinata({})", api_url),
        };
        f.debug_struct("Config")
            .field("ledger", &ledger)
            .field("storage", &storage)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("unpin_on_anchor_failure", &self.unpin_on_anchor_failure)
            .finish()
    }
}
