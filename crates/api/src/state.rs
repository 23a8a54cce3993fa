use anyhow::{Context, Result};
use crypto::{SymmetricKey, Wallet};
use ipfs::{ContentStore, MemoryStore, PinataClient};
use ledger::{EthereumLedger, Ledger, MemoryLedger};
use std::sync::Arc;
use tracing::info;

use crate::config::{Config, LedgerBackend, StorageBackend};

/// Everything a request needs. Built once per process and shared by reference.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ContentStore>,
    pub ledger: Arc<dyn Ledger>,
    /// Signs content hashes
    pub wallet: Wallet,
    /// Encrypts records that are not addressed to a public key
    pub symmetric_key: SymmetricKey,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ContentStore>, ledger: Arc<dyn Ledger>) -> Result<Self> {
        let wallet = Wallet::from_private_key(&config.signer_private_key)
            .context("SIGNER_PRIVATE_KEY is not a valid secp256k1 key")?;
        let symmetric_key = SymmetricKey::from_hex(&config.encryption_key)
            .context("ENCRYPTION_KEY must be 32 bytes of hex")?;
        Ok(Self {
            config,
            store,
            ledger,
            wallet,
            symmetric_key,
        })
    }

    /// Build the configured backends
    pub fn from_config(config: Config) -> Result<Self> {
        let store: Arc<dyn ContentStore> = match &config.storage {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::Pinata {
                jwt,
                api_url,
                gateway_url,
            } => Arc::new(PinataClient::new(api_url, gateway_url, jwt.as_str())?),
        };
        let ledger: Arc<dyn Ledger> = match &config.ledger {
            LedgerBackend::Memory => Arc::new(MemoryLedger::new()),
            LedgerBackend::Ethereum {
                rpc_url,
                registry_address,
            } => Arc::new(EthereumLedger::new(
                rpc_url,
                registry_address,
                &config.signer_private_key,
            )?),
        };
        let state = Self::new(config, store, ledger)?;
        info!("Service wallet {}", state.wallet.address());
        Ok(state)
    }
}
