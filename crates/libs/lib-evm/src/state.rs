//! # Shared EVM State
//!
//! Bundles the gateway and the swap components so they can be cloned cheaply
//! into request handlers. Every component shares the same gateway.

use anyhow::Result;
use lib_core::config::{Config, ContractAddresses, SwapSettings};
use std::sync::Arc;

use crate::client::EvmClient;
use crate::gateway::LedgerGateway;
use crate::uniswap::{AllowanceManager, NativeWrapper, PoolResolver, QuoteEngine, SwapExecutor};

#[derive(Clone)]
pub struct EvmState {
    pub gateway: Arc<dyn LedgerGateway>,
    pub allowance: AllowanceManager,
    pub pools: PoolResolver,
    pub quotes: QuoteEngine,
    pub executor: SwapExecutor,
    pub contracts: ContractAddresses,
    pub settings: SwapSettings,
    /// Block explorer prefix for transaction links in logs and responses
    pub explorer_tx_url: String,
}

impl EvmState {
    /// Build the production state on top of a signing JSON-RPC client.
    pub fn new(config: &Config) -> Result<Self> {
        let client = EvmClient::connect(config)?;
        Ok(Self::with_gateway(
            Arc::new(client),
            config.contracts,
            config.swap,
            config.explorer_tx_url.clone(),
        ))
    }

    /// Build the state on top of any gateway.
    pub fn with_gateway(
        gateway: Arc<dyn LedgerGateway>,
        contracts: ContractAddresses,
        settings: SwapSettings,
        explorer_tx_url: String,
    ) -> Self {
        let wrapper = NativeWrapper::new(gateway.clone(), contracts.wrapped_native);

        Self {
            allowance: AllowanceManager::new(gateway.clone(), contracts.router, wrapper),
            pools: PoolResolver::new(gateway.clone(), contracts.factory, settings.fee_tier),
            quotes: QuoteEngine::new(gateway.clone(), contracts.quoter, settings.quote_validity_secs),
            executor: SwapExecutor::new(gateway.clone(), contracts.router),
            gateway,
            contracts,
            settings,
            explorer_tx_url,
        }
    }
}
