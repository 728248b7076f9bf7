//! # Application Configuration
//!
//! This module manages configuration loaded from environment variables.
//! All configuration is validated on startup to fail fast if misconfigured.
//!
//! The [`Config`] value is built once at startup and passed explicitly to the
//! ledger client and services; nothing reads the environment after that.
//!
//! ```rust,no_run
//! use lib_core::config::Config;
//!
//! let config = Config::from_env()?;
//! config.validate()?;
//! # Ok::<(), String>(())
//! ```

use alloy_primitives::Address;
use lib_utils::envs::{get_env, get_env_opt, get_env_parse_or};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Uniswap V3 factory on Sepolia.
pub const DEFAULT_FACTORY_ADDRESS: &str = "0x0227628f3F023bb0B980b67D528571c95c6DaC1c";
/// QuoterV2 on Sepolia.
pub const DEFAULT_QUOTER_ADDRESS: &str = "0xEd1f6473345F45b75F8179591dd5bA1888cf2FB3";
/// SwapRouter02 on Sepolia.
pub const DEFAULT_ROUTER_ADDRESS: &str = "0x3bFA4769FB09eefC5a80d6E87c3B9C650f7Ae48E";
/// WETH9 on Sepolia.
pub const DEFAULT_WRAPPED_NATIVE_ADDRESS: &str = "0xfFf9976782d46CC05630D1f6eBAb18b2324d6B14";

/// Standard mid fee tier (0.3%), in hundredths of a basis point.
pub const DEFAULT_FEE_TIER: u32 = 3000;
/// Fee tiers a Uniswap V3 factory deploys pools under.
pub const SUPPORTED_FEE_TIERS: [u32; 4] = [100, 500, 3000, 10000];
pub const DEFAULT_SLIPPAGE_BPS: u16 = 50;
pub const DEFAULT_QUOTE_VALIDITY_SECS: u64 = 600;
pub const DEFAULT_EXPLORER_TX_URL: &str = "https://sepolia.etherscan.io/tx/";

/// Addresses of the contracts the swap pipeline talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContractAddresses {
    /// Pool factory (`getPool`)
    pub factory: Address,
    /// Quoter (`quoteExactInputSingle`)
    pub quoter: Address,
    /// Swap router (`exactInputSingle`); also the spender for approvals
    pub router: Address,
    /// Wrapped native token (`deposit`)
    pub wrapped_native: Address,
}

/// Swap policy knobs applied by the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapSettings {
    /// Fee tier queried on the factory. Other tiers are never probed.
    pub fee_tier: u32,
    /// Slippage tolerance subtracted from the quote, in basis points.
    pub slippage_bps: u16,
    /// Quote validity window in seconds.
    pub quote_validity_secs: u64,
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self {
            fee_tier: DEFAULT_FEE_TIER,
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
            quote_validity_secs: DEFAULT_QUOTE_VALIDITY_SECS,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// JSON-RPC endpoint of the EVM node
    pub rpc_url: String,

    /// Hex-encoded signing key of the swapping account
    ///
    /// Never logged; `Debug` redacts it.
    pub private_key: String,

    pub contracts: ContractAddresses,

    pub swap: SwapSettings,

    /// Upper bound on waiting for a transaction receipt. `None` waits indefinitely.
    pub confirmation_timeout: Option<Duration>,

    /// Block explorer prefix a transaction hash is appended to
    pub explorer_tx_url: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &"***REDACTED***")
            .field("contracts", &self.contracts)
            .field("swap", &self.swap)
            .field("confirmation_timeout", &self.confirmation_timeout)
            .field("explorer_tx_url", &self.explorer_tx_url)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let rpc_url = get_env("RPC_URL").map_err(|e| e.to_string())?;
        let private_key = get_env("PRIVATE_KEY").map_err(|e| e.to_string())?;

        let contracts = ContractAddresses {
            factory: address_from_env("POOL_FACTORY_ADDRESS", DEFAULT_FACTORY_ADDRESS)?,
            quoter: address_from_env("QUOTER_ADDRESS", DEFAULT_QUOTER_ADDRESS)?,
            router: address_from_env("SWAP_ROUTER_ADDRESS", DEFAULT_ROUTER_ADDRESS)?,
            wrapped_native: address_from_env("WRAPPED_NATIVE_ADDRESS", DEFAULT_WRAPPED_NATIVE_ADDRESS)?,
        };

        let swap = SwapSettings {
            fee_tier: get_env_parse_or("POOL_FEE_TIER", DEFAULT_FEE_TIER).map_err(|e| e.to_string())?,
            slippage_bps: get_env_parse_or("SLIPPAGE_BPS", DEFAULT_SLIPPAGE_BPS).map_err(|e| e.to_string())?,
            quote_validity_secs: get_env_parse_or("QUOTE_VALIDITY_SECS", DEFAULT_QUOTE_VALIDITY_SECS)
                .map_err(|e| e.to_string())?,
        };

        let confirmation_timeout = match get_env_opt("CONFIRMATION_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.trim().parse().map_err(|e| {
                format!("CONFIRMATION_TIMEOUT_SECS must be a valid number: {}", e)
            })?)),
            None => None,
        };

        let explorer_tx_url = get_env_opt("EXPLORER_TX_URL")
            .unwrap_or_else(|| DEFAULT_EXPLORER_TX_URL.to_string());

        Ok(Self {
            rpc_url,
            private_key,
            contracts,
            swap,
            confirmation_timeout,
            explorer_tx_url,
        })
    }

    /// Validate configuration values against business rules.
    pub fn validate(&self) -> Result<(), String> {
        if self.rpc_url.trim().is_empty() {
            return Err("RPC_URL cannot be empty".to_string());
        }

        if self.private_key.trim().is_empty() {
            return Err("PRIVATE_KEY cannot be empty".to_string());
        }

        if !SUPPORTED_FEE_TIERS.contains(&self.swap.fee_tier) {
            return Err(format!(
                "POOL_FEE_TIER must be one of {:?}, got {}",
                SUPPORTED_FEE_TIERS, self.swap.fee_tier
            ));
        }

        if self.swap.slippage_bps >= 10_000 {
            return Err("SLIPPAGE_BPS must be below 10000 (100%)".to_string());
        }

        if self.swap.quote_validity_secs == 0 {
            return Err("QUOTE_VALIDITY_SECS must be greater than zero".to_string());
        }

        if self.confirmation_timeout.is_some_and(|t| t.is_zero()) {
            return Err("CONFIRMATION_TIMEOUT_SECS must be greater than zero".to_string());
        }

        Ok(())
    }
}

fn address_from_env(name: &'static str, default: &str) -> Result<Address, String> {
    let raw = get_env_opt(name).unwrap_or_else(|| default.to_string());
    Address::from_str(raw.trim()).map_err(|e| format!("{} must be a valid address: {}", name, e))
}
