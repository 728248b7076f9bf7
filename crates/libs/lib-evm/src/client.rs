//! # EVM JSON-RPC Client
//!
//! [`LedgerGateway`] backed by an alloy HTTP provider with a local signer.
//!
//! The provider fills nonce, gas and chain id for every submitted transaction;
//! confirmation waits for one block and optionally gives up after the configured
//! timeout.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::providers::{
    DynProvider, PendingTransactionBuilder, PendingTransactionError, Provider, ProviderBuilder,
};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::{RpcError, TransportErrorKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use lib_core::{Config, TxReceiptRef};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::gateway::{LedgerError, LedgerGateway, PendingTx, TxRequest};

/// Signing JSON-RPC client for a single account.
#[derive(Clone)]
pub struct EvmClient {
    provider: DynProvider,
    signer: Address,
    confirmation_timeout: Option<Duration>,
}

impl EvmClient {
    /// Build a client from configuration.
    ///
    /// Does not contact the node; the first call does.
    pub fn connect(config: &Config) -> Result<Self> {
        let signer: PrivateKeySigner = config
            .private_key
            .trim()
            .parse()
            .context("PRIVATE_KEY is not a valid secp256k1 key")?;
        let address = signer.address();

        let url = config
            .rpc_url
            .parse()
            .with_context(|| format!("RPC_URL '{}' is not a valid URL", config.rpc_url))?;

        let provider = ProviderBuilder::new().wallet(signer).connect_http(url).erased();

        tracing::info!(signer = %address, rpc_url = %config.rpc_url, "EVM client configured");

        Ok(Self {
            provider,
            signer: address,
            confirmation_timeout: config.confirmation_timeout,
        })
    }
}

#[async_trait]
impl LedgerGateway for EvmClient {
    fn signer_address(&self) -> Address {
        self.signer
    }

    #[instrument(skip(self, data), fields(selector = %selector_hex(&data)))]
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, LedgerError> {
        let tx = TransactionRequest::default()
            .with_from(self.signer)
            .with_to(to)
            .with_input(data);
        self.provider.call(tx).await.map_err(from_rpc)
    }

    #[instrument(skip(self, tx), fields(to = %tx.to, value = %tx.value))]
    async fn submit(&self, tx: TxRequest) -> Result<PendingTx, LedgerError> {
        let request = TransactionRequest::default()
            .with_from(self.signer)
            .with_to(tx.to)
            .with_input(tx.data)
            .with_value(tx.value);

        let pending = self.provider.send_transaction(request).await.map_err(from_rpc)?;
        let hash = *pending.tx_hash();
        debug!(tx_hash = %hash, "transaction broadcast");
        Ok(PendingTx { hash })
    }

    #[instrument(skip(self), fields(tx_hash = %pending.hash))]
    async fn await_confirmation(&self, pending: PendingTx) -> Result<TxReceiptRef, LedgerError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), pending.hash)
            .with_required_confirmations(1)
            .with_timeout(self.confirmation_timeout)
            .get_receipt()
            .await
            .map_err(|e| from_pending(e, pending))?;

        if !receipt.status() {
            return Err(LedgerError::Reverted(pending.hash));
        }

        Ok(TxReceiptRef::new(receipt.transaction_hash, receipt.block_number))
    }
}

fn from_rpc(err: RpcError<TransportErrorKind>) -> LedgerError {
    match err {
        RpcError::ErrorResp(payload) => LedgerError::Rejected(payload.message.to_string()),
        RpcError::DeserError { err, .. } => LedgerError::Decode(format!("node response: {}", err)),
        other => LedgerError::Unavailable(other.to_string()),
    }
}

fn from_pending(err: PendingTransactionError, pending: PendingTx) -> LedgerError {
    match err {
        PendingTransactionError::TxWatcher(_) => LedgerError::Timeout(pending.hash),
        PendingTransactionError::TransportError(e) => from_rpc(e),
        other => LedgerError::Unavailable(other.to_string()),
    }
}

fn selector_hex(data: &[u8]) -> String {
    data.get(..4).map(alloy::hex::encode_prefixed).unwrap_or_default()
}
