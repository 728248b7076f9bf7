//! # Ledger Gateway
//!
//! The single seam between the swap components and the EVM node.
//!
//! Components never talk to a provider directly: reads go through
//! [`LedgerGateway::call`], state changes through [`LedgerGateway::submit`]
//! followed by [`LedgerGateway::await_confirmation`]. Production uses
//! [`EvmClient`](crate::client::EvmClient); tests swap in an in-memory ledger.
//!
//! Failures are reported as [`LedgerError`] and converted to a stage-tagged
//! [`AppError`] at the component boundary with [`LedgerError::at`].

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use lib_core::{AppError, SwapStage, TxReceiptRef};
use thiserror::Error;

/// Errors produced by a ledger gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Node unreachable or transport failure
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// Node rejected the call or transaction (revert during simulation, nonce, funds)
    #[error("rejected by node: {0}")]
    Rejected(String),

    /// Transaction was mined but reverted
    #[error("transaction {0} reverted")]
    Reverted(B256),

    /// Receipt did not arrive within the confirmation timeout
    #[error("timed out waiting for confirmation of {0}")]
    Timeout(B256),

    /// Return data could not be decoded against the expected ABI
    #[error("failed to decode {0}")]
    Decode(String),
}

impl LedgerError {
    /// Attribute this failure to a pipeline stage.
    ///
    /// Transport failures become [`AppError::LedgerUnavailable`]; everything else
    /// becomes the stage's own error kind.
    pub fn at(self, stage: SwapStage) -> AppError {
        let message = match self {
            LedgerError::Unavailable(message) => {
                return AppError::LedgerUnavailable { stage, message };
            }
            other => other.to_string(),
        };

        match stage {
            SwapStage::Validation => AppError::InvalidInput(message),
            SwapStage::Allowance | SwapStage::Approval => AppError::Allowance { stage, message },
            SwapStage::Wrap => AppError::Wrap(message),
            SwapStage::PoolResolution => AppError::PoolNotFound(message),
            SwapStage::Quote | SwapStage::ParamsBuild => AppError::Quote { stage, message },
            SwapStage::Execution => AppError::Execution(message),
        }
    }
}

/// A state-changing transaction to sign and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub to: Address,
    pub data: Bytes,
    /// Native currency attached to the call
    pub value: U256,
}

impl TxRequest {
    /// Encode `call` as a transaction to `to` with no value attached.
    pub fn new<C: SolCall>(to: Address, call: &C) -> Self {
        Self {
            to,
            data: Bytes::from(call.abi_encode()),
            value: U256::ZERO,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// A broadcast transaction that has not been confirmed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTx {
    pub hash: B256,
}

#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Account that signs submitted transactions and owns the swapped tokens.
    fn signer_address(&self) -> Address;

    /// Execute a read-only call (`eth_call`) and return the raw return data.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, LedgerError>;

    /// Sign and broadcast a transaction.
    async fn submit(&self, tx: TxRequest) -> Result<PendingTx, LedgerError>;

    /// Wait until `pending` is mined; a reverted transaction is an error.
    async fn await_confirmation(&self, pending: PendingTx) -> Result<TxReceiptRef, LedgerError>;
}

/// Encode `call`, execute it read-only against `to`, and decode the return value.
pub async fn call_typed<C>(
    gateway: &dyn LedgerGateway,
    to: Address,
    call: C,
) -> Result<C::Return, LedgerError>
where
    C: SolCall + Send,
{
    let data = Bytes::from(call.abi_encode());
    let output = gateway.call(to, data).await?;
    C::abi_decode_returns(&output)
        .map_err(|e| LedgerError::Decode(format!("{} return data: {}", C::SIGNATURE, e)))
}

/// Submit `tx` and block until it is confirmed.
pub async fn submit_and_confirm(
    gateway: &dyn LedgerGateway,
    tx: TxRequest,
) -> Result<TxReceiptRef, LedgerError> {
    let pending = gateway.submit(tx).await?;
    tracing::info!(tx_hash = %pending.hash, "transaction submitted, awaiting confirmation");
    let receipt = gateway.await_confirmation(pending).await?;
    tracing::info!(tx_hash = %receipt.tx_hash, block = ?receipt.block_number, "transaction confirmed");
    Ok(receipt)
}
