//! # Swap Handlers
//!
//! HTTP endpoint running a Uniswap V3 single-hop swap from the server's account.
//!
//! ## Endpoints
//!
//! - `POST /api/defi/swap` - wrap/approve as needed, quote, and execute a swap
//!
//! ## Request Example
//!
//! ```bash
//! curl -X POST http://localhost:3001/api/defi/swap \
//!   -H "Content-Type: application/json" \
//!   -d '{
//!     "tokenIn":  { "address": "0xfFf9976782d46CC05630D1f6eBAb18b2324d6B14", "symbol": "WETH", "decimals": 18 },
//!     "tokenOut": { "address": "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238", "symbol": "USDC", "decimals": 6 },
//!     "swapAmount": "0.01"
//!   }'
//! ```
//!
//! The call returns once the swap transaction is confirmed, which can take as long
//! as the network needs to mine up to three transactions (wrap, approve, swap).

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use lib_core::dto::{SwapRequest, SwapResponse};
use lib_core::{AppError, SwapProgress};
use tracing::instrument;

use crate::services::swap::SwapService;

/// Execute a swap.
///
/// # Request Body
///
/// - `tokenIn`, `tokenOut`: `{ address, symbol, decimals }`, decimals as number or string
/// - `swapAmount`: decimal string at `tokenIn` precision, e.g. `"1.0"`
///
/// # Returns
///
/// Success (200): `Json<SwapResponse>` with the swap transaction hash, explorer link,
/// amounts, and the approval/wrap hashes when those transactions were needed.
///
/// # Errors
///
/// - `400 Bad Request` - malformed body, amount or token descriptor (`stage: "validation"`),
///   or a wrap/approval/swap transaction that failed
/// - `404 Not Found` - no pool for the pair at the configured fee tier
/// - `502 Bad Gateway` - quote simulation failed or the node is unreachable
#[instrument(skip(service, payload))]
pub async fn execute_swap(
    State(service): State<SwapService>,
    payload: Result<Json<SwapRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SwapResponse>), AppError> {
    let Json(payload) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let swap = payload.validate()?;

    let mut progress = SwapProgress::new();
    let outcome = service
        .run(&swap.token_in, &swap.token_out, swap.amount_in, &mut progress)
        .await?;

    let response = SwapResponse::from_outcome(
        &outcome,
        &swap.token_out,
        progress.history(),
        service.explorer_tx_url(),
    );
    Ok((StatusCode::OK, Json(response)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::post;
    use axum::Router;
    use lib_evm::testing::{fixtures, FakeLedger, SubmissionKind};
    use lib_evm::EvmState;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_app(ledger: Arc<FakeLedger>) -> Router {
        let evm = EvmState::with_gateway(
            ledger,
            fixtures::contracts(),
            fixtures::settings(),
            "https://sepolia.etherscan.io/tx/".to_string(),
        );
        Router::new()
            .route("/api/defi/swap", post(execute_swap))
            .with_state(SwapService::new(Arc::new(evm)))
    }

    fn swap_body(amount: &str) -> Value {
        json!({
            "tokenIn": { "address": fixtures::WETH.to_string(), "symbol": "WETH", "decimals": 18 },
            "tokenOut": { "address": fixtures::USDC.to_string(), "symbol": "USDC", "decimals": "6" },
            "swapAmount": amount,
        })
    }

    async fn post_json(app: Router, body: String) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/defi/swap")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_swap_success() {
        // -- Arrange
        let ledger = Arc::new(
            FakeLedger::new()
                .with_pool(fixtures::WETH, fixtures::USDC, 3000, fixtures::POOL)
                .with_quote(U256::from(3_000_500_000u64)),
        );
        let app = test_app(ledger.clone());

        // -- Act
        let (status, body) = post_json(app, swap_body("1.0").to_string()).await;

        // -- Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amountIn"], "1.0");
        assert_eq!(body["quotedAmountOut"], "3000.5");
        assert_eq!(body["amountOutMinimum"], "2985.4975");
        assert_eq!(body["fee"], 3000);
        assert!(body["approvalTxHash"].is_string());
        assert!(body["wrapTxHash"].is_string());
        assert!(body["explorerUrl"]
            .as_str()
            .unwrap()
            .starts_with("https://sepolia.etherscan.io/tx/0x"));
        assert_eq!(body["stages"].as_array().unwrap().last().unwrap(), "Executed");
        assert_eq!(
            ledger.submission_kinds(),
            vec![SubmissionKind::Wrap, SubmissionKind::Approve, SubmissionKind::Swap]
        );
    }

    #[tokio::test]
    async fn test_swap_invalid_amount() {
        let ledger = Arc::new(FakeLedger::new());
        let (status, body) = post_json(test_app(ledger.clone()), swap_body("1,5").to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "InvalidInput");
        assert_eq!(body["stage"], "validation");
        assert_eq!(ledger.reads(), 0);
    }

    #[tokio::test]
    async fn test_swap_malformed_json() {
        let ledger = Arc::new(FakeLedger::new());
        let (status, body) = post_json(test_app(ledger), "{\"tokenIn\":".to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "InvalidInput");
    }

    #[tokio::test]
    async fn test_swap_pool_not_found() {
        // -- Arrange: allowance already in place, factory knows no pool
        let ledger = Arc::new(FakeLedger::new().with_allowance(
            fixtures::WETH,
            fixtures::ROUTER,
            U256::from(10u64).pow(U256::from(18u64)),
        ));

        // -- Act
        let (status, body) = post_json(test_app(ledger.clone()), swap_body("1.0").to_string()).await;

        // -- Assert
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "PoolNotFound");
        assert_eq!(body["stage"], "poolResolution");
        assert!(ledger.submissions().is_empty());
    }
}
