use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ledger::{Block, BlockSummary, Engine, Transaction};

/// Shared handle to the ledger engine
pub type EngineData = web::Data<Engine>;

/// Response for the chain endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ChainResponse {
    /// The length of the chain
    pub length: usize,

    /// The blocks in the chain
    pub chain: Vec<Block>,

    /// Whether the chain is valid
    pub is_valid: bool,
}

/// Request for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionRequest {
    /// The sender's account
    pub sender: String,

    /// The receiver's account
    pub receiver: String,

    /// The amount to transfer
    pub amount: f64,

    /// The transaction fee; the engine default applies when omitted
    pub fee: Option<f64>,
}

/// Response for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    /// The message
    pub message: String,

    /// The deterministic transaction identifier
    pub txid: String,
}

/// Request for the mine endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineRequest {
    /// The account credited with the mining reward
    pub miner: String,
}

/// Response for the mine endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineResponse {
    /// The message
    pub message: String,

    /// Summary of the sealed block
    pub block: BlockSummary,
}

/// Response for the validate endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ValidateResponse {
    /// Whether the chain passed validation
    pub valid: bool,

    /// The message
    pub message: String,
}

/// Response for the single-balance endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    /// The account identifier
    pub account: String,

    /// The account's balance
    pub balance: f64,
}

/// Get the full chain
///
/// Returns every block and the chain's validity status
#[utoipa::path(
    get,
    path = "/api/v1/chain",
    responses(
        (status = 200, description = "Chain retrieved successfully", body = ChainResponse)
    )
)]
pub async fn get_chain(engine: EngineData) -> impl Responder {
    let chain = engine.blocks();
    let is_valid = engine.is_valid();

    let response = ChainResponse {
        length: chain.len(),
        chain,
        is_valid,
    };

    HttpResponse::Ok().json(response)
}

/// Get all pending transactions
///
/// Returns the mempool: admitted transactions not yet sealed into a block
#[utoipa::path(
    get,
    path = "/api/v1/transactions/pending",
    responses(
        (status = 200, description = "Pending transactions retrieved successfully", body = Vec<Transaction>)
    )
)]
pub async fn get_pending_transactions(engine: EngineData) -> impl Responder {
    HttpResponse::Ok().json(engine.pending())
}

/// Create, sign and admit a new transaction
///
/// Builds the transaction, signs it with the sender's stored secret and
/// submits it for mempool admission; the sender is debited immediately
#[utoipa::path(
    post,
    path = "/api/v1/transactions/new",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Transaction admitted to the mempool", body = TransactionResponse),
        (status = 400, description = "Invalid transaction data")
    )
)]
pub async fn new_transaction(
    engine: EngineData,
    request: web::Json<TransactionRequest>,
) -> impl Responder {
    let fee = request.fee.unwrap_or(engine.params().default_fee);

    let tx = match engine.create_and_sign(&request.sender, &request.receiver, request.amount, fee)
    {
        Ok(tx) => tx,
        Err(err) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": format!("Failed to create transaction: {}", err)
            }));
        }
    };

    match engine.admit(tx) {
        Ok(txid) => {
            let response = TransactionResponse {
                message: "Transaction added to mempool".to_string(),
                txid,
            };

            HttpResponse::Created().json(response)
        }
        Err(err) => HttpResponse::BadRequest().json(serde_json::json!({
            "error": format!("Failed to admit transaction: {}", err)
        })),
    }
}

/// Mine a new block
///
/// Seals the best-paying pending transactions into a proof-of-work block
/// and credits the miner the reward
#[utoipa::path(
    post,
    path = "/api/v1/mine",
    request_body = MineRequest,
    responses(
        (status = 200, description = "Block mined successfully", body = MineResponse),
        (status = 400, description = "Nothing to mine")
    )
)]
pub async fn mine_block(engine: EngineData, request: web::Json<MineRequest>) -> impl Responder {
    match engine.mine_block(&request.miner) {
        Ok(summary) => {
            let response = MineResponse {
                message: format!(
                    "Block {} mined. Miner reward: {} (includes fees). Difficulty was {}",
                    summary.index, summary.reward, summary.difficulty
                ),
                block: summary,
            };

            HttpResponse::Ok().json(response)
        }
        Err(err) => HttpResponse::BadRequest().json(serde_json::json!({
            "error": format!("Failed to mine block: {}", err)
        })),
    }
}

/// Validate the chain
///
/// Recomputes every block hash and checks the linkage
#[utoipa::path(
    get,
    path = "/api/v1/validate",
    responses(
        (status = 200, description = "Chain validation status", body = ValidateResponse)
    )
)]
pub async fn validate_chain(engine: EngineData) -> impl Responder {
    let response = match engine.validate() {
        Ok(()) => ValidateResponse {
            valid: true,
            message: "Chain valid".to_string(),
        },
        Err(err) => ValidateResponse {
            valid: false,
            message: err.to_string(),
        },
    };

    HttpResponse::Ok().json(response)
}

/// Get all account balances
#[utoipa::path(
    get,
    path = "/api/v1/balances",
    responses(
        (status = 200, description = "Balances retrieved successfully")
    )
)]
pub async fn get_balances(engine: EngineData) -> impl Responder {
    HttpResponse::Ok().json(engine.balances())
}

/// Get one account's balance
///
/// Unknown accounts report a balance of 0
#[utoipa::path(
    get,
    path = "/api/v1/balances/{account}",
    responses(
        (status = 200, description = "Balance retrieved successfully", body = BalanceResponse)
    )
)]
pub async fn get_balance(engine: EngineData, account: web::Path<String>) -> impl Responder {
    let account = account.into_inner();
    let balance = engine.balance(&account);

    HttpResponse::Ok().json(BalanceResponse { account, balance })
}
