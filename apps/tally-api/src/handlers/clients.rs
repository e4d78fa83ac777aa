//! # Client Handlers

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiResult;
use crate::extract::CompanyId;
use crate::state::AppState;
use tally_core::{CashbackBalance, CashbackTransaction};

const DEFAULT_STATEMENT_LIMIT: u32 = 20;
const MAX_STATEMENT_LIMIT: u32 = 200;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatementQuery {
    pub limit: Option<u32>,
}

/// Balance plus the latest movements, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct CashbackStatement {
    pub balance: CashbackBalance,
    pub transactions: Vec<CashbackTransaction>,
}

pub async fn cashback_statement(
    State(state): State<AppState>,
    CompanyId(company): CompanyId,
    Path(client_id): Path<String>,
    query: Result<Query<StatementQuery>, QueryRejection>,
) -> ApiResult<Json<CashbackStatement>> {
    let Query(query) = query?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_STATEMENT_LIMIT)
        .clamp(1, MAX_STATEMENT_LIMIT);
    debug!(%company, %client_id, limit, "cashback_statement");

    let (balance, transactions) = state
        .engine()
        .client_cashback(&company, &client_id, limit)
        .await?;
    Ok(Json(CashbackStatement {
        balance,
        transactions,
    }))
}
