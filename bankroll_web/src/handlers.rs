use axum::{extract::State, http::StatusCode, Json};
use bankroll::domain::ledger::{Customer, Money, StatementEntry};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    error::ApiError,
    extract::{CustomerCpf, Params, Payload},
    AppState,
};

/// POST /account のボディ。`cpf` ヘッダーではなくボディで顧客を指定する
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub cpf: String,
    pub name: String,
}

/// 入金
#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub description: Option<String>,
    pub amount: Money,
}

/// 出金
#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub amount: Money,
}

/// 名義変更
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

/// `?date=YYYY-MM-DD`
///
/// 欠落と書式の検証は顧客の存在確認の後に行うため、値は文字列のまま受け取る。
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

impl DateQuery {
    /// `YYYY-MM-DD` を暦日として解釈する
    fn parse(&self) -> Result<NaiveDate, ApiError> {
        let date = self
            .date
            .as_deref()
            .ok_or_else(|| ApiError::bad_request("Missing query parameter: date"))?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| ApiError::bad_request(format!("Invalid date '{}': {}", date, e)))
    }
}

/// POST /account
pub async fn create_account(
    State(state): State<AppState>,
    Payload(request): Payload<CreateAccountRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .ledger
        .lock()
        .await
        .open_account(request.cpf.into(), request.name)
        .await?;
    Ok(StatusCode::CREATED)
}

/// GET /statement
pub async fn get_statement(
    State(state): State<AppState>,
    CustomerCpf(cpf): CustomerCpf,
) -> Result<Json<Vec<StatementEntry>>, ApiError> {
    let statement = state.ledger.lock().await.statement(&cpf).await?;
    Ok(Json(statement))
}

/// POST /deposit
pub async fn deposit(
    State(state): State<AppState>,
    CustomerCpf(cpf): CustomerCpf,
    Payload(request): Payload<DepositRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .ledger
        .lock()
        .await
        .deposit(&cpf, request.amount, request.description)
        .await?;
    Ok(StatusCode::CREATED)
}

/// POST /withdraw
pub async fn withdraw(
    State(state): State<AppState>,
    CustomerCpf(cpf): CustomerCpf,
    Payload(request): Payload<WithdrawRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .ledger
        .lock()
        .await
        .withdraw(&cpf, request.amount)
        .await?;
    Ok(StatusCode::CREATED)
}

/// GET /statement/date?date=YYYY-MM-DD
pub async fn get_statement_by_date(
    State(state): State<AppState>,
    CustomerCpf(cpf): CustomerCpf,
    Params(query): Params<DateQuery>,
) -> Result<Json<Vec<StatementEntry>>, ApiError> {
    let customer = state.ledger.lock().await.resolve(&cpf).await?;
    Ok(Json(customer.statement_on(query.parse()?)))
}

/// PUT /account
pub async fn rename_account(
    State(state): State<AppState>,
    CustomerCpf(cpf): CustomerCpf,
    Payload(request): Payload<RenameRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .ledger
        .lock()
        .await
        .rename(&cpf, request.name)
        .await?;
    Ok(StatusCode::CREATED)
}

/// GET /account
pub async fn get_account(
    State(state): State<AppState>,
    CustomerCpf(cpf): CustomerCpf,
) -> Result<Json<Customer>, ApiError> {
    let customer = state.ledger.lock().await.account(&cpf).await?;
    Ok(Json(customer))
}

/// DELETE /account
pub async fn delete_account(
    State(state): State<AppState>,
    CustomerCpf(cpf): CustomerCpf,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let remaining = state.ledger.lock().await.close_account(&cpf).await?;
    Ok(Json(remaining))
}

/// GET /balance
pub async fn get_balance(
    State(state): State<AppState>,
    CustomerCpf(cpf): CustomerCpf,
) -> Result<Json<Money>, ApiError> {
    let balance = state.ledger.lock().await.balance(&cpf).await?;
    Ok(Json(balance))
}
