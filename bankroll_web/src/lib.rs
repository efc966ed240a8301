use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use bankroll::{application::Ledger, infrastructure::ledger::InMemoryCustomerRepository};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod extract;
pub mod handlers;

use handlers::*;

/// ハンドラー間で共有する状態
///
/// 台帳は単一のロックで保護し、1リクエストの処理中は他のリクエストと交互に実行されない。
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Mutex<Ledger<InMemoryCustomerRepository>>>,
}

impl AppState {
    pub fn new(ledger: Ledger<InMemoryCustomerRepository>) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Ledger::in_memory())
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route(
            "/account",
            post(create_account)
                .put(rename_account)
                .get(get_account)
                .delete(delete_account),
        )
        .route("/statement", get(get_statement))
        .route("/statement/date", get(get_statement_by_date))
        .route("/deposit", post(deposit))
        .route("/withdraw", post(withdraw))
        .route("/balance", get(get_balance))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
