use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query,
    },
    http::{request::Parts, Request},
    Json,
};
use bankroll::{application::LedgerError, domain::ledger::Cpf};

use crate::error::ApiError;

/// 顧客を指定するヘッダー名
pub const CPF_HEADER: &str = "cpf";

/// `cpf` ヘッダーから取り出した顧客の識別子
///
/// ヘッダーが無い、または文字列として読めない場合は該当顧客なしとして扱う。
#[derive(Debug, Clone)]
pub struct CustomerCpf(pub Cpf);

#[async_trait]
impl<S> FromRequestParts<S> for CustomerCpf
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CPF_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|value| CustomerCpf(value.into()))
            .ok_or_else(|| LedgerError::CustomerNotFound.into())
    }
}

/// JSONボディ。不正なボディは 400 `{ "error": ... }` で拒否する
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, B, T> FromRequest<S, B> for Payload<T>
where
    Json<T>: FromRequest<S, B, Rejection = JsonRejection>,
    S: Send + Sync,
    B: Send + 'static,
{
    type Rejection = ApiError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Payload(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

/// クエリ文字列。解釈できない場合は `Payload` と同じく 400 `{ "error": ... }` で拒否する
#[derive(Debug, Clone)]
pub struct Params<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Params<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Params(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}
