//! # Absence Service エラー定義
//!
//! サービス固有のエラーと、HTTP レスポンス（RFC 7807 Problem Details）への
//! 変換を定義する。
//!
//! `InvalidTransition`（既に決裁済み等で到達できない遷移）と
//! `Forbidden`（権限不足）は別バリアントとして扱い、UI が
//! 「もう決まっている」と「あなたにはできない」を区別できるようにする。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use leaveflow_domain::DomainError;
use leaveflow_infra::InfraError;
use serde::Serialize;
use thiserror::Error;

/// エラーレスポンス（RFC 7807 Problem Details）
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title:      String,
    pub status:     u16,
    pub detail:     String,
}

/// Absence Service で発生するエラー
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 認証されていない（操作者を解決できない）
    #[error("認証されていません")]
    Unauthenticated,

    /// 権限不足
    #[error("権限がありません: {0}")]
    Forbidden(String),

    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 現在の状態から到達できない遷移
    #[error("許可されない状態遷移です: {0}")]
    InvalidTransition(String),

    /// 競合（条件付き更新の失敗）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(#[from] InfraError),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::BadRequest(msg),
            DomainError::InvalidTransition { from, to } => {
                Self::InvalidTransition(format!("{from} → {to}"))
            }
            DomainError::NotFound { entity_type, id } => {
                Self::NotFound(format!("{entity_type} が見つかりません: {id}"))
            }
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::Forbidden(msg) => Self::Forbidden(msg),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, error_type, title, detail) = match &self {
            ServiceError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "https://leaveflow.example.com/errors/unauthenticated",
                "Unauthorized",
                self.to_string(),
            ),
            ServiceError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                "https://leaveflow.example.com/errors/forbidden",
                "Forbidden",
                msg.clone(),
            ),
            ServiceError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "https://leaveflow.example.com/errors/not-found",
                "Not Found",
                msg.clone(),
            ),
            ServiceError::InvalidTransition(msg) => (
                StatusCode::BAD_REQUEST,
                "https://leaveflow.example.com/errors/invalid-transition",
                "Invalid Transition",
                format!("許可されない状態遷移です: {msg}"),
            ),
            ServiceError::Conflict(msg) => (
                StatusCode::CONFLICT,
                "https://leaveflow.example.com/errors/conflict",
                "Conflict",
                msg.clone(),
            ),
            ServiceError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "https://leaveflow.example.com/errors/bad-request",
                "Bad Request",
                msg.clone(),
            ),
            ServiceError::Database(e) => {
                tracing::error!("データベースエラー: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "https://leaveflow.example.com/errors/internal-error",
                    "Internal Server Error",
                    "内部エラーが発生しました".to_string(),
                )
            }
            ServiceError::Internal(msg) => {
                tracing::error!("内部エラー: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "https://leaveflow.example.com/errors/internal-error",
                    "Internal Server Error",
                    "内部エラーが発生しました".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                error_type: error_type.to_string(),
                title: title.to_string(),
                status: status.as_u16(),
                detail,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_未認証は401にマッピングされる() {
        let response = ServiceError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_権限不足は403にマッピングされる() {
        let response = ServiceError::Forbidden("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_不正な遷移は403ではなく400にマッピングされる() {
        let response =
            ServiceError::InvalidTransition("cancelled → applied".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_競合は409にマッピングされる() {
        let response = ServiceError::Conflict("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_不存在は404にマッピングされる() {
        let response = ServiceError::NotFound("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_ドメインの遷移エラーはinvalid_transitionに変換される() {
        let err: ServiceError = DomainError::InvalidTransition {
            from: "cancelled",
            to:   "applied",
        }
        .into();

        assert!(matches!(err, ServiceError::InvalidTransition(_)));
    }

    #[test]
    fn test_ドメインの検証エラーはbad_requestに変換される() {
        let err: ServiceError = DomainError::Validation("期間が不正".to_string()).into();

        assert!(matches!(err, ServiceError::BadRequest(_)));
    }
}
