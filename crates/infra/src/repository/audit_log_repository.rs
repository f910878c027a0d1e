//! # AuditLogRepository
//!
//! 監査レコードの追記を担当するリポジトリ。
//!
//! 監査シンクへの書き込みはベストエフォートであり、失敗しても
//! 主処理（状態遷移）を妨げてはならない。握りつぶしの判断は
//! ユースケース層が行い、このリポジトリは失敗をそのまま返す。

use async_trait::async_trait;
use leaveflow_domain::audit::AuditEntry;
use sqlx::PgPool;

use crate::error::InfraError;

/// 監査ログリポジトリトレイト
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// 監査レコードを追記する
    async fn append(&self, entry: &AuditEntry) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の AuditLogRepository
#[derive(Debug, Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn append(&self, entry: &AuditEntry) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, actor_id, action, entity_type, entity_id, detail, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(entry.actor_id.as_uuid())
        .bind(entry.action.to_string())
        .bind(entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.detail)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
