//! # RoleRepository
//!
//! 操作者に割り当てられたロール名の読み取りを担当するリポジトリ。
//! ロール・権限の管理 CRUD は外部コラボレータの領分であり、
//! このコアは権限階層分類に必要なロール名の列挙のみを提供する。

use async_trait::async_trait;
use leaveflow_domain::user::UserId;
use sqlx::PgPool;

use crate::error::InfraError;

/// ロールリポジトリトレイト
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// 操作者に割り当てられたロール名を列挙する
    ///
    /// ロールを一つも持たない操作者には空の Vec を返す（エラーではない）。
    async fn find_labels_by_user(&self, user_id: &UserId) -> Result<Vec<String>, InfraError>;
}

/// PostgreSQL 実装の RoleRepository
#[derive(Debug, Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn find_labels_by_user(&self, user_id: &UserId) -> Result<Vec<String>, InfraError> {
        let labels: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT r.name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(labels.into_iter().map(|(name,)| name).collect())
    }
}
