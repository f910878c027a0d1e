//! # EmployeeRepository
//!
//! 従業員（申請対象者）の読み取りを担当するリポジトリ。
//! 従業員マスタの管理自体は汎用 CRUD の領分であり、このコアは
//! 権限分類に必要な読み取りのみを提供する。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leaveflow_domain::{employee::{Employee, EmployeeId}, user::UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 従業員リポジトリトレイト
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// ID で従業員を取得する
    async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>, InfraError>;
}

#[derive(Debug, sqlx::FromRow)]
struct EmployeeRow {
    id: Uuid,
    name: String,
    user_id: Option<Uuid>,
    manager_id: Option<Uuid>,
    secondary_manager_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee::from_db(
            EmployeeId::from_uuid(row.id),
            row.name,
            row.user_id.map(UserId::from_uuid),
            row.manager_id.map(EmployeeId::from_uuid),
            row.secondary_manager_id.map(EmployeeId::from_uuid),
            row.created_at,
            row.updated_at,
        )
    }
}

/// PostgreSQL 実装の EmployeeRepository
#[derive(Debug, Clone)]
pub struct PostgresEmployeeRepository {
    pool: PgPool,
}

impl PostgresEmployeeRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeRepository for PostgresEmployeeRepository {
    async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>, InfraError> {
        let row: Option<EmployeeRow> = sqlx::query_as(
            r#"
            SELECT id, name, user_id, manager_id, secondary_manager_id,
                   created_at, updated_at
            FROM employees
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Employee::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn EmployeeRepository>();
    }
}
