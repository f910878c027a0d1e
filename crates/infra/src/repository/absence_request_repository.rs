//! # AbsenceRequestRepository
//!
//! 不在申請の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **条件付き更新**: 状態遷移の書き込みは `WHERE id = $1 AND status = $2`
//!   の単一 UPDATE で行う。更新件数が 0 の場合、前提としたステータスが
//!   既に変わっている（同時更新に負けた）ことを意味し、Conflict を返す。
//!   これが §並行性モデルの比較交換（compare-and-set）であり、
//!   別途のロック機構は持たない
//! - **原子性**: ステータスとその従属フィールド（決裁記録・計画影響フラグ）
//!   は常に同一の文で書き込まれ、部分適用は起こらない
//! - **RLS 連携**: 読み取りは [`ActorConnection`] 経由で行い、ストア側の
//!   行レベルセキュリティが操作者を参照できるようにする

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use leaveflow_domain::{
    absence::{
        AbsenceKind, AbsenceRequest, AbsenceRequestId, AbsenceRequestRecord, AbsenceStatus, Period,
    },
    employee::EmployeeId,
    user::UserId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{db::ActorConnection, error::InfraError};

/// 不在申請リポジトリトレイト
#[async_trait]
pub trait AbsenceRequestRepository: Send + Sync {
    /// 申請を新規保存する
    async fn insert(&self, request: &AbsenceRequest) -> Result<(), InfraError>;

    /// 前提ステータス付きで申請を更新する（条件付き更新）
    ///
    /// # 引数
    ///
    /// - `request`: 遷移後の申請
    /// - `expected`: 遷移の前提とした現在ステータス
    ///
    /// # 戻り値
    ///
    /// - `Ok(())`: 更新成功
    /// - `Err(Conflict)`: 前提ステータスが一致せず更新が 0 件だった場合
    /// - `Err(_)`: データベースエラー
    async fn update_from_status(
        &self,
        request: &AbsenceRequest,
        expected: AbsenceStatus,
    ) -> Result<(), InfraError>;

    /// ID で申請を取得する
    async fn find_by_id(
        &self,
        id: &AbsenceRequestId,
        actor_id: &UserId,
    ) -> Result<Option<AbsenceRequest>, InfraError>;

    /// 対象者ごとの申請一覧を取得する（作成日時の降順）
    async fn find_by_subject(
        &self,
        subject_id: &EmployeeId,
        actor_id: &UserId,
    ) -> Result<Vec<AbsenceRequest>, InfraError>;
}

/// `absence_requests` テーブルのフラット行
///
/// `into_domain()` でドメインの不変条件を検証して ADT に変換する。
#[derive(Debug, sqlx::FromRow)]
struct AbsenceRequestRow {
    id: Uuid,
    subject_id: Uuid,
    kind: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    duration_hours: Option<i32>,
    comment: Option<String>,
    status: String,
    scheduling_impact: bool,
    level1_validated_by: Option<Uuid>,
    level1_validated_at: Option<DateTime<Utc>>,
    level2_validated_by: Option<Uuid>,
    level2_validated_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    created_by: Uuid,
    updated_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AbsenceRequestRow {
    fn into_domain(self) -> Result<AbsenceRequest, InfraError> {
        let kind = self
            .kind
            .parse::<AbsenceKind>()
            .map_err(|e| InfraError::unexpected(e.to_string()))?;
        let status = self
            .status
            .parse::<AbsenceStatus>()
            .map_err(|e| InfraError::unexpected(e.to_string()))?;
        let period = Period::new(self.start_date, self.end_date, self.duration_hours)
            .map_err(|e| InfraError::unexpected(e.to_string()))?;

        AbsenceRequest::from_db(AbsenceRequestRecord {
            id: AbsenceRequestId::from_uuid(self.id),
            subject_id: EmployeeId::from_uuid(self.subject_id),
            kind,
            period,
            comment: self.comment,
            status,
            scheduling_impact: self.scheduling_impact,
            level1_validated_by: self.level1_validated_by.map(UserId::from_uuid),
            level1_validated_at: self.level1_validated_at,
            level2_validated_by: self.level2_validated_by.map(UserId::from_uuid),
            level2_validated_at: self.level2_validated_at,
            cancelled_at: self.cancelled_at,
            created_by: UserId::from_uuid(self.created_by),
            updated_by: UserId::from_uuid(self.updated_by),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
        .map_err(|e| InfraError::unexpected(e.to_string()))
    }
}

const SELECT_COLUMNS: &str = r#"
    id, subject_id, kind, start_date, end_date, duration_hours,
    comment, status, scheduling_impact,
    level1_validated_by, level1_validated_at,
    level2_validated_by, level2_validated_at,
    cancelled_at, created_by, updated_by, created_at, updated_at
"#;

/// PostgreSQL 実装の AbsenceRequestRepository
#[derive(Debug, Clone)]
pub struct PostgresAbsenceRequestRepository {
    pool: PgPool,
}

impl PostgresAbsenceRequestRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AbsenceRequestRepository for PostgresAbsenceRequestRepository {
    async fn insert(&self, request: &AbsenceRequest) -> Result<(), InfraError> {
        let kind: &str = request.kind().into();
        let status: &str = request.status().into();

        sqlx::query(
            r#"
            INSERT INTO absence_requests (
                id, subject_id, kind, start_date, end_date, duration_hours,
                comment, status, scheduling_impact,
                level1_validated_by, level1_validated_at,
                level2_validated_by, level2_validated_at,
                cancelled_at, created_by, updated_by, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9,
                $10, $11, $12, $13, $14, $15, $16, $17, $18
            )
            "#,
        )
        .bind(request.id().as_uuid())
        .bind(request.subject_id().as_uuid())
        .bind(kind)
        .bind(request.period().start())
        .bind(request.period().end())
        .bind(request.period().duration_hours())
        .bind(request.comment())
        .bind(status)
        .bind(request.scheduling_impact())
        .bind(request.level1_validation().map(|v| *v.validated_by.as_uuid()))
        .bind(request.level1_validation().map(|v| v.validated_at))
        .bind(request.level2_validation().map(|v| *v.validated_by.as_uuid()))
        .bind(request.level2_validation().map(|v| v.validated_at))
        .bind(request.cancelled_at())
        .bind(request.created_by().as_uuid())
        .bind(request.updated_by().as_uuid())
        .bind(request.created_at())
        .bind(request.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_from_status(
        &self,
        request: &AbsenceRequest,
        expected: AbsenceStatus,
    ) -> Result<(), InfraError> {
        let status: &str = request.status().into();
        let expected: &str = expected.into();

        // ステータスと従属フィールドを単一の文で書き込む。
        // WHERE 句の status 一致が compare-and-set の前提条件になる。
        let result = sqlx::query(
            r#"
            UPDATE absence_requests SET
                status = $1,
                scheduling_impact = $2,
                level1_validated_by = $3,
                level1_validated_at = $4,
                level2_validated_by = $5,
                level2_validated_at = $6,
                cancelled_at = $7,
                comment = $8,
                updated_by = $9,
                updated_at = $10
            WHERE id = $11 AND status = $12
            "#,
        )
        .bind(status)
        .bind(request.scheduling_impact())
        .bind(request.level1_validation().map(|v| *v.validated_by.as_uuid()))
        .bind(request.level1_validation().map(|v| v.validated_at))
        .bind(request.level2_validation().map(|v| *v.validated_by.as_uuid()))
        .bind(request.level2_validation().map(|v| v.validated_at))
        .bind(request.cancelled_at())
        .bind(request.comment())
        .bind(request.updated_by().as_uuid())
        .bind(request.updated_at())
        .bind(request.id().as_uuid())
        .bind(expected)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(InfraError::conflict(
                "AbsenceRequest",
                request.id().to_string(),
            ));
        }

        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &AbsenceRequestId,
        actor_id: &UserId,
    ) -> Result<Option<AbsenceRequest>, InfraError> {
        let mut conn = ActorConnection::acquire(&self.pool, actor_id).await?;

        let row: Option<AbsenceRequestRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM absence_requests WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;

        row.map(AbsenceRequestRow::into_domain).transpose()
    }

    async fn find_by_subject(
        &self,
        subject_id: &EmployeeId,
        actor_id: &UserId,
    ) -> Result<Vec<AbsenceRequest>, InfraError> {
        let mut conn = ActorConnection::acquire(&self.pool, actor_id).await?;

        let rows: Vec<AbsenceRequestRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM absence_requests
            WHERE subject_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(subject_id.as_uuid())
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter()
            .map(AbsenceRequestRow::into_domain)
            .collect()
    }
}
