//! # 不在申請 API ハンドラ
//!
//! 内部 API として公開する。操作者のアイデンティティは前段のゲートウェイ
//! （セッション管理を担う BFF）がリクエストに付与する。
//! `actor_id` を解決できないリクエストは 401 で拒否する。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use leaveflow_domain::{
    absence::{AbsenceKind, AbsenceRequest, AbsenceRequestId, AbsenceStatus},
    employee::EmployeeId,
    user::UserId,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    usecase::{AbsenceUseCaseImpl, CreateAbsenceInput, UpdateStatusInput},
};

/// 不在申請ハンドラーの State
pub struct AbsenceState {
    pub usecase: AbsenceUseCaseImpl,
}

/// 不在申請の作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateAbsenceRequestBody {
    /// 操作者のユーザー ID（ゲートウェイが付与。欠損は 401）
    pub actor_id: Option<Uuid>,
    /// 対象従業員 ID
    pub subject_id: Uuid,
    /// 不在種別
    pub kind: AbsenceKind,
    /// 開始日
    pub start_date: NaiveDate,
    /// 終了日（この日を含む）
    pub end_date: NaiveDate,
    /// 時間数（任意）
    pub duration_hours: Option<i32>,
    /// 明示的な初期ステータス（省略時は一次承認待ち）
    pub requested_status: Option<AbsenceStatus>,
    /// 計画影響フラグの明示指定（任意）
    pub scheduling_impact: Option<bool>,
    /// コメント（任意）
    pub comment: Option<String>,
}

/// ステータス更新リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequestBody {
    /// 操作者のユーザー ID（ゲートウェイが付与。欠損は 401）
    pub actor_id: Option<Uuid>,
    /// 要求ステータス
    pub status:   AbsenceStatus,
    /// コメント差し替え（任意）
    pub comment:  Option<String>,
}

/// 操作者指定クエリパラメータ（GET リクエスト用）
#[derive(Debug, Deserialize)]
pub struct ActorQuery {
    /// 操作者のユーザー ID
    pub actor_id: Option<Uuid>,
}

/// 不在申請 DTO
#[derive(Debug, Serialize)]
pub struct AbsenceRequestDto {
    pub id: String,
    pub subject_id: String,
    pub kind: String,
    pub start_date: String,
    pub end_date: String,
    pub duration_hours: Option<i32>,
    pub comment: Option<String>,
    pub status: String,
    pub scheduling_impact: bool,
    pub level1_validated_by: Option<String>,
    pub level1_validated_at: Option<String>,
    pub level2_validated_by: Option<String>,
    pub level2_validated_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<AbsenceRequest> for AbsenceRequestDto {
    fn from(request: AbsenceRequest) -> Self {
        Self {
            id: request.id().to_string(),
            subject_id: request.subject_id().to_string(),
            kind: request.kind().to_string(),
            start_date: request.period().start().to_string(),
            end_date: request.period().end().to_string(),
            duration_hours: request.period().duration_hours(),
            comment: request.comment().map(String::from),
            status: request.status().to_string(),
            scheduling_impact: request.scheduling_impact(),
            level1_validated_by: request
                .level1_validation()
                .map(|v| v.validated_by.to_string()),
            level1_validated_at: request
                .level1_validation()
                .map(|v| v.validated_at.to_rfc3339()),
            level2_validated_by: request
                .level2_validation()
                .map(|v| v.validated_by.to_string()),
            level2_validated_at: request
                .level2_validation()
                .map(|v| v.validated_at.to_rfc3339()),
            cancelled_at: request.cancelled_at().map(|t| t.to_rfc3339()),
            created_by: request.created_by().to_string(),
            updated_by: request.updated_by().to_string(),
            created_at: request.created_at().to_rfc3339(),
            updated_at: request.updated_at().to_rfc3339(),
        }
    }
}

/// 操作者アイデンティティを解決する
///
/// ゲートウェイが付与する `actor_id` が欠損している場合は 401。
fn require_actor(actor_id: Option<Uuid>) -> Result<UserId, ServiceError> {
    actor_id
        .map(UserId::from_uuid)
        .ok_or(ServiceError::Unauthenticated)
}

/// 不在申請を作成する
///
/// ## エンドポイント
/// POST /internal/absences
pub async fn create_absence(
    State(state): State<Arc<AbsenceState>>,
    Json(body): Json<CreateAbsenceRequestBody>,
) -> Result<Response, ServiceError> {
    let actor_id = require_actor(body.actor_id)?;

    let input = CreateAbsenceInput {
        subject_id: EmployeeId::from_uuid(body.subject_id),
        kind: body.kind,
        start_date: body.start_date,
        end_date: body.end_date,
        duration_hours: body.duration_hours,
        requested_status: body.requested_status,
        scheduling_impact: body.scheduling_impact,
        comment: body.comment,
    };

    let request = state.usecase.create_absence(input, actor_id).await?;

    Ok((StatusCode::CREATED, Json(AbsenceRequestDto::from(request))).into_response())
}

/// 不在申請のステータスを更新する
///
/// ## エンドポイント
/// POST /internal/absences/{id}/status
pub async fn update_absence_status(
    State(state): State<Arc<AbsenceState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusRequestBody>,
) -> Result<Response, ServiceError> {
    let actor_id = require_actor(body.actor_id)?;

    let input = UpdateStatusInput {
        status:  body.status,
        comment: body.comment,
    };

    let request = state
        .usecase
        .update_status(AbsenceRequestId::from_uuid(id), input, actor_id)
        .await?;

    Ok(Json(AbsenceRequestDto::from(request)).into_response())
}

/// 不在申請の詳細を取得する
///
/// ## エンドポイント
/// GET /internal/absences/{id}?actor_id=...
pub async fn get_absence(
    State(state): State<Arc<AbsenceState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActorQuery>,
) -> Result<Response, ServiceError> {
    let actor_id = require_actor(query.actor_id)?;

    let request = state
        .usecase
        .get_absence(AbsenceRequestId::from_uuid(id), actor_id)
        .await?;

    Ok(Json(AbsenceRequestDto::from(request)).into_response())
}

/// 対象者ごとの不在申請一覧を取得する（履歴表示用）
///
/// ## エンドポイント
/// GET /internal/absences/by-subject/{subject_id}?actor_id=...
pub async fn list_absences_by_subject(
    State(state): State<Arc<AbsenceState>>,
    Path(subject_id): Path<Uuid>,
    Query(query): Query<ActorQuery>,
) -> Result<Response, ServiceError> {
    let actor_id = require_actor(query.actor_id)?;

    let requests = state
        .usecase
        .list_by_subject(EmployeeId::from_uuid(subject_id), actor_id)
        .await?;

    let dtos: Vec<AbsenceRequestDto> = requests.into_iter().map(AbsenceRequestDto::from).collect();
    Ok(Json(dtos).into_response())
}
