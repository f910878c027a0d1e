//! # 承認ワークフローエンジン
//!
//! 不在申請の作成・状態遷移に関するビジネスロジックを実装する。
//!
//! ## 責務
//!
//! - 作成認可（人事・管理者、本人、上長のいずれかであること）
//! - 作成時の自動承認ショートカットの適用
//! - 遷移ごとの権限階層チェックと遷移の適法性チェック
//! - 条件付き更新（compare-and-set）によるコミットと競合の検出
//! - 監査シンクへのベストエフォート追記とビジネスイベントログ

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use leaveflow_domain::{
    absence::{
        AbsenceKind, AbsenceRequest, AbsenceRequestId, AbsenceStatus, NewAbsenceRequest, Period,
    },
    audit::{AuditAction, AuditEntry},
    authority::{ActorClassification, HrTierRoles},
    clock::Clock,
    employee::{Employee, EmployeeId},
    user::UserId,
};
use leaveflow_infra::repository::{
    AbsenceRequestRepository, AuditLogRepository, EmployeeRepository, RoleRepository,
};
use leaveflow_shared::{event_log::event, log_business_event};

use crate::error::ServiceError;

/// 不在申請の作成入力
#[derive(Debug, Clone)]
pub struct CreateAbsenceInput {
    /// 対象従業員 ID
    pub subject_id: EmployeeId,
    /// 不在種別
    pub kind: AbsenceKind,
    /// 開始日
    pub start_date: NaiveDate,
    /// 終了日（この日を含む）
    pub end_date: NaiveDate,
    /// 時間数（任意）
    pub duration_hours: Option<i32>,
    /// 明示的に指定された初期ステータス（省略時は一次承認待ち）
    pub requested_status: Option<AbsenceStatus>,
    /// 計画影響フラグの明示指定（人事の代理作成時のみ有効な上書き）
    pub scheduling_impact: Option<bool>,
    /// コメント（任意）
    pub comment: Option<String>,
}

/// ステータス更新入力
#[derive(Debug, Clone)]
pub struct UpdateStatusInput {
    /// 要求ステータス
    pub status:  AbsenceStatus,
    /// コメント差し替え（任意の補助編集）
    pub comment: Option<String>,
}

/// 取消ポリシー
///
/// 人事・管理者による取消は常に可能。本人による取消は
/// 状態機械の外側のこのフラグで制御する（上長は取消できない）。
#[derive(Debug, Clone, Copy, Default)]
pub struct CancellationPolicy {
    /// 本人による取消を許可するか
    pub allow_owner_cancel: bool,
}

/// ワークフローエンジンの依存コンポーネント
pub struct AbsenceWorkflowDeps {
    pub absence_repo:  Arc<dyn AbsenceRequestRepository>,
    pub employee_repo: Arc<dyn EmployeeRepository>,
    pub role_repo:     Arc<dyn RoleRepository>,
    pub audit_repo:    Arc<dyn AuditLogRepository>,
    pub clock:         Arc<dyn Clock>,
    pub hr_roles:      HrTierRoles,
    pub policy:        CancellationPolicy,
}

/// 不在申請ユースケース実装
pub struct AbsenceUseCaseImpl {
    pub(crate) deps: AbsenceWorkflowDeps,
}

impl AbsenceUseCaseImpl {
    /// 新しいユースケースを作成
    pub fn new(deps: AbsenceWorkflowDeps) -> Self {
        Self { deps }
    }

    /// 不在申請を作成する
    ///
    /// ## 処理フロー
    ///
    /// 1. 期間を検証（ストア書き込みより前）
    /// 2. 対象従業員を取得
    /// 3. 操作者を分類し、作成認可を確認
    /// 4. 初期ステータスを決定（自動承認ショートカット）
    /// 5. 保存
    /// 6. 監査追記（ベストエフォート）とビジネスイベント
    ///
    /// ## 自動承認ショートカット
    ///
    /// 既定の初期ステータス（一次承認待ち）が要求された場合のみ評価する:
    ///
    /// 1. 操作者が人事・管理者かつ対象者本人でない場合、両段階の委任権限を
    ///    持つものとして作成時点で二次承認済みにする
    /// 2. 対象者がアカウントを持たず、操作者が（人事でない）上長の場合、
    ///    一次決裁を済ませたものとして二次承認待ちから開始する
    /// 3. それ以外はショートカットなし
    pub async fn create_absence(
        &self,
        input: CreateAbsenceInput,
        actor_id: UserId,
    ) -> Result<AbsenceRequest, ServiceError> {
        // 1. 期間を検証
        let period = Period::new(input.start_date, input.end_date, input.duration_hours)?;

        // 2. 対象従業員を取得
        let subject = self
            .deps
            .employee_repo
            .find_by_id(&input.subject_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "対象の従業員が見つかりません: {}",
                    input.subject_id
                ))
            })?;

        // 3. 操作者を分類し、作成認可を確認
        let classification = self.classify(&actor_id, &subject).await?;
        if !classification.may_create() {
            return Err(ServiceError::Forbidden(
                "この従業員への不在申請を作成する権限がありません".to_string(),
            ));
        }

        let now = self.deps.clock.now();
        let params = NewAbsenceRequest {
            id: AbsenceRequestId::new(),
            subject_id: input.subject_id,
            kind: input.kind,
            period,
            comment: input.comment,
            created_by: actor_id.clone(),
            now,
        };

        // 4. 初期ステータスを決定
        let request = match input.requested_status {
            None | Some(AbsenceStatus::PendingLevel1) => {
                Self::apply_creation_shortcut(params, &classification, &subject, input.scheduling_impact)
            }
            Some(requested) => Self::build_with_requested_status(
                params,
                requested,
                &classification,
                input.scheduling_impact,
            )?,
        };

        // 5. 保存
        self.deps.absence_repo.insert(&request).await?;

        // 6. 監査とビジネスイベント
        self.append_audit(&actor_id, AuditAction::Create, &request, now)
            .await;
        log_business_event!(
            event.category = event::category::ABSENCE,
            event.action = event::action::ABSENCE_CREATED,
            event.entity_type = event::entity_type::ABSENCE_REQUEST,
            event.entity_id = %request.id(),
            event.actor_id = %actor_id,
            event.result = event::result::SUCCESS,
            status = %request.status(),
            "不在申請を作成"
        );

        Ok(request)
    }

    /// 作成時の自動承認ショートカットを適用する
    fn apply_creation_shortcut(
        params: NewAbsenceRequest,
        classification: &ActorClassification,
        subject: &Employee,
        scheduling_impact: Option<bool>,
    ) -> AbsenceRequest {
        if classification.is_hr_or_admin && !classification.is_self {
            // 人事が第三者の不在を登録する場合、明示的な false のみ尊重する
            AbsenceRequest::new_fully_validated(params, scheduling_impact.unwrap_or(true))
        } else if !subject.has_account()
            && classification.is_manager_of
            && !classification.is_hr_or_admin
        {
            AbsenceRequest::new_level1_validated(params)
        } else {
            AbsenceRequest::new(params)
        }
    }

    /// 既定以外の初期ステータスが明示された場合の作成
    ///
    /// 人事・管理者のみが指定でき、指定できるのはショートカットが
    /// 生成し得る状態（二次承認待ち・二次承認済み）に限る。
    /// 決裁記録はショートカットと同じく作成者で埋める。
    fn build_with_requested_status(
        params: NewAbsenceRequest,
        requested: AbsenceStatus,
        classification: &ActorClassification,
        scheduling_impact: Option<bool>,
    ) -> Result<AbsenceRequest, ServiceError> {
        if !classification.is_hr_or_admin {
            return Err(ServiceError::Forbidden(
                "既定以外の初期ステータスを指定できるのは人事・管理者のみです".to_string(),
            ));
        }

        match requested {
            AbsenceStatus::PendingLevel2 => Ok(AbsenceRequest::new_level1_validated(params)),
            AbsenceStatus::Level2Approved => Ok(AbsenceRequest::new_fully_validated(
                params,
                scheduling_impact.unwrap_or(true),
            )),
            _ => Err(ServiceError::BadRequest(format!(
                "作成時に指定できる初期ステータスではありません: {requested}"
            ))),
        }
    }

    /// 不在申請のステータスを更新する
    ///
    /// ## 処理フロー
    ///
    /// 1. 申請・対象従業員を取得し、操作者を分類
    /// 2. 要求ステータスごとに権限階層を確認し、遷移を適用
    ///    （到達できない遷移はこの時点で `InvalidTransition`）
    /// 3. 読み取ったステータスを前提とする条件付き更新でコミット
    ///    （前提不一致 = 同時更新に負けた場合は `Conflict`）
    /// 4. 監査追記（ベストエフォート）とビジネスイベント
    pub async fn update_status(
        &self,
        id: AbsenceRequestId,
        input: UpdateStatusInput,
        actor_id: UserId,
    ) -> Result<AbsenceRequest, ServiceError> {
        // 1. 申請と対象従業員を取得
        let current = self
            .deps
            .absence_repo
            .find_by_id(&id, &actor_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("不在申請が見つかりません: {id}")))?;

        let subject = self
            .deps
            .employee_repo
            .find_by_id(current.subject_id())
            .await?
            .ok_or_else(|| {
                ServiceError::Internal(format!(
                    "申請対象の従業員が見つかりません: {}",
                    current.subject_id()
                ))
            })?;

        let classification = self.classify(&actor_id, &subject).await?;
        let expected = current.status();
        let now = self.deps.clock.now();

        // 2. 権限階層チェックと遷移の適用
        let (updated, action) =
            self.decide_transition(current, input.status, &classification, &actor_id, now)?;

        let updated = match input.comment {
            Some(comment) => updated.with_comment(Some(comment)),
            None => updated,
        };

        // 3. 条件付き更新でコミット（compare-and-set）
        self.deps
            .absence_repo
            .update_from_status(&updated, expected)
            .await
            .map_err(|e| {
                if e.as_conflict().is_some() {
                    ServiceError::Conflict(
                        "申請は既に更新されています。最新の状態を取得してから再試行してください。"
                            .to_string(),
                    )
                } else {
                    ServiceError::Database(e)
                }
            })?;

        // 4. 監査とビジネスイベント
        self.append_audit(&actor_id, action, &updated, now).await;
        log_business_event!(
            event.category = event::category::ABSENCE,
            event.action = Self::event_action(action),
            event.entity_type = event::entity_type::ABSENCE_REQUEST,
            event.entity_id = %updated.id(),
            event.actor_id = %actor_id,
            event.result = event::result::SUCCESS,
            status = %updated.status(),
            "不在申請のステータスを更新"
        );

        Ok(updated)
    }

    /// 要求ステータスごとの権限チェックと遷移適用
    ///
    /// 戻り値は遷移後の申請と、対応する監査アクション。
    fn decide_transition(
        &self,
        current: AbsenceRequest,
        requested: AbsenceStatus,
        classification: &ActorClassification,
        actor_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(AbsenceRequest, AuditAction), ServiceError> {
        match requested {
            AbsenceStatus::Level1Approved => {
                Self::require(
                    classification.may_decide_level1(),
                    "一次承認には上長または人事・管理者の権限が必要です",
                )?;
                Ok((
                    current.approve_level1(actor_id.clone(), now)?,
                    AuditAction::Level1Approve,
                ))
            }
            AbsenceStatus::Level1Rejected => {
                Self::require(
                    classification.may_decide_level1(),
                    "一次却下には上長または人事・管理者の権限が必要です",
                )?;
                Ok((
                    current.reject_level1(actor_id.clone(), now)?,
                    AuditAction::Level1Reject,
                ))
            }
            // level1_approved のまま残った行の整合処理
            AbsenceStatus::PendingLevel2 => {
                Self::require(
                    classification.may_decide_level1(),
                    "二次承認待ちへの遷移には上長または人事・管理者の権限が必要です",
                )?;
                Ok((
                    current.advanced_to_level2(actor_id.clone(), now)?,
                    AuditAction::Level1Approve,
                ))
            }
            AbsenceStatus::Level2Approved => {
                Self::require(
                    classification.may_decide_level2(),
                    "二次承認には人事・管理者の権限が必要です",
                )?;
                Ok((
                    current.approve_level2(actor_id.clone(), now)?,
                    AuditAction::Level2Approve,
                ))
            }
            AbsenceStatus::Level2Rejected => {
                Self::require(
                    classification.may_decide_level2(),
                    "二次却下には人事・管理者の権限が必要です",
                )?;
                Ok((
                    current.reject_level2(actor_id.clone(), now)?,
                    AuditAction::Level2Reject,
                ))
            }
            AbsenceStatus::Applied => {
                Self::require(
                    classification.may_decide_level2(),
                    "適用には人事・管理者の権限が必要です",
                )?;
                Ok((
                    current.applied(actor_id.clone(), now)?,
                    AuditAction::Apply,
                ))
            }
            AbsenceStatus::Cancelled => {
                let allowed = classification.is_hr_or_admin
                    || (self.deps.policy.allow_owner_cancel && classification.is_self);
                Self::require(allowed, "取消には人事・管理者の権限が必要です")?;
                Ok((
                    current.cancelled(actor_id.clone(), now)?,
                    AuditAction::Cancel,
                ))
            }
            AbsenceStatus::PendingLevel1 => {
                // 一次承認待ちへ戻す遷移は存在しない（再申請は未サポート）
                let from: &str = current.status().into();
                Err(ServiceError::InvalidTransition(format!(
                    "{from} → pending_level1"
                )))
            }
        }
    }

    /// 不在申請の詳細を取得する
    ///
    /// 人事・管理者は全件、それ以外は本人または上長である場合のみ閲覧できる。
    pub async fn get_absence(
        &self,
        id: AbsenceRequestId,
        actor_id: UserId,
    ) -> Result<AbsenceRequest, ServiceError> {
        let request = self
            .deps
            .absence_repo
            .find_by_id(&id, &actor_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("不在申請が見つかりません: {id}")))?;

        self.authorize_read(&actor_id, request.subject_id()).await?;
        Ok(request)
    }

    /// 対象者ごとの不在申請一覧を取得する（履歴表示用）
    pub async fn list_by_subject(
        &self,
        subject_id: EmployeeId,
        actor_id: UserId,
    ) -> Result<Vec<AbsenceRequest>, ServiceError> {
        self.authorize_read(&actor_id, &subject_id).await?;
        Ok(self
            .deps
            .absence_repo
            .find_by_subject(&subject_id, &actor_id)
            .await?)
    }

    /// 閲覧認可を確認する
    async fn authorize_read(
        &self,
        actor_id: &UserId,
        subject_id: &EmployeeId,
    ) -> Result<(), ServiceError> {
        let subject = self
            .deps
            .employee_repo
            .find_by_id(subject_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("対象の従業員が見つかりません: {subject_id}"))
            })?;

        let classification = self.classify(actor_id, &subject).await?;
        Self::require(
            classification.may_read(),
            "この従業員の不在申請を閲覧する権限がありません",
        )
    }

    fn require(allowed: bool, message: &str) -> Result<(), ServiceError> {
        if allowed {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(message.to_string()))
        }
    }

    /// 監査シンクへ追記する（ベストエフォート）
    ///
    /// 失敗は警告ログに記録して握りつぶす。主処理には伝播させない。
    async fn append_audit(
        &self,
        actor_id: &UserId,
        action: AuditAction,
        request: &AbsenceRequest,
        now: DateTime<Utc>,
    ) {
        let entry = AuditEntry::for_absence_request(
            actor_id.clone(),
            action,
            request.id().to_string(),
            Some(serde_json::json!({
                "status": request.status(),
                "subject_id": request.subject_id(),
                "scheduling_impact": request.scheduling_impact(),
            })),
            now,
        );

        if let Err(e) = self.deps.audit_repo.append(&entry).await {
            tracing::warn!("監査シンクへの書き込みに失敗しました（処理は継続）: {}", e);
        }
    }

    fn event_action(action: AuditAction) -> &'static str {
        match action {
            AuditAction::Create => event::action::ABSENCE_CREATED,
            AuditAction::Level1Approve => event::action::ABSENCE_LEVEL1_APPROVED,
            AuditAction::Level1Reject => event::action::ABSENCE_LEVEL1_REJECTED,
            AuditAction::Level2Approve => event::action::ABSENCE_LEVEL2_APPROVED,
            AuditAction::Level2Reject => event::action::ABSENCE_LEVEL2_REJECTED,
            AuditAction::Apply => event::action::ABSENCE_APPLIED,
            AuditAction::Cancel => event::action::ABSENCE_CANCELLED,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, Utc};
    use leaveflow_domain::{
        authority::HrTierRoles, clock::FixedClock, employee::Employee,
    };
    use leaveflow_infra::mock::{
        MockAbsenceRequestRepository, MockAuditLogRepository, MockEmployeeRepository,
        MockRoleRepository,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    /// テスト用の組織: 人事、上長、本人（アカウントあり）、
    /// アカウントなしの部下、無関係な操作者
    struct Org {
        hr: UserId,
        manager_user: UserId,
        subject_user: UserId,
        outsider: UserId,
        subject: Employee,
        accountless: Employee,
    }

    fn setup_org(employee_repo: &MockEmployeeRepository, role_repo: &MockRoleRepository) -> Org {
        let hr = UserId::new();
        let manager_user = UserId::new();
        let subject_user = UserId::new();
        let outsider = UserId::new();

        role_repo.grant(&hr, "rh");

        let manager = Employee::new(
            leaveflow_domain::employee::EmployeeId::new(),
            "上長".to_string(),
            Some(manager_user.clone()),
            None,
            None,
            now(),
        );
        let subject = Employee::new(
            leaveflow_domain::employee::EmployeeId::new(),
            "本人".to_string(),
            Some(subject_user.clone()),
            Some(manager.id().clone()),
            None,
            now(),
        );
        let accountless = Employee::new(
            leaveflow_domain::employee::EmployeeId::new(),
            "外部協力者".to_string(),
            None,
            Some(manager.id().clone()),
            None,
            now(),
        );

        employee_repo.add(manager);
        employee_repo.add(subject.clone());
        employee_repo.add(accountless.clone());

        Org {
            hr,
            manager_user,
            subject_user,
            outsider,
            subject,
            accountless,
        }
    }

    struct TestContext {
        sut: AbsenceUseCaseImpl,
        absence_repo: MockAbsenceRequestRepository,
        audit_repo: MockAuditLogRepository,
        org: Org,
    }

    fn build_context() -> TestContext {
        build_context_with(CancellationPolicy::default(), MockAuditLogRepository::new())
    }

    fn build_context_with(
        policy: CancellationPolicy,
        audit_repo: MockAuditLogRepository,
    ) -> TestContext {
        let absence_repo = MockAbsenceRequestRepository::new();
        let employee_repo = MockEmployeeRepository::new();
        let role_repo = MockRoleRepository::new();
        let org = setup_org(&employee_repo, &role_repo);

        let sut = AbsenceUseCaseImpl::new(AbsenceWorkflowDeps {
            absence_repo: std::sync::Arc::new(absence_repo.clone()),
            employee_repo: std::sync::Arc::new(employee_repo),
            role_repo: std::sync::Arc::new(role_repo),
            audit_repo: std::sync::Arc::new(audit_repo.clone()),
            clock: std::sync::Arc::new(FixedClock::new(now())),
            hr_roles: HrTierRoles::default(),
            policy,
        });

        TestContext {
            sut,
            absence_repo,
            audit_repo,
            org,
        }
    }

    fn create_input(subject_id: &leaveflow_domain::employee::EmployeeId) -> CreateAbsenceInput {
        CreateAbsenceInput {
            subject_id: subject_id.clone(),
            kind: AbsenceKind::PaidLeave,
            start_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 4).unwrap(),
            duration_hours: None,
            requested_status: None,
            scheduling_impact: None,
            comment: None,
        }
    }

    fn status_input(status: AbsenceStatus) -> UpdateStatusInput {
        UpdateStatusInput {
            status,
            comment: None,
        }
    }

    // ===== 作成と自動承認ショートカット =====

    #[tokio::test]
    async fn test_本人による作成は一次承認待ちになる() {
        let ctx = build_context();

        let request = ctx
            .sut
            .create_absence(create_input(ctx.org.subject.id()), ctx.org.subject_user.clone())
            .await
            .unwrap();

        assert_eq!(request.status(), AbsenceStatus::PendingLevel1);
        assert_eq!(request.level1_validation(), None);
        assert_eq!(request.level2_validation(), None);
        assert!(!request.scheduling_impact());
        // 監査レコードが 1 件追記されている
        let entries = ctx.audit_repo.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Create);
    }

    #[tokio::test]
    async fn test_人事による第三者への作成は二次承認済みになる() {
        let ctx = build_context();

        let request = ctx
            .sut
            .create_absence(create_input(ctx.org.subject.id()), ctx.org.hr.clone())
            .await
            .unwrap();

        assert_eq!(request.status(), AbsenceStatus::Level2Approved);
        assert_eq!(
            request.level1_validation().map(|v| &v.validated_by),
            Some(&ctx.org.hr)
        );
        assert_eq!(
            request.level2_validation().map(|v| &v.validated_by),
            Some(&ctx.org.hr)
        );
        assert_eq!(request.level1_validation().map(|v| v.validated_at), Some(now()));
        assert_eq!(request.level2_validation().map(|v| v.validated_at), Some(now()));
        assert!(request.scheduling_impact());
    }

    #[tokio::test]
    async fn test_人事による作成で計画影響の明示的な無効化が尊重される() {
        let ctx = build_context();

        let input = CreateAbsenceInput {
            scheduling_impact: Some(false),
            ..create_input(ctx.org.subject.id())
        };
        let request = ctx
            .sut
            .create_absence(input, ctx.org.hr.clone())
            .await
            .unwrap();

        assert_eq!(request.status(), AbsenceStatus::Level2Approved);
        assert!(!request.scheduling_impact());
    }

    #[tokio::test]
    async fn test_人事による自分自身への作成はショートカットされない() {
        let ctx = build_context();
        // 人事自身の従業員行を登録する
        let employee_repo = MockEmployeeRepository::new();
        let role_repo = MockRoleRepository::new();
        role_repo.grant(&ctx.org.hr, "rh");
        let hr_employee = Employee::new(
            leaveflow_domain::employee::EmployeeId::new(),
            "人事担当".to_string(),
            Some(ctx.org.hr.clone()),
            None,
            None,
            now(),
        );
        employee_repo.add(hr_employee.clone());

        let sut = AbsenceUseCaseImpl::new(AbsenceWorkflowDeps {
            absence_repo: std::sync::Arc::new(MockAbsenceRequestRepository::new()),
            employee_repo: std::sync::Arc::new(employee_repo),
            role_repo: std::sync::Arc::new(role_repo),
            audit_repo: std::sync::Arc::new(MockAuditLogRepository::new()),
            clock: std::sync::Arc::new(FixedClock::new(now())),
            hr_roles: HrTierRoles::default(),
            policy: CancellationPolicy::default(),
        });

        let request = sut
            .create_absence(create_input(hr_employee.id()), ctx.org.hr.clone())
            .await
            .unwrap();

        // 本人への申請であるため、委任ショートカットは適用されない
        assert_eq!(request.status(), AbsenceStatus::PendingLevel1);
        assert_eq!(request.level1_validation(), None);
    }

    #[tokio::test]
    async fn test_上長によるアカウントなし部下への作成は二次承認待ちになる() {
        let ctx = build_context();

        let request = ctx
            .sut
            .create_absence(
                create_input(ctx.org.accountless.id()),
                ctx.org.manager_user.clone(),
            )
            .await
            .unwrap();

        assert_eq!(request.status(), AbsenceStatus::PendingLevel2);
        assert_eq!(
            request.level1_validation().map(|v| &v.validated_by),
            Some(&ctx.org.manager_user)
        );
        assert_eq!(request.level1_validation().map(|v| v.validated_at), Some(now()));
        assert_eq!(request.level2_validation(), None);
    }

    #[tokio::test]
    async fn test_上長によるアカウントあり部下への作成は一次承認待ちになる() {
        let ctx = build_context();

        let request = ctx
            .sut
            .create_absence(
                create_input(ctx.org.subject.id()),
                ctx.org.manager_user.clone(),
            )
            .await
            .unwrap();

        assert_eq!(request.status(), AbsenceStatus::PendingLevel1);
        assert_eq!(request.level1_validation(), None);
    }

    #[tokio::test]
    async fn test_無関係な操作者による作成は拒否され何も保存されない() {
        let ctx = build_context();

        let result = ctx
            .sut
            .create_absence(create_input(ctx.org.subject.id()), ctx.org.outsider.clone())
            .await;

        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
        assert!(ctx.absence_repo.is_empty());
        assert!(ctx.audit_repo.entries().is_empty());
    }

    #[tokio::test]
    async fn test_不正な期間はストア書き込み前に拒否される() {
        let ctx = build_context();

        let input = CreateAbsenceInput {
            start_date: NaiveDate::from_ymd_opt(2025, 7, 4).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            ..create_input(ctx.org.subject.id())
        };
        let result = ctx.sut.create_absence(input, ctx.org.subject_user.clone()).await;

        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
        assert!(ctx.absence_repo.is_empty());
    }

    #[tokio::test]
    async fn test_存在しない対象者への作成は404になる() {
        let ctx = build_context();

        let result = ctx
            .sut
            .create_absence(
                create_input(&leaveflow_domain::employee::EmployeeId::new()),
                ctx.org.hr.clone(),
            )
            .await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_既定以外の初期ステータスは人事のみ指定できる() {
        let ctx = build_context();

        // 上長による明示指定は拒否される
        let input = CreateAbsenceInput {
            requested_status: Some(AbsenceStatus::Level2Approved),
            ..create_input(ctx.org.subject.id())
        };
        let result = ctx
            .sut
            .create_absence(input, ctx.org.manager_user.clone())
            .await;
        assert!(matches!(result, Err(ServiceError::Forbidden(_))));

        // 人事は二次承認待ちを明示指定できる
        let input = CreateAbsenceInput {
            requested_status: Some(AbsenceStatus::PendingLevel2),
            ..create_input(ctx.org.subject.id())
        };
        let request = ctx.sut.create_absence(input, ctx.org.hr.clone()).await.unwrap();
        assert_eq!(request.status(), AbsenceStatus::PendingLevel2);
        assert_eq!(
            request.level1_validation().map(|v| &v.validated_by),
            Some(&ctx.org.hr)
        );
    }

    #[tokio::test]
    async fn test_作成時に終了状態は指定できない() {
        let ctx = build_context();

        let input = CreateAbsenceInput {
            requested_status: Some(AbsenceStatus::Cancelled),
            ..create_input(ctx.org.subject.id())
        };
        let result = ctx.sut.create_absence(input, ctx.org.hr.clone()).await;

        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
    }

    // ===== ステータス更新 =====

    /// 本人が作成した一次承認待ちの申請を準備する
    async fn pending_request(ctx: &TestContext) -> AbsenceRequest {
        ctx.sut
            .create_absence(create_input(ctx.org.subject.id()), ctx.org.subject_user.clone())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_上長による一次承認で二次承認待ちへ進む() {
        let ctx = build_context();
        let request = pending_request(&ctx).await;

        let updated = ctx
            .sut
            .update_status(
                request.id().clone(),
                status_input(AbsenceStatus::Level1Approved),
                ctx.org.manager_user.clone(),
            )
            .await
            .unwrap();

        assert_eq!(updated.status(), AbsenceStatus::PendingLevel2);
        assert_eq!(
            updated.level1_validation().map(|v| &v.validated_by),
            Some(&ctx.org.manager_user)
        );
        assert_eq!(updated.level2_validation(), None);
    }

    #[tokio::test]
    async fn test_人事も一次承認を実行できる() {
        let ctx = build_context();
        let request = pending_request(&ctx).await;

        let updated = ctx
            .sut
            .update_status(
                request.id().clone(),
                status_input(AbsenceStatus::Level1Approved),
                ctx.org.hr.clone(),
            )
            .await
            .unwrap();

        assert_eq!(updated.status(), AbsenceStatus::PendingLevel2);
    }

    #[tokio::test]
    async fn test_本人は一次承認できない() {
        let ctx = build_context();
        let request = pending_request(&ctx).await;

        let result = ctx
            .sut
            .update_status(
                request.id().clone(),
                status_input(AbsenceStatus::Level1Approved),
                ctx.org.subject_user.clone(),
            )
            .await;

        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_上長による二次承認は拒否されステータスは変わらない() {
        let ctx = build_context();
        let request = pending_request(&ctx).await;
        ctx.sut
            .update_status(
                request.id().clone(),
                status_input(AbsenceStatus::Level1Approved),
                ctx.org.manager_user.clone(),
            )
            .await
            .unwrap();

        let result = ctx
            .sut
            .update_status(
                request.id().clone(),
                status_input(AbsenceStatus::Level2Approved),
                ctx.org.manager_user.clone(),
            )
            .await;

        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
        let stored = ctx
            .absence_repo
            .find_by_id(request.id(), &ctx.org.hr)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status(), AbsenceStatus::PendingLevel2);
    }

    #[tokio::test]
    async fn test_エンドツーエンドの承認フロー() {
        let ctx = build_context();

        // 本人が作成 → pending_level1
        let request = pending_request(&ctx).await;
        assert_eq!(request.status(), AbsenceStatus::PendingLevel1);
        assert!(!request.scheduling_impact());

        // 上長が一次承認 → pending_level2
        let request = ctx
            .sut
            .update_status(
                request.id().clone(),
                status_input(AbsenceStatus::Level1Approved),
                ctx.org.manager_user.clone(),
            )
            .await
            .unwrap();
        assert_eq!(request.status(), AbsenceStatus::PendingLevel2);
        assert_eq!(
            request.level1_validation().map(|v| &v.validated_by),
            Some(&ctx.org.manager_user)
        );
        assert!(!request.scheduling_impact());

        // 人事が二次承認 → level2_approved、計画影響あり
        let request = ctx
            .sut
            .update_status(
                request.id().clone(),
                status_input(AbsenceStatus::Level2Approved),
                ctx.org.hr.clone(),
            )
            .await
            .unwrap();
        assert_eq!(request.status(), AbsenceStatus::Level2Approved);
        assert_eq!(
            request.level2_validation().map(|v| &v.validated_by),
            Some(&ctx.org.hr)
        );
        assert!(request.scheduling_impact());

        // 人事が適用 → applied、計画影響は維持
        let request = ctx
            .sut
            .update_status(
                request.id().clone(),
                status_input(AbsenceStatus::Applied),
                ctx.org.hr.clone(),
            )
            .await
            .unwrap();
        assert_eq!(request.status(), AbsenceStatus::Applied);
        assert!(request.scheduling_impact());

        // 監査レコード: 作成 + 3 遷移
        assert_eq!(ctx.audit_repo.entries().len(), 4);
    }

    #[tokio::test]
    async fn test_終了状態からの遷移はinvalid_transitionになる() {
        let ctx = build_context();
        let request = pending_request(&ctx).await;
        ctx.sut
            .update_status(
                request.id().clone(),
                status_input(AbsenceStatus::Level1Rejected),
                ctx.org.manager_user.clone(),
            )
            .await
            .unwrap();

        let result = ctx
            .sut
            .update_status(
                request.id().clone(),
                status_input(AbsenceStatus::Level1Approved),
                ctx.org.manager_user.clone(),
            )
            .await;

        assert!(matches!(result, Err(ServiceError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_一次承認待ちへ戻す遷移は存在しない() {
        let ctx = build_context();
        let request = pending_request(&ctx).await;
        ctx.sut
            .update_status(
                request.id().clone(),
                status_input(AbsenceStatus::Level1Approved),
                ctx.org.manager_user.clone(),
            )
            .await
            .unwrap();

        let result = ctx
            .sut
            .update_status(
                request.id().clone(),
                status_input(AbsenceStatus::PendingLevel1),
                ctx.org.hr.clone(),
            )
            .await;

        assert!(matches!(result, Err(ServiceError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_人事による取消で計画影響が偽になる() {
        let ctx = build_context();
        // 人事の代理作成で二次承認済み（計画影響あり）にする
        let request = ctx
            .sut
            .create_absence(create_input(ctx.org.subject.id()), ctx.org.hr.clone())
            .await
            .unwrap();
        assert!(request.scheduling_impact());

        let cancelled = ctx
            .sut
            .update_status(
                request.id().clone(),
                status_input(AbsenceStatus::Cancelled),
                ctx.org.hr.clone(),
            )
            .await
            .unwrap();

        assert_eq!(cancelled.status(), AbsenceStatus::Cancelled);
        assert!(!cancelled.scheduling_impact());
    }

    #[tokio::test]
    async fn test_既定ポリシーでは本人は取消できない() {
        let ctx = build_context();
        let request = pending_request(&ctx).await;

        let result = ctx
            .sut
            .update_status(
                request.id().clone(),
                status_input(AbsenceStatus::Cancelled),
                ctx.org.subject_user.clone(),
            )
            .await;

        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_ポリシー許可時は本人が取消できる() {
        let ctx = build_context_with(
            CancellationPolicy {
                allow_owner_cancel: true,
            },
            MockAuditLogRepository::new(),
        );
        let request = pending_request(&ctx).await;

        let cancelled = ctx
            .sut
            .update_status(
                request.id().clone(),
                status_input(AbsenceStatus::Cancelled),
                ctx.org.subject_user.clone(),
            )
            .await
            .unwrap();

        assert_eq!(cancelled.status(), AbsenceStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_ポリシー許可でも上長は取消できない() {
        let ctx = build_context_with(
            CancellationPolicy {
                allow_owner_cancel: true,
            },
            MockAuditLogRepository::new(),
        );
        let request = pending_request(&ctx).await;

        let result = ctx
            .sut
            .update_status(
                request.id().clone(),
                status_input(AbsenceStatus::Cancelled),
                ctx.org.manager_user.clone(),
            )
            .await;

        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_存在しない申請の更新は404になる() {
        let ctx = build_context();

        let result = ctx
            .sut
            .update_status(
                AbsenceRequestId::new(),
                status_input(AbsenceStatus::Level1Approved),
                ctx.org.hr.clone(),
            )
            .await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_コメントの差し替えはステータス更新に同乗できる() {
        let ctx = build_context();
        let request = pending_request(&ctx).await;

        let updated = ctx
            .sut
            .update_status(
                request.id().clone(),
                UpdateStatusInput {
                    status:  AbsenceStatus::Level1Approved,
                    comment: Some("承認済み。代理調整不要".to_string()),
                },
                ctx.org.manager_user.clone(),
            )
            .await
            .unwrap();

        assert_eq!(updated.comment(), Some("承認済み。代理調整不要"));
    }

    // ===== 監査シンク =====

    #[tokio::test]
    async fn test_監査シンクの失敗は主処理を妨げない() {
        let ctx = build_context_with(
            CancellationPolicy::default(),
            MockAuditLogRepository::failing(),
        );

        let result = ctx
            .sut
            .create_absence(create_input(ctx.org.subject.id()), ctx.org.subject_user.clone())
            .await;

        assert!(result.is_ok());
        assert_eq!(ctx.absence_repo.len(), 1);
    }

    // ===== 閲覧認可 =====

    #[tokio::test]
    async fn test_閲覧は本人と上長と人事のみ許可される() {
        let ctx = build_context();
        let request = pending_request(&ctx).await;

        // 本人・上長・人事は閲覧できる
        for actor in [&ctx.org.subject_user, &ctx.org.manager_user, &ctx.org.hr] {
            let result = ctx.sut.get_absence(request.id().clone(), actor.clone()).await;
            assert!(result.is_ok());
        }

        // 無関係な操作者は閲覧できない
        let result = ctx
            .sut
            .get_absence(request.id().clone(), ctx.org.outsider.clone())
            .await;
        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_対象者ごとの一覧は上長が閲覧できる() {
        let ctx = build_context();
        pending_request(&ctx).await;

        let list = ctx
            .sut
            .list_by_subject(ctx.org.subject.id().clone(), ctx.org.manager_user.clone())
            .await
            .unwrap();

        assert_eq!(list.len(), 1);
    }

    #[tokio::test]
    async fn test_無関係な操作者は一覧を閲覧できない() {
        let ctx = build_context();
        pending_request(&ctx).await;

        let result = ctx
            .sut
            .list_by_subject(ctx.org.subject.id().clone(), ctx.org.outsider.clone())
            .await;

        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    }
}
