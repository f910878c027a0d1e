//! # Identity & Role Resolver
//!
//! 操作者と申請対象者の関係を正規化済みの [`ActorClassification`] に解決する。
//!
//! 判定に必要な読み取り（操作者のロール名、対象者の上長行）はここに集約し、
//! ワークフローエンジンは生のロール行や結合結果を見ない。

use leaveflow_domain::{authority::ActorClassification, employee::Employee, user::UserId};

use crate::{error::ServiceError, usecase::absence::AbsenceUseCaseImpl};

impl AbsenceUseCaseImpl {
    /// 操作者を対象者との関係で分類する
    ///
    /// - `is_hr_or_admin`: 操作者のロール名のいずれかが人事・管理者相当
    ///   （ロールを一つも持たない操作者は偽。エラーではない）
    /// - `is_manager_of`: 対象者の上長（主・副いずれか）のログイン
    ///   アイデンティティが操作者と一致
    /// - `is_self`: 対象者のログインアイデンティティが操作者と一致
    ///   （対象者がアカウントを持たない場合は常に偽）
    ///
    /// 読み取り専用で副作用はない。
    pub(crate) async fn classify(
        &self,
        actor_id: &UserId,
        subject: &Employee,
    ) -> Result<ActorClassification, ServiceError> {
        let labels = self.deps.role_repo.find_labels_by_user(actor_id).await?;
        let is_hr_or_admin = self.deps.hr_roles.matches_any(&labels);

        let is_self = subject.is_linked_to(actor_id);

        let mut is_manager_of = false;
        for manager_id in subject.manager_ids() {
            let Some(manager) = self.deps.employee_repo.find_by_id(manager_id).await? else {
                continue;
            };
            if manager.is_linked_to(actor_id) {
                is_manager_of = true;
                break;
            }
        }

        Ok(ActorClassification::new(
            is_hr_or_admin,
            is_manager_of,
            is_self,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Utc};
    use leaveflow_domain::{
        authority::HrTierRoles,
        clock::FixedClock,
        employee::{Employee, EmployeeId},
    };
    use leaveflow_infra::mock::{
        MockAbsenceRequestRepository, MockAuditLogRepository, MockEmployeeRepository,
        MockRoleRepository,
    };

    use super::*;
    use crate::usecase::{AbsenceWorkflowDeps, CancellationPolicy};

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn build_sut(
        employee_repo: &MockEmployeeRepository,
        role_repo: &MockRoleRepository,
    ) -> AbsenceUseCaseImpl {
        AbsenceUseCaseImpl::new(AbsenceWorkflowDeps {
            absence_repo:  Arc::new(MockAbsenceRequestRepository::new()),
            employee_repo: Arc::new(employee_repo.clone()),
            role_repo:     Arc::new(role_repo.clone()),
            audit_repo:    Arc::new(MockAuditLogRepository::new()),
            clock:         Arc::new(FixedClock::new(now())),
            hr_roles:      HrTierRoles::default(),
            policy:        CancellationPolicy::default(),
        })
    }

    #[tokio::test]
    async fn test_人事ロールを持つ操作者はhr階層に分類される() {
        let employee_repo = MockEmployeeRepository::new();
        let role_repo = MockRoleRepository::new();
        let hr = UserId::new();
        role_repo.grant(&hr, "RH");

        let subject = Employee::new(
            EmployeeId::new(),
            "対象者".to_string(),
            None,
            None,
            None,
            now(),
        );
        let sut = build_sut(&employee_repo, &role_repo);

        let classification = sut.classify(&hr, &subject).await.unwrap();

        assert!(classification.is_hr_or_admin);
        assert!(!classification.is_manager_of);
        assert!(!classification.is_self);
    }

    #[tokio::test]
    async fn test_副管理者も上長として分類される() {
        let employee_repo = MockEmployeeRepository::new();
        let role_repo = MockRoleRepository::new();

        let manager_user = UserId::new();
        let manager = Employee::new(
            EmployeeId::new(),
            "活動管理者".to_string(),
            Some(manager_user.clone()),
            None,
            None,
            now(),
        );
        let subject = Employee::new(
            EmployeeId::new(),
            "対象者".to_string(),
            None,
            None,
            Some(manager.id().clone()),
            now(),
        );
        employee_repo.add(manager);
        let sut = build_sut(&employee_repo, &role_repo);

        let classification = sut.classify(&manager_user, &subject).await.unwrap();

        assert!(classification.is_manager_of);
    }

    #[tokio::test]
    async fn test_ロールなしの操作者はエラーにならず無関係に分類される() {
        let employee_repo = MockEmployeeRepository::new();
        let role_repo = MockRoleRepository::new();
        let subject = Employee::new(
            EmployeeId::new(),
            "対象者".to_string(),
            None,
            None,
            None,
            now(),
        );
        let sut = build_sut(&employee_repo, &role_repo);

        let classification = sut.classify(&UserId::new(), &subject).await.unwrap();

        assert!(!classification.is_hr_or_admin);
        assert!(!classification.is_manager_of);
        assert!(!classification.is_self);
        assert!(!classification.may_create());
    }

    #[tokio::test]
    async fn test_アカウントなしの対象者への本人判定は常に偽() {
        let employee_repo = MockEmployeeRepository::new();
        let role_repo = MockRoleRepository::new();
        let subject = Employee::new(
            EmployeeId::new(),
            "外部協力者".to_string(),
            None,
            None,
            None,
            now(),
        );
        let sut = build_sut(&employee_repo, &role_repo);

        let classification = sut.classify(&UserId::new(), &subject).await.unwrap();

        assert!(!classification.is_self);
    }

    #[tokio::test]
    async fn test_上長行が欠損していても分類は継続する() {
        let employee_repo = MockEmployeeRepository::new();
        let role_repo = MockRoleRepository::new();
        // manager_id が指す従業員行を登録しない
        let subject = Employee::new(
            EmployeeId::new(),
            "対象者".to_string(),
            None,
            Some(EmployeeId::new()),
            None,
            now(),
        );
        let sut = build_sut(&employee_repo, &role_repo);

        let classification = sut.classify(&UserId::new(), &subject).await.unwrap();

        assert!(!classification.is_manager_of);
    }
}
