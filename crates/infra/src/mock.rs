//! # テスト用インメモリリポジトリ
//!
//! ユースケース層のテストで PostgreSQL 実装の代わりに使用する
//! インメモリ実装を提供する。
//!
//! ## 設計方針
//!
//! - **共有ステート**: `Arc<Mutex<_>>` でクローン間の状態を共有し、
//!   テスト側の検証（保存されたか等）を可能にする
//! - **同時更新の忠実な再現**: [`MockAbsenceRequestRepository`] の
//!   条件付き更新は本物と同じ compare-and-set 意味論を持つ。
//!   同一スナップショットから派生した 2 つの遷移のうち、
//!   後からコミットした方は Conflict を受け取る

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use leaveflow_domain::{
    absence::{AbsenceRequest, AbsenceRequestId, AbsenceStatus},
    audit::AuditEntry,
    employee::{Employee, EmployeeId},
    user::UserId,
};

use crate::{
    error::InfraError,
    repository::{
        AbsenceRequestRepository, AuditLogRepository, EmployeeRepository, RoleRepository,
    },
};

// =============================================================================
// MockAbsenceRequestRepository
// =============================================================================

/// 不在申請リポジトリのインメモリ実装
#[derive(Clone, Default)]
pub struct MockAbsenceRequestRepository {
    requests: Arc<Mutex<Vec<AbsenceRequest>>>,
}

impl MockAbsenceRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存されている申請の数を返す（テスト検証用）
    pub fn len(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// 申請が 1 件も保存されていないか（テスト検証用）
    pub fn is_empty(&self) -> bool {
        self.requests.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl AbsenceRequestRepository for MockAbsenceRequestRepository {
    async fn insert(&self, request: &AbsenceRequest) -> Result<(), InfraError> {
        let mut requests = self.requests.lock().unwrap();
        if requests.iter().any(|r| r.id() == request.id()) {
            return Err(InfraError::unexpected(format!(
                "申請は既に存在します: {}",
                request.id()
            )));
        }
        requests.push(request.clone());
        Ok(())
    }

    async fn update_from_status(
        &self,
        request: &AbsenceRequest,
        expected: AbsenceStatus,
    ) -> Result<(), InfraError> {
        let mut requests = self.requests.lock().unwrap();
        // 本物の UPDATE ... WHERE id AND status と同じ意味論:
        // 現在ステータスが前提と一致する行のみ置き換える
        match requests
            .iter()
            .position(|r| r.id() == request.id() && r.status() == expected)
        {
            Some(pos) => {
                requests[pos] = request.clone();
                Ok(())
            }
            None => Err(InfraError::conflict(
                "AbsenceRequest",
                request.id().to_string(),
            )),
        }
    }

    async fn find_by_id(
        &self,
        id: &AbsenceRequestId,
        _actor_id: &UserId,
    ) -> Result<Option<AbsenceRequest>, InfraError> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id() == id)
            .cloned())
    }

    async fn find_by_subject(
        &self,
        subject_id: &EmployeeId,
        _actor_id: &UserId,
    ) -> Result<Vec<AbsenceRequest>, InfraError> {
        let mut requests: Vec<AbsenceRequest> = self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.subject_id() == subject_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(requests)
    }
}

// =============================================================================
// MockEmployeeRepository
// =============================================================================

/// 従業員リポジトリのインメモリ実装
#[derive(Clone, Default)]
pub struct MockEmployeeRepository {
    employees: Arc<Mutex<Vec<Employee>>>,
}

impl MockEmployeeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 従業員を登録する（テストセットアップ用）
    pub fn add(&self, employee: Employee) {
        self.employees.lock().unwrap().push(employee);
    }
}

#[async_trait]
impl EmployeeRepository for MockEmployeeRepository {
    async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>, InfraError> {
        Ok(self
            .employees
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id() == id)
            .cloned())
    }
}

// =============================================================================
// MockRoleRepository
// =============================================================================

/// ロールリポジトリのインメモリ実装
#[derive(Clone, Default)]
pub struct MockRoleRepository {
    labels: Arc<Mutex<HashMap<UserId, Vec<String>>>>,
}

impl MockRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 操作者にロールを付与する（テストセットアップ用）
    pub fn grant(&self, user_id: &UserId, label: impl Into<String>) {
        self.labels
            .lock()
            .unwrap()
            .entry(user_id.clone())
            .or_default()
            .push(label.into());
    }
}

#[async_trait]
impl RoleRepository for MockRoleRepository {
    async fn find_labels_by_user(&self, user_id: &UserId) -> Result<Vec<String>, InfraError> {
        Ok(self
            .labels
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}

// =============================================================================
// MockAuditLogRepository
// =============================================================================

/// 監査ログリポジトリのインメモリ実装
///
/// `failing()` で常に失敗する実装を作成でき、監査シンク障害時に
/// 主処理が影響を受けないことを検証できる。
#[derive(Clone, Default)]
pub struct MockAuditLogRepository {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
    fail:    bool,
}

impl MockAuditLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常に追記に失敗する実装を作成する
    pub fn failing() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            fail:    true,
        }
    }

    /// 追記されたレコードのスナップショットを返す（テスト検証用）
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditLogRepository for MockAuditLogRepository {
    async fn append(&self, entry: &AuditEntry) -> Result<(), InfraError> {
        if self.fail {
            return Err(InfraError::unexpected(
                "監査シンクへの書き込みに失敗しました".to_string(),
            ));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}
