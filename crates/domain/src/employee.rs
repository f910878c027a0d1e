//! # 従業員（申請対象者）
//!
//! 不在申請の対象となる従業員エンティティを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 備考 |
//! |---|------------|------|
//! | [`Employee`] | 従業員 | ログインアカウントを持たない「記録のみの協力者」も含む |
//! | 主管理者 (`manager_id`) | 直属上長（N+1） | 一次承認の決裁権限を持つ |
//! | 副管理者 (`secondary_manager_id`) | 活動上の管理者 | 主管理者と同等の決裁権限を持つ |
//!
//! ## 設計方針
//!
//! - **アカウント任意**: `user_id` が None の従業員はログイン不可だが、
//!   上長・人事による代理申請の対象にはなる
//! - **不変性**: フィールドの変更は `with_*` メソッド経由で新インスタンスを返す

use chrono::{DateTime, Utc};

use crate::user::UserId;

define_uuid_id! {
    /// 従業員 ID（一意識別子）
    pub struct EmployeeId;
}

/// 従業員エンティティ
///
/// 不在申請の対象者。ログインアイデンティティ（`user_id`）との紐づけは
/// 任意で、紐づかない従業員は自己申請できない。
///
/// # 不変条件
///
/// - `manager_id` / `secondary_manager_id` は自分自身を指さない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    id: EmployeeId,
    name: String,
    user_id: Option<UserId>,
    manager_id: Option<EmployeeId>,
    secondary_manager_id: Option<EmployeeId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Employee {
    /// 新しい従業員を作成する
    pub fn new(
        id: EmployeeId,
        name: String,
        user_id: Option<UserId>,
        manager_id: Option<EmployeeId>,
        secondary_manager_id: Option<EmployeeId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            user_id,
            manager_id,
            secondary_manager_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// 既存のデータから従業員を復元する（データベースから取得時）
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: EmployeeId,
        name: String,
        user_id: Option<UserId>,
        manager_id: Option<EmployeeId>,
        secondary_manager_id: Option<EmployeeId>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            user_id,
            manager_id,
            secondary_manager_id,
            created_at,
            updated_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &EmployeeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn manager_id(&self) -> Option<&EmployeeId> {
        self.manager_id.as_ref()
    }

    pub fn secondary_manager_id(&self) -> Option<&EmployeeId> {
        self.secondary_manager_id.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // ビジネスロジックメソッド

    /// ログインアカウントを持つか判定する
    ///
    /// アカウントを持たない従業員への代理申請は、上長ショートカットの
    /// 前提条件になる。
    pub fn has_account(&self) -> bool {
        self.user_id.is_some()
    }

    /// 指定されたユーザーがこの従業員本人か判定する
    ///
    /// アカウントを持たない従業員の場合は常に false。
    pub fn is_linked_to(&self, user_id: &UserId) -> bool {
        self.user_id.as_ref() == Some(user_id)
    }

    /// 管理者（主・副）の従業員 ID を列挙する
    ///
    /// 両方とも同等の一次決裁権限を持つ。
    pub fn manager_ids(&self) -> Vec<&EmployeeId> {
        self.manager_id
            .iter()
            .chain(self.secondary_manager_id.iter())
            .collect()
    }
}
