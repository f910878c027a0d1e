//! # 権限階層分類
//!
//! アクター（操作者）と申請対象者の関係を、承認ワークフローが参照する
//! 閉じた階層に分類する。
//!
//! ## 背景
//!
//! ロール名の文字列照合が呼び出し箇所ごとに散在すると、箇所間で判定が
//! ずれていく。分類はここに集約し、呼び出し側は正規化済みの
//! [`ActorClassification`] だけを扱う。
//!
//! ## 階層
//!
//! | 階層 | 意味 | 一次承認 | 二次承認 |
//! |------|------|---------|---------|
//! | `HrOrAdmin` | 人事・管理者相当のロールを持つ | 可 | 可 |
//! | `Manager` | 対象者の上長（主・副いずれか） | 可 | 不可 |
//! | `Subject` | 対象者本人 | 不可 | 不可 |
//! | `None` | 無関係 | 不可 | 不可 |
//!
//! 複数の階層に同時に該当する場合、人事・管理者階層が優先される。

use serde::{Deserialize, Serialize};

/// 人事・管理者相当として扱うロール名の集合（設定値）
///
/// 単一のロール名への固定照合ではなく、組織上この承認ワークフローに対して
/// 同等の権限を付与された複数のロール（管理者、人事、研修管理、
/// 線量管理）を設定として保持する。照合は大文字小文字を区別しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HrTierRoles(Vec<String>);

impl HrTierRoles {
    /// ロール名の集合から作成する
    pub fn new(labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(
            labels
                .into_iter()
                .map(|label| label.into().to_lowercase())
                .collect(),
        )
    }

    /// 単一のロール名が人事・管理者相当か判定する（大文字小文字を区別しない）
    pub fn matches(&self, label: &str) -> bool {
        let normalized = label.to_lowercase();
        self.0.iter().any(|entry| *entry == normalized)
    }

    /// ロール名の集合のいずれかが人事・管理者相当か判定する
    pub fn matches_any<S: AsRef<str>>(&self, labels: &[S]) -> bool {
        labels.iter().any(|label| self.matches(label.as_ref()))
    }
}

impl Default for HrTierRoles {
    /// 既定のロール集合
    ///
    /// 管理者、人事、研修管理、線量管理の各ロールが
    /// このワークフローに対して同等の権限を持つ。
    fn default() -> Self {
        Self::new([
            "admin",
            "administrateur",
            "rh",
            "responsable_formation",
            "responsable_dosimetrie",
        ])
    }
}

/// 権限階層（支配順）
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AuthorityTier {
    /// 人事・管理者相当
    HrOrAdmin,
    /// 対象者の上長
    Manager,
    /// 対象者本人
    Subject,
    /// 無関係
    None,
}

/// アクターと対象者の関係の分類結果
///
/// Identity & Role Resolver が返す正規化済みの値オブジェクト。
/// 呼び出し側が生のロール行や結合結果を見ることはない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorClassification {
    /// 人事・管理者相当のロールを持つか
    pub is_hr_or_admin: bool,
    /// 対象者の上長（主・副いずれか）か
    pub is_manager_of:  bool,
    /// 対象者本人か（対象者がアカウントを持たない場合は常に偽）
    pub is_self:        bool,
}

impl ActorClassification {
    pub fn new(is_hr_or_admin: bool, is_manager_of: bool, is_self: bool) -> Self {
        Self {
            is_hr_or_admin,
            is_manager_of,
            is_self,
        }
    }

    /// 支配的な階層を返す（人事・管理者 > 上長 > 本人 > 無関係）
    pub fn tier(&self) -> AuthorityTier {
        if self.is_hr_or_admin {
            AuthorityTier::HrOrAdmin
        } else if self.is_manager_of {
            AuthorityTier::Manager
        } else if self.is_self {
            AuthorityTier::Subject
        } else {
            AuthorityTier::None
        }
    }

    /// この対象者への申請作成が許可されるか
    ///
    /// 人事・管理者、上長、本人のいずれかであること。
    pub fn may_create(&self) -> bool {
        self.is_hr_or_admin || self.is_manager_of || self.is_self
    }

    /// この対象者の申請の閲覧が許可されるか
    ///
    /// 人事・管理者は全件、それ以外は本人または上長である場合のみ。
    pub fn may_read(&self) -> bool {
        self.is_hr_or_admin || self.is_manager_of || self.is_self
    }

    /// 一次決裁（承認・却下）が許可されるか
    pub fn may_decide_level1(&self) -> bool {
        self.is_hr_or_admin || self.is_manager_of
    }

    /// 二次決裁（承認・却下）および適用が許可されるか
    pub fn may_decide_level2(&self) -> bool {
        self.is_hr_or_admin
    }
}
