//! # 監査証跡
//!
//! 承認ワークフローの意味のある遷移ごとに 1 件記録される監査レコード。
//!
//! ## 設計方針
//!
//! - **不変性**: 監査レコードは一度作成されたら変更されない
//! - **ベストエフォート**: 監査シンクへの書き込み失敗は主処理を妨げない
//!   （呼び出し側でログに記録して握りつぶす）
//!
//! ## アクション体系
//!
//! アクションは `リソース.操作` 形式の文字列に変換される:
//!
//! | バリアント | 文字列表現 |
//! |-----------|-----------|
//! | `Create` | `absence.create` |
//! | `Level1Approve` | `absence.level1_approve` |
//! | `Level1Reject` | `absence.level1_reject` |
//! | `Level2Approve` | `absence.level2_approve` |
//! | `Level2Reject` | `absence.level2_reject` |
//! | `Apply` | `absence.apply` |
//! | `Cancel` | `absence.cancel` |

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::user::UserId;

/// 監査対象エンティティ種別（このコアでは不在申請のみ）
pub const AUDIT_ENTITY_ABSENCE_REQUEST: &str = "absence_request";

/// 監査対象のアクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Level1Approve,
    Level1Reject,
    Level2Approve,
    Level2Reject,
    Apply,
    Cancel,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "absence.create",
            Self::Level1Approve => "absence.level1_approve",
            Self::Level1Reject => "absence.level1_reject",
            Self::Level2Approve => "absence.level2_approve",
            Self::Level2Reject => "absence.level2_reject",
            Self::Apply => "absence.apply",
            Self::Cancel => "absence.cancel",
        };
        write!(f, "{s}")
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "absence.create" => Ok(Self::Create),
            "absence.level1_approve" => Ok(Self::Level1Approve),
            "absence.level1_reject" => Ok(Self::Level1Reject),
            "absence.level2_approve" => Ok(Self::Level2Approve),
            "absence.level2_reject" => Ok(Self::Level2Reject),
            "absence.apply" => Ok(Self::Apply),
            "absence.cancel" => Ok(Self::Cancel),
            _ => Err(format!("不明な監査アクション: {s}")),
        }
    }
}

/// 監査レコード
///
/// 意味のある遷移ごとに 1 件、監査シンクへ追記される不変レコード。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: UserId,
    pub action: AuditAction,
    pub entity_type: &'static str,
    pub entity_id: String,
    pub detail: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// 不在申請に対する監査レコードを作成する
    ///
    /// タイムスタンプは Clock 経由で呼び出し元から注入する。
    pub fn for_absence_request(
        actor_id: UserId,
        action: AuditAction,
        entity_id: impl Into<String>,
        detail: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            actor_id,
            action,
            entity_type: AUDIT_ENTITY_ABSENCE_REQUEST,
            entity_id: entity_id.into(),
            detail,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_監査アクションはドット区切り文字列に変換される() {
        assert_eq!(AuditAction::Create.to_string(), "absence.create");
        assert_eq!(
            AuditAction::Level1Approve.to_string(),
            "absence.level1_approve"
        );
        assert_eq!(
            AuditAction::Level2Reject.to_string(),
            "absence.level2_reject"
        );
        assert_eq!(AuditAction::Apply.to_string(), "absence.apply");
        assert_eq!(AuditAction::Cancel.to_string(), "absence.cancel");
    }

    #[test]
    fn test_監査アクションは文字列からパースできる() {
        assert_eq!(
            "absence.create".parse::<AuditAction>().unwrap(),
            AuditAction::Create
        );
        assert_eq!(
            "absence.cancel".parse::<AuditAction>().unwrap(),
            AuditAction::Cancel
        );
    }

    #[test]
    fn test_監査アクションの不明な文字列はエラーになる() {
        assert!("absence.unknown".parse::<AuditAction>().is_err());
    }

    #[test]
    fn test_不在申請の監査レコードはエンティティ種別が固定される() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let entry = AuditEntry::for_absence_request(
            UserId::new(),
            AuditAction::Create,
            "abs-123",
            Some(serde_json::json!({"status": "pending_level1"})),
            now,
        );

        assert_eq!(entry.entity_type, AUDIT_ENTITY_ABSENCE_REQUEST);
        assert_eq!(entry.entity_id, "abs-123");
        assert_eq!(entry.created_at, now);
    }
}
