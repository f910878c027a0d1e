//! # 不在申請
//!
//! 不在申請エンティティと2段階承認（N+1 承認 → 人事承認）の状態機械を管理する。
//!
//! ## 概念モデル
//!
//! - **AbsenceRequest**: 不在申請（有給・病欠・研修・外部派遣など）
//! - **Period**: 不在期間（開始日・終了日・任意の時間数）
//! - **AbsenceStatus**: 承認ワークフローのステータス
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use chrono::NaiveDate;
//! use leaveflow_domain::{
//!     absence::{AbsenceKind, AbsenceRequest, AbsenceRequestId, AbsenceStatus, NewAbsenceRequest, Period},
//!     employee::EmployeeId,
//!     user::UserId,
//! };
//!
//! let request = AbsenceRequest::new(NewAbsenceRequest {
//!     id: AbsenceRequestId::new(),
//!     subject_id: EmployeeId::new(),
//!     kind: AbsenceKind::PaidLeave,
//!     period: Period::new(
//!         NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2025, 7, 4).unwrap(),
//!         None,
//!     )?,
//!     comment: None,
//!     created_by: UserId::new(),
//!     now: chrono::Utc::now(),
//! });
//! assert_eq!(request.status(), AbsenceStatus::PendingLevel1);
//! assert!(!request.scheduling_impact());
//! # Ok(())
//! # }
//! ```

mod period;
mod request;

pub use period::*;
pub use request::*;

use crate::DomainError;

/// 不在種別
///
/// 情報としての分類であり、承認ワークフローの挙動には影響しない。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::IntoStaticStr,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AbsenceKind {
    /// 有給休暇
    PaidLeave,
    /// 病気休暇
    SickLeave,
    /// 研修
    Training,
    /// 外部派遣
    ExternalAssignment,
    /// その他
    Other,
}

impl std::str::FromStr for AbsenceKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid_leave" => Ok(Self::PaidLeave),
            "sick_leave" => Ok(Self::SickLeave),
            "training" => Ok(Self::Training),
            "external_assignment" => Ok(Self::ExternalAssignment),
            "other" => Ok(Self::Other),
            _ => Err(DomainError::Validation(format!("不正な不在種別: {}", s))),
        }
    }
}
