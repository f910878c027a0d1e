//! # LeaveFlow ドメイン層
//!
//! 不在申請（absence request）承認ワークフローのドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! このクレートは DDD（ドメイン駆動設計）の原則に従い、以下を提供する:
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（例: AbsenceRequest,
//!   Employee）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（例: Period,
//!   ActorClassification）
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! apps → infra → domain → shared
//! ```
//!
//! ドメイン層はインフラ層（DB、外部サービス）には一切依存しない。
//! これにより、承認ワークフローの状態遷移ロジックが純粋に保たれる。
//!
//! ## モジュール構成
//!
//! - [`absence`] - 不在申請エンティティと2段階承認の状態機械
//! - [`authority`] - アクターの権限階層分類（人事/管理者・上長・本人）
//! - [`employee`] - 従業員（申請対象者）エンティティ
//! - [`audit`] - 監査証跡レコード
//! - [`error`] - ドメイン層で発生するエラーの定義
//!
//! ## 使用例
//!
//! ```rust
//! use leaveflow_domain::{DomainError, employee::EmployeeId};
//!
//! // 従業員 ID の生成
//! let employee_id = EmployeeId::new();
//!
//! // ドメインエラーの生成
//! let error = DomainError::NotFound {
//!     entity_type: "AbsenceRequest",
//!     id:          "abs-123".to_string(),
//! };
//! ```

#[macro_use]
mod macros;

pub mod absence;
pub mod audit;
pub mod authority;
pub mod clock;
pub mod employee;
pub mod error;
pub mod user;

pub use error::DomainError;
