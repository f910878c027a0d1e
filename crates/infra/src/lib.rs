//! # LeaveFlow インフラ層
//!
//! PostgreSQL リポジトリと監査シンクの実装を提供する。
//!
//! ## 設計方針
//!
//! - **リポジトリパターン**: ドメイン層はトレイト経由でのみ永続化に触れる
//! - **条件付き更新**: 状態遷移の書き込みは「ID + 現在ステータス」への
//!   一致を条件とする単一の UPDATE で行い、同時更新の競合を検出する
//! - **行レベルセキュリティ連携**: 読み取りコネクションに
//!   `app.actor_id` セッション変数を設定し、ストア側の RLS ポリシーが
//!   参照できるようにする

pub mod db;
pub mod error;
pub mod repository;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use error::InfraError;
