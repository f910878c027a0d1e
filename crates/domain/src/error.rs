//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## 設計方針
//!
//! - **型による分類**: エラーの種類を列挙型で明示し、パターンマッチで処理可能に
//! - **thiserror 活用**: `#[error(...)]` マクロでエラーメッセージを自動生成
//! - **HTTP ステータスへのマッピング**: API 層でステータスコードに変換可能
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗（期間不正など） |
//! | `InvalidTransition` | 400 Bad Request | 現在の状態から到達できない遷移 |
//! | `NotFound` | 404 Not Found | エンティティが存在しない |
//! | `Conflict` | 409 Conflict | 条件付き更新の失敗（同時更新） |
//! | `Forbidden` | 403 Forbidden | 権限階層の不足 |
//!
//! `InvalidTransition` と `Forbidden` は意図的に分離している。前者は
//! 「この申請は既に決裁済み」、後者は「あなたにはこの操作が許されていない」
//! であり、UI が利用者に異なる案内を出せるようにする。

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// ビジネスロジックの実行中に発生する例外状態を表現する。
/// API 層でこのエラーを受け取り、適切な HTTP レスポンスに変換する。
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - 期間の開始日が終了日より後
    /// - 時間数が 0 以下
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// 許可されない状態遷移
    ///
    /// 現在のステータスから要求されたステータスへ遷移できない場合に使用する。
    /// 終了状態（却下・取消）からの遷移試行もここに含まれる。
    ///
    /// 同時更新による条件付き更新の失敗（[`Conflict`](Self::Conflict)）とは
    /// 区別する: こちらは読み取った時点で既に不正な遷移だった場合。
    #[error("許可されない状態遷移です: {from} → {to}")]
    InvalidTransition {
        /// 現在のステータス
        from: &'static str,
        /// 要求されたステータス
        to:   &'static str,
    },

    /// エンティティが見つからない
    ///
    /// 指定された ID のエンティティがデータベースに存在しない場合に使用する。
    /// `entity_type` にはエンティティの種類（"AbsenceRequest", "Employee"
    /// など）を指定し、エラーメッセージを具体的にする。
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類（コンパイル時に決定される `&'static str`）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },

    /// 競合エラー（条件付き更新の失敗）
    ///
    /// 同一申請への同時遷移が競合した場合に使用する。
    /// 遷移の前提とするステータスがコミット時点で既に変わっていた場合に発生する。
    ///
    /// # リトライ戦略
    ///
    /// このエラーが発生した場合、クライアントは最新データを再取得してから
    /// 再度操作を試みる必要がある（自動リトライは 1 回まで安全）。
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// 権限エラー
    ///
    /// アクターの権限階層がその遷移に要求される階層を満たさない場合に使用する。
    /// 認証（Authentication）ではなく認可（Authorization）の失敗を表す。
    #[error("権限がありません: {0}")]
    Forbidden(String),
}
