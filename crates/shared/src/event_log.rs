//! # ビジネスイベントログの構造化ヘルパー
//!
//! ログフィールドの命名規約とヘルパーマクロを提供する。
//! 運用調査で `jq` によるフィルタが効くよう、ビジネスイベントには
//! `event.kind = "business_event"` マーカーを自動付与する。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`event.action`）を使用。tracing の
//! `$($field:ident).+` パターンでサポートされ、JSON 出力でフラットな
//! キーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.entity_id`: エンティティ ID
/// - `event.actor_id`: 操作者 ID
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const ABSENCE: &str = "absence";
    }

    /// イベントアクション
    pub mod action {
        pub const ABSENCE_CREATED: &str = "absence.created";
        pub const ABSENCE_LEVEL1_APPROVED: &str = "absence.level1_approved";
        pub const ABSENCE_LEVEL1_REJECTED: &str = "absence.level1_rejected";
        pub const ABSENCE_LEVEL2_APPROVED: &str = "absence.level2_approved";
        pub const ABSENCE_LEVEL2_REJECTED: &str = "absence.level2_rejected";
        pub const ABSENCE_APPLIED: &str = "absence.applied";
        pub const ABSENCE_CANCELLED: &str = "absence.cancelled";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const ABSENCE_REQUEST: &str = "absence_request";
        pub const EMPLOYEE: &str = "employee";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}
