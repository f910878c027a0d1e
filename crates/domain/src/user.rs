//! # ユーザー（ログインアイデンティティ）
//!
//! 認証そのものは外部の認証サービスが担当するため、このコアでは
//! ログインアイデンティティを指す [`UserId`] のみを定義する。
//!
//! 従業員（[`crate::employee::Employee`]）は `user_id` を通じて
//! ログインアイデンティティと紐づくが、紐づかない「記録のみの協力者」
//! （アカウントなし従業員）も存在する。

define_uuid_id! {
    /// ユーザー ID（ログインアイデンティティの一意識別子）
    ///
    /// 申請の作成者・承認者・更新者はすべてこの ID で記録される。
    pub struct UserId;
}
