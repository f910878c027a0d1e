//! # Absence Service 設定
//!
//! 環境変数から Absence Service サーバーの設定を読み込む。

use std::env;

/// Absence Service サーバーの設定
#[derive(Debug, Clone)]
pub struct AbsenceConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// データベース接続 URL
    pub database_url: String,
    /// 本人による取消を許可するか（状態機械の外側のポリシー）
    pub allow_owner_cancel: bool,
}

impl AbsenceConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            host: env::var("ABSENCE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("ABSENCE_PORT")
                .expect("ABSENCE_PORT が設定されていません")
                .parse()
                .expect("ABSENCE_PORT は有効なポート番号である必要があります"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL が設定されていません"),
            allow_owner_cancel: env::var("ALLOW_OWNER_CANCEL")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }
}
