//! # Absence Service サーバー
//!
//! 不在申請承認ワークフローを実行する内部サービス。
//!
//! ## 役割
//!
//! - **承認ワークフロー**: 2段階承認（N+1 上長 → 人事）の状態遷移と
//!   作成時の自動承認ショートカット
//! - **権限階層分類**: 操作者と対象者の関係（人事・管理者/上長/本人）の解決
//! - **計画影響ゲート**: 計画系コラボレータが参照する `scheduling_impact` の導出
//! - **監査証跡**: 意味のある遷移ごとのベストエフォート追記
//!
//! ## アクセス制御
//!
//! このサービスは内部ネットワークからのみアクセス可能とする。
//! セッション管理は前段のゲートウェイ（BFF）が担当し、
//! 操作者のアイデンティティをリクエストに付与する。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `ABSENCE_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `ABSENCE_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `ALLOW_OWNER_CANCEL` | No | 本人による取消の許可（デフォルト: 無効） |
//! | `LOG_FORMAT` | No | `json` / `pretty`（デフォルト: `pretty`） |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境
//! cargo run -p leaveflow-absence-service
//!
//! # 本番環境
//! ABSENCE_PORT=3002 DATABASE_URL=postgres://... \
//!     cargo run -p leaveflow-absence-service --release
//! ```

mod config;
mod error;
mod handler;
mod usecase;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use config::AbsenceConfig;
use handler::{
    AbsenceState, create_absence, get_absence, health_check, list_absences_by_subject,
    update_absence_status,
};
use leaveflow_domain::{authority::HrTierRoles, clock::SystemClock};
use leaveflow_infra::{
    db,
    repository::{
        PostgresAbsenceRequestRepository, PostgresAuditLogRepository, PostgresEmployeeRepository,
        PostgresRoleRepository,
    },
};
use leaveflow_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use usecase::{AbsenceUseCaseImpl, AbsenceWorkflowDeps, CancellationPolicy};

/// Absence Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    init_tracing(TracingConfig::from_env("absence-service"));

    // 設定読み込み
    let config = AbsenceConfig::from_env().expect("設定の読み込みに失敗しました");

    tracing::info!(
        "Absence Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // データベース接続プールを作成
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("データベース接続に失敗しました");
    tracing::info!("データベースに接続しました");

    // マイグレーション適用
    db::run_migrations(&pool)
        .await
        .expect("マイグレーションの適用に失敗しました");

    // 依存コンポーネントを初期化
    let usecase = AbsenceUseCaseImpl::new(AbsenceWorkflowDeps {
        absence_repo:  Arc::new(PostgresAbsenceRequestRepository::new(pool.clone())),
        employee_repo: Arc::new(PostgresEmployeeRepository::new(pool.clone())),
        role_repo:     Arc::new(PostgresRoleRepository::new(pool.clone())),
        audit_repo:    Arc::new(PostgresAuditLogRepository::new(pool.clone())),
        clock:         Arc::new(SystemClock),
        hr_roles:      HrTierRoles::default(),
        policy:        CancellationPolicy {
            allow_owner_cancel: config.allow_owner_cancel,
        },
    });
    let state = Arc::new(AbsenceState { usecase });

    // ルーター構築
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/internal/absences", post(create_absence))
        .route("/internal/absences/{id}", get(get_absence))
        .route("/internal/absences/{id}/status", post(update_absence_status))
        .route(
            "/internal/absences/by-subject/{subject_id}",
            get(list_absences_by_subject),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("アドレスのパースに失敗しました");

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Absence Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
