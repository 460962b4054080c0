use tcg_storefront::adapter::driven::{
    MySqlCatalogRepository, MySqlCollectionRepository, MySqlInventoryRepository,
    MySqlOrderRepository, MySqlReviewRepository,
};
use tcg_storefront::adapter::driver::rest_api::{create_router, AppState, Repositories};
use tcg_storefront::adapter::{DatabaseConfig, DatabaseMigration, ServerConfig};

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 設定を読み込む
    let database_config = DatabaseConfig::from_env()?;
    let server_config = ServerConfig::from_env()?;
    tracing::info!(
        host = %database_config.host,
        port = database_config.port,
        database = %database_config.database,
        "データベース設定を読み込みました"
    );

    // 接続プールを作成
    let pool = MySqlPoolOptions::new()
        .max_connections(database_config.max_connections)
        .connect(&database_config.connection_string())
        .await?;

    // マイグレーションを実行
    DatabaseMigration::new(pool.clone()).run().await?;

    let repositories = Repositories {
        orders: Arc::new(MySqlOrderRepository::new(pool.clone())),
        inventories: Arc::new(MySqlInventoryRepository::new(pool.clone())),
        catalog: Arc::new(MySqlCatalogRepository::new(pool.clone())),
        reviews: Arc::new(MySqlReviewRepository::new(pool.clone())),
        collections: Arc::new(MySqlCollectionRepository::new(pool)),
    };

    let bind_address = server_config.bind_address();
    let site_title = server_config.site_title.clone();
    let app_state = AppState::new(repositories, server_config);

    // REST APIルーターを作成
    let app = create_router().with_state(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    // サーバーを起動
    let listener = tokio::net::TcpListener::bind(bind_address.as_str()).await?;
    tracing::info!(address = %bind_address, site = %site_title, "REST APIサーバーが起動しました");

    axum::serve(listener, app).await?;

    Ok(())
}
