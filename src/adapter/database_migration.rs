use crate::adapter::database_error::DatabaseError;
use sqlx::{MySql, Pool};

/// 埋め込みマイグレーション（名前, SQL）
/// 外部キーの参照先が先に作られる順に並べる
const MIGRATIONS: [(&str, &str); 9] = [
    (
        "001_create_categories_table",
        include_str!("../../migrations/001_create_categories_table.sql"),
    ),
    (
        "002_create_expansions_table",
        include_str!("../../migrations/002_create_expansions_table.sql"),
    ),
    (
        "003_create_cards_table",
        include_str!("../../migrations/003_create_cards_table.sql"),
    ),
    (
        "004_create_inventories_table",
        include_str!("../../migrations/004_create_inventories_table.sql"),
    ),
    (
        "005_create_orders_table",
        include_str!("../../migrations/005_create_orders_table.sql"),
    ),
    (
        "006_create_order_lines_table",
        include_str!("../../migrations/006_create_order_lines_table.sql"),
    ),
    (
        "007_create_reviews_table",
        include_str!("../../migrations/007_create_reviews_table.sql"),
    ),
    (
        "008_create_collections_table",
        include_str!("../../migrations/008_create_collections_table.sql"),
    ),
    (
        "009_create_collection_cards_table",
        include_str!("../../migrations/009_create_collection_cards_table.sql"),
    ),
];

/// データベースマイグレーションを管理する構造体
pub struct DatabaseMigration {
    pool: Pool<MySql>,
}

impl DatabaseMigration {
    /// 新しいDatabaseMigrationインスタンスを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// マイグレーションを実行
    /// べき等性を保証（CREATE TABLE IF NOT EXISTS）
    pub async fn run(&self) -> Result<(), DatabaseError> {
        for (name, migration_sql) in MIGRATIONS {
            tracing::debug!(migration = name, "マイグレーションを実行します");
            sqlx::query(migration_sql)
                .execute(&self.pool)
                .await
                .map_err(|e| DatabaseError::MigrationError(format!("{} failed: {}", name, e)))?;
        }

        tracing::info!(count = MIGRATIONS.len(), "マイグレーションが完了しました");
        Ok(())
    }
}
