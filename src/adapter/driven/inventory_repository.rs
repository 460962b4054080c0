use crate::adapter::database_error::{fetch_failed, DatabaseError};
use crate::domain::model::{CardId, Inventory, InventoryParts, Money, StockMovement};
use crate::domain::port::{InventoryRepository, RepositoryError, StockUpdateError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};
use std::collections::{BTreeMap, BTreeSet};

const INVENTORY_COLUMNS: &str = "card_id, available_quantity, reserved_quantity, list_price, \
     promotional_price, promotion_active, units_sold, average_rating";

/// MySQL在庫リポジトリ
/// 在庫台帳を永続化し、在庫操作を行ロック付きのトランザクションで適用する
#[derive(Clone)]
pub struct MySqlInventoryRepository {
    pool: Pool<MySql>,
}

impl MySqlInventoryRepository {
    /// 新しいMySQL在庫リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    fn inventory_from_row(row: &MySqlRow) -> Result<Inventory, RepositoryError> {
        let card_id =
            CardId::from_string(row.get("card_id")).map_err(|e| fetch_failed("カードID", e))?;

        Inventory::reconstruct(InventoryParts {
            card_id,
            available_quantity: row.get("available_quantity"),
            reserved_quantity: row.get("reserved_quantity"),
            list_price: Money::eur(row.get("list_price")),
            promotional_price: row
                .get::<Option<Decimal>, _>("promotional_price")
                .map(Money::eur),
            promotion_active: row.get("promotion_active"),
            units_sold: row.get("units_sold"),
            average_rating: row.get("average_rating"),
        })
        .map_err(|e| fetch_failed("在庫", e))
    }

    fn inventories_from_rows(rows: &[MySqlRow]) -> Result<Vec<Inventory>, RepositoryError> {
        rows.iter().map(Self::inventory_from_row).collect()
    }
}

#[async_trait]
impl InventoryRepository for MySqlInventoryRepository {
    async fn save(&self, inventory: &Inventory) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO inventories (
                card_id, available_quantity, reserved_quantity, list_price,
                promotional_price, promotion_active, units_sold, average_rating
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                list_price = VALUES(list_price),
                promotional_price = VALUES(promotional_price),
                promotion_active = VALUES(promotion_active)
            "#,
        )
        .bind(inventory.card_id().to_string())
        .bind(inventory.available_quantity())
        .bind(inventory.reserved_quantity())
        .bind(inventory.list_price().amount())
        .bind(inventory.promotional_price().map(|price| price.amount()))
        .bind(inventory.promotion_active())
        .bind(inventory.units_sold())
        .bind(inventory.average_rating())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("在庫の保存に失敗しました", e))?;

        Ok(())
    }

    async fn update_average_rating(
        &self,
        card_id: CardId,
        rating: f64,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE inventories SET average_rating = ? WHERE card_id = ?")
            .bind(rating)
            .bind(card_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("平均評価の更新に失敗しました", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_card_id(
        &self,
        card_id: CardId,
    ) -> Result<Option<Inventory>, RepositoryError> {
        let sql = format!("SELECT {} FROM inventories WHERE card_id = ?", INVENTORY_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(card_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("在庫の取得に失敗しました", e))?;

        row.as_ref().map(Self::inventory_from_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Inventory>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM inventories ORDER BY card_id ASC",
            INVENTORY_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("在庫一覧の取得に失敗しました", e))?;

        Self::inventories_from_rows(&rows)
    }

    async fn find_by_max_sellable(
        &self,
        max_sellable: u32,
    ) -> Result<Vec<Inventory>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM inventories \
             WHERE available_quantity - reserved_quantity <= ? \
             ORDER BY card_id ASC",
            INVENTORY_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(max_sellable)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("在庫僅少一覧の取得に失敗しました", e))?;

        Self::inventories_from_rows(&rows)
    }

    /// 対象の行をカードIDの順にロックしてから操作を適用する
    /// ロック順を揃えることで、同じカードを含む注文同士がデッドロックしない
    async fn apply_movements(
        &self,
        movements: &[StockMovement],
    ) -> Result<Vec<Inventory>, StockUpdateError> {
        if movements.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::from(DatabaseError::from_sqlx("トランザクション開始に失敗しました", e)))?;

        let card_ids: BTreeSet<CardId> = movements.iter().map(|m| m.card_id).collect();
        let lock_sql = format!(
            "SELECT {} FROM inventories WHERE card_id = ? FOR UPDATE",
            INVENTORY_COLUMNS
        );
        let mut locked: BTreeMap<CardId, Inventory> = BTreeMap::new();
        for card_id in card_ids {
            let row = sqlx::query(&lock_sql)
                .bind(card_id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    RepositoryError::from(DatabaseError::from_sqlx("在庫のロックに失敗しました", e))
                })?
                .ok_or(StockUpdateError::MissingInventory(card_id))?;
            locked.insert(card_id, Self::inventory_from_row(&row)?);
        }

        // 一つでも拒否されたらトランザクションを破棄してロールバックする
        for movement in movements {
            if let Some(inventory) = locked.get_mut(&movement.card_id) {
                inventory
                    .apply(movement)
                    .map_err(|source| StockUpdateError::Rejected {
                        card_id: movement.card_id,
                        source,
                    })?;
            }
        }

        for inventory in locked.values() {
            sqlx::query(
                r#"
                UPDATE inventories
                SET available_quantity = ?, reserved_quantity = ?, units_sold = ?
                WHERE card_id = ?
                "#,
            )
            .bind(inventory.available_quantity())
            .bind(inventory.reserved_quantity())
            .bind(inventory.units_sold())
            .bind(inventory.card_id().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from(DatabaseError::from_sqlx("在庫の更新に失敗しました", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::from(DatabaseError::from_sqlx("トランザクションのコミットに失敗しました", e)))?;

        tracing::debug!(movements = movements.len(), "在庫操作を適用しました");
        Ok(locked.into_values().collect())
    }
}
