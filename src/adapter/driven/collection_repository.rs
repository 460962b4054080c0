use crate::adapter::database_error::{fetch_failed, DatabaseError};
use crate::domain::model::{CardId, Collection, CollectionEntry, CollectionId, Condition, CustomerId};
use crate::domain::port::{CollectionRepository, RepositoryError};
use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

const COLLECTION_SELECT: &str = r#"
    SELECT id, owner_id, name, description, public, created_at, updated_at
    FROM collections
"#;

/// MySQLコレクションリポジトリ
/// コレクションと収録カードを永続化する
pub struct MySqlCollectionRepository {
    pool: Pool<MySql>,
}

impl MySqlCollectionRepository {
    /// 新しいMySQLコレクションリポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    fn entry_from_row(row: &MySqlRow) -> Result<CollectionEntry, RepositoryError> {
        Ok(CollectionEntry {
            card_id: CardId::from_string(row.get("card_id"))
                .map_err(|e| fetch_failed("カードID", e))?,
            quantity: row.get("quantity"),
            condition: row
                .get::<Option<String>, _>("card_condition")
                .map(|value| Condition::from_string(&value))
                .transpose()
                .map_err(|e| fetch_failed("コンディション", e))?,
            notes: row.get("notes"),
            added_at: row.get("added_at"),
        })
    }

    /// コレクション行に収録カードを読み込んで集約を再構築する
    async fn load(&self, row: &MySqlRow) -> Result<Collection, RepositoryError> {
        let id_text: String = row.get("id");
        let id = CollectionId::from_string(&id_text)
            .map_err(|e| fetch_failed("コレクションID", e))?;
        let owner_id = CustomerId::from_string(row.get("owner_id"))
            .map_err(|e| fetch_failed("所有者ID", e))?;

        let entry_rows = sqlx::query(
            r#"
            SELECT card_id, quantity, card_condition, notes, added_at
            FROM collection_cards
            WHERE collection_id = ?
            ORDER BY added_at ASC, card_id ASC
            "#,
        )
        .bind(&id_text)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("収録カードの取得に失敗しました", e))?;

        let entries = entry_rows
            .iter()
            .map(Self::entry_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Collection::reconstruct(
            id,
            owner_id,
            row.get("name"),
            row.get("description"),
            row.get("public"),
            entries,
            row.get("created_at"),
            row.get("updated_at"),
        ))
    }

    async fn load_all(&self, rows: &[MySqlRow]) -> Result<Vec<Collection>, RepositoryError> {
        let mut collections = Vec::with_capacity(rows.len());
        for row in rows {
            collections.push(self.load(row).await?);
        }
        Ok(collections)
    }
}

#[async_trait]
impl CollectionRepository for MySqlCollectionRepository {
    /// コレクション行を挿入または更新し、収録カードを置き換える
    /// 所有者と名前の一意制約違反は`Conflict`になる
    async fn save(&self, collection: &Collection) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::from_sqlx("トランザクション開始に失敗しました", e))?;

        let id = collection.id().to_string();
        let exists: Option<String> =
            sqlx::query_scalar("SELECT id FROM collections WHERE id = ? FOR UPDATE")
                .bind(&id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| DatabaseError::from_sqlx("コレクションの確認に失敗しました", e))?;

        let sql = if exists.is_some() {
            r#"
            UPDATE collections
            SET owner_id = ?, name = ?, description = ?, public = ?, created_at = ?, updated_at = ?
            WHERE id = ?
            "#
        } else {
            r#"
            INSERT INTO collections (owner_id, name, description, public, created_at, updated_at, id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#
        };
        sqlx::query(sql)
            .bind(collection.owner_id().to_string())
            .bind(collection.name())
            .bind(collection.description())
            .bind(collection.is_public())
            .bind(collection.created_at())
            .bind(collection.updated_at())
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx("コレクションの保存に失敗しました", e))?;

        sqlx::query("DELETE FROM collection_cards WHERE collection_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx("収録カードの削除に失敗しました", e))?;

        for entry in collection.entries() {
            sqlx::query(
                r#"
                INSERT INTO collection_cards (collection_id, card_id, quantity, card_condition, notes, added_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(entry.card_id.to_string())
            .bind(entry.quantity)
            .bind(entry.condition.map(|c| c.as_str()))
            .bind(&entry.notes)
            .bind(entry.added_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx("収録カードの保存に失敗しました", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::from_sqlx("トランザクションのコミットに失敗しました", e))?;

        Ok(())
    }

    async fn find_by_id(
        &self,
        collection_id: CollectionId,
    ) -> Result<Option<Collection>, RepositoryError> {
        let sql = format!("{} WHERE id = ?", COLLECTION_SELECT);
        let row = sqlx::query(&sql)
            .bind(collection_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("コレクションの取得に失敗しました", e))?;

        match row {
            Some(row) => self.load(&row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn find_by_owner(
        &self,
        owner_id: CustomerId,
    ) -> Result<Vec<Collection>, RepositoryError> {
        let sql = format!("{} WHERE owner_id = ? ORDER BY created_at DESC", COLLECTION_SELECT);
        let rows = sqlx::query(&sql)
            .bind(owner_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("コレクション一覧の取得に失敗しました", e))?;

        self.load_all(&rows).await
    }

    async fn find_by_owner_and_name(
        &self,
        owner_id: CustomerId,
        name: &str,
    ) -> Result<Option<Collection>, RepositoryError> {
        let sql = format!("{} WHERE owner_id = ? AND name = ?", COLLECTION_SELECT);
        let row = sqlx::query(&sql)
            .bind(owner_id.to_string())
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("コレクションの取得に失敗しました", e))?;

        match row {
            Some(row) => self.load(&row).await.map(Some),
            None => Ok(None),
        }
    }
}
