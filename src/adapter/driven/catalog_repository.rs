use crate::adapter::database_error::{fetch_failed, DatabaseError};
use crate::domain::model::{
    Card, CardDetails, CardId, Category, CategoryId, Condition, Expansion, ExpansionId, Rarity,
};
use crate::domain::port::{CardFilter, CatalogRepository, RepositoryError};
use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, QueryBuilder, Row};

const CARD_SELECT: &str = r#"
    SELECT
        id, code, name, number_in_expansion, description, primary_type, secondary_type,
        hp, expansion_id, category_id, rarity, card_condition, holo, first_edition,
        language, popularity, created_at, updated_at
    FROM cards
"#;

/// MySQLカタログリポジトリ
/// カード・カテゴリ・拡張パックを永続化する
pub struct MySqlCatalogRepository {
    pool: Pool<MySql>,
}

impl MySqlCatalogRepository {
    /// 新しいMySQLカタログリポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    fn card_from_row(row: &MySqlRow) -> Result<Card, RepositoryError> {
        let id = CardId::from_string(row.get("id")).map_err(|e| fetch_failed("カードID", e))?;
        let expansion_id = ExpansionId::from_string(row.get("expansion_id"))
            .map_err(|e| fetch_failed("拡張パックID", e))?;
        let category_id = row
            .get::<Option<String>, _>("category_id")
            .map(|value| CategoryId::from_string(&value))
            .transpose()
            .map_err(|e| fetch_failed("カテゴリID", e))?;
        let rarity =
            Rarity::from_string(row.get("rarity")).map_err(|e| fetch_failed("レアリティ", e))?;
        let condition = Condition::from_string(row.get("card_condition"))
            .map_err(|e| fetch_failed("コンディション", e))?;

        let details = CardDetails {
            code: row.get("code"),
            name: row.get("name"),
            number_in_expansion: row.get("number_in_expansion"),
            description: row.get("description"),
            primary_type: row.get("primary_type"),
            secondary_type: row.get("secondary_type"),
            hp: row.get("hp"),
            expansion_id,
            category_id,
            rarity,
            condition,
            holo: row.get("holo"),
            first_edition: row.get("first_edition"),
            language: row.get("language"),
        };

        Ok(Card::reconstruct(
            id,
            details,
            row.get("popularity"),
            row.get("created_at"),
            row.get("updated_at"),
        ))
    }

    fn category_from_row(row: &MySqlRow) -> Result<Category, RepositoryError> {
        Ok(Category {
            id: CategoryId::from_string(row.get("id")).map_err(|e| fetch_failed("カテゴリID", e))?,
            name: row.get("name"),
            description: row.get("description"),
            icon: row.get("icon"),
            created_at: row.get("created_at"),
        })
    }

    fn expansion_from_row(row: &MySqlRow) -> Result<Expansion, RepositoryError> {
        Ok(Expansion {
            id: ExpansionId::from_string(row.get("id"))
                .map_err(|e| fetch_failed("拡張パックID", e))?,
            code: row.get("code"),
            name: row.get("name"),
            release_date: row.get("release_date"),
            total_cards: row.get("total_cards"),
            active: row.get("active"),
            description: row.get("description"),
        })
    }
}

#[async_trait]
impl CatalogRepository for MySqlCatalogRepository {
    /// 既存のカードは更新し、なければ挿入する
    /// コードの一意制約違反は`Conflict`になる
    async fn save_card(&self, card: &Card) -> Result<(), RepositoryError> {
        let details = card.details();
        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM cards WHERE id = ?")
            .bind(card.id().to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("カードの確認に失敗しました", e))?;

        let sql = if exists.is_some() {
            r#"
            UPDATE cards SET
                code = ?, name = ?, number_in_expansion = ?, description = ?,
                primary_type = ?, secondary_type = ?, hp = ?, expansion_id = ?,
                category_id = ?, rarity = ?, card_condition = ?, holo = ?,
                first_edition = ?, language = ?, popularity = ?, created_at = ?,
                updated_at = ?
            WHERE id = ?
            "#
        } else {
            r#"
            INSERT INTO cards (
                code, name, number_in_expansion, description, primary_type, secondary_type,
                hp, expansion_id, category_id, rarity, card_condition, holo, first_edition,
                language, popularity, created_at, updated_at, id
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        };

        sqlx::query(sql)
            .bind(&details.code)
            .bind(&details.name)
            .bind(details.number_in_expansion)
            .bind(&details.description)
            .bind(&details.primary_type)
            .bind(&details.secondary_type)
            .bind(details.hp)
            .bind(details.expansion_id.to_string())
            .bind(details.category_id.map(|id| id.to_string()))
            .bind(details.rarity.as_str())
            .bind(details.condition.as_str())
            .bind(details.holo)
            .bind(details.first_edition)
            .bind(&details.language)
            .bind(card.popularity())
            .bind(card.created_at())
            .bind(card.updated_at())
            .bind(card.id().to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("カードの保存に失敗しました", e))?;

        Ok(())
    }

    async fn find_card(&self, card_id: CardId) -> Result<Option<Card>, RepositoryError> {
        let sql = format!("{} WHERE id = ?", CARD_SELECT);
        let row = sqlx::query(&sql)
            .bind(card_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("カードの取得に失敗しました", e))?;

        row.as_ref().map(Self::card_from_row).transpose()
    }

    async fn find_cards(&self, filter: &CardFilter) -> Result<Vec<Card>, RepositoryError> {
        let mut builder: QueryBuilder<MySql> = QueryBuilder::new(CARD_SELECT);
        builder.push(" WHERE 1 = 1");
        if let Some(category_id) = filter.category_id {
            builder.push(" AND category_id = ").push_bind(category_id.to_string());
        }
        if let Some(expansion_id) = filter.expansion_id {
            builder.push(" AND expansion_id = ").push_bind(expansion_id.to_string());
        }
        if let Some(rarity) = filter.rarity {
            builder.push(" AND rarity = ").push_bind(rarity.as_str());
        }
        if let Some(query) = filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", query);
            builder
                .push(" AND (name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR code LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        builder.push(" ORDER BY popularity DESC, name ASC");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("カード一覧の取得に失敗しました", e))?;

        rows.iter().map(Self::card_from_row).collect()
    }

    async fn find_cards_by_ids(&self, card_ids: &[CardId]) -> Result<Vec<Card>, RepositoryError> {
        if card_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<MySql> = QueryBuilder::new(CARD_SELECT);
        builder.push(" WHERE id IN (");
        let mut separated = builder.separated(", ");
        for card_id in card_ids {
            separated.push_bind(card_id.to_string());
        }
        separated.push_unseparated(")");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("カードの一括取得に失敗しました", e))?;

        rows.iter().map(Self::card_from_row).collect()
    }

    async fn increase_popularity(
        &self,
        card_id: CardId,
        amount: i64,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE cards SET popularity = popularity + ?, updated_at = UTC_TIMESTAMP(6) WHERE id = ?",
        )
        .bind(amount)
        .bind(card_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("人気度の更新に失敗しました", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn save_category(&self, category: &Category) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, icon, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(category.id.to_string())
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.icon)
        .bind(category.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("カテゴリの保存に失敗しました", e))?;

        Ok(())
    }

    async fn find_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, description, icon, created_at FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("カテゴリ一覧の取得に失敗しました", e))?;

        rows.iter().map(Self::category_from_row).collect()
    }

    async fn save_expansion(&self, expansion: &Expansion) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO expansions (id, code, name, release_date, total_cards, active, description)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(expansion.id.to_string())
        .bind(&expansion.code)
        .bind(&expansion.name)
        .bind(expansion.release_date)
        .bind(expansion.total_cards)
        .bind(expansion.active)
        .bind(&expansion.description)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("拡張パックの保存に失敗しました", e))?;

        Ok(())
    }

    async fn find_expansions(&self) -> Result<Vec<Expansion>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, code, name, release_date, total_cards, active, description
            FROM expansions
            ORDER BY release_date DESC, code ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("拡張パック一覧の取得に失敗しました", e))?;

        rows.iter().map(Self::expansion_from_row).collect()
    }
}
