use crate::adapter::database_error::{fetch_failed, DatabaseError};
use crate::domain::model::{CardId, Condition, CustomerId, Review, ReviewId, ReviewInput};
use crate::domain::port::{RepositoryError, ReviewRepository};
use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};

const REVIEW_SELECT: &str = r#"
    SELECT
        id, card_id, author_id, rating, title, comment, condition_received, recommended,
        approved, up_votes, down_votes, created_at, updated_at
    FROM reviews
"#;

/// MySQLレビューリポジトリ
pub struct MySqlReviewRepository {
    pool: Pool<MySql>,
}

impl MySqlReviewRepository {
    /// 新しいMySQLレビューリポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    fn review_from_row(row: &MySqlRow) -> Result<Review, RepositoryError> {
        let id = ReviewId::from_string(row.get("id")).map_err(|e| fetch_failed("レビューID", e))?;
        let card_id =
            CardId::from_string(row.get("card_id")).map_err(|e| fetch_failed("カードID", e))?;
        let author_id = CustomerId::from_string(row.get("author_id"))
            .map_err(|e| fetch_failed("投稿者ID", e))?;
        let condition_received = row
            .get::<Option<String>, _>("condition_received")
            .map(|value| Condition::from_string(&value))
            .transpose()
            .map_err(|e| fetch_failed("コンディション", e))?;

        Ok(Review::reconstruct(
            id,
            card_id,
            author_id,
            ReviewInput {
                rating: row.get("rating"),
                title: row.get("title"),
                comment: row.get("comment"),
                condition_received,
                recommended: row.get("recommended"),
            },
            row.get("approved"),
            row.get("up_votes"),
            row.get("down_votes"),
            row.get("created_at"),
            row.get("updated_at"),
        ))
    }
}

#[async_trait]
impl ReviewRepository for MySqlReviewRepository {
    /// 承認状態と投票数だけが後から変わる
    async fn save(&self, review: &Review) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO reviews (
                id, card_id, author_id, rating, title, comment, condition_received,
                recommended, approved, up_votes, down_votes, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                approved = IF(id = VALUES(id), VALUES(approved), approved),
                up_votes = IF(id = VALUES(id), VALUES(up_votes), up_votes),
                down_votes = IF(id = VALUES(id), VALUES(down_votes), down_votes),
                updated_at = IF(id = VALUES(id), VALUES(updated_at), updated_at)
            "#,
        )
        .bind(review.id().to_string())
        .bind(review.card_id().to_string())
        .bind(review.author_id().to_string())
        .bind(review.rating())
        .bind(review.title())
        .bind(review.comment())
        .bind(review.condition_received().map(|c| c.as_str()))
        .bind(review.recommended())
        .bind(review.is_approved())
        .bind(review.up_votes())
        .bind(review.down_votes())
        .bind(review.created_at())
        .bind(review.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("レビューの保存に失敗しました", e))?;

        // 同じカード・投稿者の別レビューに当たった場合は何も更新されていない
        let stored_id: Option<String> = sqlx::query_scalar(
            "SELECT id FROM reviews WHERE card_id = ? AND author_id = ?",
        )
        .bind(review.card_id().to_string())
        .bind(review.author_id().to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("レビューの確認に失敗しました", e))?;

        match stored_id {
            Some(id) if id == review.id().to_string() => Ok(()),
            _ => Err(RepositoryError::Conflict(format!(
                "カード {} には既にレビューがあります",
                review.card_id()
            ))),
        }
    }

    async fn find_by_id(&self, review_id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let sql = format!("{} WHERE id = ?", REVIEW_SELECT);
        let row = sqlx::query(&sql)
            .bind(review_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("レビューの取得に失敗しました", e))?;

        row.as_ref().map(Self::review_from_row).transpose()
    }

    async fn find_by_card(&self, card_id: CardId) -> Result<Vec<Review>, RepositoryError> {
        let sql = format!("{} WHERE card_id = ? ORDER BY created_at DESC", REVIEW_SELECT);
        let rows = sqlx::query(&sql)
            .bind(card_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("レビュー一覧の取得に失敗しました", e))?;

        rows.iter().map(Self::review_from_row).collect()
    }

    async fn find_by_card_and_author(
        &self,
        card_id: CardId,
        author_id: CustomerId,
    ) -> Result<Option<Review>, RepositoryError> {
        let sql = format!("{} WHERE card_id = ? AND author_id = ?", REVIEW_SELECT);
        let row = sqlx::query(&sql)
            .bind(card_id.to_string())
            .bind(author_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("レビューの取得に失敗しました", e))?;

        row.as_ref().map(Self::review_from_row).transpose()
    }
}
