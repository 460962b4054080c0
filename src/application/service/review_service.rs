use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{
    average_approved_rating, CardId, CustomerId, Inventory, Review, ReviewId, ReviewInput, Vote,
};
use crate::domain::port::{CatalogRepository, InventoryRepository, ReviewRepository};
use chrono::Utc;
use std::sync::Arc;

/// レビューサービス
/// レビューの投稿・承認・投票と、カードの平均評価の更新を担当
pub struct ReviewService {
    review_repository: Arc<dyn ReviewRepository>,
    catalog_repository: Arc<dyn CatalogRepository>,
    inventory_repository: Arc<dyn InventoryRepository>,
}

impl ReviewService {
    pub fn new(
        review_repository: Arc<dyn ReviewRepository>,
        catalog_repository: Arc<dyn CatalogRepository>,
        inventory_repository: Arc<dyn InventoryRepository>,
    ) -> Self {
        Self {
            review_repository,
            catalog_repository,
            inventory_repository,
        }
    }

    /// レビューを投稿する（承認待ち）
    /// 同じユーザーが同じカードに投稿できるのは1件だけ
    pub async fn submit_review(
        &self,
        card_id: CardId,
        author_id: CustomerId,
        input: ReviewInput,
    ) -> Result<Review, ApplicationError> {
        if self.catalog_repository.find_card(card_id).await?.is_none() {
            return Err(ApplicationError::NotFound(format!(
                "カードが見つかりません: {}",
                card_id
            )));
        }
        if self
            .review_repository
            .find_by_card_and_author(card_id, author_id)
            .await?
            .is_some()
        {
            return Err(DomainError::Duplicate(
                "このカードには既にレビューを投稿しています".to_string(),
            )
            .into());
        }

        let review = Review::new(card_id, author_id, input, Utc::now())?;
        self.review_repository.save(&review).await?;
        Ok(review)
    }

    /// カードのレビュー一覧
    ///
    /// # Arguments
    /// * `include_pending` - 承認待ちも含めるか（スタッフ用）
    pub async fn list_reviews(
        &self,
        card_id: CardId,
        include_pending: bool,
    ) -> Result<Vec<Review>, ApplicationError> {
        let reviews = self.review_repository.find_by_card(card_id).await?;
        Ok(reviews
            .into_iter()
            .filter(|review| include_pending || review.is_approved())
            .collect())
    }

    /// レビューを承認し、カードの平均評価を再計算する
    #[tracing::instrument(skip(self))]
    pub async fn approve_review(&self, review_id: ReviewId) -> Result<Review, ApplicationError> {
        let mut review = self.load_review(review_id).await?;
        review.approve(Utc::now());
        self.review_repository.save(&review).await?;

        let reviews = self.review_repository.find_by_card(review.card_id()).await?;
        let average = Inventory::validate_average_rating(average_approved_rating(&reviews))?;
        // 在庫数を上書きしないよう平均評価の列だけを更新する
        let updated = self
            .inventory_repository
            .update_average_rating(review.card_id(), average)
            .await?;
        if !updated {
            tracing::warn!(
                card_id = %review.card_id(),
                "在庫がないため平均評価を保存できません"
            );
        }

        tracing::info!(review_id = %review_id, average, "レビューを承認しました");
        Ok(review)
    }

    pub async fn vote(&self, review_id: ReviewId, vote: Vote) -> Result<Review, ApplicationError> {
        let mut review = self.load_review(review_id).await?;
        review.vote(vote);
        self.review_repository.save(&review).await?;
        Ok(review)
    }

    async fn load_review(&self, review_id: ReviewId) -> Result<Review, ApplicationError> {
        self.review_repository
            .find_by_id(review_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("レビューが見つかりません: {}", review_id))
            })
    }
}
