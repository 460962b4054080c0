use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{
    CardId, Collection, CollectionId, Condition, CustomerId, Money, WISHLIST_NAME,
};
use crate::domain::port::{CatalogRepository, CollectionRepository};
use chrono::Utc;
use std::sync::Arc;

/// コレクションと集計値
#[derive(Debug, Clone)]
pub struct CollectionSummary {
    pub collection: Collection,
    pub total_cards: u32,
    pub estimated_value: Money,
}

/// コレクションサービス
/// 個人コレクションとウィッシュリストを管理する
pub struct CollectionService {
    collection_repository: Arc<dyn CollectionRepository>,
    catalog_repository: Arc<dyn CatalogRepository>,
}

impl CollectionService {
    pub fn new(
        collection_repository: Arc<dyn CollectionRepository>,
        catalog_repository: Arc<dyn CatalogRepository>,
    ) -> Self {
        Self {
            collection_repository,
            catalog_repository,
        }
    }

    /// コレクションを作成する（名前はユーザーごとに一意）
    pub async fn create_collection(
        &self,
        owner_id: CustomerId,
        name: String,
        description: Option<String>,
        public: bool,
    ) -> Result<CollectionSummary, ApplicationError> {
        if self
            .collection_repository
            .find_by_owner_and_name(owner_id, &name)
            .await?
            .is_some()
        {
            return Err(DomainError::Duplicate(format!(
                "同じ名前のコレクションが既にあります: {}",
                name
            ))
            .into());
        }
        let collection = Collection::new(owner_id, name, description, public, Utc::now())?;
        self.collection_repository.save(&collection).await?;
        self.summarize(collection).await
    }

    pub async fn list_collections(
        &self,
        owner_id: CustomerId,
    ) -> Result<Vec<CollectionSummary>, ApplicationError> {
        let collections = self.collection_repository.find_by_owner(owner_id).await?;
        let mut summaries = Vec::with_capacity(collections.len());
        for collection in collections {
            summaries.push(self.summarize(collection).await?);
        }
        Ok(summaries)
    }

    pub async fn get_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<CollectionSummary, ApplicationError> {
        let collection = self.load(collection_id).await?;
        self.summarize(collection).await
    }

    /// コレクションにカードを追加（既にあれば数量を加算）
    pub async fn add_card(
        &self,
        collection_id: CollectionId,
        card_id: CardId,
        quantity: u32,
        condition: Option<Condition>,
        notes: Option<String>,
    ) -> Result<CollectionSummary, ApplicationError> {
        self.ensure_card_exists(card_id).await?;
        let mut collection = self.load(collection_id).await?;
        collection.add_card(card_id, quantity, condition, notes, Utc::now())?;
        self.collection_repository.save(&collection).await?;
        self.summarize(collection).await
    }

    pub async fn remove_card(
        &self,
        collection_id: CollectionId,
        card_id: CardId,
    ) -> Result<CollectionSummary, ApplicationError> {
        let mut collection = self.load(collection_id).await?;
        collection.remove_card(card_id, Utc::now())?;
        self.collection_repository.save(&collection).await?;
        self.summarize(collection).await
    }

    /// ウィッシュリストを取得（なければ作成）
    pub async fn wishlist(&self, owner_id: CustomerId) -> Result<Collection, ApplicationError> {
        if let Some(existing) = self
            .collection_repository
            .find_by_owner_and_name(owner_id, WISHLIST_NAME)
            .await?
        {
            return Ok(existing);
        }
        let wishlist = Collection::wishlist(owner_id, Utc::now());
        self.collection_repository.save(&wishlist).await?;
        Ok(wishlist)
    }

    pub async fn add_to_wishlist(
        &self,
        owner_id: CustomerId,
        card_id: CardId,
    ) -> Result<CollectionSummary, ApplicationError> {
        let wishlist = self.wishlist(owner_id).await?;
        self.add_card(wishlist.id(), card_id, 1, None, None).await
    }

    pub async fn remove_from_wishlist(
        &self,
        owner_id: CustomerId,
        card_id: CardId,
    ) -> Result<CollectionSummary, ApplicationError> {
        let wishlist = self.wishlist(owner_id).await?;
        self.remove_card(wishlist.id(), card_id).await
    }

    async fn load(&self, collection_id: CollectionId) -> Result<Collection, ApplicationError> {
        self.collection_repository
            .find_by_id(collection_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!(
                    "コレクションが見つかりません: {}",
                    collection_id
                ))
            })
    }

    async fn ensure_card_exists(&self, card_id: CardId) -> Result<(), ApplicationError> {
        match self.catalog_repository.find_card(card_id).await? {
            Some(_) => Ok(()),
            None => Err(ApplicationError::NotFound(format!(
                "カードが見つかりません: {}",
                card_id
            ))),
        }
    }

    async fn summarize(&self, collection: Collection) -> Result<CollectionSummary, ApplicationError> {
        let card_ids: Vec<CardId> = collection
            .entries()
            .iter()
            .map(|entry| entry.card_id)
            .collect();
        let cards = if card_ids.is_empty() {
            Vec::new()
        } else {
            self.catalog_repository.find_cards_by_ids(&card_ids).await?
        };
        Ok(CollectionSummary {
            total_cards: collection.total_cards(),
            estimated_value: collection.estimated_value(&cards),
            collection,
        })
    }
}
